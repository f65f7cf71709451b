//! Domain types.

mod connection;
mod credentials;
mod provider;
mod resource;
mod user;

pub use connection::{
    ConnectionId, ConnectionUpdate, CredentialConnection, NewConnection, SecretBlob,
};
pub use credentials::Credentials;
pub use provider::Provider;
pub use resource::{CachedResource, DiscoveredResource};
pub use user::{Role, User, UserId};
