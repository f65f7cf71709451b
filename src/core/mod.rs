//! Core library components.
//!
//! The credential vault, the provider CLI executor, and the discovery
//! engine built on them. Nothing here prints; front ends drive
//! [`inventory::Inventory`].

pub mod audit;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod domain;
pub mod exec;
pub mod export;
pub mod inventory;
pub mod provider;
pub mod query;
pub mod store;
pub mod vault;
pub mod visibility;
