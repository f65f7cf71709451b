//! native-form: a multi-tenant cloud inventory.
//!
//! Users register AWS and Azure credentials; the engine discovers resources
//! through the provider CLIs and caches them for browsing and export.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── connection    # Connection add/list/edit/rm/test
//! │   ├── discover      # Discovery trigger
//! │   ├── resources     # Listing and detail
//! │   ├── export        # CSV / JSON export
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── cipher        # age-based secret cipher
//!     ├── vault/        # Credential store
//!     ├── store/        # Repository trait, memory and JSON file backends
//!     ├── exec/         # Sandboxed provider CLI execution
//!     ├── provider/     # AWS and Azure probe tables
//!     ├── discovery     # Clear, probe, commit
//!     ├── visibility    # Per-user connection and resource scope
//!     ├── inventory     # Application operations
//!     └── config        # Settings from file and environment
//! ```
//!
//! # Features
//!
//! - Credentials sealed with a process-wide age key, never stored in plaintext
//! - Provider CLIs run with an allow-listed environment and a hard timeout
//! - Discovery tolerates per-probe failures and replaces the cache wholesale
//! - Personal connections override server-wide defaults

pub mod cli;
pub mod core;
pub mod error;
