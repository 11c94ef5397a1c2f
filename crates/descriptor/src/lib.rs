//! Typed migration model for migcheck.
//!
//! Every checker consumes the same [`MigrationDescriptor`]. Raw JSON/YAML
//! payloads are converted once, at the boundary, by [`adapter`].

pub mod adapter;
pub mod endpoint;
pub mod kinds;
pub mod migration;
pub mod schema;

pub use endpoint::{is_loopback, CloudConfig, DatabaseConfig, MigrationEndpoint, PathSet, RemoteAuth};
pub use kinds::{CloudProvider, DatabaseFamily, DatabaseKind, PlatformFamily, SystemKind, TransferMethod};
pub use migration::{MigrationDescriptor, MigrationOptions, Side};
