//! storgrid-core: shared types for the StorGrid placement engine.
//!
//! Holds the domain model consumed by `storgrid-placement`:
//!
//! - **`types`**: candidates, storage pool descriptions, deployed resources
//! - **`kinds`**: device provider kinds and the mixing-compatibility table
//! - **`config`**: the `PlacementFilter` (TOML-loadable)
//! - **`access`**: collaborator traits for property and deployment lookups

pub mod access;
pub mod config;
pub mod error;
pub mod kinds;
pub mod types;

pub use access::{AccessDenied, PropertyAccess, ResourceStateAccess, StaticCluster};
pub use config::{DisklessType, PlacementFilter, PropRule};
pub use error::{CoreError, CoreResult};
pub use kinds::{DefaultMixingPolicy, MixingPolicy, ProviderKind};
pub use types::*;
