//! # kiln-config
//!
//! User configuration for Kiln: the declarative config users write, its
//! discovery on disk, and its normalization into concrete build targets.

pub mod discovery;
pub mod error;
pub mod normalize;
pub mod package;
pub mod target;
pub mod user;

// Re-export main types
pub use error::*;
pub use normalize::{normalize_user_config, partition_targets};
pub use package::PackageJson;
pub use target::{BuildMode, BuildTargetConfig, BundleConfig, BundleOutput, BundlessConfig};
pub use user::*;

pub use discovery::{ConfigDiscovery, discover};
