mod clean;
mod config;
mod error;
pub mod fs_utils;
mod generator;
mod golist;
mod gotool;
mod gowork;
pub mod idl;
mod metadata;
mod packages;
mod render;
mod reporter;
mod service_tree;
mod workspace;

pub use clean::*;
pub use config::*;
pub use error::*;
pub use generator::*;
pub use golist::*;
pub use gotool::*;
pub use gowork::*;
pub use metadata::*;
pub use packages::*;
pub use render::*;
pub use reporter::*;
pub use service_tree::*;
pub use workspace::*;

/// Name of the configuration file, looked up in the project directory.
pub const RGO_CONFIG_FILE: &str = "rgo_config.yaml";

/// File name of the serialized package descriptors, one per service.
pub const PACKAGES_FILE: &str = "rgo_packages.json";
