pub mod config;
pub mod core;
pub mod interactive;
pub mod list;
pub mod logger;
pub mod registrar;

pub use crate::core::{InstallRequest, InstallRequestBuilder, InstallerConfig, RequestError};
pub use crate::registrar::{InstallError, InstalledApp, Installer};
