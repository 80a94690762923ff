pub mod layout;
pub mod normalization;
pub mod request;

pub use layout::{AppLayout, InstallerConfig};
pub use normalization::{suggest_app_id, suggest_app_name};
pub use request::{InstallRequest, InstallRequestBuilder, RequestError, parse_terminal};
