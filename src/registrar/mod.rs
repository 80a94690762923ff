pub mod copier;
pub mod desktop_entry;
pub mod installer;

pub use desktop_entry::DesktopEntry;
pub use installer::{InstallError, InstalledApp, Installer};
