use std::path::{Path, PathBuf};

pub const APPLICATION_DIR: &str = "application";

/// Where applications are installed and where the desktop looks for entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    pub packages_root: PathBuf,
    pub desktop_entries_dir: PathBuf,
}

impl InstallerConfig {
    pub fn new(packages_root: impl Into<PathBuf>, desktop_entries_dir: impl Into<PathBuf>) -> Self {
        InstallerConfig {
            packages_root: packages_root.into(),
            desktop_entries_dir: desktop_entries_dir.into(),
        }
    }

    /// Paths owned by `app_id`. The per-app paths are absolute so they can be
    /// written into `Exec=` and `Icon=` as-is.
    pub fn layout_for(&self, app_id: &str) -> AppLayout {
        let packages_root =
            std::path::absolute(&self.packages_root).unwrap_or_else(|_| self.packages_root.clone());
        let app_dir = packages_root.join(app_id);

        AppLayout {
            application_dir: app_dir.join(APPLICATION_DIR),
            entry_copy: app_dir.join(format!("{}.desktop", app_id)),
            desktop_entry: self.desktop_entries_dir.join(format!("{}.desktop", app_id)),
            app_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    pub app_dir: PathBuf,
    pub application_dir: PathBuf,
    /// In-app record of the generated entry.
    pub entry_copy: PathBuf,
    /// The entry the desktop environment reads.
    pub desktop_entry: PathBuf,
}

impl AppLayout {
    pub fn installed_file(&self, source: &Path) -> PathBuf {
        self.application_dir
            .join(source.file_name().unwrap_or_default())
    }

    pub fn installed_icon(&self, source: &Path) -> PathBuf {
        self.app_dir.join(source.file_name().unwrap_or_default())
    }
}
