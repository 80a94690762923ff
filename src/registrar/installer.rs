use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::{AppLayout, InstallRequest, InstallerConfig};
use crate::registrar::copier::{copy_file, make_owner_executable, merge_dir, set_mode};
use crate::registrar::desktop_entry::DesktopEntry;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{app_id} is already installed ({path} exists)")]
    AlreadyInstalled { app_id: String, path: PathBuf },

    #[error("The desktop entries directory does not exist: {0}")]
    DesktopDirMissing(PathBuf),

    #[error("Executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Additional files not found: {}", join_paths(.0))]
    AdditionalFileNotFound(Vec<PathBuf>),

    #[error("Additional files directory not found: {0}")]
    AdditionalFilesDirNotFound(PathBuf),

    #[error("Icon not found: {0}")]
    IconNotFound(PathBuf),

    #[error("{path} would be installed over {target}")]
    NameConflict { path: PathBuf, target: PathBuf },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    /// Process exit status reported by the non-interactive front-end.
    pub fn exit_code(&self) -> u8 {
        match self {
            InstallError::AlreadyInstalled { .. } => 1,
            InstallError::DesktopDirMissing(_) => 2,
            InstallError::ExecutableNotFound(_) => 3,
            InstallError::AdditionalFileNotFound(_) => 4,
            InstallError::AdditionalFilesDirNotFound(_) => 4,
            InstallError::IconNotFound(_) => 5,
            InstallError::Io { .. } => 6,
            InstallError::NameConflict { .. } => 7,
        }
    }

    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> InstallError {
        let path = path.to_path_buf();
        move |source| InstallError::Io { action, path, source }
    }
}

/// Rejects sources whose copy would replace the installed executable, the
/// entry copy or the `application/` directory.
fn check_name_conflicts(request: &InstallRequest, layout: &AppLayout) -> Result<(), InstallError> {
    fn conflict(path: &Path, target: &Path) -> InstallError {
        InstallError::NameConflict {
            path: path.to_path_buf(),
            target: target.to_path_buf(),
        }
    }

    let executable = layout.installed_file(request.executable());

    for file in request.additional_files() {
        if layout.installed_file(file) == executable {
            return Err(conflict(file, &executable));
        }
    }

    if let Some(dir) = request.additional_files_dir() {
        for entry in fs::read_dir(dir).map_err(InstallError::io("read", dir))? {
            let entry = entry.map_err(InstallError::io("read", dir))?;
            if layout.application_dir.join(entry.file_name()) == executable {
                return Err(conflict(&entry.path(), &executable));
            }
        }
    }

    if let Some(icon) = request.icon() {
        let dest = layout.installed_icon(icon);
        if dest == layout.entry_copy || dest == layout.application_dir {
            return Err(conflict(icon, &dest));
        }
    }

    Ok(())
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// What an install produced (or, in a dry run, would produce).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    pub app_id: String,
    pub app_dir: PathBuf,
    pub executable: PathBuf,
    pub icon: Option<PathBuf>,
    pub entry_copy: PathBuf,
    pub desktop_entry: PathBuf,
}

pub struct Installer {
    pub config: InstallerConfig,
    pub dry_run: bool,
}

impl Installer {
    pub fn new(config: InstallerConfig) -> Self {
        Installer {
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Installs `request` under the packages root and registers its entry.
    ///
    /// Every precondition is checked before the first write, so a rejected
    /// request leaves the filesystem untouched. An I/O failure after the app
    /// directory has been reserved leaves the partial install in place.
    #[instrument(skip(self, request), fields(app_id = %request.app_id()))]
    pub fn install(&self, request: &InstallRequest) -> Result<InstalledApp, InstallError> {
        let layout = self.config.layout_for(request.app_id());

        if let Err(e) = self.validate(request, &layout) {
            debug!("Rejected: {}", e);
            return Err(e);
        }

        let installed = InstalledApp {
            app_id: request.app_id().to_string(),
            app_dir: layout.app_dir.clone(),
            executable: layout.installed_file(request.executable()),
            icon: request.icon().map(|icon| layout.installed_icon(icon)),
            entry_copy: layout.entry_copy.clone(),
            desktop_entry: layout.desktop_entry.clone(),
        };

        if self.dry_run {
            info!("[DRY RUN] Would install {} into {:?}", installed.app_id, installed.app_dir);
            return Ok(installed);
        }

        self.reserve(request.app_id(), &layout)?;

        let entry = DesktopEntry::for_request(request, &installed.executable, installed.icon.as_deref());
        self.write_desktop_entry(&entry, &layout)?;

        copy_file(request.executable(), &installed.executable)
            .map_err(InstallError::io("copy executable to", &installed.executable))?;
        make_owner_executable(&installed.executable)
            .map_err(InstallError::io("mark executable", &installed.executable))?;

        for file in request.additional_files() {
            let dest = layout.installed_file(file);
            copy_file(file, &dest).map_err(InstallError::io("copy additional file to", &dest))?;
        }

        if let Some(dir) = request.additional_files_dir() {
            merge_dir(dir, &layout.application_dir)
                .map_err(InstallError::io("merge additional files into", &layout.application_dir))?;
        }

        if let (Some(src), Some(dest)) = (request.icon(), installed.icon.as_deref()) {
            copy_file(src, dest).map_err(InstallError::io("copy icon to", dest))?;
        }

        info!("Installed {} into {:?}", installed.app_id, installed.app_dir);
        Ok(installed)
    }

    fn validate(&self, request: &InstallRequest, layout: &AppLayout) -> Result<(), InstallError> {
        // symlink_metadata so that a dangling link also counts as taken
        if fs::symlink_metadata(&layout.app_dir).is_ok() {
            return Err(InstallError::AlreadyInstalled {
                app_id: request.app_id().to_string(),
                path: layout.app_dir.clone(),
            });
        }

        if !self.config.desktop_entries_dir.is_dir() {
            return Err(InstallError::DesktopDirMissing(
                self.config.desktop_entries_dir.clone(),
            ));
        }

        if !request.executable().is_file() {
            return Err(InstallError::ExecutableNotFound(
                request.executable().to_path_buf(),
            ));
        }

        let missing: Vec<PathBuf> = request
            .additional_files()
            .iter()
            .filter(|path| !path.is_file())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(InstallError::AdditionalFileNotFound(missing));
        }

        if let Some(dir) = request.additional_files_dir()
            && !dir.is_dir()
        {
            return Err(InstallError::AdditionalFilesDirNotFound(dir.to_path_buf()));
        }

        if let Some(icon) = request.icon()
            && !icon.is_file()
        {
            return Err(InstallError::IconNotFound(icon.to_path_buf()));
        }

        check_name_conflicts(request, layout)
    }

    /// Creates the app directory in fail-if-exists mode; whoever creates it
    /// owns the id.
    fn reserve(&self, app_id: &str, layout: &AppLayout) -> Result<(), InstallError> {
        fs::create_dir_all(&self.config.packages_root)
            .map_err(InstallError::io("create packages root", &self.config.packages_root))?;

        match fs::create_dir(&layout.app_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(InstallError::AlreadyInstalled {
                    app_id: app_id.to_string(),
                    path: layout.app_dir.clone(),
                });
            }
            Err(e) => return Err(InstallError::io("create app directory", &layout.app_dir)(e)),
        }

        fs::create_dir(&layout.application_dir)
            .map_err(InstallError::io("create application directory", &layout.application_dir))?;

        debug!("Reserved {:?}", layout.app_dir);
        Ok(())
    }

    fn write_desktop_entry(&self, entry: &DesktopEntry, layout: &AppLayout) -> Result<(), InstallError> {
        debug!("Writing desktop entry: {:?}", layout.entry_copy);
        fs::write(&layout.entry_copy, entry.to_file_content())
            .map_err(InstallError::io("write desktop entry", &layout.entry_copy))?;
        set_mode(&layout.entry_copy, 0o644)
            .map_err(InstallError::io("set permissions on", &layout.entry_copy))?;

        debug!("Registering desktop entry: {:?}", layout.desktop_entry);
        copy_file(&layout.entry_copy, &layout.desktop_entry)
            .map_err(InstallError::io("copy desktop entry to", &layout.desktop_entry))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        config: InstallerConfig,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let packages = root.join("packages");
        let desktop = root.join("applications");
        fs::create_dir_all(&desktop).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/Test.AppImage"), b"fake appimage").unwrap();

        Fixture {
            _temp: temp,
            root,
            config: InstallerConfig::new(packages, desktop),
        }
    }

    fn request(fx: &Fixture) -> crate::core::InstallRequestBuilder {
        InstallRequest::builder()
            .app_id("test")
            .app_name("Test Package")
            .executable(fx.root.join("src/Test.AppImage"))
    }

    #[test]
    fn install_lays_out_app_directory() {
        let fx = fixture();
        let req = request(&fx).build().unwrap();

        let installed = Installer::new(fx.config.clone()).install(&req).unwrap();

        let app_dir = fx.config.packages_root.join("test");
        assert!(app_dir.join("application/Test.AppImage").is_file());
        assert!(app_dir.join("test.desktop").is_file());
        assert!(fx.config.desktop_entries_dir.join("test.desktop").is_file());
        assert_eq!(installed.executable, app_dir.join("application/Test.AppImage"));
        assert_eq!(installed.icon, None);
    }

    #[test]
    fn desktop_entry_points_at_installed_copies() {
        let fx = fixture();
        fs::write(fx.root.join("src/Test.png"), b"png").unwrap();
        let req = request(&fx)
            .icon(fx.root.join("src/Test.png"))
            .build()
            .unwrap();

        let installed = Installer::new(fx.config.clone()).install(&req).unwrap();

        let content = fs::read_to_string(&installed.desktop_entry).unwrap();
        assert!(content.contains(&format!("Exec={}\n", installed.executable.display())));
        assert!(content.contains(&format!(
            "Icon={}\n",
            fx.config.packages_root.join("test/Test.png").display()
        )));
        assert!(!content.contains(&fx.root.join("src").display().to_string()));
        assert!(fx.config.packages_root.join("test/Test.png").is_file());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fx = fixture();
        let req = request(&fx).build().unwrap();

        let installed = Installer::new(fx.config.clone())
            .with_dry_run(true)
            .install(&req)
            .unwrap();

        assert_eq!(installed.app_id, "test");
        assert!(!fx.config.packages_root.exists());
        assert!(!fx.config.desktop_entries_dir.join("test.desktop").exists());
    }

    #[test]
    fn dry_run_still_validates() {
        let fx = fixture();
        let req = request(&fx)
            .executable(fx.root.join("src/missing"))
            .build()
            .unwrap();

        let err = Installer::new(fx.config.clone())
            .with_dry_run(true)
            .install(&req)
            .unwrap_err();

        assert!(matches!(err, InstallError::ExecutableNotFound(_)));
    }

    #[test]
    fn existing_app_dir_blocks_install() {
        let fx = fixture();
        fs::create_dir_all(fx.config.packages_root.join("test")).unwrap();
        let req = request(&fx).build().unwrap();

        let err = Installer::new(fx.config.clone()).install(&req).unwrap_err();

        assert!(matches!(err, InstallError::AlreadyInstalled { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(!fx.config.desktop_entries_dir.join("test.desktop").exists());
    }

    #[test]
    fn reserve_refuses_a_directory_created_after_validation() {
        let fx = fixture();
        let installer = Installer::new(fx.config.clone());
        let layout = fx.config.layout_for("test");
        fs::create_dir_all(&layout.app_dir).unwrap();

        let err = installer.reserve("test", &layout).unwrap_err();

        assert!(matches!(err, InstallError::AlreadyInstalled { .. }));
    }

    #[test]
    fn additional_files_missing_reports_every_path() {
        let fx = fixture();
        fs::write(fx.root.join("src/present.txt"), b"ok").unwrap();
        let req = request(&fx)
            .additional_file(fx.root.join("src/present.txt"))
            .additional_file(fx.root.join("src/one.txt"))
            .additional_file(fx.root.join("src/two.txt"))
            .build()
            .unwrap();

        let err = Installer::new(fx.config.clone()).install(&req).unwrap_err();

        match &err {
            InstallError::AdditionalFileNotFound(missing) => {
                assert_eq!(
                    missing,
                    &vec![fx.root.join("src/one.txt"), fx.root.join("src/two.txt")]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("one.txt"));
        assert!(err.to_string().contains("two.txt"));
    }

    #[test]
    fn additional_files_dir_must_be_a_directory() {
        let fx = fixture();
        let req = request(&fx)
            .additional_files_dir(fx.root.join("src/Test.AppImage"))
            .build()
            .unwrap();

        let err = Installer::new(fx.config.clone()).install(&req).unwrap_err();

        assert!(matches!(err, InstallError::AdditionalFilesDirNotFound(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn checks_run_in_order() {
        let fx = fixture();
        let req = request(&fx)
            .executable(fx.root.join("src/missing"))
            .icon(fx.root.join("src/missing.png"))
            .build()
            .unwrap();
        let config = InstallerConfig::new(
            fx.config.packages_root.clone(),
            fx.root.join("no-such-dir"),
        );

        let err = Installer::new(config).install(&req).unwrap_err();

        assert!(matches!(err, InstallError::DesktopDirMissing(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn additional_content_is_copied_into_application_dir() {
        let fx = fixture();
        let extra = fx.root.join("src/extra");
        fs::create_dir_all(extra.join("data")).unwrap();
        fs::write(extra.join("data/table.bin"), b"table").unwrap();
        fs::write(fx.root.join("src/LICENSE"), b"MIT").unwrap();
        let req = request(&fx)
            .additional_file(fx.root.join("src/LICENSE"))
            .additional_files_dir(&extra)
            .build()
            .unwrap();

        Installer::new(fx.config.clone()).install(&req).unwrap();

        let application = fx.config.packages_root.join("test/application");
        assert_eq!(fs::read(application.join("LICENSE")).unwrap(), b"MIT");
        assert_eq!(fs::read(application.join("data/table.bin")).unwrap(), b"table");
    }

    #[test]
    fn additional_file_named_like_executable_is_rejected() {
        let fx = fixture();
        fs::create_dir_all(fx.root.join("src/other")).unwrap();
        fs::write(fx.root.join("src/other/Test.AppImage"), b"data").unwrap();
        let req = request(&fx)
            .additional_file(fx.root.join("src/other/Test.AppImage"))
            .build()
            .unwrap();

        let err = Installer::new(fx.config.clone()).install(&req).unwrap_err();

        assert!(matches!(err, InstallError::NameConflict { .. }));
        assert_eq!(err.exit_code(), 7);
        assert!(!fx.config.packages_root.join("test").exists());
    }

    #[test]
    fn files_dir_entry_named_like_executable_is_rejected() {
        let fx = fixture();
        let extra = fx.root.join("src/extra");
        fs::create_dir_all(&extra).unwrap();
        fs::write(extra.join("Test.AppImage"), b"data").unwrap();
        let req = request(&fx).additional_files_dir(&extra).build().unwrap();

        let err = Installer::new(fx.config.clone()).install(&req).unwrap_err();

        match err {
            InstallError::NameConflict { path, target } => {
                assert_eq!(path, extra.join("Test.AppImage"));
                assert_eq!(target, fx.config.packages_root.join("test/application/Test.AppImage"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!fx.config.packages_root.join("test").exists());
    }

    #[test]
    fn icon_may_not_replace_entry_copy_or_application_dir() {
        let fx = fixture();
        fs::create_dir_all(fx.root.join("src/other")).unwrap();
        fs::write(fx.root.join("src/other/test.desktop"), b"PNGDATA").unwrap();
        fs::write(fx.root.join("src/other/application"), b"PNGDATA").unwrap();

        for name in ["test.desktop", "application"] {
            let req = request(&fx)
                .icon(fx.root.join("src/other").join(name))
                .build()
                .unwrap();

            let err = Installer::new(fx.config.clone()).install(&req).unwrap_err();

            assert!(matches!(err, InstallError::NameConflict { .. }), "{name}: {err}");
            assert!(!fx.config.packages_root.join("test").exists());
        }
    }

    #[cfg(unix)]
    #[test]
    fn executable_keeps_exec_bit_next_to_additional_files() {
        use std::os::unix::fs::PermissionsExt;

        let fx = fixture();
        let extra = fx.root.join("src/extra");
        fs::create_dir_all(&extra).unwrap();
        fs::write(extra.join("README"), b"docs").unwrap();
        fs::write(fx.root.join("src/LICENSE"), b"MIT").unwrap();
        let req = request(&fx)
            .additional_file(fx.root.join("src/LICENSE"))
            .additional_files_dir(&extra)
            .build()
            .unwrap();

        let installed = Installer::new(fx.config.clone()).install(&req).unwrap();

        let mode = fs::metadata(&installed.executable).unwrap().permissions().mode();
        assert_ne!(mode & 0o100, 0);
        assert_eq!(fs::read(&installed.executable).unwrap(), b"fake appimage");
    }
}
