use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Copies `src` to `dest`, replacing any existing file.
pub fn copy_file(src: &Path, dest: &Path) -> io::Result<u64> {
    debug!("Copying {:?} to {:?}", src, dest);
    fs::copy(src, dest)
}

/// Merges the contents of `src_dir` into `dest_dir`. Files that already
/// exist in the destination are overwritten. Returns the number of files
/// copied.
pub fn merge_dir(src_dir: &Path, dest_dir: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src_dir).min_depth(1).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(io::Error::other)?;
        let target = dest_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!("Merged {} files from {:?} into {:?}", copied, src_dir, dest_dir);
    Ok(copied)
}

/// Adds the owner-executable bit, keeping every other permission bit.
#[cfg(unix)]
pub fn make_owner_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o100);
    fs::set_permissions(path, perms)?;
    debug!("Set owner executable bit: {:?}", path);
    Ok(())
}

#[cfg(not(unix))]
pub fn make_owner_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn merge_dir_copies_nested_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(src.join("lib/plugins")).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("README"), b"readme").unwrap();
        fs::write(src.join("lib/plugins/a.so"), b"plugin").unwrap();

        let copied = merge_dir(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read(dest.join("README")).unwrap(), b"readme");
        assert_eq!(fs::read(dest.join("lib/plugins/a.so")).unwrap(), b"plugin");
    }

    #[test]
    fn merge_dir_overwrites_and_keeps_unrelated_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("config.ini"), b"new").unwrap();
        fs::write(dest.join("config.ini"), b"old").unwrap();
        fs::write(dest.join("app"), b"binary").unwrap();

        merge_dir(&src, &dest).unwrap();

        assert_eq!(fs::read(dest.join("config.ini")).unwrap(), b"new");
        assert_eq!(fs::read(dest.join("app")).unwrap(), b"binary");
    }

    #[test]
    fn merge_dir_copies_empty_directories() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dest = temp.path().join("dest");
        fs::create_dir_all(src.join("cache")).unwrap();
        fs::create_dir_all(&dest).unwrap();

        assert_eq!(merge_dir(&src, &dest).unwrap(), 0);
        assert!(dest.join("cache").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn make_owner_executable_preserves_other_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tool");
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        set_mode(&path, 0o640).unwrap();

        make_owner_executable(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o740, "mode was {mode:o}");
    }
}
