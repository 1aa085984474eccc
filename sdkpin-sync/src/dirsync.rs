//! Destination tree replacement and teardown.
//!
//! The destination is owned by this tool: it is never merged into, only
//! removed and recreated. Removal clears read-only permissions first, since
//! vendor snapshots routinely ship read-only files and `fs::copy` carries
//! those permissions over.

use std::fs;
use std::io;
use std::path::Path;

use sdkpin_core::Stage;

use crate::error::{io_err, SyncError};

/// Replace `dest` with a full recursive copy of `source`.
///
/// `source` is checked before `dest` is touched. A failure mid-copy leaves
/// `dest` partially populated; the next successful run replaces it.
/// Returns the number of files copied.
pub fn materialize(source: &Path, dest: &Path) -> Result<u64, SyncError> {
    let stage = Stage::Materializing;
    let meta = fs::metadata(source).map_err(|e| io_err(stage, source, e))?;
    if !meta.is_dir() {
        return Err(io_err(
            stage,
            source,
            io::Error::new(io::ErrorKind::NotFound, "source is not a directory"),
        ));
    }

    if dest.exists() {
        tracing::info!("removing existing copy at {}", dest.display());
        remove_tree(dest).map_err(|e| io_err(stage, dest, e))?;
    }

    tracing::info!("copying {} -> {}", source.display(), dest.display());
    copy_tree(source, dest, stage)
}

/// Remove `dest` if present. Returns whether anything was removed.
///
/// An absent destination is success so clean can be repeated.
pub fn teardown(dest: &Path) -> Result<bool, SyncError> {
    match fs::symlink_metadata(dest) {
        Ok(_) => {
            tracing::info!("removing {}", dest.display());
            remove_tree(dest).map_err(|e| io_err(Stage::Cleaning, dest, e))?;
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("nothing to remove at {}", dest.display());
            Ok(false)
        }
        Err(err) => Err(io_err(Stage::Cleaning, dest, err)),
    }
}

fn copy_tree(source: &Path, dest: &Path, stage: Stage) -> Result<u64, SyncError> {
    fs::create_dir_all(dest).map_err(|e| io_err(stage, dest, e))?;

    let mut entries: Vec<_> = fs::read_dir(source)
        .map_err(|e| io_err(stage, source, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| io_err(stage, source, e))?;
    entries.sort_by_key(|e| e.file_name());

    let mut copied = 0;
    for entry in entries {
        let from = entry.path();
        let to = dest.join(entry.file_name());
        // Follows symlinks: the destination holds plain files.
        let meta = fs::metadata(&from).map_err(|e| io_err(stage, &from, e))?;
        if meta.is_dir() {
            copied += copy_tree(&from, &to, stage)?;
        } else {
            fs::copy(&from, &to).map_err(|e| io_err(stage, &to, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// `remove_dir_all`, retried once after making the whole tree writable.
fn remove_tree(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        clear_readonly(path, &meta)?;
        return fs::remove_file(path);
    }
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(first) if first.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(first) => {
            tracing::debug!(
                "retrying removal of {} with write permission: {first}",
                path.display()
            );
            make_writable(path)?;
            fs::remove_dir_all(path)
        }
    }
}

fn make_writable(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    clear_readonly(path, &meta)?;
    if meta.is_dir() {
        for entry in fs::read_dir(path)? {
            make_writable(&entry?.path())?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn clear_readonly(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if meta.file_type().is_symlink() {
        return Ok(());
    }
    let mode = meta.permissions().mode();
    let wanted = if meta.is_dir() { mode | 0o700 } else { mode | 0o200 };
    if wanted != mode {
        fs::set_permissions(path, fs::Permissions::from_mode(wanted))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn clear_readonly(path: &Path, meta: &fs::Metadata) -> io::Result<()> {
    let mut perms = meta.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot(root: &Path) -> std::path::PathBuf {
        let src = root.join("WICED-SDK-3.3.1");
        fs::create_dir_all(src.join("WICED/platform")).unwrap();
        fs::write(src.join("README.txt"), "WICED SDK\n").unwrap();
        fs::write(src.join("WICED/platform/wwd_bus.c"), "int bus;\n").unwrap();
        src
    }

    #[test]
    fn materialize_copies_full_tree() {
        let tmp = TempDir::new().unwrap();
        let src = snapshot(tmp.path());
        let dest = tmp.path().join("out/WICED-SDK-3.3.1");

        let copied = materialize(&src, &dest).expect("materialize");
        assert_eq!(copied, 2);
        assert_eq!(
            fs::read_to_string(dest.join("WICED/platform/wwd_bus.c")).unwrap(),
            "int bus;\n"
        );
    }

    #[test]
    fn materialize_replaces_rather_than_merges() {
        let tmp = TempDir::new().unwrap();
        let src = snapshot(tmp.path());
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.o"), "old").unwrap();
        fs::write(dest.join("README.txt"), "hand edited").unwrap();

        materialize(&src, &dest).expect("materialize");
        assert!(!dest.join("stale.o").exists(), "stale file must be gone");
        assert_eq!(fs::read_to_string(dest.join("README.txt")).unwrap(), "WICED SDK\n");
    }

    #[test]
    fn missing_source_leaves_destination_alone() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("keep"), "x").unwrap();

        let err = materialize(&tmp.path().join("nope"), &dest).unwrap_err();
        assert_eq!(err.exit_code(), 34);
        assert!(dest.join("keep").exists());
    }

    #[test]
    fn teardown_absent_is_noop_and_repeatable() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("never-created");
        assert!(!teardown(&dest).expect("first"));
        assert!(!teardown(&dest).expect("second"));
        assert!(!dest.exists());
    }

    #[test]
    #[cfg(unix)]
    fn teardown_clears_readonly_files_and_dirs() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = snapshot(tmp.path());
        let dest = tmp.path().join("dest");
        materialize(&src, &dest).unwrap();

        let file = dest.join("WICED/platform/wwd_bus.c");
        fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();
        let dir = dest.join("WICED/platform");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        assert!(teardown(&dest).expect("teardown"));
        assert!(!dest.exists());
    }

    #[test]
    #[cfg(unix)]
    fn materialize_over_readonly_copy_succeeds() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = snapshot(tmp.path());
        fs::set_permissions(src.join("README.txt"), fs::Permissions::from_mode(0o444)).unwrap();
        let dest = tmp.path().join("dest");

        materialize(&src, &dest).expect("first copy");
        materialize(&src, &dest).expect("second copy over read-only file");
        assert!(dest.join("README.txt").exists());
    }
}
