use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use walkdir::WalkDir;

/// Per-process counter so concurrent writers never share a temp file name.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Options for [`copy_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Copy the content a symlink points at instead of the link itself.
    pub follow_symlinks: bool,
    /// Replace files that already exist at the destination.
    pub overwrite: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            overwrite: true,
        }
    }
}

/// Counters collected while copying a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Regular files written.
    pub files: usize,
    /// Directories created (including the root).
    pub dirs: usize,
    /// Bytes written.
    pub bytes: u64,
    /// Existing files left alone because `overwrite` was off.
    pub skipped: usize,
}

/// Recursively copy `src` into `dst`.
///
/// `src` may be a directory or a single file. Missing parents of `dst` are
/// created. Every regular file goes through [`atomic_copy_file`], so a reader
/// (or a second copy racing on the same destination) only ever sees a whole
/// file.
///
/// # Errors
/// Returns an error if `src` does not exist, a symlink is dangling or loops
/// while `follow_symlinks` is set, or any write fails.
pub fn copy_tree(src: &Path, dst: &Path, options: &CopyOptions) -> io::Result<CopyStats> {
    let mut stats = CopyStats::default();

    let root_meta = if options.follow_symlinks {
        fs::metadata(src)?
    } else {
        fs::symlink_metadata(src)?
    };

    if !root_meta.is_dir() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        copy_one(src, dst, root_meta.file_type().is_symlink(), options, &mut stats)?;
        return Ok(stats);
    }

    for entry in WalkDir::new(src).follow_links(options.follow_symlinks) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            stats.dirs += 1;
        } else {
            copy_one(entry.path(), &target, file_type.is_symlink(), options, &mut stats)?;
        }
    }

    Ok(stats)
}

fn copy_one(
    src: &Path,
    dst: &Path,
    is_symlink: bool,
    options: &CopyOptions,
    stats: &mut CopyStats,
) -> io::Result<()> {
    if !options.overwrite && dst.symlink_metadata().is_ok() {
        stats.skipped += 1;
        return Ok(());
    }

    if is_symlink {
        copy_link(src, dst)?;
    } else {
        stats.bytes += atomic_copy_file(src, dst)?;
    }
    stats.files += 1;
    Ok(())
}

/// Recreate a symlink verbatim (only reached when links are not followed).
#[cfg(unix)]
fn copy_link(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_link(src: &Path, dst: &Path) -> io::Result<()> {
    atomic_copy_file(src, dst).map(|_| ())
}

/// Copy a single file by writing a sibling temp file and renaming it over `dst`.
///
/// Symlinks in `src` are followed. Returns the number of bytes copied.
///
/// # Errors
/// Returns an error if the source cannot be read or the rename fails.
pub fn atomic_copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let temp_path = temp_sibling(dst);

    let bytes = match fs::copy(src, &temp_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    match fs::rename(&temp_path, dst) {
        Ok(()) => Ok(bytes),
        Err(e) => {
            // On Windows, rename can fail if target exists. Try copy + remove as fallback.
            if cfg!(windows) {
                let copied = fs::copy(&temp_path, dst);
                let _ = fs::remove_file(&temp_path);
                copied
            } else {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    parent.join(format!(
        ".{}.tmp.{}.{n}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        std::process::id()
    ))
}
