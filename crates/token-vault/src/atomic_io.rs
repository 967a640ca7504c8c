//! Temp-file-and-rename replacement of a single vault entry.
//!
//! The secret is written to a hidden sibling file, flushed to disk, and then
//! renamed over the entry. A failed write leaves the previous entry intact.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use cap_std::fs::{Dir, File, OpenOptions};

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `entry` in `dir` with `secret`.
///
/// `entry` must already be validated as a single visible file name; the
/// staging file is hidden so it can never collide with a valid key.
pub(crate) fn replace_entry(dir: &Dir, entry: &str, secret: &[u8]) -> io::Result<()> {
    let staging = staging_name(entry);

    if let Err(error) = stage_secret(dir, &staging, secret) {
        discard(dir, &staging);
        return Err(error);
    }
    if let Err(error) = promote(dir, &staging, entry) {
        discard(dir, &staging);
        return Err(error);
    }
    sync_directory(dir);
    Ok(())
}

fn staging_name(entry: &str) -> String {
    let sequence = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    format!(".{entry}.staging.{}.{nanos}.{sequence}", std::process::id())
}

fn stage_secret(dir: &Dir, staging: &str, secret: &[u8]) -> io::Result<()> {
    let mut file = open_private(dir, staging)?;
    file.write_all(secret)?;
    file.sync_all()
}

#[cfg(unix)]
fn open_private(dir: &Dir, name: &str) -> io::Result<File> {
    use cap_std::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true).mode(0o600);
    dir.open_with(name, &options)
}

#[cfg(not(unix))]
fn open_private(dir: &Dir, name: &str) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    dir.open_with(name, &options)
}

#[cfg(windows)]
fn promote(dir: &Dir, staging: &str, entry: &str) -> io::Result<()> {
    // Windows refuses to rename over an existing file.
    match dir.remove_file(entry) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    dir.rename(staging, dir, entry)
}

#[cfg(not(windows))]
fn promote(dir: &Dir, staging: &str, entry: &str) -> io::Result<()> {
    dir.rename(staging, dir, entry)
}

fn discard(dir: &Dir, staging: &str) {
    if dir.remove_file(staging).is_err() {
        // The staging file may never have been created.
    }
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Some platforms cannot fsync a directory handle.
    }
}
