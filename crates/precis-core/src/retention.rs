use std::path::Path;
use std::time::{Duration, SystemTime};

/// Delete regular files in `dir` last modified more than `max_age` ago.
///
/// Subdirectories are left alone. Returns the number of files removed; a
/// missing directory counts as empty.
pub fn purge_expired(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    purge_older_than(dir, SystemTime::now(), max_age)
}

/// `hours` as a [`Duration`], saturating instead of overflowing.
pub fn hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

fn purge_older_than(dir: &Path, now: SystemTime, max_age: Duration) -> std::io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age > max_age {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(path = %entry.path().display(), age_secs = age.as_secs(), "removed expired upload");
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove expired upload");
                }
            }
        }
    }
    Ok(removed)
}
