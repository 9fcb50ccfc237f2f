use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Purge expired uploads now, then every `interval`.
pub fn spawn_sweeper(upload_dir: PathBuf, max_age: Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            // the first tick completes immediately
            ticker.tick().await;
            let dir = upload_dir.clone();
            match tokio::task::spawn_blocking(move || precis_core::purge_expired(&dir, max_age)).await {
                Ok(Ok(0)) => {}
                Ok(Ok(removed)) => tracing::info!(removed, "purged expired uploads"),
                Ok(Err(e)) => tracing::warn!(error = %e, "upload sweep failed"),
                Err(e) => tracing::warn!(error = %e, "upload sweep task failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_sweep_runs_immediately() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.txt"), "x").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let handle = spawn_sweeper(
            dir.path().to_path_buf(),
            Duration::from_millis(10),
            Duration::from_secs(3600),
        );
        for _ in 0..100 {
            if !dir.path().join("old.txt").exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert!(!dir.path().join("old.txt").exists());
    }
}
