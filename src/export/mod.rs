//! Design snapshot export and upload tracking.
//!
//! Saving a finished package is a two-step hand-off:
//!
//! - The design is serialised to a timestamped JSON snapshot on disk
//! - The snapshot is handed to the upload service and its completion
//!   state is polled until it resolves or the deadline passes
//!
//! A failed or timed-out upload leaves the snapshot file in place so the
//! transfer can be inspected or retried; only a completed upload removes
//! it.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::ExportConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::model::Design;

/// A serialisable capture of one design, tagged for the upload service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSnapshot {
    /// Export job this capture belongs to.
    pub job: Uuid,
    /// Capture time.
    pub created: DateTime<Utc>,
    /// The design as it stood at capture time.
    pub design: Design,
}

impl DesignSnapshot {
    /// Captures `design` under a fresh job id.
    #[must_use]
    pub fn capture(design: &Design) -> Self {
        Self::with_job(design, Uuid::new_v4())
    }

    /// Captures `design` under an existing job id.
    #[must_use]
    pub fn with_job(design: &Design, job: Uuid) -> Self {
        Self {
            job,
            created: Utc::now(),
            design: design.clone(),
        }
    }
}

/// Completion state reported by one upload service poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// The transfer is still in flight.
    Processing,
    /// The service rejected or lost the transfer.
    Failed,
    /// The transfer completed.
    Finished {
        /// Resource name the service assigned to the design.
        urn: String,
    },
}

/// One bounded upload, polled until it resolves or its deadline passes.
#[derive(Debug, Clone)]
pub struct UploadJob {
    id: Uuid,
    timeout: Duration,
    poll_interval: Duration,
}

impl UploadJob {
    /// Creates a job with the configured deadline and poll cadence.
    #[must_use]
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            timeout: Duration::from_secs(config.upload_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// The identifier snapshots for this job are tagged with.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Polls `poll` until the upload finishes, fails, or the deadline
    /// passes. The service is always polled at least once.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UploadFailed`] when the service reports
    /// the transfer lost, and [`GenerateError::UploadTimeout`] when the
    /// deadline passes first.
    pub async fn wait<F>(&self, mut poll: F) -> GenerateResult<String>
    where
        F: FnMut() -> UploadState,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            match poll() {
                UploadState::Finished { urn } => return Ok(urn),
                UploadState::Failed => return Err(GenerateError::UploadFailed),
                UploadState::Processing => {
                    tracing::debug!(job = %self.id, "upload pending");
                }
            }
            if Instant::now() >= deadline {
                return Err(GenerateError::UploadTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Writes snapshots and drives uploads per the export configuration.
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    /// Creates an exporter.
    #[must_use]
    pub const fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// The directory snapshots are written into.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.config
            .directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Serialises `design` to a snapshot file and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::SnapshotWrite`] when the file cannot be
    /// written.
    pub async fn save_snapshot(&self, design: &Design) -> GenerateResult<PathBuf> {
        self.write_snapshot(&DesignSnapshot::capture(design)).await
    }

    /// Exports `design` and waits for the upload service to take it.
    ///
    /// The snapshot file is removed once the upload completes. A failed
    /// or timed-out upload leaves it in place.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::SnapshotWrite`] when the snapshot cannot
    /// be written, and the errors of [`UploadJob::wait`] when the upload
    /// does not complete.
    pub async fn upload<F>(&self, design: &Design, poll: F) -> GenerateResult<String>
    where
        F: FnMut() -> UploadState,
    {
        let job = UploadJob::new(&self.config);
        let snapshot = DesignSnapshot::with_job(design, job.id());
        let path = self.write_snapshot(&snapshot).await?;
        tracing::info!(job = %job.id(), path = %path.display(), "snapshot written");

        let urn = job.wait(poll).await?;
        if let Err(error) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), %error, "snapshot cleanup failed");
        }
        tracing::info!(%urn, "design uploaded");
        Ok(urn)
    }

    async fn write_snapshot(&self, snapshot: &DesignSnapshot) -> GenerateResult<PathBuf> {
        let path = self
            .directory()
            .join(format!("{}-{}.json", snapshot.design.name, snapshot.job));
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            GenerateError::snapshot_write(&path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| GenerateError::snapshot_write(&path, e))?;
        Ok(path)
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn exporter_in(dir: &std::path::Path) -> Exporter {
        Exporter::new(ExportConfig {
            directory: Some(dir.to_path_buf()),
            ..ExportConfig::default()
        })
    }

    fn quick_job() -> UploadJob {
        UploadJob::new(&ExportConfig {
            directory: None,
            upload_timeout_secs: 60,
            poll_interval_ms: 1,
        })
    }

    #[tokio::test]
    async fn snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let design = Design::new("RES_0402");

        let path = exporter_in(dir.path()).save_snapshot(&design).await.unwrap();

        assert!(path.starts_with(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("RES_0402-"));
        assert!(name.ends_with(".json"));

        let json = std::fs::read_to_string(&path).unwrap();
        let snapshot: DesignSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot.design, design);
    }

    #[tokio::test]
    async fn write_failure_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let design = Design::new("CAP_0603");

        let err = exporter_in(&missing).save_snapshot(&design).await.unwrap_err();
        match err {
            GenerateError::SnapshotWrite { path, .. } => assert!(path.starts_with(&missing)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn completed_upload_removes_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let design = Design::new("SOT23");

        let urn = exporter_in(dir.path())
            .upload(&design, || UploadState::Finished {
                urn: "urn:adsk:pkg:1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(urn, "urn:adsk:pkg:1");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_upload_keeps_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let design = Design::new("SOT23");

        let err = exporter_in(dir.path())
            .upload(&design, || UploadState::Failed)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::UploadFailed));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn pending_polls_repeat_until_finished() {
        let polls = Cell::new(0u32);
        let urn = quick_job()
            .wait(|| {
                polls.set(polls.get() + 1);
                if polls.get() < 3 {
                    UploadState::Processing
                } else {
                    UploadState::Finished {
                        urn: "urn:adsk:pkg:2".to_string(),
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(urn, "urn:adsk:pkg:2");
        assert_eq!(polls.get(), 3);
    }

    #[tokio::test]
    async fn expired_deadline_reports_a_timeout() {
        let job = UploadJob::new(&ExportConfig {
            directory: None,
            upload_timeout_secs: 0,
            poll_interval_ms: 1,
        });

        let polls = Cell::new(0u32);
        let err = job
            .wait(|| {
                polls.set(polls.get() + 1);
                UploadState::Processing
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateError::UploadTimeout { seconds: 0 }));
        assert_eq!(polls.get(), 1);
    }

    #[test]
    fn jobs_are_uniquely_identified() {
        let config = ExportConfig::default();
        assert_ne!(UploadJob::new(&config).id(), UploadJob::new(&config).id());
    }

    #[test]
    fn default_directory_is_the_system_temp() {
        assert_eq!(Exporter::default().directory(), std::env::temp_dir());
    }
}
