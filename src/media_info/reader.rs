//! Failure-tolerant front end over a [`MediaProbe`].

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::ffprobe::{Ffprobe, MediaProbe};
use super::model::MediaInfoModel;
use crate::config::ProbeConfig;

/// Probes files for batch analysis: one bad file yields `None`, never an
/// error that would abort the batch.
#[derive(Clone)]
pub struct MediaInfoReader {
    probe: Option<Arc<dyn MediaProbe>>,
}

impl MediaInfoReader {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self { probe: Some(probe) }
    }

    /// A reader with no probe; every lookup returns `None`.
    pub fn disabled() -> Self {
        Self { probe: None }
    }

    /// Locate ffprobe, falling back to a disabled reader if it is missing.
    pub fn from_config(settings: &ProbeConfig) -> Self {
        match Ffprobe::locate(settings) {
            Ok(ffprobe) => Self::new(Arc::new(ffprobe)),
            Err(e) => {
                tracing::warn!("Media probing disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.probe.is_some()
    }

    pub async fn get_media_info(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Option<MediaInfoModel> {
        let probe = self.probe.as_ref()?;
        match probe.probe(path, cancel).await {
            Ok(info) => Some(info),
            Err(e) if e.is_cancelled() => {
                tracing::debug!(path = %path.display(), "Probe cancelled");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to probe file");
                None
            }
        }
    }
}

impl std::fmt::Debug for MediaInfoReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaInfoReader")
            .field("available", &self.is_available())
            .finish()
    }
}
