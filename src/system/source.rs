use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use super::sample::MetricKind;

/// Failure to read one telemetry source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{} could not be read: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is malformed: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SourceError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A producer of one telemetry kind, owned exclusively by one worker.
///
/// `sample` may block for `window` (the CPU source measures across it); the
/// other sources return immediately and ignore it. Dropping the source
/// releases whatever OS handles it holds.
pub trait MetricSource: Send + 'static {
    type Sample: Send + std::fmt::Debug + 'static;

    const KIND: MetricKind;

    fn sample(
        &mut self,
        window: Duration,
    ) -> impl Future<Output = Result<Self::Sample, SourceError>> + Send;
}
