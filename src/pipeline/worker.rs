use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Instrument;

use super::control::{ControlHandle, Guarded};
use crate::system::sample::MetricKind;
use crate::system::source::{MetricSource, SourceError};

/// The CPU worker's first window is fixed so the first frame appears quickly.
pub const FIRST_CPU_WINDOW: Duration = Duration::from_secs(1);

/// How a worker spaces its samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Sample instantly, then rest for the interval before the next sample.
    Rest(Duration),
    /// The sample itself spans the window, so there is no separate rest.
    Window { first: Duration, rest: Duration },
}

impl Cadence {
    pub fn window(&self, index: usize) -> Duration {
        match *self {
            Cadence::Rest(_) => Duration::ZERO,
            Cadence::Window { first, .. } if index == 0 => first,
            Cadence::Window { rest, .. } => rest,
        }
    }

    /// Pause after publishing sample `index`; nothing follows the last one.
    pub fn rest_after(&self, index: usize, count: usize) -> Option<Duration> {
        match *self {
            Cadence::Rest(interval) if index + 1 < count => Some(interval),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    Completed { published: usize },
    Terminated { published: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("{kind}: {source}")]
    Source {
        kind: MetricKind,
        #[source]
        source: SourceError,
    },
    #[error("{kind}: aggregator stopped receiving after {published} samples")]
    Disconnected { kind: MetricKind, published: usize },
    #[error("{kind}: worker task panicked")]
    Panicked { kind: MetricKind },
}

/// Samples one source a fixed number of times and publishes each result.
///
/// The worker exclusively owns the source and the sending half of its
/// channel; both are released when `run` returns, which also closes the
/// channel.
pub struct Worker<S: MetricSource> {
    source: S,
    publish: mpsc::Sender<S::Sample>,
    control: ControlHandle,
    cadence: Cadence,
    count: usize,
}

impl<S: MetricSource> Worker<S> {
    pub fn new(
        source: S,
        publish: mpsc::Sender<S::Sample>,
        control: ControlHandle,
        cadence: Cadence,
        count: usize,
    ) -> Self {
        Worker {
            source,
            publish,
            control,
            cadence,
            count,
        }
    }

    pub async fn run(mut self) -> Result<WorkerExit, WorkerError> {
        let kind = S::KIND;
        let mut published = 0;

        while published < self.count {
            let index = published;

            let sample = loop {
                let window = self.cadence.window(index);
                let span = tracing::trace_span!("worker.sample", %kind, index);
                match self
                    .control
                    .guard(self.source.sample(window).instrument(span))
                    .await
                {
                    Guarded::Done(Ok(sample)) => break sample,
                    Guarded::Done(Err(source)) => return Err(WorkerError::Source { kind, source }),
                    Guarded::Resumed => continue,
                    Guarded::Terminated => return Ok(WorkerExit::Terminated { published }),
                }
            };

            // Reserve first so a pause never drops a sample that is mid-send.
            loop {
                match self.control.guard(self.publish.reserve()).await {
                    Guarded::Done(Ok(permit)) => {
                        permit.send(sample);
                        break;
                    }
                    Guarded::Done(Err(_)) => {
                        return Err(WorkerError::Disconnected { kind, published });
                    }
                    Guarded::Resumed => continue,
                    Guarded::Terminated => return Ok(WorkerExit::Terminated { published }),
                }
            }
            published += 1;
            tracing::trace!(%kind, published, "sample published");

            if let Some(rest) = self.cadence.rest_after(index, self.count)
                && self.control.guard(tokio::time::sleep(rest)).await == Guarded::Terminated
            {
                return Ok(WorkerExit::Terminated { published });
            }
        }

        Ok(WorkerExit::Completed { published })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::control::{ControlPlane, ControlState};
    use crate::system::sample::MemorySample;

    struct Counting {
        produced: usize,
        fail_at: Option<usize>,
    }

    impl Counting {
        fn new() -> Self {
            Counting {
                produced: 0,
                fail_at: None,
            }
        }
    }

    impl MetricSource for Counting {
        type Sample = MemorySample;

        const KIND: MetricKind = MetricKind::Memory;

        async fn sample(&mut self, window: Duration) -> Result<MemorySample, SourceError> {
            tokio::time::sleep(window).await;
            if self.fail_at == Some(self.produced) {
                return Err(SourceError::parse("/proc/meminfo", "no MemTotal"));
            }
            self.produced += 1;
            Ok(MemorySample {
                physical_used_gib: self.produced as f32,
                ..MemorySample::default()
            })
        }
    }

    fn used(sample: MemorySample) -> f32 {
        sample.physical_used_gib
    }

    #[test]
    fn cpu_cadence_starts_with_short_window() {
        let cadence = Cadence::Window {
            first: FIRST_CPU_WINDOW,
            rest: Duration::from_secs(5),
        };
        assert_eq!(cadence.window(0), Duration::from_secs(1));
        assert_eq!(cadence.window(1), Duration::from_secs(5));
        assert_eq!(cadence.rest_after(0, 3), None);
    }

    #[test]
    fn rest_cadence_skips_rest_after_last_sample() {
        let cadence = Cadence::Rest(Duration::from_secs(2));
        assert_eq!(cadence.window(0), Duration::ZERO);
        assert_eq!(cadence.rest_after(0, 2), Some(Duration::from_secs(2)));
        assert_eq!(cadence.rest_after(1, 2), None);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_exactly_count_then_closes() {
        let mut plane = ControlPlane::new();
        let (tx, mut rx) = mpsc::channel(1);
        let worker = Worker::new(
            Counting::new(),
            tx,
            plane.register(MetricKind::Memory),
            Cadence::Rest(Duration::from_secs(1)),
            3,
        );
        let task = tokio::spawn(worker.run());

        let mut received = Vec::new();
        while let Some(sample) = rx.recv().await {
            received.push(used(sample));
        }
        assert_eq!(received, vec![1.0, 2.0, 3.0]);
        assert_eq!(
            task.await.unwrap().unwrap(),
            WorkerExit::Completed { published: 3 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_position_until_resume() {
        let mut plane = ControlPlane::new();
        let (tx, mut rx) = mpsc::channel(1);
        let worker = Worker::new(
            Counting::new(),
            tx,
            plane.register(MetricKind::Memory),
            Cadence::Window {
                first: Duration::from_secs(1),
                rest: Duration::from_secs(1),
            },
            3,
        );
        let task = tokio::spawn(worker.run());

        assert_eq!(rx.recv().await.map(used), Some(1.0));

        // Pause in the middle of the second window.
        tokio::time::sleep(Duration::from_millis(500)).await;
        plane.pause().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());

        plane.resume();
        assert_eq!(rx.recv().await.map(used), Some(2.0));
        assert_eq!(rx.recv().await.map(used), Some(3.0));
        assert_eq!(rx.recv().await, None);
        assert_eq!(
            task.await.unwrap().unwrap(),
            WorkerExit::Completed { published: 3 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn terminate_while_paused_exits_without_publishing() {
        let mut plane = ControlPlane::new();
        let (tx, mut rx) = mpsc::channel(1);
        let worker = Worker::new(
            Counting::new(),
            tx,
            plane.register(MetricKind::Memory),
            Cadence::Rest(Duration::from_secs(10)),
            5,
        );
        let task = tokio::spawn(worker.run());
        assert_eq!(rx.recv().await.map(used), Some(1.0));

        plane.pause().await;
        plane.terminate().await;
        assert_eq!(plane.state(), ControlState::Stopped);
        assert_eq!(
            task.await.unwrap().unwrap(),
            WorkerExit::Terminated { published: 1 }
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_stops_only_this_worker() {
        let mut plane = ControlPlane::new();
        let (tx, mut rx) = mpsc::channel(1);
        let source = Counting {
            produced: 0,
            fail_at: Some(1),
        };
        let worker = Worker::new(
            source,
            tx,
            plane.register(MetricKind::Memory),
            Cadence::Rest(Duration::from_secs(1)),
            4,
        );
        let task = tokio::spawn(worker.run());

        assert_eq!(rx.recv().await.map(used), Some(1.0));
        assert_eq!(rx.recv().await, None);
        let err = task.await.unwrap().unwrap_err();
        assert!(err.to_string().starts_with("memory: "), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_is_a_disconnect() {
        let mut plane = ControlPlane::new();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let worker = Worker::new(
            Counting::new(),
            tx,
            plane.register(MetricKind::Memory),
            Cadence::Rest(Duration::from_secs(1)),
            2,
        );
        let err = worker.run().await.unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Disconnected {
                kind: MetricKind::Memory,
                published: 0
            }
        ));
    }
}
