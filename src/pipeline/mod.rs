pub mod control;
pub mod worker;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::RunConfig;
use crate::system::sample::{CpuSample, MemorySample, MetricKind, SessionSnapshot};
use crate::system::source::MetricSource;
use control::ControlPlane;
use worker::{Cadence, FIRST_CPU_WINDOW, Worker, WorkerError, WorkerExit};

/// Samples a worker may have queued ahead of the aggregator.
pub const PUBLISH_CAPACITY: usize = 1;

pub type WorkerResult = Result<WorkerExit, WorkerError>;

/// One source per worker role.
pub struct Sources<M, S, C> {
    pub memory: M,
    pub sessions: S,
    pub cpu: C,
}

/// The aggregator's ends of the three publish channels.
pub struct Receivers {
    pub memory: mpsc::Receiver<MemorySample>,
    pub sessions: mpsc::Receiver<SessionSnapshot>,
    pub cpu: mpsc::Receiver<CpuSample>,
}

impl Receivers {
    /// Refuses further samples; workers still sending see a disconnect.
    pub fn close(&mut self) {
        self.memory.close();
        self.sessions.close();
        self.cpu.close();
    }
}

/// The three running workers plus everything needed to drive and stop them.
pub struct Pipeline {
    pub receivers: Receivers,
    pub control: ControlPlane,
    handles: Vec<(MetricKind, JoinHandle<WorkerResult>)>,
}

impl Pipeline {
    pub fn spawn<M, S, C>(config: &RunConfig, sources: Sources<M, S, C>) -> Self
    where
        M: MetricSource<Sample = MemorySample>,
        S: MetricSource<Sample = SessionSnapshot>,
        C: MetricSource<Sample = CpuSample>,
    {
        let count = config.sample_count;
        let interval = config.interval();
        let mut control = ControlPlane::new();

        let (memory_tx, memory) = mpsc::channel(PUBLISH_CAPACITY);
        let (sessions_tx, sessions) = mpsc::channel(PUBLISH_CAPACITY);
        let (cpu_tx, cpu) = mpsc::channel(PUBLISH_CAPACITY);

        let handles = vec![
            spawn_worker(
                &mut control,
                sources.memory,
                memory_tx,
                Cadence::Rest(interval),
                count,
            ),
            spawn_worker(
                &mut control,
                sources.sessions,
                sessions_tx,
                Cadence::Rest(interval),
                count,
            ),
            spawn_worker(
                &mut control,
                sources.cpu,
                cpu_tx,
                Cadence::Window {
                    first: FIRST_CPU_WINDOW,
                    rest: interval,
                },
                count,
            ),
        ];
        tracing::info!(count, interval_secs = interval.as_secs(), "sampling workers started");

        Pipeline {
            receivers: Receivers {
                memory,
                sessions,
                cpu,
            },
            control,
            handles,
        }
    }

    /// Waits for every worker to exit. Later calls return nothing.
    pub async fn join(&mut self) -> Vec<(MetricKind, WorkerResult)> {
        let (kinds, handles): (Vec<_>, Vec<_>) = std::mem::take(&mut self.handles).into_iter().unzip();
        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(kinds)
            .map(|(joined, kind)| {
                let result = joined.unwrap_or_else(|_| Err(WorkerError::Panicked { kind }));
                (kind, result)
            })
            .collect()
    }
}

fn spawn_worker<S: MetricSource>(
    control: &mut ControlPlane,
    source: S,
    publish: mpsc::Sender<S::Sample>,
    cadence: Cadence,
    count: usize,
) -> (MetricKind, JoinHandle<WorkerResult>) {
    let kind = S::KIND;
    let worker = Worker::new(source, publish, control.register(kind), cadence, count);
    let span = tracing::info_span!("worker", %kind);

    let handle = tokio::spawn(
        async move {
            let result = worker.run().await;
            match &result {
                Ok(exit) => tracing::debug!(?exit, "worker exited"),
                Err(err) => {
                    tracing::error!(%err, "worker failed");
                    eprintln!("{err}");
                }
            }
            result
        }
        .instrument(span),
    );
    (kind, handle)
}
