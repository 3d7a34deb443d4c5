use std::io::{self, Write};
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RunConfig;
use crate::event::{Interrupt, Interrupts};
use crate::pipeline::control::ControlState;
use crate::pipeline::{Pipeline, WorkerResult};
use crate::prompt::QuitPrompt;
use crate::system::history::SeriesStore;
use crate::system::info::{SelfMemory, SystemInfo};
use crate::system::sample::{CpuSample, MemorySample, MetricKind, SessionSnapshot};
use crate::ui::{FrameContext, Screen, build_frame, build_system_info};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed { iterations: usize },
    /// The user confirmed a quit; workers were terminated early.
    Quit { iterations: usize },
    /// A terminate request stopped the run without asking.
    Terminated { iterations: usize },
}

/// Why a run ends before its last iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stop {
    Quit,
    Terminate,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("{kind}: channel closed after {iteration} of {expected} iterations")]
    Closed {
        kind: MetricKind,
        iteration: usize,
        expected: usize,
    },
    #[error("{kind}: no sample within {}s in iteration {iteration}", waited.as_secs())]
    Timeout {
        kind: MetricKind,
        iteration: usize,
        waited: Duration,
    },
    #[error("terminal: {0}")]
    Terminal(#[source] io::Error),
}

/// Stand-in for a deadline the clock cannot represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// The samples gathered for one iteration.
struct Collected {
    memory: MemorySample,
    cpu: CpuSample,
    /// `None` when the latest snapshot was already taken in an earlier drain.
    sessions: Option<SessionSnapshot>,
}

/// The aggregator: collects one sample of each kind per iteration, records
/// them and redraws the screen.
pub struct Dashboard<W: Write, P: QuitPrompt> {
    config: RunConfig,
    store: Option<SeriesStore>,
    sessions: SessionSnapshot,
    sessions_received: usize,
    pipeline: Pipeline,
    interrupts: Interrupts,
    prompt: P,
    screen: Screen<W>,
    self_memory: SelfMemory,
    reports: Vec<(MetricKind, WorkerResult)>,
}

impl<W: Write, P: QuitPrompt> Dashboard<W, P> {
    pub fn new(
        config: RunConfig,
        pipeline: Pipeline,
        interrupts: Interrupts,
        prompt: P,
        screen: Screen<W>,
    ) -> Self {
        Dashboard {
            store: Some(SeriesStore::new(config.sample_count)),
            config,
            sessions: SessionSnapshot::default(),
            sessions_received: 0,
            pipeline,
            interrupts,
            prompt,
            screen,
            self_memory: SelfMemory::new(),
            reports: Vec::new(),
        }
    }

    /// Runs every iteration, then waits for the workers and prints the
    /// static system information. Workers are always joined, even on error.
    pub async fn run(&mut self) -> Result<Outcome, DashboardError> {
        let result = self.drive().await;
        if let Err(err) = &result {
            tracing::error!(%err, "dashboard stopped");
            self.abort().await;
        }
        result
    }

    /// `None` once a quit has released it.
    pub fn store(&self) -> Option<&SeriesStore> {
        self.store.as_ref()
    }

    pub fn reports(&self) -> &[(MetricKind, WorkerResult)] {
        &self.reports
    }

    pub fn control_state(&self) -> ControlState {
        self.pipeline.control.state()
    }

    pub fn screen(&self) -> &Screen<W> {
        &self.screen
    }

    async fn drive(&mut self) -> Result<Outcome, DashboardError> {
        for iteration in 0..self.config.sample_count {
            let collected = match self.collect(iteration).await? {
                ControlFlow::Continue(collected) => collected,
                ControlFlow::Break(stop) => return Ok(self.quit(iteration, stop).await),
            };
            self.update(collected);
            self.render(iteration)?;
        }
        self.finish().await
    }

    /// Waits for one memory and one CPU sample plus the newest session
    /// snapshot, unless the run is stopped first.
    async fn collect(
        &mut self,
        iteration: usize,
    ) -> Result<ControlFlow<Stop, Collected>, DashboardError> {
        let expected = self.config.sample_count;
        let wait = self.config.collect_deadline();
        let mut deadline = deadline_after(wait);

        let mut memory = None;
        let mut cpu = None;
        let mut sessions = None;
        let mut sessions_ready = false;

        let (memory, cpu) = loop {
            if sessions_ready
                && let (Some(memory), Some(cpu)) = (memory, cpu)
            {
                break (memory, cpu);
            }
            let receivers = &mut self.pipeline.receivers;
            tokio::select! {
                Some(interrupt) = self.interrupts.next() => {
                    tracing::info!(iteration, ?interrupt, "interrupt received");
                    if let Some(stop) = self.handle_interrupt(interrupt).await? {
                        return Ok(ControlFlow::Break(stop));
                    }
                    deadline = deadline_after(wait);
                }
                sample = receivers.memory.recv(), if memory.is_none() => {
                    let Some(sample) = sample else {
                        return Err(DashboardError::Closed { kind: MetricKind::Memory, iteration, expected });
                    };
                    memory = Some(sample);
                }
                sample = receivers.cpu.recv(), if cpu.is_none() => {
                    let Some(sample) = sample else {
                        return Err(DashboardError::Closed { kind: MetricKind::Cpu, iteration, expected });
                    };
                    cpu = Some(sample);
                }
                snapshot = receivers.sessions.recv(), if !sessions_ready => {
                    match snapshot {
                        Some(snapshot) => {
                            self.sessions_received += 1;
                            sessions = Some(snapshot);
                        }
                        // Earlier drains already consumed this iteration's snapshot.
                        None if self.sessions_received > iteration => {}
                        None => {
                            return Err(DashboardError::Closed { kind: MetricKind::Sessions, iteration, expected });
                        }
                    }
                    sessions_ready = true;
                }
                () = tokio::time::sleep_until(deadline) => {
                    let kind = if memory.is_none() {
                        MetricKind::Memory
                    } else if cpu.is_none() {
                        MetricKind::Cpu
                    } else {
                        MetricKind::Sessions
                    };
                    return Err(DashboardError::Timeout { kind, iteration, waited: wait });
                }
            }
        };

        while let Ok(snapshot) = self.pipeline.receivers.sessions.try_recv() {
            self.sessions_received += 1;
            sessions = Some(snapshot);
        }

        Ok(ControlFlow::Continue(Collected {
            memory,
            cpu,
            sessions,
        }))
    }

    fn update(&mut self, collected: Collected) {
        if let Some(store) = self.store.as_mut() {
            store.record(collected.memory, collected.cpu);
        }
        if let Some(sessions) = collected.sessions {
            self.sessions = sessions;
        }
    }

    fn render(&mut self, iteration: usize) -> Result<(), DashboardError> {
        let _render_span = tracing::debug_span!("dashboard.render", iteration).entered();
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        let ctx = FrameContext {
            config: &self.config,
            store,
            sessions: &self.sessions,
            iteration,
            self_memory_kb: self.self_memory.kilobytes(),
            width: self.screen.width(),
        };
        let lines = build_frame(&ctx);
        self.screen.draw(&lines).map_err(DashboardError::Terminal)
    }

    async fn handle_interrupt(
        &mut self,
        interrupt: Interrupt,
    ) -> Result<Option<Stop>, DashboardError> {
        match interrupt {
            Interrupt::Terminate => Ok(Some(Stop::Terminate)),
            Interrupt::Quit => self.confirm_quit().await,
        }
    }

    /// Pauses every worker, asks the user, and resumes unless they confirm.
    /// A terminate while the question is open ends the run without an answer.
    async fn confirm_quit(&mut self) -> Result<Option<Stop>, DashboardError> {
        self.pipeline.control.pause().await;
        let answer = tokio::select! {
            answer = self.prompt.confirm_quit() => answer,
            () = self.interrupts.terminated() => {
                tracing::info!("terminate received while prompting");
                return Ok(Some(Stop::Terminate));
            }
        };
        let discarded = self.interrupts.discard_pending();
        if discarded > 0 {
            tracing::debug!(discarded, "dropped interrupts raised during prompt");
        }

        match answer {
            Ok(true) => Ok(Some(Stop::Quit)),
            Ok(false) => {
                self.pipeline.control.resume();
                Ok(None)
            }
            Err(err) => Err(DashboardError::Terminal(err)),
        }
    }

    async fn quit(&mut self, iterations: usize, stop: Stop) -> Outcome {
        tracing::info!(iterations, ?stop, "stopping early");
        self.store = None;
        self.pipeline.control.terminate().await;
        self.pipeline.receivers.close();
        self.reports = self.pipeline.join().await;
        match stop {
            Stop::Quit => Outcome::Quit { iterations },
            Stop::Terminate => Outcome::Terminated { iterations },
        }
    }

    /// Lets in-flight workers wind down, then prints the static information.
    async fn finish(&mut self) -> Result<Outcome, DashboardError> {
        let iterations = self.config.sample_count;
        let settle = tokio::time::sleep(self.config.settle_delay());
        tokio::pin!(settle);

        loop {
            tokio::select! {
                () = &mut settle => break,
                Some(interrupt) = self.interrupts.next() => {
                    if let Some(stop) = self.handle_interrupt(interrupt).await? {
                        return Ok(self.quit(iterations, stop).await);
                    }
                }
            }
        }

        self.pipeline.receivers.close();
        self.reports = self.pipeline.join().await;
        let info = build_system_info(&SystemInfo::gather());
        self.screen
            .print_lines(&info)
            .map_err(DashboardError::Terminal)?;
        tracing::info!(iterations, "dashboard finished");
        Ok(Outcome::Completed { iterations })
    }

    async fn abort(&mut self) {
        self.pipeline.control.terminate().await;
        self.pipeline.receivers.close();
        self.reports = self.pipeline.join().await;
    }
}
