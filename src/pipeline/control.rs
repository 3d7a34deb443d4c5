use std::future::Future;

use tokio::sync::watch;

use crate::system::sample::MetricKind;

/// What the aggregator currently asks of every worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Run,
    Pause,
    Terminate,
}

/// What a worker reports back about itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Paused,
    Stopped,
}

/// Aggregator-side view of the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlState {
    Running,
    /// Pause broadcast, not yet acknowledged by every worker.
    PauseRequested,
    Paused,
    Stopped,
}

/// Broadcasts commands to all workers and tracks their acknowledgements.
///
/// `Terminate` is sticky: once sent, no later command replaces it.
pub struct ControlPlane {
    commands: watch::Sender<Command>,
    workers: Vec<(MetricKind, watch::Receiver<WorkerState>)>,
    state: ControlState,
}

impl Default for ControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPlane {
    pub fn new() -> Self {
        let (commands, _) = watch::channel(Command::Run);
        ControlPlane {
            commands,
            workers: Vec::new(),
            state: ControlState::Running,
        }
    }

    /// Creates the control endpoint for one worker.
    pub fn register(&mut self, kind: MetricKind) -> ControlHandle {
        let (state_tx, state_rx) = watch::channel(WorkerState::Running);
        self.workers.push((kind, state_rx));
        ControlHandle {
            kind,
            commands: self.commands.subscribe(),
            state: state_tx,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Current self-reported state of every registered worker.
    pub fn worker_states(&self) -> Vec<(MetricKind, WorkerState)> {
        self.workers
            .iter()
            .map(|(kind, rx)| (*kind, *rx.borrow()))
            .collect()
    }

    /// Asks every worker to suspend and waits until each one has either
    /// acknowledged or already stopped. A no-op unless running.
    pub async fn pause(&mut self) {
        if self.state != ControlState::Running {
            return;
        }
        self.state = ControlState::PauseRequested;
        self.commands.send_replace(Command::Pause);
        tracing::debug!("pause requested");

        self.wait_for_all(|s| matches!(s, WorkerState::Paused | WorkerState::Stopped))
            .await;
        self.state = ControlState::Paused;
        tracing::debug!("all workers paused");
    }

    pub fn resume(&mut self) {
        if self.state != ControlState::Paused {
            return;
        }
        self.commands.send_replace(Command::Run);
        self.state = ControlState::Running;
        tracing::debug!("workers resumed");
    }

    /// Stops every worker from whatever state it is in and waits until each
    /// has released its source and exited its loop.
    pub async fn terminate(&mut self) {
        if self.state == ControlState::Stopped {
            return;
        }
        self.commands.send_replace(Command::Terminate);
        self.state = ControlState::Stopped;
        tracing::debug!("terminate broadcast");

        self.wait_for_all(|s| *s == WorkerState::Stopped).await;
    }

    async fn wait_for_all(&mut self, done: impl Fn(&WorkerState) -> bool) {
        for (kind, rx) in &mut self.workers {
            // A closed channel means the handle is gone, which implies stopped.
            if rx.wait_for(&done).await.is_err() {
                tracing::trace!(%kind, "worker handle already dropped");
            }
        }
    }
}

/// Result of running a future under worker control.
#[derive(Debug, PartialEq, Eq)]
pub enum Guarded<T> {
    Done(T),
    /// A pause interrupted the future, which was dropped; the worker has since
    /// been resumed and should retry the same step.
    Resumed,
    Terminated,
}

/// A worker's end of the control channel.
///
/// Dropping the handle reports the worker as stopped.
pub struct ControlHandle {
    kind: MetricKind,
    commands: watch::Receiver<Command>,
    state: watch::Sender<WorkerState>,
}

impl ControlHandle {
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Drives `fut` unless a command arrives first.
    ///
    /// A pause drops `fut` (so an unfinished sleep or sampling window is
    /// abandoned), acknowledges, and blocks until resume or terminate.
    pub async fn guard<F: Future>(&mut self, fut: F) -> Guarded<F::Output> {
        tokio::pin!(fut);
        loop {
            let command = *self.commands.borrow_and_update();
            match command {
                Command::Terminate => return Guarded::Terminated,
                Command::Pause => {
                    return if self.suspend().await {
                        Guarded::Resumed
                    } else {
                        Guarded::Terminated
                    };
                }
                Command::Run => {}
            }

            tokio::select! {
                biased;
                changed = self.commands.changed() => {
                    if changed.is_err() {
                        return Guarded::Terminated;
                    }
                }
                output = &mut fut => return Guarded::Done(output),
            }
        }
    }

    /// Returns `true` when resumed, `false` when terminated while paused.
    async fn suspend(&mut self) -> bool {
        self.state.send_replace(WorkerState::Paused);
        tracing::debug!(kind = %self.kind, "worker paused");

        let next = self
            .commands
            .wait_for(|command| *command != Command::Pause)
            .await
            .map(|command| *command);

        match next {
            Ok(Command::Run) => {
                self.state.send_replace(WorkerState::Running);
                tracing::debug!(kind = %self.kind, "worker resumed");
                true
            }
            _ => false,
        }
    }
}

impl Drop for ControlHandle {
    fn drop(&mut self) {
        self.state.send_replace(WorkerState::Stopped);
    }
}
