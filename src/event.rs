use std::io;

use tokio::sync::mpsc;

/// A request from outside the dashboard to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// Ctrl-C: ask the user before quitting.
    Quit,
    /// SIGTERM: stop at once without asking.
    Terminate,
}

pub struct Interrupts {
    rx: mpsc::UnboundedReceiver<Interrupt>,
    /// A terminate seen while discarding quit requests, delivered next.
    held_terminate: bool,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl Interrupts {
    /// Replaces the default Ctrl-C, SIGTERM and Ctrl-Z behaviour with a
    /// stream of interrupts. Ctrl-Z is swallowed so sampling never freezes.
    ///
    /// Handlers are installed before this returns, so must run inside the
    /// runtime.
    pub fn listen() -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Interrupt>();

        let mut signals = match Signals::install() {
            Ok(signals) => Some(signals),
            Err(err) => {
                tracing::warn!(%err, "could not install signal handlers");
                None
            }
        };

        let task = tokio::spawn(async move {
            let Some(signals) = signals.as_mut() else {
                return;
            };
            loop {
                match signals.recv().await {
                    Ok(interrupt) => {
                        if tx.send(interrupt).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "interrupt listener stopped");
                        break;
                    }
                }
            }
        });

        Self {
            rx,
            held_terminate: false,
            task: Some(task),
        }
    }

    /// Interrupts fed by hand instead of by the terminal.
    pub fn channel() -> (mpsc::UnboundedSender<Interrupt>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let interrupts = Self {
            rx,
            held_terminate: false,
            task: None,
        };
        (tx, interrupts)
    }

    pub async fn next(&mut self) -> Option<Interrupt> {
        if std::mem::take(&mut self.held_terminate) {
            return Some(Interrupt::Terminate);
        }
        self.rx.recv().await
    }

    /// Resolves once a terminate arrives, dropping quit requests meanwhile.
    /// Never resolves if the source is gone.
    pub async fn terminated(&mut self) {
        loop {
            match self.next().await {
                Some(Interrupt::Terminate) => return,
                Some(Interrupt::Quit) => {}
                None => std::future::pending::<()>().await,
            }
        }
    }

    /// Drops quit requests that arrived while the quit prompt was open.
    /// A pending terminate is kept for the next call to [`Interrupts::next`].
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while let Ok(interrupt) = self.rx.try_recv() {
            match interrupt {
                Interrupt::Quit => discarded += 1,
                Interrupt::Terminate => self.held_terminate = true,
            }
        }
        discarded
    }
}

impl Drop for Interrupts {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    suspend: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Signals {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            suspend: signal(SignalKind::from_raw(libc::SIGTSTP))?,
        })
    }

    async fn recv(&mut self) -> io::Result<Interrupt> {
        loop {
            tokio::select! {
                Some(()) = self.interrupt.recv() => return Ok(Interrupt::Quit),
                Some(()) = self.terminate.recv() => return Ok(Interrupt::Terminate),
                Some(()) = self.suspend.recv() => {
                    tracing::debug!("ignoring terminal stop request");
                }
                else => return Err(io::Error::other("signal streams closed")),
            }
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn install() -> io::Result<Self> {
        Ok(Signals)
    }

    async fn recv(&mut self) -> io::Result<Interrupt> {
        tokio::signal::ctrl_c().await?;
        Ok(Interrupt::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_interrupts_arrive_in_order() {
        let (tx, mut interrupts) = Interrupts::channel();
        tx.send(Interrupt::Quit).unwrap();
        tx.send(Interrupt::Terminate).unwrap();
        assert_eq!(interrupts.next().await, Some(Interrupt::Quit));
        assert_eq!(interrupts.next().await, Some(Interrupt::Terminate));
    }

    #[tokio::test]
    async fn discard_pending_empties_the_queue() {
        let (tx, mut interrupts) = Interrupts::channel();
        for _ in 0..3 {
            tx.send(Interrupt::Quit).unwrap();
        }
        assert_eq!(interrupts.discard_pending(), 3);
        drop(tx);
        assert_eq!(interrupts.next().await, None);
    }

    #[tokio::test]
    async fn discarding_keeps_a_pending_terminate() {
        let (tx, mut interrupts) = Interrupts::channel();
        tx.send(Interrupt::Quit).unwrap();
        tx.send(Interrupt::Terminate).unwrap();
        tx.send(Interrupt::Quit).unwrap();
        assert_eq!(interrupts.discard_pending(), 2);
        assert_eq!(interrupts.next().await, Some(Interrupt::Terminate));
    }

    #[tokio::test]
    async fn terminated_skips_quit_requests() {
        let (tx, mut interrupts) = Interrupts::channel();
        tx.send(Interrupt::Quit).unwrap();
        tx.send(Interrupt::Terminate).unwrap();
        interrupts.terminated().await;
        drop(tx);
        assert_eq!(interrupts.next().await, None);
    }
}
