//! Background runner: a worker thread owns the engine and paces its ticks
//! against a [`Clock`].
//!
//! Commands travel over an unbounded channel, each with its own reply
//! channel. The latest [`Snapshot`] is published through a bounded(1) channel
//! that the worker keeps topped up with the newest value. The worker exits
//! when the runner is dropped, joining before `drop` returns.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use turntable_traits::Drive;
use turntable_traits::clock::Clock;

use crate::command::{Command, Reply};
use crate::engine::Turntable;
use crate::error::{Result, TurntableError};
use crate::scheduler::Scheduler;
use crate::snapshot::Snapshot;

type Request = (Command, xch::Sender<Reply>);

pub struct Runner {
    commands: Option<xch::Sender<Request>>,
    snapshots: xch::Receiver<Snapshot>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for Runner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runner")
            .field("running", &self.join_handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Move `engine` onto a worker thread. One logic period of simulated time
    /// passes per logic period of `clock` time.
    pub fn spawn<D, C>(engine: Turntable<D>, clock: C) -> Self
    where
        D: Drive + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = xch::unbounded::<Request>();
        let (snap_tx, snap_rx) = xch::bounded::<Snapshot>(1);
        let snap_drain = snap_rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_worker = shutdown.clone();
        let period_ms = engine.timing().logic_period_ms.max(1);

        let join_handle = std::thread::spawn(move || {
            let mut sched = Scheduler::new(engine);
            let epoch = clock.now();
            let publish = |sched: &Scheduler<D>| {
                // Replace whatever is still queued with the newest view.
                let _ = snap_drain.try_recv();
                let _ = snap_tx.try_send(sched.engine().snapshot());
            };
            publish(&sched);
            loop {
                if shutdown_worker.load(Ordering::Relaxed) {
                    tracing::debug!("runner received shutdown signal");
                    break;
                }
                loop {
                    match cmd_rx.try_recv() {
                        Ok((cmd, reply_tx)) => {
                            let reply = sched.apply(cmd);
                            let _ = reply_tx.send(reply);
                        }
                        Err(xch::TryRecvError::Empty) => break,
                        Err(xch::TryRecvError::Disconnected) => {
                            tracing::debug!("runner command channel closed");
                            return;
                        }
                    }
                }
                sched.advance(period_ms);
                publish(&sched);
                clock.sleep_until_ms(epoch, sched.now_ms());
            }
            tracing::trace!(at_ms = sched.now_ms(), "runner thread exiting cleanly");
        });

        Self {
            commands: Some(cmd_tx),
            snapshots: snap_rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Queue `cmd` and wait for the worker to apply it.
    pub fn send(&self, cmd: Command) -> Result<Reply> {
        let name = cmd.name();
        let tx = self
            .commands
            .as_ref()
            .ok_or_else(|| eyre::Report::new(TurntableError::RunnerStopped))?;
        let (reply_tx, reply_rx) = xch::bounded(1);
        tx.send((cmd, reply_tx))
            .map_err(|_| eyre::Report::new(TurntableError::RunnerStopped))?;
        reply_rx
            .recv()
            .map_err(|_| eyre::Report::new(TurntableError::RunnerStopped))
            .map_err(|e| e.wrap_err(format!("command {name} was not applied")))
    }

    /// Most recent snapshot published by the worker, if a new one is available.
    pub fn latest(&self) -> Option<Snapshot> {
        self.snapshots.try_iter().last()
    }

    /// Block until the worker publishes a snapshot satisfying `done`.
    pub fn wait_for<F>(&self, mut done: F) -> Result<Snapshot>
    where
        F: FnMut(&Snapshot) -> bool,
    {
        for snap in &self.snapshots {
            if done(&snap) {
                return Ok(snap);
            }
        }
        Err(eyre::Report::new(TurntableError::RunnerStopped))
    }

    /// Signal the worker without waiting for it.
    pub fn request_stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.commands = None;
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("runner thread joined successfully"),
                Err(e) => tracing::warn!(?e, "runner thread panicked during shutdown"),
            }
        }
    }
}
