//! The background scheduler: owns the timing loop, the overlap gate, manual
//! trigger semantics, and graceful shutdown.
//!
//! One tokio task runs the loop; the control context may call
//! [`Scheduler::trigger`], [`Scheduler::run_once`], [`Scheduler::shutdown`]
//! and the status reads at any time. The only shared mutable state is
//! [`RunState`], guarded by a single mutex that is never held across the
//! job's I/O: the gate only flips the flag, the job runs unlocked, so a slow
//! pass never serialises status queries or trigger attempts behind it.
//!
//! The inter-tick sleep races the stop signal (`tokio::select!` over a watch
//! channel), so shutdown latency is bounded by the remaining sleep, not by
//! the full interval.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::contract::{ClientError, IngestionLedger, RemoteDirectory};
use crate::sync_job::SyncJob;

/// Poll step while shutdown waits for an in-flight run to clear.
const SHUTDOWN_POLL_STEP: Duration = Duration::from_millis(20);

/// The mutable flags shared between the loop task and the control context.
#[derive(Debug, Default)]
struct RunState {
    /// A job run is currently executing (set/cleared by the gated path).
    in_progress: bool,
    /// The background loop task is alive.
    loop_alive: bool,
}

pub struct Scheduler {
    config: Arc<RwLock<SchedulerConfig>>,
    job: Arc<SyncJob>,
    state: Arc<Mutex<RunState>>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        remote: Arc<dyn RemoteDirectory>,
        ledger: Arc<dyn IngestionLedger>,
    ) -> Self {
        let config = Arc::new(RwLock::new(config));
        let job = Arc::new(SyncJob::new(Arc::clone(&config), remote, ledger));
        Self {
            config,
            job,
            state: Arc::new(Mutex::new(RunState::default())),
            stop_tx: Mutex::new(None),
            loop_handle: Mutex::new(None),
        }
    }

    /// Shared config handle. Mutations take effect on the next tick; a run
    /// already using the previous values completes unaffected.
    pub fn config_handle(&self) -> Arc<RwLock<SchedulerConfig>> {
        Arc::clone(&self.config)
    }

    /// Launch the background loop. Idempotent: a second call while the loop
    /// is alive is a no-op.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().unwrap();
            if state.loop_alive {
                debug!("Scheduler already running, start ignored");
                return;
            }
            state.loop_alive = true;
        }

        // Fresh channel per start, so any previous stop signal is cleared.
        let (tx, rx) = watch::channel(false);
        *self.stop_tx.lock().unwrap() = Some(tx);

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.run_loop(rx).await;
        });
        *self.loop_handle.lock().unwrap() = Some(handle);
        info!("Scheduler started");
    }

    /// Signal the loop to stop, then wait, bounded by the configured
    /// shutdown timeout: first for the loop task to exit, then for any
    /// in-flight run to clear. An in-flight run is never killed; past the
    /// grace period it is simply no longer waited upon.
    pub async fn shutdown(&self) {
        let timeout = self.config.read().unwrap().shutdown_timeout();
        info!("Scheduler shutdown requested");

        if let Some(tx) = self.stop_tx.lock().unwrap().take() {
            let _ = tx.send(true);
        }

        let handle = self.loop_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(timeout, handle).await.is_err() {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Scheduler loop did not exit within the shutdown timeout"
                );
            }
        }

        let deadline = Instant::now() + timeout;
        while self.in_progress() {
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "A sync run is still in progress after the shutdown grace period"
                );
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL_STEP).await;
        }
        info!("Scheduler shutdown complete");
    }

    /// One synchronous pass through the gated execution path, for manual/CLI
    /// use outside the loop. No jitter; errors propagate to the caller.
    pub async fn run_once(&self) -> Result<bool, ClientError> {
        self.execute_gated(false).await
    }

    /// Manually invoke the gated execution path. Returns whether the job
    /// actually started (`false` means it was skipped by the overlap policy).
    ///
    /// `force = true` bypasses the overlap check entirely: the run starts
    /// even while another is mid-flight, and the two execute concurrently.
    /// Errors propagate to the caller.
    pub async fn trigger(&self, force: bool) -> Result<bool, ClientError> {
        self.execute_gated(force).await
    }

    /// Whether the background loop task is alive.
    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().loop_alive
    }

    /// Whether a job run is currently executing.
    pub fn in_progress(&self) -> bool {
        self.state.lock().unwrap().in_progress
    }

    async fn run_loop(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        info!("Scheduler loop running");
        loop {
            if *stop_rx.borrow() {
                break;
            }

            let tick_started = Instant::now();
            match self.execute_gated(false).await {
                Ok(true) => {}
                Ok(false) => {} // overlap skip, already logged
                Err(e) => {
                    // One failing tick never kills the loop.
                    error!(error = %e, "Scheduled sync run failed, continuing to next tick");
                }
            }

            let sleep_for = self.next_sleep(tick_started.elapsed());
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = stop_rx.changed() => {}
            }
        }
        self.state.lock().unwrap().loop_alive = false;
        info!("Scheduler loop stopped");
    }

    /// Next inter-tick sleep: `max(0, interval + jitter - elapsed)`.
    ///
    /// Interval and jitter are re-read from the shared config each tick, and
    /// jitter is resampled every tick whether or not the run was skipped.
    fn next_sleep(&self, elapsed: Duration) -> Duration {
        let (interval, jitter_bound) = {
            let config = self.config.read().unwrap();
            (config.interval(), config.jitter_bound())
        };
        let jitter = if jitter_bound.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_secs(rand::thread_rng().gen_range(0..=jitter_bound.as_secs()))
        };
        (interval + jitter).saturating_sub(elapsed)
    }

    /// The gated execution path shared by loop ticks, `run_once` and
    /// `trigger`: check/flip the in-progress flag under the lock, run the job
    /// with the lock released, clear the flag however the job call exits.
    async fn execute_gated(&self, force: bool) -> Result<bool, ClientError> {
        let allow_overlap = self.config.read().unwrap().allow_overlap;
        {
            let mut state = self.state.lock().unwrap();
            if state.in_progress && !allow_overlap && !force {
                warn!("Previous sync run still in progress, skipping");
                return Ok(false);
            }
            state.in_progress = true;
        }

        // Cleared on success, error, or cancellation of this future.
        let _guard = InProgressGuard {
            state: Arc::clone(&self.state),
        };

        let files = self.job.run().await?;
        info!(downloaded = files.len(), "Sync run complete");
        Ok(true)
    }
}

/// Clears `in_progress` on drop, so the flag resets no matter how the job
/// call exits.
struct InProgressGuard {
    state: Arc<Mutex<RunState>>,
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.state.lock().unwrap().in_progress = false;
    }
}
