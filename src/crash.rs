use std::time::{Duration, SystemTime};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::CRASH_EXIT_CODE;

/// A scheduled simulated crash. Dropping the handle leaves the timer running.
#[derive(Debug)]
pub struct CrashHandle {
    delay: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CrashHandle {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stops the timer. The crash callback is dropped without being called.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Draws a delay in `[0, max_delay_secs)` and calls `on_crash` once it elapses, without blocking the caller.
///
/// Returns `None` and never calls `on_crash` when `max_delay_secs` is 0. Must be called within a tokio runtime.
pub fn schedule<R, F>(max_delay_secs: u64, rng: &mut R, on_crash: F) -> Option<CrashHandle>
where
    R: Rng + ?Sized,
    F: FnOnce() + Send + 'static,
{
    if max_delay_secs == 0 {
        return None;
    }

    let delay = Duration::from_secs(rng.gen_range(0..max_delay_secs));
    info!("Crashing in [{}] seconds", delay.as_secs());

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => info!("Simulated crash cancelled"),
            _ = tokio::time::sleep(delay) => on_crash(),
        }
    });

    Some(CrashHandle {
        delay,
        cancel,
        task,
    })
}

/// Schedules termination of the whole process using a time-seeded generator.
pub fn schedule_process_crash(max_delay_secs: u64) -> Option<CrashHandle> {
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let mut rng = StdRng::seed_from_u64(seed);

    schedule(max_delay_secs, &mut rng, || {
        error!("Simulated crash: terminating process");
        std::process::exit(CRASH_EXIT_CODE);
    })
}
