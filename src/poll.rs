//! Fixed-interval polling of the engine: readiness after setup and image
//! analysis after submission.

use std::thread;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tracing::debug;

use crate::engine::EngineApi;
use crate::error::AppError;

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status value reported once analysis has finished.
pub const ANALYZED: &str = "analyzed";

/// Source of elapsed time and the blocking sleep between attempts.
pub trait Clock {
    fn elapsed(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPhase {
    Health,
    System,
}

/// Receives progress notifications from the pollers.
pub trait PollObserver {
    fn engine_not_ready(&mut self, phase: ReadinessPhase, error: &AppError);
    fn status_changed(&mut self, status: &str);
    fn status_unchanged(&mut self, status: &str);
    fn analysis_complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Changed,
    Unchanged,
}

/// Remembers the last observed status so repeats can be told apart from transitions.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: Option<String>,
}

impl StatusTracker {
    pub fn observe(&mut self, status: &str) -> StatusChange {
        if self.last.as_deref() == Some(status) {
            StatusChange::Unchanged
        } else {
            self.last = Some(status.to_string());
            StatusChange::Changed
        }
    }
}

pub struct Poller<C: Clock> {
    clock: C,
    interval: Duration,
    timeout: Duration,
}

impl<C: Clock> Poller<C> {
    /// The timeout budget is measured from each wait call's first attempt.
    pub fn new(clock: C, interval: Duration, timeout: Duration) -> Self {
        Self { clock, interval, timeout }
    }

    /// Block until the health endpoint and then the authenticated system
    /// endpoint both answer. Both phases draw on one shared budget.
    pub fn wait_engine_ready<E>(
        &self,
        engine: &E,
        observer: &mut dyn PollObserver,
    ) -> Result<(), AppError>
    where
        E: EngineApi + ?Sized,
    {
        let start = self.clock.elapsed();
        for phase in [ReadinessPhase::Health, ReadinessPhase::System] {
            loop {
                let attempt = match phase {
                    ReadinessPhase::Health => engine.check_health(),
                    ReadinessPhase::System => engine.check_system(),
                };
                match attempt {
                    Ok(()) => break,
                    Err(err) => {
                        debug!(?phase, error = %err, "Engine probe failed");
                        observer.engine_not_ready(phase, &err);
                    }
                }
                self.clock.sleep(self.interval);
                if self.clock.elapsed() - start >= self.timeout {
                    return Err(self.timeout_error("the engine to become available"));
                }
            }
        }
        Ok(())
    }

    /// Block until the image's analysis status reaches [`ANALYZED`].
    /// Errors fetching the status are not retried.
    pub fn wait_image_analyzed<E>(
        &self,
        engine: &E,
        digest: &str,
        observer: &mut dyn PollObserver,
    ) -> Result<(), AppError>
    where
        E: EngineApi + ?Sized,
    {
        let start = self.clock.elapsed();
        let mut tracker = StatusTracker::default();
        loop {
            if self.clock.elapsed() - start >= self.timeout {
                return Err(self.timeout_error("image analysis"));
            }
            let status = engine.image_status(digest)?;
            if status == ANALYZED {
                observer.analysis_complete();
                return Ok(());
            }
            match tracker.observe(&status) {
                StatusChange::Changed => observer.status_changed(&status),
                StatusChange::Unchanged => observer.status_unchanged(&status),
            }
            self.clock.sleep(self.interval);
        }
    }

    fn timeout_error(&self, waiting_for: &'static str) -> AppError {
        AppError::Timeout { waiting_for, secs: self.timeout.as_secs() }
    }
}

/// Prints poll progress to the terminal. Repeated statuses advance a spinner
/// instead of printing another line.
pub struct ConsoleObserver {
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self { spinner: None }
    }

    fn spinner(&mut self) -> &ProgressBar {
        self.spinner.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_message("waiting");
            bar
        })
    }

    fn print_line(&self, line: &str) {
        match &self.spinner {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        ConsoleObserver::new()
    }
}

impl PollObserver for ConsoleObserver {
    fn engine_not_ready(&mut self, _phase: ReadinessPhase, _error: &AppError) {
        println!("Anchore engine not up yet...");
    }

    fn status_changed(&mut self, status: &str) {
        self.print_line(&format!("Analysis status: {status}"));
    }

    fn status_unchanged(&mut self, status: &str) {
        let spinner = self.spinner();
        spinner.set_message(status.to_string());
        spinner.tick();
    }

    fn analysis_complete(&mut self) {
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
        println!("Analysis successful");
    }
}
