//! Progress reporting for running downloads.
//!
//! The retrieval tool reports raw percentages, possibly repeating or going
//! backwards when a playlist moves on to its next item. [`ProgressGate`]
//! forwards those as [`ProgressEvent::Progress`] and owns the single
//! [`ProgressEvent::Finished`], which it emits only when told the job
//! succeeded.

use std::time::Instant;

/// Event delivered to a progress callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Completion of the current item, 0-100
    Progress {
        /// Percentage complete
        percent_complete: f64,
    },
    /// The job finished successfully
    Finished,
}

/// Forwards progress to a callback and guarantees `Finished` at most once.
pub struct ProgressGate<'a> {
    callback: &'a mut (dyn FnMut(ProgressEvent) + Send),
    updates: u64,
    last_percent: Option<f64>,
    finished: bool,
    started: Instant,
}

impl<'a> ProgressGate<'a> {
    /// Wrap `callback`.
    pub fn new(callback: &'a mut (dyn FnMut(ProgressEvent) + Send)) -> Self {
        Self {
            callback,
            updates: 0,
            last_percent: None,
            finished: false,
            started: Instant::now(),
        }
    }

    /// Forward a percentage. Ignored once finished.
    pub fn progress(&mut self, percent_complete: f64) {
        if self.finished || !percent_complete.is_finite() {
            return;
        }
        let percent_complete = percent_complete.clamp(0.0, 100.0);
        self.updates += 1;
        self.last_percent = Some(percent_complete);
        (self.callback)(ProgressEvent::Progress { percent_complete });
    }

    /// Emit `Finished`. Subsequent calls do nothing.
    pub fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            (self.callback)(ProgressEvent::Finished);
        }
    }

    /// Number of progress updates forwarded.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Last percentage forwarded.
    pub fn last_percent(&self) -> Option<f64> {
        self.last_percent
    }

    /// Whether `Finished` was emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} progress updates", self.updates)];
        if let Some(pct) = self.last_percent {
            parts.push(format!("last at {pct:.1}%"));
        }
        parts.push(format!("in {}", format_elapsed(self.started.elapsed().as_secs())));
        parts.join(", ")
    }
}

fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
