//! Simulated load with a console progress bar
//!
//! The mock steps stand in for slow work (model calls, database queries).
//! [`Pacer::simulate_load`] sleeps for a scaled duration while drawing a
//! 30-tick `indicatif` bar, then pauses briefly. It never touches state or
//! control flow, and a zero scale turns it into a no-op for tests and
//! `--fast` runs.

use crate::config::PacingConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Ticks drawn per simulated load
pub const TICKS: u64 = 30;

/// Pause after the bar completes, in unscaled seconds
const SETTLE_SECONDS: f64 = 0.5;

/// Paces the mock steps
#[derive(Debug, Clone, PartialEq)]
pub struct Pacer {
    delay_scale: f64,
    enabled: bool,
}

impl Pacer {
    /// Pacer multiplying every simulated duration by `delay_scale`
    pub fn new(delay_scale: f64) -> Self {
        Self {
            delay_scale,
            enabled: true,
        }
    }

    /// Pacer that returns immediately and draws nothing
    pub fn disabled() -> Self {
        Self {
            delay_scale: 0.0,
            enabled: false,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        if config.enabled {
            Self::new(config.delay_scale)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && self.delay_scale > 0.0
    }

    /// Wall-clock duration for `seconds` of simulated work
    pub fn scaled(&self, seconds: f64) -> Duration {
        let scaled = seconds * self.delay_scale;
        if self.enabled && scaled.is_finite() && scaled > 0.0 {
            Duration::from_secs_f64(scaled)
        } else {
            Duration::ZERO
        }
    }

    /// Sleep for `seconds` (scaled) while showing a progress bar labelled `label`
    pub async fn simulate_load(&self, seconds: f64, label: &str) {
        if !self.is_enabled() {
            return;
        }

        let total = self.scaled(seconds);
        let tick = total / TICKS as u32;

        let bar = ProgressBar::new(TICKS);
        let style = ProgressStyle::with_template("{msg:>36} [{bar:30.cyan}] {percent:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█ ");
        bar.set_style(style);
        bar.set_message(label.to_string());

        for _ in 0..TICKS {
            tokio::time::sleep(tick).await;
            bar.inc(1);
        }
        bar.finish_with_message(format!("{} - done!", label));
        tracing::trace!(label, elapsed_ms = total.as_millis() as u64, "Simulated load finished");

        tokio::time::sleep(self.scaled(SETTLE_SECONDS)).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(1.0)
    }
}
