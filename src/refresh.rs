//! Periodic train position refresh.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::api::{Api, Transport};
use crate::map::{MapPresenter, MapSurface};
use crate::state::StateView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A train is being inspected; nothing was fetched.
    Paused,
    Refreshed(usize),
    Failed,
}

/// Repeating refresh schedule, disabled while a train is being inspected.
///
/// Missed ticks are not caught up: when inspection ends the interval restarts
/// from that moment.
pub struct RefreshController {
    view: StateView,
    interval: Interval,
    period: Duration,
    /// Set once an inspection has been observed; the interval restarts when it ends.
    paused: bool,
}

impl RefreshController {
    pub fn new(period: Duration, view: StateView) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { view, interval, period, paused: false }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    pub fn is_enabled(&self) -> bool {
        !self.view.is_inspecting()
    }

    /// Resolves when the next refresh is due. Cancel-safe, so it can sit in a
    /// `select!` loop.
    pub async fn next_due(&mut self) {
        loop {
            if self.view.is_inspecting() {
                self.paused = true;
                self.view.wait_idle().await;
                continue;
            }
            if self.paused {
                self.paused = false;
                self.interval.reset();
            }

            tokio::select! {
                _ = self.interval.tick() => {
                    if self.is_enabled() {
                        return;
                    }
                }
                () = self.view.wait_inspecting() => {}
            }
        }
    }

    /// Run one refresh: skip while inspecting, otherwise fetch positions and
    /// redraw the train markers.
    pub async fn tick<T: Transport, S: MapSurface>(
        &mut self, api: &Api<T>, presenter: &mut MapPresenter<S>,
    ) -> TickOutcome {
        if self.view.is_inspecting() {
            log::debug!("Inspecting a train, skipping refresh");
            return TickOutcome::Paused;
        }

        match presenter.render_train_markers(api).await {
            Ok(count) => {
                log::debug!("Refreshed {count} trains");
                TickOutcome::Refreshed(count)
            }
            Err(e) => {
                log::error!("Error adding train markers: {e}");
                TickOutcome::Failed
            }
        }
    }
}
