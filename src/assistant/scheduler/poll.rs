use crate::assistant::controller::orders::{Reconciler, Refresh};
use crate::assistant::gateway::transport::Transport;
use crate::assistant::state::ViewState;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio::{pin, select};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    Refreshed,
    /// the previous tick has not resolved yet
    SkippedInFlight,
    SkippedMutation,
}

/// Silent background refresh of whatever view the reconciler is on.
///
/// One tick at a time: a tick is skipped while the previous one is unresolved or while
/// a mutation is waiting on the backend, since that mutation re-fetches on its own.
pub(crate) struct PollScheduler<'a, T: Transport> {
    reconciler: &'a Reconciler<T>,
    period: Duration,
    in_flight: AtomicBool,
}

struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<'a, T: Transport> PollScheduler<'a, T> {
    pub fn new(reconciler: &'a Reconciler<T>, period: Duration) -> Self {
        Self {
            reconciler,
            period,
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn tick(&self) -> Tick {
        if self.reconciler.mutations_in_flight() > 0 {
            debug!("mutation in flight, skipping poll tick");
            return Tick::SkippedMutation;
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("previous poll still unresolved, skipping tick");
            return Tick::SkippedInFlight;
        }
        let _guard = TickGuard(&self.in_flight);
        // silent refreshes report through the degraded flag only
        let _ = self.reconciler.refresh(Refresh::Silent).await;
        Tick::Refreshed
    }

    /// poll until cancelled, `on_tick` sees the state after every refresh
    pub async fn run<F>(&self, cancel_token: CancellationToken, mut on_tick: F)
    where
        F: FnMut(&ViewState),
    {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("polling every {}s", self.period.as_secs());
        loop {
            select! {
                _ = interval.tick() => {},
                _ = cancel_token.cancelled() => {
                    info!("received cancel signal, returning gracefully");
                    return;
                }
            }

            let tick = self.tick();
            pin!(tick);
            let outcome = select! {
                outcome = &mut tick => outcome,
                _ = cancel_token.cancelled() => {
                    info!("received cancel signal mid-poll, returning gracefully");
                    return;
                }
            };
            if outcome == Tick::Refreshed {
                on_tick(&self.reconciler.snapshot().await);
            }
        }
    }
}
