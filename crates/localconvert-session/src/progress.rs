// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress ticker — a periodic timer task owned by an RAII guard.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use localconvert_core::config::TickerConfig;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

/// Calls a closure every `interval` until dropped.
///
/// The first call happens one full interval after spawning. Dropping the
/// guard aborts the timer task, so no tick can land after the owner has
/// finished, whichever way it finished.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: JoinHandle<()>,
    live: Arc<AtomicUsize>,
}

impl ProgressTicker {
    /// Spawn the timer task on the current Tokio runtime.
    ///
    /// `live` counts tickers that have not been dropped yet.
    pub fn spawn<F>(config: TickerConfig, live: Arc<AtomicUsize>, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = config.interval();
        live.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                on_tick();
            }
        });
        debug!(interval_ms = config.interval_ms, "Progress ticker started");
        Self { handle, live }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The ticker of the current job generation, if there is one.
///
/// Starting a newer job or resetting drops the old ticker right away rather
/// than when its job's work returns.
#[derive(Debug, Default)]
pub struct TickerSlot {
    current: Mutex<Option<(u64, ProgressTicker)>>,
}

impl TickerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<(u64, ProgressTicker)>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold `ticker` for `generation`, dropping the one it replaces. A ticker
    /// for an older generation than the one held is dropped instead.
    pub fn install(&self, generation: u64, ticker: ProgressTicker) {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|(held, _)| *held > generation) {
            return;
        }
        *current = Some((generation, ticker));
    }

    /// Drop the held ticker if it belongs to `generation`.
    pub fn release(&self, generation: u64) {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|(held, _)| *held == generation) {
            *current = None;
        }
    }

    /// Drop whatever ticker is held.
    pub fn clear(&self) {
        self.lock().take();
    }
}

/// Advance `progress` by `step`, never past `ceiling` and never backwards.
pub fn advance(progress: u8, step: u8, ceiling: u8) -> u8 {
    if progress >= ceiling {
        progress
    } else {
        progress.saturating_add(step).min(ceiling)
    }
}
