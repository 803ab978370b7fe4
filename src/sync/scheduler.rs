//! Periodic push timer.
//!
//! A tokio task ticks every `sync_interval_ms` and pushes. The task holds a
//! weak reference so it never keeps the engine alive, and awaits each push
//! before the next tick, so it never overlaps with itself.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::SyncError;

use super::engine::SyncEngine;
use super::push::PushOutcome;
use super::state::{SettingsUpdate, SyncConfig, MIN_SYNC_INTERVAL_MS};

impl SyncEngine {
    /// (Re)start the periodic push timer according to the current config.
    ///
    /// Any running timer is cancelled first. Returns whether a timer is now
    /// armed: it is not when sync or auto-sync is off, or when the interval
    /// is below the 5 second floor.
    pub async fn arm_timer(self: &Arc<Self>) -> bool {
        self.disarm_timer();

        let config = self.config().await;
        if !config.wants_auto_sync() {
            log::debug!("Auto sync disabled, timer not armed");
            return false;
        }

        if config.sync_interval_ms < MIN_SYNC_INTERVAL_MS {
            log::warn!(
                "Sync interval {}ms is below the {}ms minimum, timer not armed",
                config.sync_interval_ms,
                MIN_SYNC_INTERVAL_MS
            );
            return false;
        }

        let period = Duration::from_millis(config.sync_interval_ms);
        let engine = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            Self::timer_loop(engine, period).await;
        });

        let mut slot = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            // a concurrent arm_timer won the race; keep only one timer
            previous.abort();
        }

        log::info!("Auto sync timer armed (every {}ms)", config.sync_interval_ms);
        true
    }

    /// Cancel the periodic timer. Safe to call when none is running.
    pub fn disarm_timer(&self) {
        let mut slot = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
            log::info!("Auto sync timer disarmed");
        }
    }

    /// Whether the periodic timer is running.
    pub fn is_timer_armed(&self) -> bool {
        let slot = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Apply user settings, persist them and re-arm the timer.
    pub async fn update_settings(
        self: &Arc<Self>,
        update: SettingsUpdate,
    ) -> Result<SyncConfig, SyncError> {
        let config = self.commit(|config| {
            if config.apply(&update) {
                log::info!("Sync settings updated");
            }
        })
        .await?;

        self.arm_timer().await;
        Ok(config)
    }

    async fn timer_loop(engine: Weak<SyncEngine>, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let Some(engine) = engine.upgrade() else {
                log::debug!("Sync engine dropped, timer exiting");
                break;
            };

            log::debug!("Auto sync tick");
            match engine.save_for_sync_if_enabled().await {
                Ok(PushOutcome::Pushed(metadata)) => {
                    log::info!("Auto sync pushed at {}", metadata.modified_at);
                }
                Ok(outcome) => log::debug!("Auto sync tick finished: {:?}", outcome),
                // already reported to the user by push
                Err(e) => log::debug!("Auto sync tick failed: {}", e),
            }
        }
    }
}
