use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::services::TimeOffService;

const DAILY: Duration = Duration::from_secs(24 * 60 * 60);

/// Reminders go out at a fixed hour of day, not 24h from process start.
const REMINDER_HOUR: u32 = 1;

/// Three independent background jobs sharing the interactive path's data
/// store: annual balance reset, stale-request purge, and daily approver
/// reminders.
///
/// Each job is its own tokio task on a fixed-period timer. A tick's payload
/// must finish before the next tick is armed, so runs never overlap. Payload
/// errors are logged and the timer keeps going.
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(service: Arc<TimeOffService>) -> Self {
        let handles = vec![
            tokio::spawn(run_annual_reset(service.clone())),
            tokio::spawn(run_stale_purge(service.clone())),
            tokio::spawn(run_daily_reminders(service)),
        ];
        log::info!("Scheduler started with {} jobs", handles.len());
        Self { handles }
    }

    /// Best-effort shutdown: stops all timers without draining in-flight
    /// runs.
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        log::info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_annual_reset(service: Arc<TimeOffService>) {
    let mut timer = interval(DAILY);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer.tick().await; // the first tick completes immediately

    loop {
        timer.tick().await;
        let today = Utc::now().date_naive();
        match service.reset_balances_for_new_year(today).await {
            Ok(0) => {}
            Ok(reset) => log::info!("Annual reset: restored balances for {} employees", reset),
            Err(err) => log::error!("Annual balance reset failed: {}", err),
        }
    }
}

async fn run_stale_purge(service: Arc<TimeOffService>) {
    let mut timer = interval(DAILY);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer.tick().await;

    loop {
        timer.tick().await;
        match service.purge_stale_requests(Utc::now()).await {
            Ok(0) => {}
            Ok(purged) => log::info!("Purged {} stale time-off requests", purged),
            Err(err) => log::error!("Stale request purge failed: {}", err),
        }
    }
}

async fn run_daily_reminders(service: Arc<TimeOffService>) {
    tokio::time::sleep(delay_until_hour(Utc::now(), REMINDER_HOUR)).await;

    // The first interval tick completes immediately, so the first run lands
    // on the aligned hour and the rest follow every 24h.
    let mut timer = interval(DAILY);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;
        match service.send_daily_reminders().await {
            Ok(sent) => log::debug!("Sent {} approver reminders", sent),
            Err(err) => log::error!("Daily reminder run failed: {}", err),
        }
    }
}

/// Time left until the next occurrence of `hour:00:00` UTC.
fn delay_until_hour(now: DateTime<Utc>, hour: u32) -> Duration {
    let mut target = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap_or(now.naive_utc())
        .and_utc();
    if target <= now {
        target += chrono::Duration::days(1);
    }
    (target - now).to_std().unwrap_or(Duration::ZERO)
}
