use chrono::{Timelike, Utc};
use hardmode_core::alerts::AlertScheduler;
use hardmode_core::lifecycle::RolloverScheduler;

use super::{load_engine_config, open_database, CommandResult, StdoutSink};

/// Run both schedulers at the top of every hour, forever. Window tolerance
/// and the per-user timezone checks live in the schedulers; the daemon only
/// supplies the clock.
pub fn run() -> CommandResult {
    let db = open_database()?;
    let config = load_engine_config();
    let rollover = RolloverScheduler::from_config(&config);
    let alerts = AlertScheduler::from_config(&config);
    let runtime = tokio::runtime::Runtime::new()?;

    tracing::info!("daemon started, ticking hourly");
    loop {
        let now = Utc::now();

        let report = rollover.run_tick(&db, &StdoutSink, now);
        tracing::info!(
            checked = report.users_checked,
            advanced = report.advanced.len(),
            reset = report.reset.len(),
            errors = report.errors,
            "rollover tick"
        );

        let report = alerts.run_tick(&db, &StdoutSink, now);
        tracing::info!(sent = report.sent.len(), errors = report.errors, "alert tick");

        let report = alerts.run_deadline_tick(&db, &StdoutSink, now);
        tracing::info!(
            sent = report.sent.len(),
            errors = report.errors,
            "deadline tick"
        );

        runtime.block_on(tokio::time::sleep(until_next_hour()));
    }
}

fn until_next_hour() -> std::time::Duration {
    let now = Utc::now();
    let elapsed = u64::from(now.minute()) * 60 + u64::from(now.second());
    std::time::Duration::from_secs(3600 - elapsed.min(3599))
}
