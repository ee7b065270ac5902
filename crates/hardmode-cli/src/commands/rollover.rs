use hardmode_core::lifecycle::RolloverScheduler;

use super::{load_engine_config, open_database, parse_at, CommandResult, StdoutSink};

pub fn run(at: Option<&str>) -> CommandResult {
    let db = open_database()?;
    let now = parse_at(at)?;
    let scheduler = RolloverScheduler::from_config(&load_engine_config());
    let report = scheduler.run_tick(&db, &StdoutSink, now);
    println!(
        "checked {} user(s): {} advanced, {} reset, {} finished, {} error(s)",
        report.users_checked,
        report.advanced.len(),
        report.reset.len(),
        report.finished.len(),
        report.errors,
    );
    Ok(())
}
