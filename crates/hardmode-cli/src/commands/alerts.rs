use hardmode_core::alerts::AlertScheduler;

use super::{load_engine_config, open_database, parse_at, CommandResult, StdoutSink};

pub fn run(at: Option<&str>, deadline: bool) -> CommandResult {
    let db = open_database()?;
    let now = parse_at(at)?;
    let scheduler = AlertScheduler::from_config(&load_engine_config());

    let report = scheduler.run_tick(&db, &StdoutSink, now);
    println!(
        "checked {} user(s): {} reminder(s) sent, {} error(s)",
        report.users_checked,
        report.sent.len(),
        report.errors,
    );

    if deadline {
        let report = scheduler.run_deadline_tick(&db, &StdoutSink, now);
        println!(
            "deadline check: {} warning(s) sent, {} error(s)",
            report.sent.len(),
            report.errors,
        );
    }
    Ok(())
}
