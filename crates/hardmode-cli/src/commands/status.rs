use hardmode_core::logger::TaskLogger;
use hardmode_core::report;

use super::{load_engine_config, open_database, CommandResult};
use crate::commands::log::load_user;

pub fn run(handle: &str) -> CommandResult {
    let db = open_database()?;
    let (user, program) = load_user(&db, handle)?;
    let log = TaskLogger::new(&db).open_log(&user)?;
    println!(
        "{}",
        report::format_status(&user, &program, &log, load_engine_config().challenge_days)
    );
    Ok(())
}
