use chrono::Local;
use colored::*;
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Maps the configured verbosity (0..=3) to a log level.
pub fn level_for(log_level: u8) -> LevelFilter {
    match log_level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger. `RUST_LOG`, when set, takes precedence over `log_level`.
pub fn init_logger(log_level: u8, verbose: bool) {
    let level = if verbose {
        level_for(log_level.max(2))
    } else {
        level_for(log_level)
    };

    let _ = Builder::from_env(Env::default().default_filter_or(level.to_string()))
        .format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            let level = match record.level() {
                log::Level::Error => record.level().to_string().red(),
                log::Level::Warn => record.level().to_string().yellow(),
                log::Level::Info => record.level().to_string().green(),
                log::Level::Debug => record.level().to_string().blue(),
                log::Level::Trace => record.level().to_string().white(),
            };
            writeln!(buf, "[{}] [{}] {}", timestamp, level, record.args())
        })
        .try_init();
}

/// Command line as it may appear in logs: PASS arguments are masked.
pub fn redact_command(verb: &str, arg: &str) -> String {
    if verb.eq_ignore_ascii_case("PASS") {
        "PASS ***".to_string()
    } else if arg.is_empty() {
        verb.to_string()
    } else {
        format!("{} {}", verb, arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(3), LevelFilter::Trace);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn test_redact_command() {
        assert_eq!(redact_command("PASS", "esoj"), "PASS ***");
        assert_eq!(redact_command("pass", ""), "PASS ***");
        assert_eq!(redact_command("USER", "jose"), "USER jose");
        assert_eq!(redact_command("PWD", ""), "PWD");
    }
}
