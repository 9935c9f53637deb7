use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";
const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// Initialise log4rs from a YAML file, falling back to a plain console
/// logger at `info` when the file is missing or unusable.
pub fn init(path: impl AsRef<Path>) {
    let path = path.as_ref();
    if path.exists() {
        match log4rs::init_file(path, Default::default()) {
            Ok(()) => return,
            Err(e) => eprintln!("Invalid log config {}: {}, using console", path.display(), e),
        }
    }
    init_console(LevelFilter::Info);
}

pub fn init_console(level: LevelFilter) {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level));

    match config {
        Ok(config) => {
            // Fails only if a logger is already installed
            let _ = log4rs::init_config(config);
        }
        Err(e) => eprintln!("Failed to build console logger: {}", e),
    }
}
