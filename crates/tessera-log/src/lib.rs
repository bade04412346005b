// Re-export logging macros and `LevelFilter` so crates only depend on this one.
pub use log::*;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

/// Directory the file appender writes into.
pub const LOG_DIRECTORY: &str = "./logs";

const CONSOLE_PATTERN: &str = "{h({l:<5})} {t} - {m}{n}";
const FILE_PATTERN: &str = "{d} {l:<5} {t} - {m}{n}";

/// Initializes logging to both the console and a timestamped file inside [`LOG_DIRECTORY`].
/// Should be called before any other logging functions. Messages below `filter` are discarded.
///
/// Panics are routed through the logger as well, so precondition violations inside the ECS end
/// up in the log file before the process unwinds.
///
/// # Panics
/// Panics if the log file can't be created or if a logger was already installed.
pub fn init(filter: LevelFilter) {
    let now = chrono::Local::now();
    let log_file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(format!(
            "{}/{}.txt",
            LOG_DIRECTORY,
            now.format("%Y-%m-%d %H-%M-%S")
        ))
        .expect("unable to initialize logging to file");

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(console())))
        .appender(Appender::builder().build("log_file", Box::new(log_file)))
        .build(
            Root::builder()
                .appender("log_file")
                .appender("stdout")
                .build(filter),
        )
        .expect("unable to create logging configuration");

    log4rs::init_config(config).expect("unable to initialize logging");
    log_panics::init();
}

/// Initializes console-only logging.
///
/// Unlike [`init`] this tolerates an already installed logger, which makes it usable from tests
/// and small tools that may initialize more than once.
pub fn init_console(filter: LevelFilter) {
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(console())))
        .build(Root::builder().appender("stdout").build(filter))
        .expect("unable to create logging configuration");

    if log4rs::init_config(config).is_ok() {
        log_panics::init();
    }
}

fn console() -> ConsoleAppender {
    ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build()
}
