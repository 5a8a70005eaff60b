use std::sync::{Arc, OnceLock};

/// Receives the log output of `TagKit` in the host app.
///
/// The responder logs every command APDU it answers at debug level, which
/// makes the host app's logger the place to look when a reader refuses the tag.
///
/// # Examples
///
/// ```rust
/// use tagkit_core::logger::{LogLevel, Logger};
///
/// struct StdoutLogger;
///
/// impl Logger for StdoutLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// object TagKitLogger : Logger {
///     override fun log(level: LogLevel, message: String) {
///         when (level) {
///             LogLevel.ERROR -> Log.e("TagKit", message)
///             LogLevel.WARN -> Log.w("TagKit", message)
///             LogLevel.INFO -> Log.i("TagKit", message)
///             else -> Log.d("TagKit", message)
///         }
///     }
/// }
///
/// // Application.onCreate(), once per process
/// setLogger(TagKitLogger)
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed messages
    Trace,
    /// Every command APDU and state change
    Debug,
    /// Activations
    Info,
    /// Potentially harmful situations
    Warn,
    /// Failures
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// `log::Log` implementation forwarding records to the foreign [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        is_forwarded(metadata.target(), metadata.level())
    }

    fn log(&self, record: &log::Record) {
        let module = record.module_path().unwrap_or_else(|| record.target());
        if !is_forwarded(module, record.level()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), record.args().to_string());
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace output of other crates is dropped.
fn is_forwarded(module: &str, level: log::Level) -> bool {
    level <= log::Level::Info || module.starts_with("tagkit")
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the host app's logger.
///
/// Only the first call has an effect, later calls are reported on stderr and
/// otherwise ignored.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
