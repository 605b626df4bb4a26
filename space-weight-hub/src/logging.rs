use flexi_logger::{DeferredNow, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Record};

pub fn line_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {:<5} [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.module_path().unwrap_or("<unnamed>"),
        &record.args()
    )
}

/// Log to stderr, or to `<dir>/space-weight-hub.log` (duplicating info and
/// above to stdout) when a directory is given. `RUST_LOG` overrides `info`.
///
/// The handle must be kept alive for as long as the process logs.
pub fn init(log_dir: Option<&std::path::Path>) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str("info")?.format(line_format);

    match log_dir {
        Some(dir) => logger
            .log_to_file(
                FileSpec::default()
                    .directory(dir)
                    .basename("space-weight-hub")
                    .suppress_timestamp(),
            )
            .duplicate_to_stdout(Duplicate::Info)
            .append()
            .start(),
        None => logger.start(),
    }
}
