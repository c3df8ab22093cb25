// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::settings::cli::Settings;
use crate::raise_error;
use chrono::Local;
use file::setup_file_logger;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

mod file;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Installs the global subscriber. The returned guard flushes the log file
/// when dropped and must live as long as the process.
pub fn initialize_logging(settings: &Settings) -> MailMoverResult<Option<WorkerGuard>> {
    if settings.mailmover_log_to_file {
        setup_file_logger(settings).map(Some)
    } else {
        setup_stdout_logger(settings).map(|_| None)
    }
}

fn setup_stdout_logger(settings: &Settings) -> MailMoverResult<()> {
    let level = parse_log_level(&settings.mailmover_log_level)?;

    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(true)
        .with_timer(LocalTimer);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(settings.mailmover_ansi_logs)
        .with_writer(std::io::stdout)
        .event_format(format)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(e.to_string(), ErrorCode::InternalError))
}

fn parse_log_level(value: &str) -> MailMoverResult<Level> {
    value.parse::<Level>().map_err(|_| {
        raise_error!(
            format!(
                "Invalid log level '{}'. Use one of: error, warn, info, debug, trace",
                value
            ),
            ErrorCode::InvalidParameter
        )
    })
}
