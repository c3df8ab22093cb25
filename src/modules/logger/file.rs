// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::logger::{parse_log_level, LocalTimer};
use crate::modules::settings::cli::Settings;
use crate::raise_error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub fn setup_file_logger(settings: &Settings) -> MailMoverResult<WorkerGuard> {
    let level = parse_log_level(&settings.mailmover_log_level)?;
    let (writer, guard) = run_log_writer(settings)?;

    let layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(settings.mailmover_ansi_logs)
        .with_level(true)
        .with_writer(writer)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| raise_error!(e.to_string(), ErrorCode::InternalError))?;
    Ok(guard)
}

fn run_log_writer(settings: &Settings) -> MailMoverResult<(NonBlocking, WorkerGuard)> {
    let rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("mailmover")
        .filename_suffix("log")
        .max_log_files(settings.mailmover_max_log_files)
        .build(&settings.mailmover_log_dir)
        .map_err(|e| {
            raise_error!(
                format!(
                    "Failed to open log directory {}: {}",
                    settings.mailmover_log_dir.display(),
                    e
                ),
                ErrorCode::InvalidParameter
            )
        })?;
    Ok(tracing_appender::non_blocking(rolling))
}
