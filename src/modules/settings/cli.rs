// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use clap::{builder::ValueParser, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(
    name = "mailmover",
    about = "Moves messages matching a query from one Gmail account into an archive account,
    leaving a labelled placeholder behind for every message moved.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// Path of the JSON configuration file
    #[clap(
        default_value = "mailmover.conf",
        env = "MAILMOVER_CONFIG",
        help = "Path of the JSON configuration file"
    )]
    pub config: PathBuf,

    /// mailmover log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for mailmover",
        value_parser = ValueParser::new(|s: &str| {
            if s.parse::<tracing::Level>().is_err() {
                return Err("Use one of: error, warn, info, debug, trace".to_string());
            }
            Ok(s.to_string())
        })
    )]
    pub mailmover_log_level: String,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub mailmover_ansi_logs: bool,

    /// Enable log file output (default: false)
    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub mailmover_log_to_file: bool,

    #[clap(
        long,
        default_value = "logs",
        env,
        help = "Directory that receives the rolling log files"
    )]
    pub mailmover_log_dir: PathBuf,

    /// Maximum number of log files (default: 5)
    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of log files kept on disk"
    )]
    pub mailmover_max_log_files: usize,

    #[clap(
        long,
        default_value = "false",
        help = "Report what would be migrated without changing either account"
    )]
    pub dry_run: bool,
}
