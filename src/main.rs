use clap::Parser;
use mimalloc::MiMalloc;
use modules::{
    error::MailMoverResult,
    imap::store::ImapStore,
    logger,
    migration::{self, state::Summary},
    settings::{cli::Settings, config::MigrationConfig},
    utils::tls::install_crypto_provider,
};
use std::process::ExitCode;
use tracing::{info, warn};

mod modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = Settings::parse();
    let _log_guard = match logger::initialize_logging(&settings) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::from(error.exit_code());
        }
    };

    info!("Starting mailmover");
    info!("Version:  {}", mailmover_version!());
    info!("Git:      [{}]", env!("GIT_HASH"));

    match run(&settings).await {
        Ok(summary) => {
            info!("Summary: {}", summary);
            ExitCode::SUCCESS
        }
        Err(error) => {
            error.report();
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(settings: &Settings) -> MailMoverResult<Summary> {
    let config = MigrationConfig::load(&settings.config)?;
    let policy = config.to_policy(
        settings.dry_run,
        format!("mailmover {} ({})", mailmover_version!(), env!("GIT_HASH")),
    );
    if policy.max_messages == 0 {
        warn!("'max' is 0 or unset, no message will be processed");
    }
    if policy.dry_run {
        info!("Dry run: neither account will be modified");
    }

    install_crypto_provider()?;

    let mut source = ImapStore::connect(&config.accounts.main).await?;
    let mut archive = match ImapStore::connect(&config.accounts.archive).await {
        Ok(archive) => archive,
        Err(error) => {
            migration::logout(&mut source, config.logout_timeout()).await;
            return Err(error);
        }
    };

    migration::execute(&mut source, &mut archive, &policy, config.logout_timeout()).await
}
