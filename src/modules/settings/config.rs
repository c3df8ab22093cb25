// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::AccountPair;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::migration::{MigrationPolicy, DEFAULT_LOGOUT_TIMEOUT};
use crate::raise_error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Contents of the JSON configuration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub accounts: AccountPair,
    /// Gmail search expression, e.g. `older_than:2y`.
    pub query: String,
    /// Cap on the number of matched messages processed in one run.
    #[serde(default)]
    pub max: usize,
    #[serde(default, rename = "dryrun")]
    pub dry_run: bool,
    #[serde(default = "default_require_subject")]
    pub require_subject: bool,
    #[serde(default)]
    pub all_mail_mailbox: Option<String>,
    #[serde(default)]
    pub trash_mailbox: Option<String>,
    #[serde(default = "default_logout_timeout_secs")]
    pub logout_timeout_secs: u64,
}

fn default_require_subject() -> bool {
    true
}

fn default_logout_timeout_secs() -> u64 {
    DEFAULT_LOGOUT_TIMEOUT.as_secs()
}

impl MigrationConfig {
    pub fn load(path: &Path) -> MailMoverResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            raise_error!(
                format!("Cannot read configuration file {}: {}", path.display(), e),
                ErrorCode::MissingConfiguration
            )
        })?;
        let config: MigrationConfig = serde_json::from_str(&content).map_err(|e| {
            raise_error!(
                format!("Malformed configuration file {}: {}", path.display(), e),
                ErrorCode::ConfigFileParseError
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MailMoverResult<()> {
        self.accounts.validate()?;
        if self.query.trim().is_empty() {
            return Err(raise_error!(
                "The configuration must contain a non-empty 'query'".into(),
                ErrorCode::InvalidParameter
            ));
        }
        Ok(())
    }

    pub fn logout_timeout(&self) -> Duration {
        Duration::from_secs(self.logout_timeout_secs)
    }

    /// Builds the run policy. A dry run requested on the command line wins
    /// over the file.
    pub fn to_policy(&self, force_dry_run: bool, program_identity: String) -> MigrationPolicy {
        MigrationPolicy {
            query: self.query.trim().to_string(),
            max_messages: self.max,
            dry_run: self.dry_run || force_dry_run,
            require_subject: self.require_subject,
            all_mail_mailbox: self.all_mail_mailbox.clone(),
            trash_mailbox: self.trash_mailbox.clone(),
            program_identity,
        }
    }
}
