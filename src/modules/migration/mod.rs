// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::MailMoverResult;
use crate::modules::store::MailStore;
use controller::MigrationController;
use state::Summary;
use std::time::Duration;
use tracing::warn;

pub mod controller;
pub mod labels;
pub mod state;

pub const ALL_MAIL_MAILBOX: &str = "[Gmail]/All Mail";
pub const TRASH_MAILBOX: &str = "[Gmail]/Trash";
/// Label attached to every placeholder left in the source account.
pub const MARKER_LABEL: &str = "Mailmover/Automated Archival";
pub const DEFAULT_LOGOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// What one run migrates and how.
#[derive(Clone, Debug)]
pub struct MigrationPolicy {
    /// Gmail search expression selecting the messages to move.
    pub query: String,
    /// Upper bound on the number of matched messages processed.
    pub max_messages: usize,
    pub dry_run: bool,
    /// Skip messages without a Subject header.
    pub require_subject: bool,
    /// Mailbox holding every message. Looked up by special-use when unset.
    pub all_mail_mailbox: Option<String>,
    /// Mailbox deleted messages pass through. Looked up by special-use when unset.
    pub trash_mailbox: Option<String>,
    /// Name and version written into each placeholder.
    pub program_identity: String,
}

/// Runs the migration and logs both accounts out whatever the outcome.
pub async fn execute<S: MailStore, A: MailStore>(
    source: &mut S,
    archive: &mut A,
    policy: &MigrationPolicy,
    logout_timeout: Duration,
) -> MailMoverResult<Summary> {
    let result = MigrationController::new(policy).run(source, archive).await;
    logout(source, logout_timeout).await;
    logout(archive, logout_timeout).await;
    result
}

pub async fn logout<S: MailStore>(store: &mut S, timeout: Duration) {
    if let Err(e) = store.logout(timeout).await {
        warn!("Logout of '{}' failed: {}", store.identity(), e);
    }
}
