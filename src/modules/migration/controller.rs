// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::imap::decoder::try_decode_string;
use crate::modules::message::classify::{classify, Classification};
use crate::modules::message::placeholder::{PlaceholderComposer, PlaceholderRequest};
use crate::modules::message::{CandidateMessage, FetchScope};
use crate::modules::migration::labels::LabelCache;
use crate::modules::migration::state::{RunState, Summary};
use crate::modules::migration::{MigrationPolicy, ALL_MAIL_MAILBOX, MARKER_LABEL, TRASH_MAILBOX};
use crate::modules::store::{MailStore, SpecialUse, StoreQuery};
use crate::modules::utils::{domain_part, generate_message_id};
use crate::raise_error;
use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info, warn};

/// Mailboxes of one account the pipeline moves messages between.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MailboxLayout {
    pub all_mail: String,
    pub trash: String,
}

/// Resolves the "all messages" and trash mailboxes of an account. Names set
/// in the policy win, then special-use attributes, then Gmail's defaults.
pub async fn resolve_layout<S: MailStore>(
    store: &mut S,
    policy: &MigrationPolicy,
) -> MailMoverResult<MailboxLayout> {
    if let (Some(all_mail), Some(trash)) = (&policy.all_mail_mailbox, &policy.trash_mailbox) {
        return Ok(MailboxLayout {
            all_mail: all_mail.clone(),
            trash: trash.clone(),
        });
    }

    let mailboxes = store.list_mailboxes().await?;
    let by_role = |role: SpecialUse| {
        mailboxes
            .iter()
            .find(|m| m.special == Some(role))
            .map(|m| m.name.clone())
    };

    let layout = MailboxLayout {
        all_mail: policy
            .all_mail_mailbox
            .clone()
            .or_else(|| by_role(SpecialUse::All))
            .unwrap_or_else(|| ALL_MAIL_MAILBOX.to_string()),
        trash: policy
            .trash_mailbox
            .clone()
            .or_else(|| by_role(SpecialUse::Trash))
            .unwrap_or_else(|| TRASH_MAILBOX.to_string()),
    };
    debug!(
        "Mailbox layout for '{}': all={} trash={}",
        store.identity(),
        layout.all_mail,
        layout.trash
    );
    Ok(layout)
}

/// Drives each matched message from the source account into the archive
/// account, one message at a time.
pub struct MigrationController<'a> {
    policy: &'a MigrationPolicy,
}

/// Per-run context shared by the steps of the pipeline.
struct Run {
    source: MailboxLayout,
    archive: MailboxLayout,
    state: RunState,
    /// Only ever holds the marker label.
    source_labels: LabelCache,
    total: usize,
}

impl<'a> MigrationController<'a> {
    pub fn new(policy: &'a MigrationPolicy) -> Self {
        Self { policy }
    }

    pub async fn run<S: MailStore, A: MailStore>(
        &self,
        source: &mut S,
        archive: &mut A,
    ) -> MailMoverResult<Summary> {
        let mut run = Run {
            source: resolve_layout(source, self.policy).await?,
            archive: resolve_layout(archive, self.policy).await?,
            state: RunState::new(),
            source_labels: LabelCache::new(),
            total: 0,
        };

        source.select_mailbox(&run.source.all_mail).await?;
        archive.select_mailbox(&run.archive.all_mail).await?;

        info!(
            "Searching for messages in '{}' that match \"{}\"",
            source.identity(),
            self.policy.query
        );
        let matched = source
            .search(&StoreQuery::Raw(self.policy.query.clone()))
            .await?;
        run.state.matched(matched.len());
        info!("Found {} matching messages", matched.len());
        if matched.is_empty() {
            return Ok(run.state.into_summary());
        }

        if matched.len() > self.policy.max_messages {
            info!(
                "Limiting to max messages count of {}",
                self.policy.max_messages
            );
        }
        run.total = matched.len().min(self.policy.max_messages);

        for (index, uid) in matched.into_iter().take(run.total).enumerate() {
            self.process(source, archive, &mut run, index + 1, uid).await?;
        }

        let summary = run.state.into_summary();
        info!("Run finished: {}", summary);
        Ok(summary)
    }

    async fn process<S: MailStore, A: MailStore>(
        &self,
        source: &mut S,
        archive: &mut A,
        run: &mut Run,
        position: usize,
        uid: u32,
    ) -> MailMoverResult<()> {
        let candidate = source.fetch(uid, FetchScope::Header).await?;
        run.state.processed();

        let classification = classify(&candidate.header, self.policy.require_subject);
        let (correlation_key, subject) = match classification {
            Classification::Accepted {
                correlation_key,
                subject,
            } => (correlation_key, subject),
            skipped => {
                match skipped {
                    Classification::SkipPlaceholder => debug!(
                        "[{}/{}] UID {} is a placeholder, skipping",
                        position, run.total, uid
                    ),
                    Classification::SkipNoCorrelationKey => warn!(
                        "[{}/{}] UID {} has no Message-ID header, skipping",
                        position, run.total, uid
                    ),
                    _ => warn!(
                        "[{}/{}] UID {} has no Subject header, skipping",
                        position, run.total, uid
                    ),
                }
                run.state.skipped(&skipped);
                return Ok(());
            }
        };

        info!(
            "[{}/{}] UID {} {} \"{}\" ({} bytes, {} labels)",
            position,
            run.total,
            uid,
            correlation_key,
            subject
                .as_deref()
                .map(try_decode_string)
                .unwrap_or_default(),
            candidate.size,
            candidate.labels.len()
        );

        if self.policy.dry_run {
            run.state.would_migrate();
            return Ok(());
        }

        let full = source.fetch(uid, FetchScope::Full).await?;
        let body = full.body.as_deref().ok_or_else(|| {
            raise_error!(
                format!("FETCH of UID {} returned no message body", uid),
                ErrorCode::ImapUnexpectedResult
            )
        })?;

        archive
            .append(
                &run.archive.all_mail,
                &full.flags,
                Some(full.internal_date),
                body,
            )
            .await?;

        let archived = archive
            .search(&StoreQuery::MessageId(correlation_key.clone()))
            .await?;
        if archived.is_empty() {
            warn!(
                "{} was appended to '{}' but cannot be found there yet, leaving the original in place",
                correlation_key,
                archive.identity()
            );
            run.state.unverified();
            return Ok(());
        }

        for label in full.labels.user_labels() {
            run.state.labels.ensure_created(archive, label).await;
        }
        archive.set_labels(&archived, &full.labels).await?;

        self.purge_original(source, &run.source, uid, &correlation_key)
            .await?;
        self.insert_placeholder(source, archive.identity(), run, &full, &correlation_key)
            .await?;

        run.state.migrated();
        Ok(())
    }

    /// Moves the original to the trash and expunges it from there.
    async fn purge_original<S: MailStore>(
        &self,
        source: &mut S,
        layout: &MailboxLayout,
        uid: u32,
        correlation_key: &str,
    ) -> MailMoverResult<()> {
        source.copy(uid, &layout.trash).await?;
        source.select_mailbox(&layout.trash).await?;

        let trashed = source
            .search(&StoreQuery::MessageId(correlation_key.to_string()))
            .await?;
        if trashed.is_empty() {
            return Err(raise_error!(
                format!(
                    "{} was copied to '{}' but cannot be found there",
                    correlation_key, layout.trash
                ),
                ErrorCode::MessageNotLocatable
            ));
        }

        source.mark_deleted(&trashed).await?;
        source.expunge(&trashed).await?;
        source.select_mailbox(&layout.all_mail).await
    }

    async fn insert_placeholder<S: MailStore>(
        &self,
        source: &mut S,
        archive_identity: &str,
        run: &mut Run,
        original: &CandidateMessage,
        correlation_key: &str,
    ) -> MailMoverResult<()> {
        let layout = &run.source;
        let message_id = generate_message_id(domain_part(source.identity()));
        let timestamp: DateTime<FixedOffset> = Local::now().into();
        let placeholder = PlaceholderComposer::compose(&PlaceholderRequest {
            original_header: &original.header,
            archive_identity,
            correlation_key,
            search_criteria: &self.policy.query,
            timestamp,
            program_identity: &self.policy.program_identity,
            message_id: &message_id,
        });

        source
            .append(
                &layout.all_mail,
                &original.flags,
                Some(original.internal_date),
                &placeholder,
            )
            .await?;

        let placed = source
            .search(&StoreQuery::MessageId(message_id.clone()))
            .await?;
        if placed.is_empty() {
            return Err(raise_error!(
                format!(
                    "Placeholder {} for {} cannot be found in '{}'",
                    message_id, correlation_key, layout.all_mail
                ),
                ErrorCode::MessageNotLocatable
            ));
        }

        run.source_labels
            .ensure_created(source, MARKER_LABEL)
            .await;
        source
            .set_labels(&placed, &original.labels.with(MARKER_LABEL))
            .await
    }
}
