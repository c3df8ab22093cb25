// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::{
    error::MailMoverResult,
    message::{flags::EnvelopeFlag, CandidateMessage, FetchScope, LabelSet},
    utils::imap_quote,
};
use chrono::{DateTime, FixedOffset};
use std::time::Duration;

#[cfg(test)]
pub mod memory;

/// Special-use role advertised for a mailbox in LIST (RFC 6154).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpecialUse {
    All,
    Trash,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MailboxInfo {
    /// Decoded mailbox name.
    pub name: String,
    pub special: Option<SpecialUse>,
}

/// Search criteria understood by a Gmail store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreQuery {
    /// Gmail web-UI search syntax, passed through verbatim.
    Raw(String),
    /// Exact match on the RFC 822 Message-ID header.
    MessageId(String),
}

impl StoreQuery {
    pub fn gmail_raw(&self) -> String {
        match self {
            StoreQuery::Raw(query) => query.clone(),
            StoreQuery::MessageId(id) => format!("rfc822msgid:{}", id),
        }
    }

    /// Search key for `UID SEARCH`.
    pub fn to_imap_command(&self) -> String {
        let raw = self.gmail_raw();
        if raw.is_ascii() {
            format!("X-GM-RAW {}", imap_quote(&raw))
        } else {
            format!("CHARSET UTF-8 X-GM-RAW {}", imap_quote(&raw))
        }
    }
}

/// One mailbox account as the migration sees it. Every call acts on the
/// currently selected mailbox unless it names another one.
#[allow(async_fn_in_trait)]
pub trait MailStore {
    /// Account name used in log lines and the placeholder notice.
    fn identity(&self) -> &str;

    async fn list_mailboxes(&mut self) -> MailMoverResult<Vec<MailboxInfo>>;

    async fn select_mailbox(&mut self, mailbox: &str) -> MailMoverResult<()>;

    /// UIDs matching the query, in ascending order.
    async fn search(&mut self, query: &StoreQuery) -> MailMoverResult<Vec<u32>>;

    async fn fetch(&mut self, uid: u32, scope: FetchScope) -> MailMoverResult<CandidateMessage>;

    async fn append(
        &mut self,
        mailbox: &str,
        flags: &[EnvelopeFlag],
        internal_date: Option<DateTime<FixedOffset>>,
        message: &[u8],
    ) -> MailMoverResult<()>;

    /// Replaces the label set of every listed message.
    async fn set_labels(&mut self, uids: &[u32], labels: &LabelSet) -> MailMoverResult<()>;

    async fn create_mailbox(&mut self, mailbox: &str) -> MailMoverResult<()>;

    async fn copy(&mut self, uid: u32, mailbox: &str) -> MailMoverResult<()>;

    async fn mark_deleted(&mut self, uids: &[u32]) -> MailMoverResult<()>;

    /// Permanently removes the listed messages, which must already be marked
    /// `\Deleted`.
    async fn expunge(&mut self, uids: &[u32]) -> MailMoverResult<()>;

    async fn logout(&mut self, timeout: Duration) -> MailMoverResult<()>;
}
