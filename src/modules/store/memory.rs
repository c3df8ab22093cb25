// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

//! Gmail-like account held in memory.
//!
//! Mailboxes are independent lists of messages. Copying into the trash
//! mailbox moves the message there, as Gmail does. Every call that changes
//! the account is recorded in `mutations`.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::message::flags::{EmailFlag, EnvelopeFlag};
use crate::modules::message::header::HeaderBlock;
use crate::modules::message::{CandidateMessage, FetchScope, LabelSet};
use crate::modules::store::{MailStore, MailboxInfo, SpecialUse, StoreQuery};
use crate::raise_error;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::time::Duration;

pub const ALL_MAIL: &str = "[Gmail]/All Mail";
pub const TRASH: &str = "[Gmail]/Trash";

#[derive(Clone, Debug)]
pub struct StoredMessage {
    pub uid: u32,
    pub gmail_msg_id: u64,
    pub gmail_thread_id: u64,
    pub labels: LabelSet,
    pub flags: Vec<EnvelopeFlag>,
    pub internal_date: DateTime<FixedOffset>,
    pub raw: Vec<u8>,
    /// Appended while search was told to lag behind.
    pub hidden: bool,
}

impl StoredMessage {
    pub fn header(&self) -> HeaderBlock {
        let end = self
            .raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map(|p| p + 4)
            .unwrap_or(self.raw.len());
        HeaderBlock::new(&self.raw[..end])
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }

    pub fn has_flag(&self, flag: &EmailFlag) -> bool {
        self.flags.iter().any(|f| &f.flag == flag)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    Append { mailbox: String, uid: u32 },
    SetLabels { uids: Vec<u32> },
    CreateMailbox(String),
    Copy { uid: u32, mailbox: String },
    MarkDeleted(Vec<u32>),
    Expunge(Vec<u32>),
}

#[derive(Debug)]
pub struct MemoryStore {
    identity: String,
    mailboxes: BTreeMap<String, Vec<StoredMessage>>,
    special: Vec<(String, SpecialUse)>,
    selected: Option<String>,
    next_uid: u32,
    next_gmail_id: u64,
    raw_filter: Option<fn(&str, &StoredMessage) -> bool>,
    pub mutations: Vec<Mutation>,
    pub hide_appended: bool,
    /// Copies land in their mailbox but stay invisible to search.
    pub hide_copies: bool,
    pub fail_appends: bool,
    pub logged_out: bool,
}

impl MemoryStore {
    pub fn new(identity: &str) -> Self {
        let mut mailboxes = BTreeMap::new();
        mailboxes.insert("INBOX".to_string(), Vec::new());
        mailboxes.insert(ALL_MAIL.to_string(), Vec::new());
        mailboxes.insert(TRASH.to_string(), Vec::new());
        Self {
            identity: identity.to_string(),
            mailboxes,
            special: vec![
                (ALL_MAIL.to_string(), SpecialUse::All),
                (TRASH.to_string(), SpecialUse::Trash),
            ],
            selected: None,
            next_uid: 1,
            next_gmail_id: 1_000_000,
            raw_filter: None,
            mutations: Vec::new(),
            hide_appended: false,
            hide_copies: false,
            fail_appends: false,
            logged_out: false,
        }
    }

    /// Restricts what a `StoreQuery::Raw` search matches. Without a filter
    /// every message in the selected mailbox matches.
    pub fn with_raw_filter(mut self, filter: fn(&str, &StoredMessage) -> bool) -> Self {
        self.raw_filter = Some(filter);
        self
    }

    /// Puts a message into All Mail as if it had been delivered.
    pub fn seed(&mut self, raw: &str, labels: &[&str], flags: &[EnvelopeFlag]) -> u32 {
        let uid = self.allocate_uid();
        let gmail_msg_id = self.allocate_gmail_id();
        let message = StoredMessage {
            uid,
            gmail_msg_id,
            gmail_thread_id: gmail_msg_id,
            labels: labels.iter().copied().collect(),
            flags: flags.to_vec(),
            internal_date: DateTime::parse_from_rfc3339("2022-01-15T08:30:00+01:00").unwrap(),
            raw: raw.as_bytes().to_vec(),
            hidden: false,
        };
        self.mailbox_mut(ALL_MAIL).push(message);
        uid
    }

    pub fn messages(&self, mailbox: &str) -> &[StoredMessage] {
        self.mailboxes
            .get(mailbox)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find_by_message_id(&self, mailbox: &str, message_id: &str) -> Vec<&StoredMessage> {
        self.messages(mailbox)
            .iter()
            .filter(|m| m.header().message_id().as_deref() == Some(message_id))
            .collect()
    }

    pub fn has_mailbox(&self, mailbox: &str) -> bool {
        self.mailboxes.contains_key(mailbox)
    }

    fn allocate_uid(&mut self) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    fn allocate_gmail_id(&mut self) -> u64 {
        let id = self.next_gmail_id;
        self.next_gmail_id += 1;
        id
    }

    fn mailbox_mut(&mut self, mailbox: &str) -> &mut Vec<StoredMessage> {
        self.mailboxes.entry(mailbox.to_string()).or_default()
    }

    fn selected(&self) -> MailMoverResult<String> {
        self.selected.clone().ok_or_else(|| {
            raise_error!(
                "No mailbox selected".into(),
                ErrorCode::ImapCommandFailed
            )
        })
    }

    fn is_trash(&self, mailbox: &str) -> bool {
        self.special
            .iter()
            .any(|(name, role)| name == mailbox && *role == SpecialUse::Trash)
    }
}

impl MailStore for MemoryStore {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn list_mailboxes(&mut self) -> MailMoverResult<Vec<MailboxInfo>> {
        Ok(self
            .mailboxes
            .keys()
            .map(|name| MailboxInfo {
                name: name.clone(),
                special: self
                    .special
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, role)| *role),
            })
            .collect())
    }

    async fn select_mailbox(&mut self, mailbox: &str) -> MailMoverResult<()> {
        if !self.mailboxes.contains_key(mailbox) {
            return Err(raise_error!(
                format!("Mailbox '{}' does not exist", mailbox),
                ErrorCode::ImapCommandFailed
            ));
        }
        self.selected = Some(mailbox.to_string());
        Ok(())
    }

    async fn search(&mut self, query: &StoreQuery) -> MailMoverResult<Vec<u32>> {
        let selected = self.selected()?;
        let filter = self.raw_filter;
        let mut uids: Vec<u32> = self
            .messages(&selected)
            .iter()
            .filter(|m| !m.hidden)
            .filter(|m| match query {
                StoreQuery::Raw(q) => filter.map_or(true, |f| f(q, m)),
                StoreQuery::MessageId(id) => {
                    m.header().message_id().as_deref() == Some(id.as_str())
                }
            })
            .map(|m| m.uid)
            .collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn fetch(&mut self, uid: u32, scope: FetchScope) -> MailMoverResult<CandidateMessage> {
        let selected = self.selected()?;
        let message = self
            .messages(&selected)
            .iter()
            .find(|m| m.uid == uid)
            .ok_or_else(|| {
                raise_error!(
                    format!("FETCH returned nothing for UID {}", uid),
                    ErrorCode::ImapUnexpectedResult
                )
            })?;
        Ok(CandidateMessage {
            seq: uid,
            uid,
            gmail_msg_id: message.gmail_msg_id,
            gmail_thread_id: message.gmail_thread_id,
            labels: message.labels.clone(),
            flags: message.flags.clone(),
            internal_date: message.internal_date,
            size: message.raw.len() as u32,
            header: message.header(),
            body: match scope {
                FetchScope::Header => None,
                FetchScope::Full => Some(message.raw.clone()),
            },
        })
    }

    async fn append(
        &mut self,
        mailbox: &str,
        flags: &[EnvelopeFlag],
        internal_date: Option<DateTime<FixedOffset>>,
        message: &[u8],
    ) -> MailMoverResult<()> {
        if self.fail_appends {
            return Err(raise_error!(
                format!("APPEND to '{}' was rejected", mailbox),
                ErrorCode::ImapCommandFailed
            ));
        }
        if !self.mailboxes.contains_key(mailbox) {
            return Err(raise_error!(
                format!("[TRYCREATE] Mailbox '{}' does not exist", mailbox),
                ErrorCode::ImapCommandFailed
            ));
        }
        let uid = self.allocate_uid();
        let gmail_msg_id = self.allocate_gmail_id();
        let stored = StoredMessage {
            uid,
            gmail_msg_id,
            gmail_thread_id: gmail_msg_id,
            labels: LabelSet::new(),
            flags: flags.iter().filter(|f| f.is_appendable()).cloned().collect(),
            internal_date: internal_date.unwrap_or_else(|| chrono::Local::now().into()),
            raw: message.to_vec(),
            hidden: self.hide_appended,
        };
        self.mailbox_mut(mailbox).push(stored);
        self.mutations.push(Mutation::Append {
            mailbox: mailbox.to_string(),
            uid,
        });
        Ok(())
    }

    async fn set_labels(&mut self, uids: &[u32], labels: &LabelSet) -> MailMoverResult<()> {
        let selected = self.selected()?;
        for message in self.mailbox_mut(&selected) {
            if uids.contains(&message.uid) {
                message.labels = labels.clone();
            }
        }
        self.mutations.push(Mutation::SetLabels {
            uids: uids.to_vec(),
        });
        Ok(())
    }

    async fn create_mailbox(&mut self, mailbox: &str) -> MailMoverResult<()> {
        self.mutations
            .push(Mutation::CreateMailbox(mailbox.to_string()));
        if self.mailboxes.contains_key(mailbox) {
            return Err(raise_error!(
                format!("[ALREADYEXISTS] Mailbox '{}' already exists", mailbox),
                ErrorCode::ImapCommandFailed
            ));
        }
        self.mailboxes.insert(mailbox.to_string(), Vec::new());
        Ok(())
    }

    async fn copy(&mut self, uid: u32, mailbox: &str) -> MailMoverResult<()> {
        let selected = self.selected()?;
        if !self.mailboxes.contains_key(mailbox) {
            return Err(raise_error!(
                format!("[TRYCREATE] Mailbox '{}' does not exist", mailbox),
                ErrorCode::ImapCommandFailed
            ));
        }
        let position = self
            .messages(&selected)
            .iter()
            .position(|m| m.uid == uid)
            .ok_or_else(|| {
                raise_error!(
                    format!("UID {} not found in '{}'", uid, selected),
                    ErrorCode::ImapCommandFailed
                )
            })?;
        let mut copied = if self.is_trash(mailbox) {
            self.mailbox_mut(&selected).remove(position)
        } else {
            self.messages(&selected)[position].clone()
        };
        copied.uid = self.allocate_uid();
        copied.hidden = self.hide_copies;
        self.mailbox_mut(mailbox).push(copied);
        self.mutations.push(Mutation::Copy {
            uid,
            mailbox: mailbox.to_string(),
        });
        Ok(())
    }

    async fn mark_deleted(&mut self, uids: &[u32]) -> MailMoverResult<()> {
        let selected = self.selected()?;
        for message in self.mailbox_mut(&selected) {
            if uids.contains(&message.uid) && !message.has_flag(&EmailFlag::Deleted) {
                message.flags.push(EnvelopeFlag::new(EmailFlag::Deleted, None));
            }
        }
        self.mutations.push(Mutation::MarkDeleted(uids.to_vec()));
        Ok(())
    }

    async fn expunge(&mut self, uids: &[u32]) -> MailMoverResult<()> {
        let selected = self.selected()?;
        self.mailbox_mut(&selected)
            .retain(|m| !(uids.contains(&m.uid) && m.has_flag(&EmailFlag::Deleted)));
        self.mutations.push(Mutation::Expunge(uids.to_vec()));
        Ok(())
    }

    async fn logout(&mut self, _timeout: Duration) -> MailMoverResult<()> {
        self.logged_out = true;
        self.selected = None;
        Ok(())
    }
}
