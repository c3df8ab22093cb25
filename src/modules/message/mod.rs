// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, FixedOffset};
use flags::EnvelopeFlag;
use header::HeaderBlock;
use std::collections::BTreeSet;

pub mod classify;
pub mod flags;
pub mod header;
pub mod placeholder;

/// How much of a message a fetch retrieves.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchScope {
    /// Metadata and the header block only.
    Header,
    /// Metadata, header block and the complete RFC 822 message.
    Full,
}

/// Gmail labels attached to a message, unique by name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelSet(BTreeSet<String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        self.0.insert(label.into())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// System labels such as `\Inbox` or `\Important` exist on every account
    /// and cannot be created.
    pub fn is_reserved(label: &str) -> bool {
        label.starts_with('\\') || label.starts_with('/')
    }

    /// Labels that may need to be created on the destination account.
    pub fn user_labels(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|l| !Self::is_reserved(l))
    }

    /// Copy of the set with one more label.
    pub fn with(&self, label: &str) -> Self {
        let mut labels = self.clone();
        labels.insert(label);
        labels
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A message matched by the source search, as seen by one fetch.
#[derive(Clone, Debug)]
pub struct CandidateMessage {
    pub seq: u32,
    pub uid: u32,
    pub gmail_msg_id: u64,
    pub gmail_thread_id: u64,
    pub labels: LabelSet,
    pub flags: Vec<EnvelopeFlag>,
    pub internal_date: DateTime<FixedOffset>,
    pub size: u32,
    pub header: HeaderBlock,
    /// Complete RFC 822 message, present after a `FetchScope::Full` fetch.
    pub body: Option<Vec<u8>>,
}
