// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::store::MailStore;
use std::collections::HashSet;
use tracing::debug;

/// Labels this run has already tried to create on the archive account.
#[derive(Debug, Default)]
pub struct LabelCache {
    attempted: HashSet<String>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues CREATE the first time a label is seen. Gmail answers NO for a
    /// label that already exists, so failures are only logged.
    pub async fn ensure_created<S: MailStore>(&mut self, store: &mut S, label: &str) -> bool {
        if !self.attempted.insert(label.to_string()) {
            return false;
        }
        if let Err(e) = store.create_mailbox(label).await {
            debug!(
                "CREATE '{}' on '{}' failed, assuming it exists: {}",
                label,
                store.identity(),
                e
            );
        }
        true
    }

    pub fn len(&self) -> usize {
        self.attempted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }
}
