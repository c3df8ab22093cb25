// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::message::classify::Classification;
use crate::modules::migration::labels::LabelCache;
use serde::Serialize;
use std::fmt;

/// Counters reported at the end of a run.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub matched: usize,
    pub processed: usize,
    pub migrated: usize,
    pub would_migrate: usize,
    pub skipped_placeholder: usize,
    pub skipped_no_message_id: usize,
    pub skipped_no_subject: usize,
    /// Appended to the archive but not found there by Message-ID, so the
    /// original was left in place.
    pub unverified: usize,
}

impl Summary {
    pub fn skipped(&self) -> usize {
        self.skipped_placeholder + self.skipped_no_message_id + self.skipped_no_subject
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matched={} processed={} migrated={} would_migrate={} skipped={} \
(placeholder={} no_message_id={} no_subject={}) unverified={}",
            self.matched,
            self.processed,
            self.migrated,
            self.would_migrate,
            self.skipped(),
            self.skipped_placeholder,
            self.skipped_no_message_id,
            self.skipped_no_subject,
            self.unverified
        )
    }
}

/// Mutable state of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub labels: LabelCache,
    summary: Summary,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matched(&mut self, count: usize) {
        self.summary.matched = count;
    }

    pub fn processed(&mut self) {
        self.summary.processed += 1;
    }

    pub fn skipped(&mut self, classification: &Classification) {
        match classification {
            Classification::SkipPlaceholder => self.summary.skipped_placeholder += 1,
            Classification::SkipNoCorrelationKey => self.summary.skipped_no_message_id += 1,
            Classification::SkipNoSubject => self.summary.skipped_no_subject += 1,
            Classification::Accepted { .. } => {}
        }
    }

    pub fn would_migrate(&mut self) {
        self.summary.would_migrate += 1;
    }

    pub fn migrated(&mut self) {
        self.summary.migrated += 1;
    }

    pub fn unverified(&mut self) {
        self.summary.unverified += 1;
    }

    pub fn into_summary(self) -> Summary {
        self.summary
    }
}
