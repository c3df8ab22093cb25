// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::message::header::HeaderBlock;

/// Outcome of inspecting a candidate's header block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    Accepted {
        correlation_key: String,
        subject: Option<String>,
    },
    /// Already a placeholder left behind by an earlier run.
    SkipPlaceholder,
    SkipNoCorrelationKey,
    SkipNoSubject,
}

impl Classification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Classification::Accepted { .. })
    }
}

pub fn classify(header: &HeaderBlock, require_subject: bool) -> Classification {
    if header.has_marker() {
        return Classification::SkipPlaceholder;
    }
    let Some(correlation_key) = header.message_id() else {
        return Classification::SkipNoCorrelationKey;
    };
    let subject = header.subject();
    if subject.is_none() && require_subject {
        return Classification::SkipNoSubject;
    }
    Classification::Accepted {
        correlation_key,
        subject,
    }
}
