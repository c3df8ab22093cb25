// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents an IMAP flag on a message, either a system flag or a keyword.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EnvelopeFlag {
    /// The type of flag (standard or custom) as defined by `EmailFlag`.
    pub flag: EmailFlag,
    /// Keyword name when `flag` is `EmailFlag::Custom`, `None` otherwise.
    pub custom: Option<String>,
}

impl EnvelopeFlag {
    pub fn new(flag: EmailFlag, custom: Option<String>) -> Self {
        Self { flag, custom }
    }

    pub fn seen() -> Self {
        Self::new(EmailFlag::Seen, None)
    }

    /// Parses a flag as it appears on the wire, e.g. `\Seen` or `$Forwarded`.
    pub fn parse(raw: &str) -> Self {
        let flag = match raw.to_ascii_lowercase().as_str() {
            "\\seen" => EmailFlag::Seen,
            "\\answered" => EmailFlag::Answered,
            "\\flagged" => EmailFlag::Flagged,
            "\\deleted" => EmailFlag::Deleted,
            "\\draft" => EmailFlag::Draft,
            "\\recent" => EmailFlag::Recent,
            "\\*" => EmailFlag::MayCreate,
            _ => return Self::new(EmailFlag::Custom, Some(raw.to_string())),
        };
        Self::new(flag, None)
    }

    /// Wire form of the flag.
    pub fn to_imap_string(&self) -> String {
        match self.flag {
            EmailFlag::Custom => self.custom.clone().unwrap_or_default(),
            EmailFlag::Seen => "\\Seen".into(),
            EmailFlag::Answered => "\\Answered".into(),
            EmailFlag::Flagged => "\\Flagged".into(),
            EmailFlag::Deleted => "\\Deleted".into(),
            EmailFlag::Draft => "\\Draft".into(),
            EmailFlag::Recent => "\\Recent".into(),
            EmailFlag::MayCreate => "\\*".into(),
        }
    }

    /// Whether the flag may be carried over by APPEND. `\Recent` belongs to
    /// the server and a copy must never arrive already `\Deleted`.
    pub fn is_appendable(&self) -> bool {
        match self.flag {
            EmailFlag::Recent | EmailFlag::MayCreate | EmailFlag::Deleted => false,
            EmailFlag::Custom => self.custom.as_deref().is_some_and(|c| !c.is_empty()),
            _ => true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum EmailFlag {
    Seen,
    Answered,
    Flagged,
    Deleted,
    Draft,
    Recent,
    MayCreate,
    Custom,
}

impl fmt::Display for EnvelopeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.custom {
            Some(custom) => write!(f, "{}", custom),
            None => write!(f, "{}", self.flag),
        }
    }
}

impl fmt::Display for EmailFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag_str = match self {
            EmailFlag::Seen => "Seen",
            EmailFlag::Answered => "Answered",
            EmailFlag::Flagged => "Flagged",
            EmailFlag::Deleted => "Deleted",
            EmailFlag::Draft => "Draft",
            EmailFlag::Recent => "Recent",
            EmailFlag::MayCreate => "MayCreate",
            EmailFlag::Custom => "Custom",
        };
        write!(f, "{}", flag_str)
    }
}

/// Parenthesized flag list for APPEND, e.g. `(\Seen $Label1)`.
pub fn to_append_flags(flags: &[EnvelopeFlag]) -> Option<String> {
    let rendered: Vec<String> = flags
        .iter()
        .filter(|f| f.is_appendable())
        .map(EnvelopeFlag::to_imap_string)
        .collect();
    if rendered.is_empty() {
        None
    } else {
        Some(format!("({})", rendered.join(" ")))
    }
}
