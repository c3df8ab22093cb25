// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

//! Textual access to an RFC 5322 header block.
//!
//! Header lookups and rewrites work on the raw bytes returned by
//! `BODY.PEEK[HEADER]`. Folded values (continuation lines starting with a
//! space or tab) belong to the header above them, and a header name may
//! appear more than once.

use regex::bytes::Regex;

/// Header carried by every placeholder message.
pub const MARKER_HEADER: &str = "X-Mailmover-Placeholder";
pub const MARKER_HEADER_VALUE: &str = "true";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderBlock {
    raw: Vec<u8>,
}

/// Matches one header field including its folded continuation lines and the
/// terminating line break.
fn field_pattern(name: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?mi-u)^{}[ \t]*:[^\r\n]*(?:\r?\n[ \t][^\r\n]*)*(?:\r?\n)?",
        regex::escape(name)
    );
    Regex::new(&pattern).ok()
}

impl HeaderBlock {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Unfolded value of the first occurrence of `name`.
    pub fn find(&self, name: &str) -> Option<String> {
        let pattern = field_pattern(name)?;
        let field = pattern.find(&self.raw)?;
        let field = String::from_utf8_lossy(field.as_bytes());
        let (_, value) = field.split_once(':')?;
        let unfolded = value.replace("\r\n", "").replace('\n', "");
        Some(unfolded.trim().to_string())
    }

    /// The Message-ID used to re-locate the message in another store.
    pub fn message_id(&self) -> Option<String> {
        self.find("Message-ID")?
            .split_whitespace()
            .next()
            .map(str::to_string)
    }

    pub fn subject(&self) -> Option<String> {
        self.find("Subject").filter(|s| !s.is_empty())
    }

    pub fn has_marker(&self) -> bool {
        field_pattern(MARKER_HEADER).is_some_and(|p| p.is_match(&self.raw))
    }

    /// Returns a copy of the block in which every occurrence of each named
    /// header is removed and a single `Name: value` line is appended. The
    /// result always ends with the empty line that separates it from a body.
    pub fn rewrite(&self, replacements: &[(&str, &str)]) -> Vec<u8> {
        let mut stripped = self.raw.clone();
        for pattern in replacements.iter().filter_map(|(name, _)| field_pattern(name)) {
            stripped = pattern.replace_all(&stripped, &b""[..]).into_owned();
        }

        while matches!(stripped.last(), Some(b'\r' | b'\n')) {
            stripped.pop();
        }

        let mut rewritten = stripped;
        if !rewritten.is_empty() {
            rewritten.extend_from_slice(b"\r\n");
        }
        for (name, value) in replacements {
            rewritten.extend_from_slice(name.as_bytes());
            rewritten.extend_from_slice(b": ");
            rewritten.extend_from_slice(value.as_bytes());
            rewritten.extend_from_slice(b"\r\n");
        }
        rewritten.extend_from_slice(b"\r\n");
        rewritten
    }
}
