// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::message::header::{HeaderBlock, MARKER_HEADER, MARKER_HEADER_VALUE};
use chrono::{DateTime, FixedOffset};
use html_escape::encode_safe;

/// Everything a placeholder notice says about the message it stands in for.
#[derive(Clone, Debug)]
pub struct PlaceholderRequest<'a> {
    pub original_header: &'a HeaderBlock,
    pub archive_identity: &'a str,
    pub correlation_key: &'a str,
    pub search_criteria: &'a str,
    pub timestamp: DateTime<FixedOffset>,
    pub program_identity: &'a str,
    /// Fresh Message-ID under which the placeholder itself is appended.
    pub message_id: &'a str,
}

pub struct PlaceholderComposer;

impl PlaceholderComposer {
    /// Builds the RFC 822 bytes of a placeholder: the original header block
    /// with its content headers and Message-ID replaced and the marker
    /// header added, followed by an HTML notice.
    pub fn compose(request: &PlaceholderRequest<'_>) -> Vec<u8> {
        let mut message = request.original_header.rewrite(&[
            ("Content-Type", "text/html; charset=UTF-8"),
            ("Content-Transfer-Encoding", "8bit"),
            ("Message-ID", request.message_id),
            (MARKER_HEADER, MARKER_HEADER_VALUE),
        ]);
        message.extend_from_slice(Self::generate_html(request).as_bytes());
        message
    }

    fn generate_html(request: &PlaceholderRequest<'_>) -> String {
        format!(
            "<span style='font-size:larger'><span style='font-size:larger;font-weight:bold'>NOTICE:</span><br/>\r\n\
<span style='font-weight:bold'>This message was moved to an email archive account via an automated process.</span><br/>\r\n\
<br/>\r\n\
At the time of archival, the destination archive account was:<br/>\r\n\
<span style='font-family:monospace'>{}</span><br/>\r\n\
<br/>\r\n\
If the archive account is a Gmail account, you may be able to locate the\r\n\
message by searching for this string from within the archive account:<br/>\r\n\
<span style='font-family:monospace'>rfc822msgid:{}</span><br/>\r\n\
<br/>\r\n\
The query used to select this email for archival was:<br/>\r\n\
<span style='font-family:monospace'>{}</span><br/>\r\n\
<br/>\r\n\
This archival operation occurred at:<br/>\r\n\
<span style='font-family:monospace'>{}</span><br/>\r\n\
<br/>\r\n\
This email was archived using:<br/>\r\n\
<span style='font-family:monospace'>{}</span></span><br/>\r\n",
            encode_safe(request.archive_identity),
            encode_safe(request.correlation_key),
            encode_safe(request.search_criteria),
            encode_safe(&request.timestamp.format("%Y-%m-%d %H:%M:%S %z").to_string()),
            encode_safe(request.program_identity),
        )
    }
}
