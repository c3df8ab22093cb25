// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use mail_parser::parsers::MessageStream;

/// Decodes an RFC 2047 encoded-word header value, returning the input
/// unchanged when it is not one.
pub fn try_decode_string(encoded: &str) -> String {
    let trimmed = encoded.trim();
    if trimmed.starts_with("=?") && trimmed.ends_with("?=") {
        // the parser expects to be positioned just past the leading '='
        let modified_encoded = &trimmed[1..];
        if let Some(result) = MessageStream::new(modified_encoded.as_bytes()).decode_rfc2047() {
            return result;
        }
    }
    encoded.to_string()
}
