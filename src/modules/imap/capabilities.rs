// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::imap::session::ImapSession;
use crate::{modules::error::MailMoverResult, raise_error};
use async_imap::types::Capabilities;

/// Gmail's extension set: X-GM-RAW, X-GM-LABELS, X-GM-MSGID, X-GM-THRID.
pub const GMAIL_EXTENSION: &str = "X-GM-EXT-1";
pub const UIDPLUS: &str = "UIDPLUS";

/// What the run needs to know about a connected server.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ServerFeatures {
    pub uidplus: bool,
}

pub async fn fetch_capabilities(session: &mut ImapSession) -> MailMoverResult<Capabilities> {
    session
        .capabilities()
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))
}

pub fn check_capabilities(capabilities: &Capabilities) -> MailMoverResult<ServerFeatures> {
    check_capability_names(|name| capabilities.has_str(name))
}

fn check_capability_names(has: impl Fn(&str) -> bool) -> MailMoverResult<ServerFeatures> {
    if !has("IMAP4rev1") {
        return Err(raise_error!(
            "Server does not support IMAP4rev1".into(),
            ErrorCode::Incompatible
        ));
    }
    if !has(GMAIL_EXTENSION) {
        return Err(raise_error!(
            format!(
                "Server does not advertise {}, Gmail search and labels are unavailable",
                GMAIL_EXTENSION
            ),
            ErrorCode::Incompatible
        ));
    }
    Ok(ServerFeatures {
        uidplus: has(UIDPLUS),
    })
}
