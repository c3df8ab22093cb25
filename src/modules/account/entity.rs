// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::{
    modules::error::{code::ErrorCode, MailMoverResult},
    raise_error, validate_email,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoint used when an account does not name its IMAP server.
pub const DEFAULT_IMAP_ADDR: &str = "imap.gmail.com:993";
/// Port on which the connection is TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 993;

#[derive(Clone, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Encryption {
    /// SSL/TLS encrypted connection
    #[default]
    Ssl,
    /// StartTLS encryption
    StartTls,
    /// Unencrypted connection
    None,
}

/// Credentials and server address of one mailbox store.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Login name, normally the full email address.
    pub username: String,
    /// Password or app password used for `LOGIN`.
    pub password: String,
    /// `host:port` of the IMAP server. Defaults to Gmail.
    #[serde(rename = "imapaddr", default)]
    pub imap_addr: Option<String>,
    /// Transport security. When absent it is derived from the port:
    /// 993 is implicit TLS, anything else upgrades with STARTTLS.
    #[serde(default)]
    pub encryption: Option<Encryption>,
}

/// Resolved network location of an account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImapEndpoint {
    pub host: String,
    pub port: u16,
    pub encryption: Encryption,
}

impl Account {
    pub fn endpoint(&self) -> MailMoverResult<ImapEndpoint> {
        let addr = self
            .imap_addr
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_IMAP_ADDR);

        let (host, port) = addr.rsplit_once(':').ok_or_else(|| {
            raise_error!(
                format!("IMAP address '{}' must be in host:port form", addr),
                ErrorCode::InvalidParameter
            )
        })?;
        if host.is_empty() {
            return Err(raise_error!(
                format!("IMAP address '{}' has an empty host", addr),
                ErrorCode::InvalidParameter
            ));
        }
        let port = port.parse::<u16>().map_err(|_| {
            raise_error!(
                format!("IMAP address '{}' has an invalid port", addr),
                ErrorCode::InvalidParameter
            )
        })?;

        let encryption = self.encryption.clone().unwrap_or(if port == IMPLICIT_TLS_PORT {
            Encryption::Ssl
        } else {
            Encryption::StartTls
        });

        Ok(ImapEndpoint {
            host: host.to_string(),
            port,
            encryption,
        })
    }

    pub fn validate(&self, role: &str) -> MailMoverResult<()> {
        if self.username.trim().is_empty() {
            return Err(raise_error!(
                format!("The {} account is missing a username", role),
                ErrorCode::MissingConfiguration
            ));
        }
        if self.password.is_empty() {
            return Err(raise_error!(
                format!("The {} account '{}' is missing a password", role, self.username),
                ErrorCode::MissingConfiguration
            ));
        }
        if self.username.contains('@') {
            validate_email!(&self.username)?;
        }
        self.endpoint().map(|_| ())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"********")
            .field("imap_addr", &self.imap_addr)
            .field("encryption", &self.encryption)
            .finish()
    }
}

/// The two stores of a single run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountPair {
    /// Account messages are moved out of.
    #[serde(alias = "source")]
    pub main: Account,
    /// Account messages are moved into.
    pub archive: Account,
}

impl AccountPair {
    pub fn validate(&self) -> MailMoverResult<()> {
        self.main.validate("main")?;
        self.archive.validate("archive")
    }
}
