// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ErrorCode {
    // Configuration errors (10000–10999)
    InvalidParameter = 10000,
    MissingConfiguration = 10020,
    ConfigFileParseError = 10030,

    // Network connection errors (40000–40999)
    NetworkError = 40000,
    ConnectionTimeout = 40010,
    ImapAuthenticationFailed = 40020,
    Incompatible = 40030,

    // Mail service errors (50000–50999)
    ImapCommandFailed = 50000,
    ImapUnexpectedResult = 50020,

    // Data integrity errors (60000–60999)
    MessageNotLocatable = 60000,

    // Internal system errors (70000–70999)
    InternalError = 70000,
}

/// Failure classes a run distinguishes when deciding how to terminate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Protocol,
    DataIntegrity,
    Internal,
}

impl ErrorCode {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::InvalidParameter
            | ErrorCode::MissingConfiguration
            | ErrorCode::ConfigFileParseError => ErrorKind::Configuration,
            ErrorCode::NetworkError
            | ErrorCode::ConnectionTimeout
            | ErrorCode::ImapAuthenticationFailed
            | ErrorCode::Incompatible => ErrorKind::Connection,
            ErrorCode::ImapCommandFailed | ErrorCode::ImapUnexpectedResult => {
                ErrorKind::Protocol
            }
            ErrorCode::MessageNotLocatable => ErrorKind::DataIntegrity,
            ErrorCode::InternalError => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Protocol => "ProtocolError",
            ErrorKind::DataIntegrity => "DataIntegrityError",
            ErrorKind::Internal => "InternalError",
        };
        write!(f, "{}", kind)
    }
}
