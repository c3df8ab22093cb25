// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use code::{ErrorCode, ErrorKind};
use snafu::{Location, Snafu};

pub mod code;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MailMoverError {
    #[snafu(display("{message}"))]
    Generic {
        message: String,
        #[snafu(implicit)]
        location: Location,
        code: ErrorCode,
    },
}

pub type MailMoverResult<T, E = MailMoverError> = std::result::Result<T, E>;

impl MailMoverError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MailMoverError::Generic { code, .. } => *code,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    /// Process exit status reported when this error terminates the run.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Configuration => 1,
            _ => 2,
        }
    }

    /// Logs the error with its code and source location.
    pub fn report(&self) {
        match self {
            MailMoverError::Generic {
                message,
                location,
                code,
            } => {
                tracing::error!(
                    error_code = *code as u32,
                    error_kind = %code.kind(),
                    error_message = %message,
                    error_location = ?location
                );
            }
        }
    }
}
