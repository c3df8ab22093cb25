// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite, BufWriter};
use tokio_io_timeout::TimeoutStream;

/// Byte stream an IMAP session runs over, whatever the transport security.
pub trait SessionStream: AsyncRead + AsyncWrite + Unpin + Send + Sync + std::fmt::Debug {}

impl SessionStream for Box<dyn SessionStream> {}

impl<T: SessionStream> SessionStream for tokio_rustls::client::TlsStream<T> {}

impl<T: SessionStream> SessionStream for BufWriter<T> {}

impl<T: AsyncRead + AsyncWrite + Send + Sync + std::fmt::Debug> SessionStream
    for Pin<Box<TimeoutStream<T>>>
{
}

#[cfg(test)]
impl SessionStream for tokio::io::DuplexStream {}

pub type ImapSession = async_imap::Session<Box<dyn SessionStream>>;
