// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::ImapEndpoint;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::raise_error;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tokio_io_timeout::TimeoutStream;
use tracing::{debug, warn};

/// Budget for resolving and connecting to the server.
pub(crate) const DIAL_TIMEOUT: Duration = Duration::from_secs(30);
/// Budget for any single read or write once connected.
pub(crate) const IO_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) type TcpTransport = Pin<Box<TimeoutStream<TcpStream>>>;

/// Resolves the endpoint and connects to the first address that answers.
pub(crate) async fn dial(endpoint: &ImapEndpoint) -> MailMoverResult<TcpTransport> {
    let target = format!("{}:{}", endpoint.host, endpoint.port);
    let stream = timeout(DIAL_TIMEOUT, connect_any(&target))
        .await
        .map_err(|_| {
            raise_error!(
                format!(
                    "Connecting to {} timed out after {}s",
                    target,
                    DIAL_TIMEOUT.as_secs()
                ),
                ErrorCode::ConnectionTimeout
            )
        })??;

    stream
        .set_nodelay(true)
        .map_err(|e| raise_error!(e.to_string(), ErrorCode::NetworkError))?;

    let mut transport = TimeoutStream::new(stream);
    transport.set_read_timeout(Some(IO_TIMEOUT));
    transport.set_write_timeout(Some(IO_TIMEOUT));
    Ok(Box::pin(transport))
}

async fn connect_any(target: &str) -> MailMoverResult<TcpStream> {
    let addresses = lookup_host(target).await.map_err(|e| {
        raise_error!(
            format!("Cannot resolve {}: {}", target, e),
            ErrorCode::NetworkError
        )
    })?;

    let mut last_error = None;
    for address in addresses {
        debug!("Connecting to {} ({})", target, address);
        match TcpStream::connect(address).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                warn!("Connection to {} failed: {}", address, e);
                last_error = Some(e);
            }
        }
    }

    Err(raise_error!(
        match last_error {
            Some(e) => format!("Cannot connect to {}: {}", target, e),
            None => format!("{} resolved to no addresses", target),
        },
        ErrorCode::NetworkError
    ))
}
