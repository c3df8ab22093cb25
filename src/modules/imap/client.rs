// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::{Encryption, ImapEndpoint};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::imap::session::{ImapSession, SessionStream};
use crate::modules::utils::net::{dial, TcpTransport};
use crate::modules::utils::tls::establish_tls_stream;
use crate::raise_error;
use async_imap::Client as ImapClient;
use tokio::io::BufWriter;
use tracing::debug;

type Connection = ImapClient<Box<dyn SessionStream>>;

/// An unauthenticated connection that has already consumed the greeting.
#[derive(Debug)]
pub(crate) struct Client {
    inner: Connection,
}

fn alpn(port: u16) -> &'static [&'static str] {
    if port == 993 {
        &[]
    } else {
        &["imap"]
    }
}

fn boxed<S: SessionStream + 'static>(stream: S) -> Box<dyn SessionStream> {
    Box::new(BufWriter::new(stream))
}

impl Client {
    pub(crate) async fn connection(endpoint: &ImapEndpoint) -> MailMoverResult<Self> {
        debug!(
            "Opening IMAP connection to {}:{} ({:?})",
            endpoint.host, endpoint.port, endpoint.encryption
        );
        let transport = dial(endpoint).await?;
        let stream = match endpoint.encryption {
            Encryption::Ssl => boxed(
                establish_tls_stream(&endpoint.host, alpn(endpoint.port), transport).await?,
            ),
            Encryption::StartTls => return Self::upgrade(transport, &endpoint.host).await,
            Encryption::None => boxed(transport),
        };

        let mut inner = ImapClient::new(stream);
        read_greeting(&mut inner).await?;
        Ok(Self { inner })
    }

    /// Reads the plaintext greeting, issues STARTTLS and continues over TLS.
    /// The server sends no second greeting after the handshake.
    async fn upgrade(transport: TcpTransport, host: &str) -> MailMoverResult<Self> {
        let mut plain = ImapClient::new(BufWriter::new(transport));
        read_greeting(&mut plain).await?;
        plain
            .run_command_and_check_ok("STARTTLS", None)
            .await
            .map_err(|e| {
                raise_error!(
                    format!("STARTTLS was refused by {}: {:#?}", host, e),
                    ErrorCode::ImapCommandFailed
                )
            })?;

        let transport = plain.into_inner().into_inner();
        let tls = establish_tls_stream(host, &[], transport).await?;
        Ok(Self {
            inner: ImapClient::new(boxed(tls)),
        })
    }

    pub(crate) async fn login(self, username: &str, password: &str) -> MailMoverResult<ImapSession> {
        self.inner
            .login(username, password)
            .await
            .map_err(|(e, _)| {
                raise_error!(
                    format!("Login as '{}' was rejected: {:#?}", username, e),
                    ErrorCode::ImapAuthenticationFailed
                )
            })
    }
}

async fn read_greeting<T>(client: &mut ImapClient<T>) -> MailMoverResult<()>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + std::fmt::Debug + Send,
{
    client
        .read_response()
        .await
        .map_err(|e| {
            raise_error!(
                format!("Reading the server greeting failed: {}", e),
                ErrorCode::NetworkError
            )
        })?
        .ok_or_else(|| {
            raise_error!(
                "Connection closed before the server greeting".into(),
                ErrorCode::NetworkError
            )
        })?;
    Ok(())
}
