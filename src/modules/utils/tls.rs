// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::{
    modules::{
        error::{code::ErrorCode, MailMoverResult},
        imap::session::SessionStream,
    },
    raise_error,
};
use rustls::RootCertStore;
use std::sync::Arc;

pub async fn establish_tls_stream(
    server_hostname: &str,
    alpn_protocols: &[&str],
    stream: impl SessionStream + 'static,
) -> MailMoverResult<impl SessionStream> {
    let tls_stream = establish_rustls_stream(server_hostname, alpn_protocols, stream).await?;
    let boxed_stream: Box<dyn SessionStream> = Box::new(tls_stream);
    Ok(boxed_stream)
}

pub async fn establish_rustls_stream(
    server_hostname: &str,
    alpn_protocols: &[&str],
    stream: impl SessionStream,
) -> MailMoverResult<impl SessionStream> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.into(),
    };

    let mut config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    config.alpn_protocols = alpn_protocols
        .iter()
        .map(|s| s.as_bytes().to_vec())
        .collect();

    let tls_connector = tokio_rustls::TlsConnector::from(Arc::new(config));

    let server_name = rustls_pki_types::ServerName::try_from(server_hostname)
        .map_err(|_| {
            raise_error!(
                format!("Invalid DNS name: {}", server_hostname),
                ErrorCode::NetworkError
            )
        })?
        .to_owned();

    let tls_stream = tls_connector
        .connect(server_name, stream)
        .await
        .map_err(|e| {
            raise_error!(
                format!("TLS handshake with {} failed: {}", server_hostname, e),
                ErrorCode::NetworkError
            )
        })?;

    Ok(tls_stream)
}

/// Installs ring as the process-wide rustls provider. Must run before the
/// first connection is made.
pub fn install_crypto_provider() -> MailMoverResult<()> {
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::ring::default_provider())
        .map_err(|_| {
            raise_error!(
                "failed to set crypto provider".into(),
                ErrorCode::InternalError
            )
        })
}
