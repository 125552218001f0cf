//! # Rustls
//!
//! rustls types for prontoftp

use std::pin::Pin;

use async_std::io::{Read, Write};
use async_std::net::TcpStream;
use async_trait::async_trait;
use futures_rustls::TlsConnector as RustlsTlsConnector;
use futures_rustls::client::TlsStream as ClientTlsStream;
use pin_project::pin_project;
use rustls_pki_types::{DnsName, ServerName};

use super::{TlsConnector, TlsStream};
use crate::{FtpError, FtpResult};

/// A Wrapper for the tls connector
pub struct RustlsConnector {
    connector: RustlsTlsConnector,
}

impl std::fmt::Debug for RustlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<?>")
    }
}

impl From<RustlsTlsConnector> for RustlsConnector {
    fn from(connector: RustlsTlsConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl TlsConnector for RustlsConnector {
    type Stream = RustlsStream;

    async fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream> {
        let server_name = ServerName::DnsName(
            DnsName::try_from(domain.to_string())
                .map_err(|e| FtpError::SecureError(e.to_string()))?,
        );

        self.connector
            .connect(server_name, stream)
            .await
            .map(RustlsStream::from)
            .map_err(|e| FtpError::SecureError(e.to_string()))
    }
}

#[derive(Debug)]
#[pin_project(project = RustlsStreamProj)]
pub struct RustlsStream {
    #[pin]
    stream: ClientTlsStream<TcpStream>,
}

impl From<ClientTlsStream<TcpStream>> for RustlsStream {
    fn from(stream: ClientTlsStream<TcpStream>) -> Self {
        Self { stream }
    }
}

impl Read for RustlsStream {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut [u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        self.project().stream.poll_read(cx, buf)
    }
}

impl Write for RustlsStream {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        self.project().stream.poll_write(cx, buf)
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        self.project().stream.poll_flush(cx)
    }

    fn poll_close(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        self.project().stream.poll_close(cx)
    }
}

impl TlsStream for RustlsStream {
    fn tcp_stream(self) -> TcpStream {
        self.stream.get_ref().0.clone()
    }

    fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref().0
    }
}
