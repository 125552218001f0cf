//! # Native TLS
//!
//! Native tls types for prontoftp

use std::pin::Pin;

use async_native_tls::TlsConnector as NativeConnector;
use async_native_tls::TlsStream as NativeStream;
use async_std::io::{Read, Write};
use async_std::net::TcpStream;
use async_trait::async_trait;
use pin_project::pin_project;

use super::{TlsConnector, TlsStream};
use crate::{FtpError, FtpResult};

#[derive(Debug)]
/// A Wrapper for the tls connector
pub struct NativeTlsConnector {
    connector: NativeConnector,
}

impl From<NativeConnector> for NativeTlsConnector {
    fn from(connector: NativeConnector) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl TlsConnector for NativeTlsConnector {
    type Stream = NativeTlsStream;

    async fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream> {
        self.connector
            .connect(domain, stream)
            .await
            .map(NativeTlsStream::from)
            .map_err(|e| FtpError::SecureError(e.to_string()))
    }
}

#[derive(Debug)]
#[pin_project(project = NativeTlsStreamProj)]
pub struct NativeTlsStream {
    #[pin]
    stream: NativeStream<TcpStream>,
}

impl From<NativeStream<TcpStream>> for NativeTlsStream {
    fn from(stream: NativeStream<TcpStream>) -> Self {
        Self { stream }
    }
}

impl Read for NativeTlsStream {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut [u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        self.project().stream.poll_read(cx, buf)
    }
}

impl Write for NativeTlsStream {
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

impl TlsStream for NativeTlsStream {
    fn tcp_stream(self) -> TcpStream {
        self.stream.get_ref().clone()
    }

    fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }
}
