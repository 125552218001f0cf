//! # Channel
//!
//! State of the control connection: reply framing, the one-command-at-a-time
//! contract and the sticky closing error.

use std::collections::VecDeque;
use std::time::Duration;

use async_std::future::timeout;
use async_std::net::TcpStream;
use futures_lite::{AsyncReadExt, AsyncWriteExt};

use super::data_stream::DataStream;
use super::tls::TlsStream;
use crate::command::Command;
use crate::frame::Framer;
use crate::types::{FtpError, FtpResult, Response, TextEncoding};
use crate::Status;

/// Sticky cause set when a second exchange starts while one is outstanding
const TASK_OVERLAP_CAUSE: &str = "a previous command exchange did not run to completion";

/// The control connection.
///
/// Every command round trip must be bracketed by [`Self::begin`] and
/// [`Self::finish`]; overlapping exchanges leave the protocol state
/// unknowable, so they close the channel for good. Once closed, the original
/// cause is returned for every later call.
pub struct ControlChannel<T>
where
    T: TlsStream + Send,
{
    stream: Option<DataStream<T>>,
    /// Bytes received but not yet decoded; the tail after the last newline
    /// may end in the middle of a multi-byte character
    raw: Vec<u8>,
    framer: Framer,
    replies: VecDeque<Response>,
    closed: Option<String>,
    busy: bool,
    encoding: TextEncoding,
    timeout: Option<Duration>,
}

impl<T> ControlChannel<T>
where
    T: TlsStream + Send,
{
    pub fn new(stream: DataStream<T>) -> Self {
        Self {
            stream: Some(stream),
            raw: Vec::new(),
            framer: Framer::default(),
            replies: VecDeque::new(),
            closed: None,
            busy: false,
            encoding: TextEncoding::default(),
            timeout: None,
        }
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Start a command exchange.
    ///
    /// Fails with the sticky cause if the channel is closed. Fails with
    /// [`FtpError::PendingTask`] and closes the channel if a previous exchange
    /// is still in progress, for example because its future was dropped
    /// half-way through the protocol.
    pub fn begin(&mut self) -> FtpResult<()> {
        self.ensure_open()?;
        if self.busy {
            error!("Command submitted while a previous one is still in progress; closing control connection");
            self.close(TASK_OVERLAP_CAUSE);
            return Err(FtpError::PendingTask);
        }
        self.busy = true;
        Ok(())
    }

    /// End the exchange started by the matching [`Self::begin`]
    pub fn finish(&mut self) {
        self.busy = false;
    }

    pub fn ensure_open(&self) -> FtpResult<()> {
        if self.closed.is_some() || self.stream.is_none() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    /// Close the channel, recording `cause` as the error every later call gets
    pub fn close(&mut self, cause: &str) {
        if self.closed.is_none() {
            self.closed = Some(cause.to_string());
        }
        self.stream = None;
    }

    /// Close the channel for a socket fault and hand the fault back as the
    /// operation error
    pub fn fault(&mut self, err: std::io::Error) -> FtpError {
        debug!("Control connection fault: {err}");
        self.close(&err.to_string());
        FtpError::ConnectionError(err)
    }

    fn closed_error(&self) -> FtpError {
        let cause = self
            .closed
            .clone()
            .unwrap_or_else(|| String::from("connection closed"));
        FtpError::ConnectionClosed(cause)
    }

    /// Write one command line to the server
    pub async fn send_command(&mut self, command: Command) -> FtpResult<()> {
        self.ensure_open()?;
        trace!("CC OUT: {}", command.redacted());
        let payload = self.encoding.encode(&command.to_string());
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(self.closed_error()),
        };
        match stream.write_all(&payload).await {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fault(err)),
        }
    }

    /// Read the next reply, applying the configured timeout
    pub async fn read_reply(&mut self) -> FtpResult<Response> {
        self.next_reply(true).await
    }

    /// Read the next reply without the inactivity timeout; used while a data
    /// transfer carries the timeout on the data socket instead
    pub async fn read_reply_untimed(&mut self) -> FtpResult<Response> {
        self.next_reply(false).await
    }

    /// Read the next reply and require its status to be one of `expected`
    pub async fn read_reply_in(&mut self, expected: &[Status]) -> FtpResult<Response> {
        let response = self.read_reply().await?;
        if expected.contains(&response.status()) {
            Ok(response)
        } else {
            Err(FtpError::UnexpectedResponse(response))
        }
    }

    async fn next_reply(&mut self, armed: bool) -> FtpResult<Response> {
        loop {
            if let Some(reply) = self.replies.pop_front() {
                trace!("CC IN: {reply}");
                return Ok(reply);
            }
            self.ensure_open()?;
            self.fill(armed).await?;
        }
    }

    /// Read one chunk off the socket and frame whatever replies it completes
    async fn fill(&mut self, armed: bool) -> FtpResult<()> {
        let mut chunk = [0u8; 1024];
        let limit = self.timeout;
        let read = match self.stream.as_mut() {
            Some(stream) => match (armed, limit) {
                (true, Some(limit)) => match timeout(limit, stream.read(&mut chunk)).await {
                    Ok(result) => result,
                    Err(_) => Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "timed out while waiting for a reply",
                    )),
                },
                _ => stream.read(&mut chunk).await,
            },
            None => return Err(self.closed_error()),
        };
        match read {
            Ok(0) => Err(self.fault(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "server closed the control connection",
            ))),
            Ok(len) => {
                self.raw.extend_from_slice(&chunk[..len]);
                self.drain_lines();
                Ok(())
            }
            Err(err) => Err(self.fault(err)),
        }
    }

    /// Decode and frame the newline-terminated prefix of the receive buffer.
    /// Bytes after the last newline wait for the next chunk, so a multi-byte
    /// character split across chunks is never decoded in halves.
    fn drain_lines(&mut self) {
        let cut = match self.raw.iter().rposition(|&byte| byte == b'\n') {
            Some(cut) => cut,
            None => return,
        };
        let head = self.raw.drain(..=cut).collect::<Vec<u8>>();
        let text = self.encoding.decode(&head);
        self.replies.extend(self.framer.feed(&text));
    }

    /// Detach the control stream for a TLS upgrade of the same connection
    #[cfg(feature = "secure")]
    pub fn take_stream(&mut self) -> FtpResult<DataStream<T>> {
        self.ensure_open()?;
        match self.stream.take() {
            Some(stream) => Ok(stream),
            None => Err(self.closed_error()),
        }
    }

    /// Install the upgraded control stream. Anything buffered from before the
    /// upgrade is discarded.
    #[cfg(feature = "secure")]
    pub fn replace_stream(&mut self, stream: DataStream<T>) {
        self.raw.clear();
        self.framer = Framer::default();
        self.replies.clear();
        self.stream = Some(stream);
    }

    pub fn peer_addr(&mut self) -> FtpResult<std::net::SocketAddr> {
        let stream = match self.stream.as_ref() {
            Some(stream) => stream,
            None => return Err(self.closed_error()),
        };
        match stream.get_ref().peer_addr() {
            Ok(addr) => Ok(addr),
            Err(err) => Err(self.fault(err)),
        }
    }

    /// Reference to the underlying tcp stream, e.g. for socket options
    pub fn get_ref(&self) -> FtpResult<&TcpStream> {
        match self.stream.as_ref() {
            Some(stream) => Ok(stream.get_ref()),
            None => Err(self.closed_error()),
        }
    }
}

#[cfg(test)]
mod test {

    use async_std::net::TcpListener;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::tls::NoTlsStream;

    async fn channel_pair() -> (ControlChannel<NoTlsStream>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (ControlChannel::new(DataStream::Tcp(client)), server)
    }

    #[async_attributes::test]
    async fn should_read_reply_split_across_chunks() {
        crate::log_init();
        let (mut channel, mut server) = channel_pair().await;
        server.write_all(b"220-Welcome\r\n220 Rea").await.unwrap();
        server.flush().await.unwrap();
        server.write_all(b"dy\r\n200 Ok\r\n").await.unwrap();
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.code, 220);
        assert_eq!(reply.message.as_str(), "220-Welcome\n220 Ready");
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.code, 200);
    }

    #[async_attributes::test]
    async fn should_not_decode_a_split_character_in_halves() {
        crate::log_init();
        let (mut channel, mut server) = channel_pair().await;
        // "200 ø\r\n" with the two bytes of 'ø' in different chunks
        server.write_all(b"200 \xc3").await.unwrap();
        server.flush().await.unwrap();
        server.write_all(b"\xb8\r\n").await.unwrap();
        let reply = channel.read_reply().await.unwrap();
        assert_eq!(reply.message.as_str(), "200 \u{f8}");
    }

    #[async_attributes::test]
    async fn should_reject_overlapping_exchanges_and_close() {
        crate::log_init();
        let (mut channel, _server) = channel_pair().await;
        assert!(channel.begin().is_ok());
        assert!(matches!(channel.begin(), Err(FtpError::PendingTask)));
        channel.finish();
        // the violation is sticky even after the stale exchange is released
        assert!(matches!(
            channel.begin(),
            Err(FtpError::ConnectionClosed(cause)) if cause.as_str() == TASK_OVERLAP_CAUSE
        ));
    }

    #[async_attributes::test]
    async fn should_keep_rejecting_after_a_fault_without_touching_the_network() {
        crate::log_init();
        let (mut channel, server) = channel_pair().await;
        drop(server);
        assert!(matches!(
            channel.read_reply().await,
            Err(FtpError::ConnectionError(_))
        ));
        // no socket left to talk to; everything fails fast with the same cause
        assert!(matches!(
            channel.begin(),
            Err(FtpError::ConnectionClosed(_))
        ));
        assert!(matches!(
            channel.send_command(Command::Noop).await,
            Err(FtpError::ConnectionClosed(_))
        ));
        assert!(matches!(
            channel.read_reply().await,
            Err(FtpError::ConnectionClosed(_))
        ));
    }

    #[async_attributes::test]
    async fn should_time_out_waiting_for_a_reply() {
        crate::log_init();
        let (mut channel, _server) = channel_pair().await;
        channel.set_read_timeout(Some(Duration::from_millis(50)));
        let err = channel.read_reply().await.unwrap_err();
        match err {
            FtpError::ConnectionError(err) => {
                assert_eq!(err.kind(), std::io::ErrorKind::TimedOut)
            }
            err => panic!("expected a timeout fault, got {err:?}"),
        }
        assert!(matches!(
            channel.ensure_open(),
            Err(FtpError::ConnectionClosed(_))
        ));
    }

    #[async_attributes::test]
    async fn should_check_reply_against_expected_statuses() {
        crate::log_init();
        let (mut channel, mut server) = channel_pair().await;
        server.write_all(b"530 Not logged in\r\n").await.unwrap();
        let err = channel
            .read_reply_in(&[Status::LoggedIn, Status::NeedPassword])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FtpError::UnexpectedResponse(response) if response.code == 530
        ));
        // a refused reply does not close the channel
        assert!(channel.ensure_open().is_ok());
    }
}
