//! # Transfer
//!
//! Data-transfer drivers. A transfer is finished only once the data socket
//! has completed *and* the server has sent its closing reply, in whichever
//! order those happen; while the data socket is live, control replies are
//! raced against data progress so an early server verdict is never missed.
//!
//! A failure on the data side (the socket, its timeout, or the local stream
//! being fed) fails only the transfer: the verdict the server still owes is
//! absorbed and the control channel stays in service. Only control-side
//! failures close the whole channel.

use std::time::Duration;

use async_std::future::timeout;
use futures_lite::future::or;
use futures_lite::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::channel::ControlChannel;
use super::data_stream::DataStream;
use super::tls::TlsStream;
use crate::types::{FtpError, FtpResult, Response};

const CHUNK_SIZE: usize = 8192;

/// Completion barrier for one transfer
#[derive(Debug, Default)]
pub struct TransferResolver {
    pub data_done: bool,
    pub control_result: Option<Response>,
}

impl TransferResolver {
    /// Barrier with the server's verdict already in, for the odd server that
    /// sends its closing reply before the data connection is used
    pub fn resolved_early(response: Response) -> Self {
        Self {
            data_done: false,
            control_result: Some(response),
        }
    }
}

/// Outcome of one round of the transfer window
enum Step {
    Data(std::io::Result<usize>),
    Control(FtpResult<Response>),
}

/// Sort a control reply received while the transfer runs. Completion replies
/// feed the barrier and extra preliminary ones are ignored. A failure rejects
/// the transfer but leaves the channel usable. An intermediate reply is the
/// server asking a question this exchange cannot answer, which leaves the
/// conversation in a state the client cannot recover: the channel closes.
fn absorb_reply<T>(
    channel: &mut ControlChannel<T>,
    resolver: &mut TransferResolver,
    response: Response,
) -> FtpResult<()>
where
    T: TlsStream + Send,
{
    if response.is_completion() {
        resolver.control_result = Some(response);
        Ok(())
    } else if response.is_preliminary() {
        trace!("Ignoring extra preliminary reply during transfer: {response}");
        Ok(())
    } else if response.is_intermediate() {
        let cause = format!("unexpected intermediate reply during a transfer: {response}");
        error!("{cause}");
        channel.close(&cause);
        Err(FtpError::ConnectionClosed(cause))
    } else {
        Err(FtpError::UnexpectedResponse(response))
    }
}

/// Run `op` under the inactivity timeout when one is configured
async fn within<F, O>(limit: Option<Duration>, op: F) -> std::io::Result<O>
where
    F: std::future::Future<Output = std::io::Result<O>>,
{
    match limit {
        Some(limit) => match timeout(limit, op).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "timed out during data transfer",
            )),
        },
        None => op.await,
    }
}

/// A transfer abandoned mid-flight still owes the control channel a verdict;
/// read replies until it lands, then hand back `err` as the operation error.
/// Failure and completion replies both settle the exchange. An intermediate
/// reply or a fault on the (armed again) control read still closes the
/// channel.
async fn abandon_transfer<T>(
    channel: &mut ControlChannel<T>,
    resolver: &TransferResolver,
    err: std::io::Error,
) -> FtpError
where
    T: TlsStream + Send,
{
    let mut pending = resolver.control_result.is_none();
    while pending {
        match channel.read_reply().await {
            Ok(response) if response.is_preliminary() => {
                trace!("Ignoring preliminary reply while abandoning a transfer: {response}");
            }
            Ok(response) if response.is_intermediate() => {
                let cause = format!("unexpected intermediate reply during a transfer: {response}");
                error!("{cause}");
                channel.close(&cause);
                pending = false;
            }
            Ok(response) => {
                debug!("Server verdict for the abandoned transfer: {response}");
                pending = false;
            }
            // the read has already closed the channel with its own cause
            Err(_) => pending = false,
        }
    }
    FtpError::ConnectionError(err)
}

/// Drain the data connection into `sink`. Returns the number of bytes
/// received once the server has also confirmed the transfer.
pub async fn download_stream<T, W>(
    channel: &mut ControlChannel<T>,
    mut data: DataStream<T>,
    sink: &mut W,
    mut resolver: TransferResolver,
) -> FtpResult<u64>
where
    T: TlsStream + Send,
    W: AsyncWrite + Unpin + ?Sized,
{
    let limit = channel.read_timeout();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut received: u64 = 0;
    while !resolver.data_done {
        let step = or(
            async { Step::Data(within(limit, data.read(&mut buf)).await) },
            async { Step::Control(channel.read_reply_untimed().await) },
        )
        .await;
        match step {
            Step::Data(Ok(0)) => resolver.data_done = true,
            Step::Data(Ok(len)) => {
                if let Err(err) = sink.write_all(&buf[..len]).await {
                    drop(data);
                    return Err(abandon_transfer(channel, &resolver, err).await);
                }
                received += len as u64;
            }
            Step::Data(Err(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                // a TLS peer may drop the link without a close_notify once
                // the payload is over; treat it as end of stream
                debug!("Data connection ended without close_notify");
                resolver.data_done = true;
            }
            Step::Data(Err(err)) => {
                drop(data);
                return Err(abandon_transfer(channel, &resolver, err).await);
            }
            Step::Control(Ok(response)) => absorb_reply(channel, &mut resolver, response)?,
            Step::Control(Err(err)) => return Err(err),
        }
    }
    // the server sends its verdict once it sees the data connection close
    drop(data);
    trace!("Data connection done after {received} bytes, awaiting transfer reply");
    while resolver.control_result.is_none() {
        let response = channel.read_reply().await?;
        absorb_reply(channel, &mut resolver, response)?;
    }
    sink.flush().await.map_err(FtpError::ConnectionError)?;
    Ok(received)
}

/// Feed `source` into the data connection. Returns the number of bytes sent
/// once the server has also confirmed the transfer.
pub async fn upload_stream<T, R>(
    channel: &mut ControlChannel<T>,
    mut data: DataStream<T>,
    source: &mut R,
    mut resolver: TransferResolver,
) -> FtpResult<u64>
where
    T: TlsStream + Send,
    R: AsyncRead + Unpin + ?Sized,
{
    let limit = channel.read_timeout();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let len = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(len) => len,
            Err(err) => {
                drop(data);
                return Err(abandon_transfer(channel, &resolver, err).await);
            }
        };
        let mut pos = 0;
        while pos < len {
            let step = or(
                async { Step::Data(within(limit, data.write(&buf[pos..len])).await) },
                async { Step::Control(channel.read_reply_untimed().await) },
            )
            .await;
            match step {
                Step::Data(Ok(0)) => {
                    drop(data);
                    let err = std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "data connection refused further bytes",
                    );
                    return Err(abandon_transfer(channel, &resolver, err).await);
                }
                Step::Data(Ok(written)) => {
                    pos += written;
                    sent += written as u64;
                }
                Step::Data(Err(err)) => {
                    drop(data);
                    return Err(abandon_transfer(channel, &resolver, err).await);
                }
                Step::Control(Ok(response)) => absorb_reply(channel, &mut resolver, response)?,
                Step::Control(Err(err)) => return Err(err),
            }
        }
    }
    // close_notify and FIN are what tell the server the upload is complete
    if let Err(err) = within(limit, data.close()).await {
        drop(data);
        return Err(abandon_transfer(channel, &resolver, err).await);
    }
    drop(data);
    resolver.data_done = true;
    trace!("Data connection closed after {sent} bytes, awaiting transfer reply");
    while resolver.control_result.is_none() {
        let response = channel.read_reply().await?;
        absorb_reply(channel, &mut resolver, response)?;
    }
    Ok(sent)
}
