//! # Client
//!
//! FTP/FTPS client: connection setup, command exchanges, data transfers and
//! configuration.

mod channel;
mod data_stream;
mod passive;
pub mod tls;
mod transfer;

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use async_std::io::{Read, Write};
use async_std::net::{TcpStream, ToSocketAddrs};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use self::channel::ControlChannel;
use self::data_stream::DataStream;
pub use self::passive::PassiveStreamBuilder;
#[cfg(feature = "secure")]
use self::tls::TlsConnector;
use self::tls::TlsStream;
use self::transfer::TransferResolver;
use crate::command::feat::parse_features;
use crate::command::Command;
#[cfg(feature = "secure")]
use crate::command::ProtectionLevel;
use crate::list::{self, File, ListParser};
use crate::regex::{MDTM_RE, SIZE_RE};
use crate::types::{
    Features, FileStructure, FileType, FtpError, FtpResult, Mode, Response, TextEncoding,
};
use crate::Status;

/// Listing command dialects, tried in order of preference until the server
/// accepts one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListCommand {
    Mlsd,
    ListHidden,
    List,
}

impl ListCommand {
    fn command(self, path: Option<&str>) -> Command {
        match self {
            ListCommand::Mlsd => Command::Mlsd(path.map(String::from)),
            ListCommand::ListHidden => Command::List(Some(match path {
                Some(path) => format!("-a {path}"),
                None => String::from("-a"),
            })),
            ListCommand::List => Command::List(path.map(String::from)),
        }
    }
}

/// FTP client bound to one control connection.
///
/// The type parameter selects the TLS backend; plain clients use the
/// [`FtpClient`](crate::FtpClient) alias and never name it.
pub struct ImplFtpClient<T>
where
    T: TlsStream + Send,
{
    channel: ControlChannel<T>,
    welcome_msg: Option<String>,
    mode: Mode,
    mode_fallback: Option<Mode>,
    list_command: ListCommand,
    list_fallbacks: Vec<ListCommand>,
    list_parser: Option<Box<dyn ListParser>>,
    passive_stream_builder: Box<PassiveStreamBuilder>,
    #[cfg(feature = "secure")]
    tls_ctx: Option<(Box<dyn TlsConnector<Stream = T> + Send + Sync + 'static>, String)>,
}

impl<T> ImplFtpClient<T>
where
    T: TlsStream + Send + 'static,
{
    // -- connection

    /// Creates a client and connects to the specified address.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> FtpResult<Self> {
        debug!("Connecting to server");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(FtpError::ConnectionError)?;
        Self::connect_with_stream(stream).await
    }

    /// Like [`Self::connect`], but gives up when the TCP connection is not
    /// established within `timeout`.
    pub async fn connect_timeout(addr: SocketAddr, timeout: Duration) -> FtpResult<Self> {
        debug!("Connecting to server {addr}");
        let stream = async_std::io::timeout(timeout, async move { TcpStream::connect(addr).await })
            .await
            .map_err(FtpError::ConnectionError)?;
        Self::connect_with_stream(stream).await
    }

    /// Creates a client on an already connected stream and reads the server
    /// greeting off it.
    pub async fn connect_with_stream(stream: TcpStream) -> FtpResult<Self> {
        debug!("Established connection with server");
        let mut client = Self {
            channel: ControlChannel::new(DataStream::Tcp(stream)),
            welcome_msg: None,
            mode: Mode::ExtendedPassive,
            mode_fallback: Some(Mode::Passive),
            list_command: ListCommand::Mlsd,
            list_fallbacks: vec![ListCommand::ListHidden, ListCommand::List],
            list_parser: None,
            passive_stream_builder: passive::default_passive_stream_builder(),
            #[cfg(feature = "secure")]
            tls_ctx: None,
        };
        debug!("Reading server greeting");
        client.channel.begin()?;
        let greeting = client.channel.read_reply_in(&[Status::Ready]).await;
        client.channel.finish();
        let response = greeting?;
        debug!("Server READY; {}", response.first_line());
        client.welcome_msg = Some(response.message);
        Ok(client)
    }

    /// Upgrade the control connection to TLS (`AUTH TLS`), then require the
    /// same protection for data connections (`PBSZ 0`, `PROT P`). Data
    /// connections opened from here on are negotiated through `tls_connector`
    /// with the same `domain`.
    #[cfg(feature = "secure")]
    pub async fn into_secure(
        mut self,
        tls_connector: impl TlsConnector<Stream = T> + Send + Sync + 'static,
        domain: &str,
    ) -> FtpResult<Self> {
        debug!("Initializing TLS auth");
        self.channel.begin()?;
        let auth = async {
            self.channel.send_command(Command::Auth).await?;
            self.channel.read_reply_in(&[Status::AuthAccepted]).await
        }
        .await;
        self.channel.finish();
        auth?;
        debug!("TLS OK; initializing ssl stream");
        let stream = self.channel.take_stream()?;
        let stream = tls_connector.connect(domain, stream.into_tcp_stream()).await?;
        self.channel.replace_stream(DataStream::Ssl(Box::new(stream)));
        self.tls_ctx = Some((Box::new(tls_connector), String::from(domain)));
        debug!("TLS stream OK");
        // Set protection buffer size
        self.exec(Command::Pbsz(0), &[Status::CommandOk]).await?;
        // Change the level of data protection to Private
        self.exec(Command::Prot(ProtectionLevel::Private), &[Status::CommandOk])
            .await?;
        Ok(self)
    }

    /// Switch the control channel back to clear text (`CCC`), keeping the
    /// negotiated protection for data connections. Lets NAT devices rewrite
    /// PASV/EPSV replies again.
    #[cfg(feature = "secure")]
    pub async fn clear_command_channel(mut self) -> FtpResult<Self> {
        self.exec(Command::ClearCommandChannel, &[Status::CommandOk])
            .await?;
        trace!("CCC OK; downgrading control connection");
        let stream = self.channel.take_stream()?;
        self.channel
            .replace_stream(DataStream::Tcp(stream.into_tcp_stream()));
        Ok(self)
    }

    /// Returns welcome message retrieved from server (if available)
    pub fn get_welcome_msg(&self) -> Option<&str> {
        self.welcome_msg.as_deref()
    }

    /// Returns a reference to the underlying TcpStream, e.g. for socket options.
    pub fn get_ref(&self) -> FtpResult<&TcpStream> {
        self.channel.get_ref()
    }

    /// Log in to the server. `password` is only sent when the server asks
    /// for one.
    pub async fn login<S: AsRef<str>>(&mut self, user: S, password: S) -> FtpResult<()> {
        debug!("Signing in with user '{}'", user.as_ref());
        self.channel.begin()?;
        let result = async {
            self.channel
                .send_command(Command::User(user.as_ref().to_string()))
                .await?;
            let response = self
                .channel
                .read_reply_in(&[Status::LoggedIn, Status::NeedPassword])
                .await?;
            if response.status() == Status::NeedPassword {
                debug!("Password is required");
                self.channel
                    .send_command(Command::Pass(password.as_ref().to_string()))
                    .await?;
                self.channel.read_reply_in(&[Status::LoggedIn]).await?;
            }
            Ok(())
        }
        .await;
        self.channel.finish();
        result?;
        debug!("Login OK");
        Ok(())
    }

    /// Ping the server to keep the connection alive
    pub async fn noop(&mut self) -> FtpResult<()> {
        debug!("Pinging server");
        self.exec(Command::Noop, &[Status::CommandOk]).await?;
        Ok(())
    }

    /// Quits the current FTP session. The client is consumed and the control
    /// connection closed.
    pub async fn quit(mut self) -> FtpResult<()> {
        debug!("Quitting stream");
        self.exec(Command::Quit, &[Status::Closing]).await?;
        Ok(())
    }

    // -- file system operations

    /// Change the current directory to the path specified.
    pub async fn cwd<S: AsRef<str>>(&mut self, path: S) -> FtpResult<()> {
        debug!("Changing working directory to {}", path.as_ref());
        self.exec(Command::Cwd(path.as_ref().to_string()), &[Status::FileActionOk])
            .await?;
        Ok(())
    }

    /// Move the current directory to the parent directory.
    pub async fn cdup(&mut self) -> FtpResult<()> {
        debug!("Going to parent directory");
        self.exec(Command::Cdup, &[Status::CommandOk, Status::FileActionOk])
            .await?;
        Ok(())
    }

    /// Gets the current directory
    pub async fn pwd(&mut self) -> FtpResult<String> {
        debug!("Getting working directory");
        let response = self.exec(Command::Pwd, &[Status::PathCreated]).await?;
        match (response.message.find('"'), response.message.rfind('"')) {
            (Some(begin), Some(end)) if begin < end => {
                Ok(response.message[begin + 1..end].to_string())
            }
            _ => Err(FtpError::BadResponse(response.message)),
        }
    }

    /// This creates a new directory on the server.
    pub async fn mkdir<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<()> {
        debug!("Creating directory at {}", pathname.as_ref());
        self.exec(Command::Mkd(pathname.as_ref().to_string()), &[Status::PathCreated])
            .await?;
        Ok(())
    }

    /// Remove the remote directory from the server.
    pub async fn rmdir<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<()> {
        debug!("Removing directory {}", pathname.as_ref());
        self.exec(Command::Rmd(pathname.as_ref().to_string()), &[Status::FileActionOk])
            .await?;
        Ok(())
    }

    /// Remove the remote file from the server.
    pub async fn rm<S: AsRef<str>>(&mut self, filename: S) -> FtpResult<()> {
        debug!("Deleting file {}", filename.as_ref());
        self.exec(Command::Dele(filename.as_ref().to_string()), &[Status::FileActionOk])
            .await?;
        Ok(())
    }

    /// Remove the remote file if it exists. Returns whether the file was
    /// there: the server saying "file unavailable" counts as success.
    pub async fn rm_if_exists<S: AsRef<str>>(&mut self, filename: S) -> FtpResult<bool> {
        match self.rm(filename).await {
            Ok(()) => Ok(true),
            Err(FtpError::UnexpectedResponse(response))
                if response.status() == Status::FileUnavailable =>
            {
                debug!("File to delete was not there");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Rename the file from_name to to_name
    pub async fn rename<S: AsRef<str>>(&mut self, from_name: S, to_name: S) -> FtpResult<()> {
        debug!("Renaming '{}' to '{}'", from_name.as_ref(), to_name.as_ref());
        self.channel.begin()?;
        let result = async {
            self.channel
                .send_command(Command::RenameFrom(from_name.as_ref().to_string()))
                .await?;
            self.channel
                .read_reply_in(&[Status::FileActionPending])
                .await?;
            self.channel
                .send_command(Command::RenameTo(to_name.as_ref().to_string()))
                .await?;
            self.channel.read_reply_in(&[Status::FileActionOk]).await?;
            Ok(())
        }
        .await;
        self.channel.finish();
        result
    }

    // -- queries

    /// Retrieves the size of the file in bytes at `pathname` if it exists.
    pub async fn size<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<usize> {
        debug!("Getting file size of {}", pathname.as_ref());
        let response = self
            .exec(Command::Size(pathname.as_ref().to_string()), &[Status::FileStatus])
            .await?;
        SIZE_RE
            .captures(&response.message)
            .and_then(|caps| caps[1].parse::<usize>().ok())
            .ok_or(FtpError::BadResponse(response.message))
    }

    /// Retrieves the modification time of the file at `pathname` if it exists.
    pub async fn mdtm<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<NaiveDateTime> {
        debug!("Getting modification time of {}", pathname.as_ref());
        let response = self
            .exec(Command::Mdtm(pathname.as_ref().to_string()), &[Status::FileStatus])
            .await?;
        let caps = match MDTM_RE.captures(&response.message) {
            Some(caps) => caps,
            None => return Err(FtpError::BadResponse(response.message)),
        };
        // The regex matches only fixed-width digit runs
        let (year, month, day) = (
            caps[1].parse::<i32>().unwrap(),
            caps[2].parse::<u32>().unwrap(),
            caps[3].parse::<u32>().unwrap(),
        );
        let (hour, minute, second) = (
            caps[4].parse::<u32>().unwrap(),
            caps[5].parse::<u32>().unwrap(),
            caps[6].parse::<u32>().unwrap(),
        );
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| FtpError::BadResponse(response.message.clone()))?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)
            .ok_or_else(|| FtpError::BadResponse(response.message.clone()))?;
        Ok(NaiveDateTime::new(date, time))
    }

    /// Ask the server which extension features it supports.
    pub async fn feat(&mut self) -> FtpResult<Features> {
        debug!("Feat command");
        let response = self.exec(Command::Feat, &[Status::SystemStatus]).await?;
        parse_features(&response)
    }

    /// Set an option for a feature the server advertises, e.g.
    /// `OPTS UTF8 ON`.
    pub async fn opts<S: AsRef<str>>(&mut self, feature: S, value: Option<S>) -> FtpResult<()> {
        debug!("Setting option for {}", feature.as_ref());
        self.exec(
            Command::Opts(
                feature.as_ref().to_string(),
                value.as_ref().map(|value| value.as_ref().to_string()),
            ),
            &[Status::CommandOk],
        )
        .await?;
        Ok(())
    }

    /// Execute a `SITE` command, accepting whatever non-failure reply the
    /// server gives.
    pub async fn site<S: AsRef<str>>(&mut self, command: S) -> FtpResult<Response> {
        debug!("SITE {}", command.as_ref());
        self.exec_lenient(Command::Site(command.as_ref().to_string()))
            .await
    }

    /// Execute a command on the server verbatim and validate the reply
    /// against `expected`.
    pub async fn custom_command<S: AsRef<str>>(
        &mut self,
        command: S,
        expected: &[Status],
    ) -> FtpResult<Response> {
        debug!("Sending custom command {}", command.as_ref());
        self.exec(Command::Custom(command.as_ref().to_string()), expected)
            .await
    }

    /// Sets the type of file to be transferred. That is the implementation
    /// of `TYPE` command.
    pub async fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        debug!("Setting transfer type {}", file_type);
        self.exec(Command::Type(file_type), &[Status::CommandOk])
            .await?;
        Ok(())
    }

    /// Sets the file structure (`STRU`); only `F`ile is defined.
    pub async fn structure(&mut self, structure: FileStructure) -> FtpResult<()> {
        debug!("Setting file structure {}", structure);
        self.exec(Command::Stru(structure), &[Status::CommandOk])
            .await?;
        Ok(())
    }

    // -- transfers

    /// Store `source` on the server at `filename`. Returns the number of
    /// bytes written.
    pub async fn upload_from<S, R>(&mut self, filename: S, source: &mut R) -> FtpResult<u64>
    where
        S: AsRef<str>,
        R: Read + Unpin + ?Sized,
    {
        debug!("Uploading file {}", filename.as_ref());
        let command = Command::Store(filename.as_ref().to_string());
        self.channel.begin()?;
        let result = async {
            let (data, resolver) = self.open_data_stream(command, None).await?;
            transfer::upload_stream(&mut self.channel, data, source, resolver).await
        }
        .await;
        self.channel.finish();
        result
    }

    /// Append `source` to the file at `filename`, creating it if missing.
    /// Returns the number of bytes written.
    pub async fn append_from<S, R>(&mut self, filename: S, source: &mut R) -> FtpResult<u64>
    where
        S: AsRef<str>,
        R: Read + Unpin + ?Sized,
    {
        debug!("Appending to file {}", filename.as_ref());
        let command = Command::Appe(filename.as_ref().to_string());
        self.channel.begin()?;
        let result = async {
            let (data, resolver) = self.open_data_stream(command, None).await?;
            transfer::upload_stream(&mut self.channel, data, source, resolver).await
        }
        .await;
        self.channel.finish();
        result
    }

    /// Retrieve `filename` into `sink`, resuming from byte `offset` when it
    /// is greater than zero. Returns the number of bytes received.
    pub async fn download_to<S, W>(
        &mut self,
        filename: S,
        sink: &mut W,
        offset: usize,
    ) -> FtpResult<u64>
    where
        S: AsRef<str>,
        W: Write + Unpin + ?Sized,
    {
        debug!("Retrieving '{}'", filename.as_ref());
        let command = Command::Retr(filename.as_ref().to_string());
        let offset = (offset > 0).then_some(offset);
        self.channel.begin()?;
        let result = async {
            let (data, resolver) = self.open_data_stream(command, offset).await?;
            transfer::download_stream(&mut self.channel, data, sink, resolver).await
        }
        .await;
        self.channel.finish();
        result
    }

    /// List the files in the given directory, or the current one. The payload
    /// format is auto-detected unless a parser was installed with
    /// [`Self::list_parser`].
    pub async fn list(&mut self, pathname: Option<&str>) -> FtpResult<Vec<File>> {
        debug!(
            "Reading {} directory content",
            pathname.unwrap_or("working")
        );
        let payload = self.fetch_listing(pathname).await?;
        match &self.list_parser {
            Some(parser) => Ok(list::parse_listing_with(parser.as_ref(), &payload)),
            None => list::parse_listing(&payload),
        }
    }

    /// Get the plain names of the files in the given directory, or the
    /// current one.
    pub async fn nlst(&mut self, pathname: Option<&str>) -> FtpResult<Vec<String>> {
        debug!(
            "Getting file names for {} directory",
            pathname.unwrap_or("working")
        );
        let payload = self
            .transfer_text(Command::Nlst(pathname.map(String::from)))
            .await?;
        Ok(payload
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    // -- configuration

    /// Set the data-connection mode explicitly, disabling the automatic
    /// fallback from extended passive to passive.
    pub fn set_mode(&mut self, mode: Mode) {
        debug!("Changed mode to {:?}", mode);
        self.mode = mode;
        self.mode_fallback = None;
    }

    /// Set the stream builder used to open data connections, e.g. to go
    /// through a proxy or to bind a specific interface.
    pub fn passive_stream_builder<F>(mut self, stream_builder: F) -> Self
    where
        F: Fn(SocketAddr) -> Pin<Box<dyn Future<Output = FtpResult<TcpStream>> + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        self.passive_stream_builder = Box::new(stream_builder);
        self
    }

    /// Install a custom directory-listing parser, replacing the built-in
    /// format detection.
    pub fn list_parser(mut self, parser: Box<dyn ListParser>) -> Self {
        self.list_parser = Some(parser);
        self
    }

    /// Text encoding used for commands, replies and listing payloads
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.channel.set_encoding(encoding);
    }

    /// Inactivity timeout applied while a command or a transfer is in
    /// progress. `None` waits forever.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.channel.set_read_timeout(timeout);
    }

    // -- internals

    /// Run one command exchange as a whole task
    async fn exec(&mut self, command: Command, expected: &[Status]) -> FtpResult<Response> {
        self.channel.begin()?;
        let result = async {
            self.channel.send_command(command).await?;
            self.channel.read_reply_in(expected).await
        }
        .await;
        self.channel.finish();
        result
    }

    /// Run one command exchange, accepting any reply that is not a failure
    async fn exec_lenient(&mut self, command: Command) -> FtpResult<Response> {
        self.channel.begin()?;
        let result = async {
            self.channel.send_command(command).await?;
            let response = self.channel.read_reply().await?;
            if response.is_failure() {
                Err(FtpError::UnexpectedResponse(response))
            } else {
                Ok(response)
            }
        }
        .await;
        self.channel.finish();
        result
    }

    /// Run one listing transfer and return the decoded payload
    async fn transfer_text(&mut self, command: Command) -> FtpResult<String> {
        self.channel.begin()?;
        let result = async {
            let (data, resolver) = self.open_data_stream(command, None).await?;
            let mut payload: Vec<u8> = Vec::new();
            transfer::download_stream(&mut self.channel, data, &mut payload, resolver).await?;
            Ok(self.channel.encoding().decode(&payload))
        }
        .await;
        self.channel.finish();
        result
    }

    /// Fetch a raw directory listing, trying each listing dialect until the
    /// server accepts one and remembering the winner for this session.
    async fn fetch_listing(&mut self, path: Option<&str>) -> FtpResult<String> {
        let mut variant = self.list_command;
        let mut fallbacks = self.list_fallbacks.clone().into_iter();
        let mut first_rejection: Option<FtpError> = None;
        loop {
            match self.transfer_text(variant.command(path)).await {
                Ok(payload) => {
                    self.list_command = variant;
                    self.list_fallbacks.clear();
                    return Ok(payload);
                }
                Err(FtpError::UnexpectedResponse(response)) if response.code >= 500 => {
                    debug!("Listing command {variant:?} rejected by the server: {response}");
                    let rejection = FtpError::UnexpectedResponse(response);
                    match fallbacks.next() {
                        Some(next) => {
                            first_rejection.get_or_insert(rejection);
                            variant = next;
                        }
                        None => return Err(first_rejection.unwrap_or(rejection)),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Negotiate a passive data connection, announce `command` over the
    /// control channel and wait for the server's go-ahead.
    async fn open_data_stream(
        &mut self,
        command: Command,
        offset: Option<usize>,
    ) -> FtpResult<(DataStream<T>, TransferResolver)> {
        let (mode, stream) = passive::negotiate_data_addr(
            &mut self.channel,
            &self.passive_stream_builder,
            self.mode,
            self.mode_fallback,
        )
        .await?;
        if self.mode_fallback.is_some() {
            debug!("Transfer mode {mode:?} accepted; keeping it for this session");
            self.mode = mode;
            self.mode_fallback = None;
        }
        if let Some(offset) = offset {
            debug!("Restarting transfer at offset {offset}");
            self.channel.send_command(Command::Rest(offset)).await?;
            self.channel
                .read_reply_in(&[Status::FileActionPending])
                .await?;
        }
        self.channel.send_command(command).await?;
        let reply = self.channel.read_reply().await?;
        let resolver = if reply.is_preliminary() {
            TransferResolver::default()
        } else if reply.is_completion() {
            debug!("Server confirmed the transfer before the data connection was used: {reply}");
            TransferResolver::resolved_early(reply)
        } else if reply.is_intermediate() {
            let cause = format!("unexpected intermediate reply opening a transfer: {reply}");
            error!("{cause}");
            self.channel.close(&cause);
            return Err(FtpError::ConnectionClosed(cause));
        } else {
            // transfer refused; the unused data socket is discarded and the
            // channel stays usable
            return Err(FtpError::UnexpectedResponse(reply));
        };
        let data = self.secure_data_stream(stream).await?;
        Ok((data, resolver))
    }

    #[cfg(feature = "secure")]
    async fn secure_data_stream(&self, stream: TcpStream) -> FtpResult<DataStream<T>> {
        match &self.tls_ctx {
            Some((tls_ctx, domain)) => {
                debug!("Securing data connection with TLS");
                tls_ctx
                    .connect(domain, stream)
                    .await
                    .map(|stream| DataStream::Ssl(Box::new(stream)))
            }
            None => Ok(DataStream::Tcp(stream)),
        }
    }

    #[cfg(not(feature = "secure"))]
    async fn secure_data_stream(&self, stream: TcpStream) -> FtpResult<DataStream<T>> {
        Ok(DataStream::Tcp(stream))
    }
}
