//! # Types
//!
//! Shared types for the FTP client: errors, replies, transfer settings.

use std::collections::HashMap;
use std::fmt;
use std::net::AddrParseError;

use thiserror::Error;

use crate::Status;

/// A shorthand for a Result whose error type is always an FtpError.
pub type FtpResult<T> = std::result::Result<T, FtpError>;

/// `FtpError` is a library-global error type to describe the different kinds of
/// errors that might occur while using FTP.
///
/// Three families of failures are covered, and callers can rely on the split:
///
/// - [`FtpError::UnexpectedResponse`] is the server refusing or mishandling a
///   single request; the control connection stays usable.
/// - [`FtpError::ConnectionError`], [`FtpError::ConnectionClosed`],
///   [`FtpError::PendingTask`] and [`FtpError::SecureError`] are faults of the
///   connection itself; the channel has been torn down and must be reopened.
/// - [`FtpError::BadResponse`], [`FtpError::UnknownListFormat`] and
///   [`FtpError::InvalidAddress`] mean the peer sent text this client could not
///   make sense of; only the operation in flight fails.
#[derive(Debug, Error)]
pub enum FtpError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(std::io::Error),
    /// The channel was closed by an earlier fault; contains the rendered cause
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),
    /// A command was submitted while a previous one was still being serviced
    #[error("A command is already in progress on this connection")]
    PendingTask,
    /// There was an error with the secure stream
    #[cfg(feature = "secure")]
    #[cfg_attr(docsrs, doc(cfg(feature = "secure")))]
    #[error("Secure error: {0}")]
    SecureError(String),
    /// Unexpected response from remote. The command expected a certain response, but got another one.
    /// This means the ftp server refused to perform your request or there was an error while processing it.
    /// Contains the response data.
    #[error("Invalid response: {0}")]
    UnexpectedResponse(Response),
    /// The response syntax is invalid; contains the offending text verbatim
    #[error("Response contains an invalid syntax: {0}")]
    BadResponse(String),
    /// No list parser recognized the listing output; contains the sampled line verbatim.
    /// Install your own parser with `list_parser` or enable trace logging to inspect the raw lines.
    #[error("Unsupported LIST format: {0}")]
    UnknownListFormat(String),
    /// The address provided was invalid
    #[error("Invalid address: {0}")]
    InvalidAddress(AddrParseError),
}

/// Defines a response from the ftp server.
///
/// The reply code is kept as the raw number from the wire, so codes the
/// [`Status`] enum does not know about still classify correctly by range.
/// `message` holds the full reply text, every line, with CRLF normalized to LF.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub code: u32,
    pub message: String,
}

impl Response {
    /// Instantiates a new `Response`
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the [`Status`] associated to the reply code
    pub fn status(&self) -> Status {
        Status::from(self.code)
    }

    /// Whether this is a 1xx positive preliminary reply
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Whether this is a 2xx positive completion reply
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Whether this is a 3xx positive intermediate reply
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// Whether this is an error reply (4xx transient, 5xx permanent)
    pub fn is_failure(&self) -> bool {
        self.code >= 400
    }

    /// First line of the reply body, without the code prefix
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim_end()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message.trim_end())
    }
}

/// Text Format Control used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatControl {
    /// Default text format control (is NonPrint)
    Default,
    /// Non-print (not destined for printing)
    NonPrint,
    /// Telnet format control (\<CR\>, \<FF\>, etc.)
    Telnet,
    /// ASA (Fortran) Carriage Control
    Asa,
}

/// File Type used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileType {
    /// ASCII text (the argument is the text format control)
    Ascii(FormatControl),
    /// EBCDIC text (the argument is the text format control)
    Ebcdic(FormatControl),
    /// Image,
    Image,
    /// Binary (the synonym to Image)
    Binary,
    /// Local format (the argument is the number of bits in one byte on local machine)
    Local(u8),
}

/// File Structure used in `STRU` command; `File` is the only structure in
/// actual use and the only one this client negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileStructure {
    #[default]
    File,
}

/// Connection mode for data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Required by some servers (ipv6); defined in rfc 2428 <https://www.rfc-editor.org/rfc/rfc2428#section-3>
    ExtendedPassive,
    Passive,
}

/// Encoding of text on the control channel and in listing payloads.
///
/// `Utf8` is the modern default (RFC 2640). `Latin1` covers legacy servers
/// that never negotiated UTF-8; bytes are mapped through windows-1252, the
/// superset actually emitted in the wild. Decoding never fails: undecodable
/// byte sequences are replaced, so a mojibake file name cannot take down the
/// control connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl TextEncoding {
    /// Decode raw bytes received from the server
    pub(crate) fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => {
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                text.into_owned()
            }
        }
    }

    /// Encode outgoing text for the wire
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Latin1 => {
                let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(text);
                bytes.into_owned()
            }
        }
    }
}

/// Features returned by FEAT command (key, maybe value)
pub type Features = HashMap<String, Option<String>>;

impl fmt::Display for FormatControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FormatControl::Default | FormatControl::NonPrint => String::from("N"),
                FormatControl::Telnet => String::from("T"),
                FormatControl::Asa => String::from("C"),
            }
        )
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FileType::Ascii(fc) => format!("A {}", fc),
                FileType::Ebcdic(fc) => format!("E {}", fc),
                FileType::Image | FileType::Binary => String::from("I"),
                FileType::Local(bits) => format!("L {bits}"),
            }
        )
    }
}

impl fmt::Display for FileStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStructure::File => write!(f, "F"),
        }
    }
}
