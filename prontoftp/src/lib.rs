#![crate_name = "prontoftp"]
#![crate_type = "lib"]

//! # ProntoFTP
//!
//! ProntoFTP is an async FTP client library for Rust with optional FTPS support,
//! built on [async-std](https://crates.io/crates/async-std). Beyond the usual
//! session commands it gives you:
//!
//! - Streamed uploads and downloads over any `Read`/`Write` source or sink, with resume (`REST`)
//! - A parser for directory listings which understands MLSX, POSIX ls, DOS and EPLF formats
//! - Automatic fallback from `EPSV` to `PASV` and from `MLSD` to `LIST`, remembering what the server accepted
//! - A workaround for servers behind NAT announcing unroutable addresses
//! - Explicit FTPS (`AUTH TLS`) through either native-tls or rustls
//! - Error codes you can match on, and a connection that refuses further use once it is out of sync
//!
//! ## Get started
//!
//! To get started, first add **prontoftp** to your dependencies:
//!
//! ```toml
//! prontoftp = "^0.1.0"
//! ```
//!
//! ### Features
//!
//! #### SSL/TLS Support
//!
//! If you want to enable **support for FTPS**, you must enable the `native-tls` or `rustls` feature
//! in your cargo dependencies, based on the TLS provider you prefer.
//!
//! ```toml
//! prontoftp = { version = "^0.1.0", features = ["native-tls"] }
//! # or
//! prontoftp = { version = "^0.1.0", features = ["rustls"] }
//! ```
//!
//! > 💡 If you don't know what to choose, `native-tls` should be preferred for compatibility reasons.
//!
//! #### Logging
//!
//! ProntoFTP logs command exchanges through the [log](https://crates.io/crates/log) facade, with
//! payloads at trace level. If that is unwanted, the `no-log` feature replaces every log call
//! with a no-op.
//!
//! ## Usage
//!
//! ```no_run
//! use prontoftp::{FtpClient, FtpResult};
//!
//! async fn example() -> FtpResult<()> {
//!     let mut client = FtpClient::connect("127.0.0.1:10021").await?;
//!     client.login("test", "test").await?;
//!     for file in client.list(None).await? {
//!         println!("{} ({} bytes)", file.name(), file.size());
//!     }
//!     // Disconnect from server
//!     client.quit().await
//! }
//! ```
//!
//! ## FTPS
//!
//! The client uses explicit mode for FTPS: connect as usual, then switch to the secure
//! mode with [`ImplFtpClient::into_secure`] before authenticating. Data connections
//! are protected with the same TLS configuration from then on.
//!
//! ```ignore
//! use prontoftp::async_native_tls::TlsConnector;
//! use prontoftp::{FtpResult, NativeTlsFtpClient};
//!
//! async fn example() -> FtpResult<()> {
//!     let client = NativeTlsFtpClient::connect("test.rebex.net:21").await?;
//!     // Switch to the secure mode
//!     let mut client = client.into_secure(TlsConnector::new().into(), "test.rebex.net").await?;
//!     client.login("demo", "password").await?;
//!     // Do other secret stuff
//!     client.quit().await
//! }
//! ```
//!

// -- common deps
#[macro_use]
extern crate lazy_regex;
#[macro_use]
extern crate log;

// -- private
mod client;
pub(crate) mod command;
mod frame;
mod regex;
mod status;

// -- public
pub mod list;
pub mod types;

// -- secure deps
#[cfg(feature = "native-tls")]
pub extern crate async_native_tls;
#[cfg(feature = "rustls")]
pub extern crate futures_rustls;

// -- export tls types
#[cfg(feature = "native-tls")]
pub use client::tls::{NativeTlsConnector, NativeTlsStream};
#[cfg(feature = "rustls")]
pub use client::tls::{RustlsConnector, RustlsStream};
#[cfg(feature = "secure")]
pub use client::tls::TlsConnector;
pub use client::tls::{NoTlsStream, TlsStream};
// -- export client
pub use client::{ImplFtpClient, PassiveStreamBuilder};
// -- export (common)
pub use status::Status;
pub use types::{FtpError, FtpResult, Mode, Response};

/// An FTP client over a plain text connection
pub type FtpClient = ImplFtpClient<NoTlsStream>;

/// An FTP client which can upgrade to FTPS through native-tls
#[cfg(feature = "native-tls")]
pub type NativeTlsFtpClient = ImplFtpClient<NativeTlsStream>;

/// An FTP client which can upgrade to FTPS through rustls
#[cfg(feature = "rustls")]
pub type RustlsFtpClient = ImplFtpClient<RustlsStream>;

// -- test logging
#[cfg(test)]
pub fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
