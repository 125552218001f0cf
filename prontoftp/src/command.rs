//! # Command
//!
//! The set of FTP commands

pub mod feat;

use std::string::ToString;

use crate::types::{FileStructure, FileType};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ftp commands with their arguments
pub enum Command {
    /// Append to file
    Appe(String),
    /// Set auth to TLS
    #[cfg(feature = "secure")]
    Auth,
    /// Ask server not to encrypt command channel
    #[cfg(feature = "secure")]
    ClearCommandChannel,
    /// Change directory to parent directory
    Cdup,
    /// Custom command, verbatim except for the line terminator
    Custom(String),
    /// Change working directory
    Cwd(String),
    /// Remove file at specified path
    Dele(String),
    /// Extended passive mode <https://www.rfc-editor.org/rfc/rfc2428#section-3>
    Epsv,
    /// List supported server features
    Feat,
    /// List entries at specified path. If path is not provided list entries at current working directory
    List(Option<String>),
    /// Get modification time for file at specified path
    Mdtm(String),
    /// Make directory
    Mkd(String),
    /// Machine-readable listing of specified path <https://www.rfc-editor.org/rfc/rfc3659#section-7>
    Mlsd(Option<String>),
    /// Get the list of file names at specified path. If path is not provided list entries at current working directory
    Nlst(Option<String>),
    /// Ping server
    Noop,
    /// Set an option for a feature, e.g. `OPTS UTF8 ON`
    Opts(String, Option<String>),
    /// Provide login password
    Pass(String),
    /// Passive mode
    Pasv,
    /// Protection buffer size
    #[cfg(feature = "secure")]
    Pbsz(usize),
    /// Set protection level for protocol
    #[cfg(feature = "secure")]
    Prot(ProtectionLevel),
    /// Print working directory
    Pwd,
    /// Quit
    Quit,
    /// Select file to rename
    RenameFrom(String),
    /// Rename selected file to
    RenameTo(String),
    /// Resume transfer from offset
    Rest(usize),
    /// Retrieve file
    Retr(String),
    /// Remove directory
    Rmd(String),
    /// Execute a site-specific command
    Site(String),
    /// Get file size of specified path
    Size(String),
    /// Put file at specified path
    Store(String),
    /// Set file structure
    Stru(FileStructure),
    /// Set transfer type
    Type(FileType),
    /// Provide user to login as
    User(String),
}

#[cfg(feature = "secure")]
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(unused)]
/// Protection level; argument for `Prot` command
pub enum ProtectionLevel {
    Clear,
    Private,
}

// -- stringify

impl ToString for Command {
    fn to_string(&self) -> String {
        let mut s = match self {
            Self::Appe(f) => format!("APPE {}", f),
            #[cfg(feature = "secure")]
            Self::Auth => "AUTH TLS".to_string(),
            Self::Cdup => "CDUP".to_string(),
            #[cfg(feature = "secure")]
            Self::ClearCommandChannel => "CCC".to_string(),
            Self::Custom(line) => line.to_string(),
            Self::Cwd(d) => format!("CWD {}", d),
            Self::Dele(f) => format!("DELE {}", f),
            Self::Epsv => "EPSV".to_string(),
            Self::Feat => "FEAT".to_string(),
            Self::List(p) => p
                .as_deref()
                .map(|x| format!("LIST {}", x))
                .unwrap_or_else(|| "LIST".to_string()),
            Self::Mdtm(p) => format!("MDTM {}", p),
            Self::Mkd(p) => format!("MKD {}", p),
            Self::Mlsd(p) => p
                .as_deref()
                .map(|x| format!("MLSD {}", x))
                .unwrap_or_else(|| "MLSD".to_string()),
            Self::Nlst(p) => p
                .as_deref()
                .map(|x| format!("NLST {}", x))
                .unwrap_or_else(|| "NLST".to_string()),
            Self::Noop => "NOOP".to_string(),
            Self::Opts(feature, value) => value
                .as_deref()
                .map(|x| format!("OPTS {} {}", feature, x))
                .unwrap_or_else(|| format!("OPTS {}", feature)),
            Self::Pass(p) => format!("PASS {}", p),
            Self::Pasv => "PASV".to_string(),
            #[cfg(feature = "secure")]
            Self::Pbsz(sz) => format!("PBSZ {}", sz),
            #[cfg(feature = "secure")]
            Self::Prot(l) => format!("PROT {}", l.to_string()),
            Self::Pwd => "PWD".to_string(),
            Self::Quit => "QUIT".to_string(),
            Self::RenameFrom(p) => format!("RNFR {}", p),
            Self::RenameTo(p) => format!("RNTO {}", p),
            Self::Rest(offset) => format!("REST {}", offset),
            Self::Retr(p) => format!("RETR {}", p),
            Self::Rmd(p) => format!("RMD {}", p),
            Self::Site(p) => format!("SITE {}", p),
            Self::Size(p) => format!("SIZE {}", p),
            Self::Store(p) => format!("STOR {}", p),
            Self::Stru(s) => format!("STRU {}", s),
            Self::Type(t) => format!("TYPE {}", t),
            Self::User(u) => format!("USER {}", u),
        };
        s.push_str("\r\n");
        s
    }
}

impl Command {
    /// Rendering of the command for logging, with the `PASS` argument hidden
    pub fn redacted(&self) -> String {
        match self {
            Self::Pass(_) => "PASS ***".to_string(),
            other => other.to_string().trim_end().to_string(),
        }
    }
}

#[cfg(feature = "secure")]
impl ToString for ProtectionLevel {
    fn to_string(&self) -> String {
        match self {
            Self::Clear => "C",
            Self::Private => "P",
        }
        .to_string()
    }
}
