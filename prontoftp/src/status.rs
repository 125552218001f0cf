//! # Status
//!
//! Reply codes defined by RFC 959 (and the security extensions of RFC 2228),
//! as sent by the server on the control channel.

use thiserror::Error;

/// Ftp status returned after command execution
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
#[repr(u32)]
pub enum Status {
    #[error("Restart marker reply")]
    RestartMarker = 110,
    #[error("Service ready in (n) minutes")]
    ReadySoon = 120,
    #[error("Data connection already open; transfer starting")]
    TransferStarting = 125,
    #[error("File status okay; about to open data connection")]
    AboutToSend = 150,
    #[error("Command okay")]
    CommandOk = 200,
    #[error("Command not implemented, superfluous at this site")]
    SuperfluousCommand = 202,
    #[error("System status, or system help reply")]
    SystemStatus = 211,
    #[error("Directory status")]
    DirectoryStatus = 212,
    #[error("File status")]
    FileStatus = 213,
    #[error("Help message")]
    HelpMessage = 214,
    #[error("NAME system type")]
    SystemType = 215,
    #[error("Service ready for new user")]
    Ready = 220,
    #[error("Service closing control connection")]
    Closing = 221,
    #[error("Data connection open; no transfer in progress")]
    DataConnectionOpen = 225,
    #[error("Closing data connection; requested file action successful")]
    ClosingDataConnection = 226,
    #[error("Entering passive mode")]
    PassiveMode = 227,
    #[error("Entering long passive mode")]
    LongPassiveMode = 228,
    #[error("Entering extended passive mode")]
    ExtendedPassiveMode = 229,
    #[error("User logged in, proceed")]
    LoggedIn = 230,
    #[error("User logged out; service terminated")]
    LoggedOut = 231,
    #[error("Logout command noted, will complete when transfer done")]
    LogoutNoted = 232,
    #[error("Authentication mechanism accepted; security data exchange complete")]
    AuthAccepted = 234,
    #[error("Requested file action okay, completed")]
    FileActionOk = 250,
    #[error("Pathname created")]
    PathCreated = 257,
    #[error("User name okay, need password")]
    NeedPassword = 331,
    #[error("Need account for login")]
    NeedAccount = 332,
    #[error("Requested file action pending further information")]
    FileActionPending = 350,
    #[error("Service not available, closing control connection")]
    ServiceNotAvailable = 421,
    #[error("Can't open data connection")]
    CannotOpenDataConnection = 425,
    #[error("Connection closed; transfer aborted")]
    TransferAborted = 426,
    #[error("Invalid username or password")]
    InvalidCredentials = 430,
    #[error("Requested host unavailable")]
    HostUnavailable = 434,
    #[error("Requested file action not taken")]
    FileActionIgnored = 450,
    #[error("Requested action aborted; local error in processing")]
    LocalProcessingError = 451,
    #[error("Requested action not taken; insufficient storage space")]
    InsufficientStorage = 452,
    #[error("Syntax error, command unrecognized")]
    CommandUnrecognized = 500,
    #[error("Syntax error in parameters or arguments")]
    InvalidArguments = 501,
    #[error("Command not implemented")]
    CommandNotImplemented = 502,
    #[error("Bad sequence of commands")]
    BadCommandSequence = 503,
    #[error("Command not implemented for that parameter")]
    ParameterNotImplemented = 504,
    #[error("Not logged in")]
    NotLoggedIn = 530,
    #[error("Need account for storing files")]
    StoringNeedAccount = 532,
    #[error("Request denied for policy reasons")]
    PolicyDenied = 534,
    #[error("Requested action not taken; file unavailable")]
    FileUnavailable = 550,
    #[error("Requested action aborted; page type unknown")]
    PageTypeUnknown = 551,
    #[error("Requested file action aborted; exceeded storage allocation")]
    ExceededStorage = 552,
    #[error("Requested action not taken; file name not allowed")]
    FileNameNotAllowed = 553,
    #[error("Unknown reply code")]
    Unknown = 0,
}

impl Status {
    /// Returns the numeric code associated to the status
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Returns the description associated to the reply code
    pub fn desc(&self) -> String {
        self.to_string()
    }
}

impl From<u32> for Status {
    fn from(code: u32) -> Self {
        match code {
            110 => Status::RestartMarker,
            120 => Status::ReadySoon,
            125 => Status::TransferStarting,
            150 => Status::AboutToSend,
            200 => Status::CommandOk,
            202 => Status::SuperfluousCommand,
            211 => Status::SystemStatus,
            212 => Status::DirectoryStatus,
            213 => Status::FileStatus,
            214 => Status::HelpMessage,
            215 => Status::SystemType,
            220 => Status::Ready,
            221 => Status::Closing,
            225 => Status::DataConnectionOpen,
            226 => Status::ClosingDataConnection,
            227 => Status::PassiveMode,
            228 => Status::LongPassiveMode,
            229 => Status::ExtendedPassiveMode,
            230 => Status::LoggedIn,
            231 => Status::LoggedOut,
            232 => Status::LogoutNoted,
            234 => Status::AuthAccepted,
            250 => Status::FileActionOk,
            257 => Status::PathCreated,
            331 => Status::NeedPassword,
            332 => Status::NeedAccount,
            350 => Status::FileActionPending,
            421 => Status::ServiceNotAvailable,
            425 => Status::CannotOpenDataConnection,
            426 => Status::TransferAborted,
            430 => Status::InvalidCredentials,
            434 => Status::HostUnavailable,
            450 => Status::FileActionIgnored,
            451 => Status::LocalProcessingError,
            452 => Status::InsufficientStorage,
            500 => Status::CommandUnrecognized,
            501 => Status::InvalidArguments,
            502 => Status::CommandNotImplemented,
            503 => Status::BadCommandSequence,
            504 => Status::ParameterNotImplemented,
            530 => Status::NotLoggedIn,
            532 => Status::StoringNeedAccount,
            534 => Status::PolicyDenied,
            550 => Status::FileUnavailable,
            551 => Status::PageTypeUnknown,
            552 => Status::ExceededStorage,
            553 => Status::FileNameNotAllowed,
            _ => Status::Unknown,
        }
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_return_code_for_status() {
        assert_eq!(Status::AboutToSend.code(), 150);
        assert_eq!(Status::CommandOk.code(), 200);
        assert_eq!(Status::NeedPassword.code(), 331);
        assert_eq!(Status::FileUnavailable.code(), 550);
        assert_eq!(Status::Unknown.code(), 0);
    }

    #[test]
    fn should_convert_code_to_status() {
        assert_eq!(Status::from(150), Status::AboutToSend);
        assert_eq!(Status::from(226), Status::ClosingDataConnection);
        assert_eq!(Status::from(350), Status::FileActionPending);
        assert_eq!(Status::from(534), Status::PolicyDenied);
        assert_eq!(Status::from(999), Status::Unknown);
    }

    #[test]
    fn should_describe_status() {
        assert_eq!(Status::CommandOk.desc().as_str(), "Command okay");
        assert_eq!(
            Status::FileUnavailable.desc().as_str(),
            "Requested action not taken; file unavailable"
        );
    }
}
