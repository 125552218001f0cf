//! # Pex
//!
//! POSIX permissions for a class of users, as carried by directory listings

/// Selects which class of users a permission query refers to
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PosixPexQuery {
    Owner,
    Group,
    Others,
}

/// Describes the permissions on POSIX system for a single class of users.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PosixPex {
    read: bool,
    write: bool,
    execute: bool,
}

impl PosixPex {
    /// Returns whether read permission is true
    pub fn can_read(&self) -> bool {
        self.read
    }

    /// Returns whether write permission is true
    pub fn can_write(&self) -> bool {
        self.write
    }

    /// Returns whether execute permission is true
    pub fn can_execute(&self) -> bool {
        self.execute
    }
}

/// Permissions default to all-granted when the listing does not carry them
impl Default for PosixPex {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
            execute: true,
        }
    }
}

impl From<u8> for PosixPex {
    fn from(bits: u8) -> Self {
        Self {
            read: ((bits >> 2) & 0x01) != 0,
            write: ((bits >> 1) & 0x01) != 0,
            execute: (bits & 0x01) != 0,
        }
    }
}
