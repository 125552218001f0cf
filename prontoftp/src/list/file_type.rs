use std::path::{Path, PathBuf};

/// Describes the kind of file. If `Symlink`, the path of the pointed file is
/// carried along; it may be empty when the listing did not disclose the
/// target. `Unknown` covers entries the listing can name but this model
/// cannot, such as block devices or sockets in `ls -l` output.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum FileType {
    /// Directory type
    Directory,
    /// Regular file type
    File,
    /// Symlink type with the path to the pointed file
    Symlink(PathBuf),
    /// Anything else
    #[default]
    Unknown,
}

impl FileType {
    /// Returns whether the file is a directory
    pub fn is_directory(&self) -> bool {
        matches!(self, &FileType::Directory)
    }

    /// Returns whether the file is a file
    pub fn is_file(&self) -> bool {
        matches!(self, &FileType::File)
    }

    /// Returns whether the file is a symlink
    pub fn is_symlink(&self) -> bool {
        matches!(self, &FileType::Symlink(_))
    }

    /// get symlink if any
    pub fn symlink(&self) -> Option<&Path> {
        match self {
            FileType::Symlink(p) => Some(p.as_path()),
            _ => None,
        }
    }
}
