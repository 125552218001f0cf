//! # List
//!
//! Parsers for directory listings. There is no single specification for the
//! output of `LIST`: servers answer in a handful of incompatible dialects, so
//! this module ships one parser per dialect it understands (Unix `ls -l`,
//! DOS/Windows, MLSD as of RFC 3659, EPLF) plus a detector that samples the
//! listing and picks the parser for it. When none of the built-in parsers
//! recognizes the output, parsing fails loudly with the sampled line so the
//! caller can install its own [`ListParser`] instead of receiving an empty
//! listing.
//!
//! ## Get started
//!
//! ```rust
//! use prontoftp::list;
//!
//! let listing = "drwxrwxr-x 1 root  dialout  4096 Nov 5 2018 docs\n-rw-rw-r-- 1 0  1  8192 Nov 5 2018 omar.txt";
//! let files = list::parse_listing(listing).expect("unsupported format");
//! assert_eq!(files.len(), 2);
//! assert!(files[0].is_directory());
//! ```

mod file_type;
mod pex;

use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::prelude::{NaiveDate, NaiveDateTime, Utc};
use chrono::Datelike;
use lazy_regex::{Lazy, Regex};

pub use self::file_type::FileType;
pub use self::pex::{PosixPex, PosixPexQuery};
use crate::types::{FtpError, FtpResult};

// -- Regex

/// Unix `ls -l` style line. The leading class covers regular files,
/// directories and symlinks as well as devices, pipes and sockets.
static UNIX_LS_RE: Lazy<Regex> = lazy_regex!(
    r#"^([\-bcdlps])([\-rwxsStT]{9})\s+(\d+)\s+([^ ]+)\s+([^ ]+)\s+(\d+)\s+([^ ]+\s+\d{1,2}\s+(?:\d{1,2}:\d{1,2}|\d{4}))\s+(.+)$"#
);
/// DOS system regex to parse list output
static DOS_LS_RE: Lazy<Regex> =
    lazy_regex!(r#"^(\d{2}\-\d{2}\-\d{2}\s+\d{2}:\d{2}\s*[AP]M)\s+(<DIR>)?([\d,]*)\s+(.+)$"#);
/// Sniff for MLSD entries: at least one `fact=value;` before the name separator
static MLSD_SNIFF_RE: Lazy<Regex> = lazy_regex!(r"^([A-Za-z0-9._-]+=[^;]*;)+ ");

// -- File entry

/// Describes a file entry on the remote system.
/// This data type is returned in a collection after parsing a listing.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct File {
    /// File name
    name: String,
    /// File type describes whether it is a directory, a file or a symlink
    file_type: FileType,
    /// File size in bytes
    size: usize,
    /// Last modification time, when the listing carried a parseable one
    modified: Option<SystemTime>,
    /// Modification time exactly as printed by the server
    modified_raw: String,
    /// Number of hard links (Unix listings only)
    link_count: Option<u32>,
    /// Owner, by name or numeric id, as printed
    owner: Option<String>,
    /// Group, by name or numeric id, as printed
    group: Option<String>,
    /// Owner user id, when the listing printed a numeric one
    uid: Option<u32>,
    /// Group id, when the listing printed a numeric one
    gid: Option<u32>,
    /// Server-assigned unique id (MLSD), used to match symlinks to their targets
    unique: Option<String>,
    /// POSIX permissions, when the listing carried them
    posix_pex: Option<(PosixPex, PosixPex, PosixPex)>,
}

impl File {
    // -- getters

    /// Get file name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get whether file is a directory
    pub fn is_directory(&self) -> bool {
        self.file_type.is_directory()
    }

    /// Get whether file is a file
    pub fn is_file(&self) -> bool {
        self.file_type.is_file()
    }

    /// Get whether file is a symlink
    pub fn is_symlink(&self) -> bool {
        self.file_type.is_symlink()
    }

    /// Returns, if available, the file the symlink is pointing to.
    /// The path is empty when the listing did not disclose the target.
    pub fn symlink(&self) -> Option<&std::path::Path> {
        self.file_type.symlink()
    }

    /// Returned file size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the last time the file was modified, if the listing carried a
    /// parseable timestamp
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Returns the modification time exactly as the server printed it
    pub fn modified_raw(&self) -> &str {
        self.modified_raw.as_str()
    }

    /// Returns the number of hard links, when listed
    pub fn link_count(&self) -> Option<u32> {
        self.link_count
    }

    /// Returns the owner as printed in the listing, name or numeric id
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the group as printed in the listing, name or numeric id
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns when available the owner user id of the file. (POSIX only)
    pub fn uid(&self) -> Option<u32> {
        self.uid
    }

    /// Returns when available the owner group id of the file. (POSIX only)
    pub fn gid(&self) -> Option<u32> {
        self.gid
    }

    /// Returns the server-assigned unique id, when listed (MLSD)
    pub fn unique(&self) -> Option<&str> {
        self.unique.as_deref()
    }

    /// Returns the POSIX permission triple (owner, group, others), when listed
    pub fn posix_pex(&self) -> Option<(PosixPex, PosixPex, PosixPex)> {
        self.posix_pex
    }

    /// Returns whether `who` can read file; access is assumed when the
    /// listing carried no permissions
    pub fn can_read(&self, who: PosixPexQuery) -> bool {
        self.query_pex(who).can_read()
    }

    /// Returns whether `who` can write file; access is assumed when the
    /// listing carried no permissions
    pub fn can_write(&self, who: PosixPexQuery) -> bool {
        self.query_pex(who).can_write()
    }

    /// Returns whether `who` can execute file; access is assumed when the
    /// listing carried no permissions
    pub fn can_execute(&self, who: PosixPexQuery) -> bool {
        self.query_pex(who).can_execute()
    }

    /// Returns the pex structure for selected query
    fn query_pex(&self, who: PosixPexQuery) -> PosixPex {
        let (owner, group, others) = self.posix_pex.unwrap_or_default();
        match who {
            PosixPexQuery::Owner => owner,
            PosixPexQuery::Group => group,
            PosixPexQuery::Others => others,
        }
    }
}

// -- parsers

/// A parser for one directory-listing dialect.
///
/// `test_line` is a cheap sniff used by the detector to recognize the format
/// from a sample line. `parse_line` turns one line into a [`File`], or `None`
/// for lines that carry no entry (headers, `cdir`/`pdir` facts, anything the
/// dialect treats as noise). `transform_list` runs once over the parsed
/// entries for cross-entry fixups; the default is the identity.
///
/// Implement this trait and install it with `list_parser` on the client to
/// handle a server dialect the built-in parsers do not cover.
pub trait ListParser: Send + Sync {
    fn test_line(&self, line: &str) -> bool;

    fn parse_line(&self, line: &str) -> Option<File>;

    fn transform_list(&self, files: Vec<File>) -> Vec<File> {
        files
    }
}

/// Parser for Unix `ls -l` style listings
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixParser;

/// Parser for DOS/Windows style listings
#[derive(Debug, Clone, Copy, Default)]
pub struct DosParser;

/// Parser for MLSD fact-based listings (RFC 3659)
#[derive(Debug, Clone, Copy, Default)]
pub struct MlsdParser;

/// Parser for EPLF ("Easily Parsed List Format") listings
#[derive(Debug, Clone, Copy, Default)]
pub struct EplfParser;

/// Candidate parsers in detection order, most distinctive sniff first
static BUILTIN_PARSERS: &[&dyn ListParser] = &[&EplfParser, &MlsdParser, &DosParser, &UnixParser];

impl ListParser for UnixParser {
    fn test_line(&self, line: &str) -> bool {
        UNIX_LS_RE.is_match(line)
    }

    fn parse_line(&self, line: &str) -> Option<File> {
        let metadata = UNIX_LS_RE.captures(line)?;
        trace!("Parsed POSIX line {line}");
        let file_type = match &metadata[1] {
            "-" => FileType::File,
            "d" => FileType::Directory,
            "l" => FileType::Symlink(PathBuf::default()),
            _ => FileType::Unknown,
        };

        let pex = |range: Range<usize>| {
            let mut count: u8 = 0;
            for (i, c) in metadata[2][range].chars().enumerate() {
                match c {
                    '-' | 'S' | 'T' => {}
                    _ => {
                        count += match i {
                            0 => 4,
                            1 => 2,
                            2 => 1,
                            _ => 0,
                        }
                    }
                }
            }
            count
        };
        let posix_pex = Some((
            PosixPex::from(pex(0..3)),
            PosixPex::from(pex(3..6)),
            PosixPex::from(pex(6..9)),
        ));

        let link_count = metadata[3].parse::<u32>().ok();
        let owner = Some(metadata[4].to_string());
        let group = Some(metadata[5].to_string());
        let uid = metadata[4].parse::<u32>().ok();
        let gid = metadata[5].parse::<u32>().ok();
        let size = metadata[6].parse::<usize>().ok()?;
        let modified_raw = metadata[7].trim().to_string();
        let modified = parse_lstime(modified_raw.as_str(), "%b %d %Y", "%b %d %H:%M");
        // Split filename if required
        let (name, symlink_path) = match file_type.is_symlink() {
            true => get_name_and_link(&metadata[8]),
            false => (String::from(&metadata[8]), None),
        };
        let file_type = match symlink_path {
            Some(p) => FileType::Symlink(p),
            None => file_type,
        };
        Some(File {
            name,
            file_type,
            size,
            modified,
            modified_raw,
            link_count,
            owner,
            group,
            uid,
            gid,
            unique: None,
            posix_pex,
        })
    }
}

impl ListParser for DosParser {
    fn test_line(&self, line: &str) -> bool {
        DOS_LS_RE.is_match(line)
    }

    fn parse_line(&self, line: &str) -> Option<File> {
        let metadata = DOS_LS_RE.captures(line)?;
        trace!("Parsed DOS line {line}");
        let modified_raw = String::from(&metadata[1]);
        let modified = parse_dostime(modified_raw.as_str());
        let file_type = match metadata.get(2).is_some() {
            true => FileType::Directory,
            false => FileType::File,
        };
        let size: usize = match file_type.is_directory() {
            true => 0,
            false => metadata[3].replace(',', "").parse().ok()?,
        };
        Some(File {
            name: String::from(&metadata[4]),
            file_type,
            size,
            modified,
            modified_raw,
            ..Default::default()
        })
    }
}

impl ListParser for MlsdParser {
    fn test_line(&self, line: &str) -> bool {
        MLSD_SNIFF_RE.is_match(line)
    }

    fn parse_line(&self, line: &str) -> Option<File> {
        // facts end at the first space; the rest, spaces included, is the name
        let (facts, name) = line.split_once(' ')?;
        if name.is_empty() {
            return None;
        }
        let mut f = File {
            name: name.to_string(),
            file_type: FileType::File,
            ..Default::default()
        };
        for fact in facts.split(';').filter(|fact| !fact.is_empty()) {
            let Some((key, value)) = fact.split_once('=') else {
                continue;
            };
            match key.to_lowercase().as_str() {
                "type" => {
                    let value_lc = value.to_lowercase();
                    f.file_type = match value_lc.as_str() {
                        "dir" => FileType::Directory,
                        "file" => FileType::File,
                        // the listed directory itself and its parent carry no entry
                        "cdir" | "pdir" => return None,
                        "link" | "os.unix=symlink" => FileType::Symlink(PathBuf::default()),
                        _ if value_lc.starts_with("os.unix=slink:") => {
                            FileType::Symlink(PathBuf::from(&value["os.unix=slink:".len()..]))
                        }
                        _ => FileType::Unknown,
                    };
                }
                "size" => {
                    f.size = value.parse().ok()?;
                }
                "modify" => {
                    f.modified_raw = value.to_string();
                    f.modified = parse_mlsx_time(value);
                }
                "unique" => {
                    f.unique = Some(value.to_string());
                }
                "unix.uid" => {
                    f.uid = value.parse().ok();
                }
                "unix.gid" => {
                    f.gid = value.parse().ok();
                }
                "unix.owner" => {
                    f.owner = Some(value.to_string());
                }
                "unix.group" => {
                    f.group = Some(value.to_string());
                }
                "unix.mode" => {
                    // servers print either 3 octal digits or a 0-padded word
                    let digits = value.get(value.len().saturating_sub(3)..)?;
                    let modes = digits
                        .chars()
                        .map(|c| c.to_digit(8).unwrap_or(0) as u8)
                        .collect::<Vec<u8>>();
                    if modes.len() == 3 {
                        f.posix_pex = Some((
                            PosixPex::from(modes[0]),
                            PosixPex::from(modes[1]),
                            PosixPex::from(modes[2]),
                        ));
                    }
                }
                _ => continue,
            }
        }
        Some(f)
    }

    fn transform_list(&self, files: Vec<File>) -> Vec<File> {
        // First pass: index the names of non-symlink entries by unique id,
        // then resolve symlinks that only carry a matching id. Entries whose
        // name contains a path separator exist solely as link targets and are
        // dropped afterwards.
        let mut targets: HashMap<&str, &str> = HashMap::new();
        for file in &files {
            if !file.is_symlink() {
                if let Some(unique) = file.unique() {
                    targets.insert(unique, file.name());
                }
            }
        }
        let resolved: Vec<Option<PathBuf>> = files
            .iter()
            .map(|file| {
                let unresolved = matches!(&file.file_type, FileType::Symlink(p) if p.as_os_str().is_empty());
                match (unresolved, file.unique()) {
                    (true, Some(unique)) => targets.get(unique).copied().map(PathBuf::from),
                    _ => None,
                }
            })
            .collect();
        files
            .into_iter()
            .zip(resolved)
            .map(|(mut file, target)| {
                if let Some(target) = target {
                    file.file_type = FileType::Symlink(target);
                }
                file
            })
            .filter(|file| !file.name.contains('/'))
            .collect()
    }
}

impl ListParser for EplfParser {
    fn test_line(&self, line: &str) -> bool {
        line.starts_with('+')
    }

    fn parse_line(&self, line: &str) -> Option<File> {
        let rest = line.strip_prefix('+')?;
        let (facts, name) = rest
            .split_once('\t')
            .or_else(|| rest.split_once(' '))?;
        if name.is_empty() {
            return None;
        }
        trace!("Parsed EPLF line {line}");
        let mut f = File {
            name: name.to_string(),
            ..Default::default()
        };
        for fact in facts.split(',').filter(|fact| !fact.is_empty()) {
            if fact == "/" {
                f.file_type = FileType::Directory;
            } else if fact == "r" {
                f.file_type = FileType::File;
            } else if let Some(size) = fact.strip_prefix('s') {
                f.size = size.parse().ok()?;
            } else if let Some(mtime) = fact.strip_prefix('m') {
                f.modified_raw = mtime.to_string();
                f.modified = mtime
                    .parse::<u64>()
                    .ok()
                    .and_then(|secs| SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs)));
            } else if let Some(mode) = fact.strip_prefix("up") {
                f.posix_pex = u32::from_str_radix(mode, 8).ok().map(|bits| {
                    (
                        PosixPex::from(((bits >> 6) & 0x07) as u8),
                        PosixPex::from(((bits >> 3) & 0x07) as u8),
                        PosixPex::from((bits & 0x07) as u8),
                    )
                });
            } else if let Some(id) = fact.strip_prefix('i') {
                f.unique = Some(id.to_string());
            }
        }
        Some(f)
    }
}

// -- detection

/// Parses a whole listing, detecting its dialect first.
///
/// The sample for detection is the *last* non-blank line: Unix listings
/// often open with a `total N` header, so the first line is an unreliable
/// witness of the format. Lines the chosen parser does not recognize are
/// skipped (that is how the `total` header itself is dropped), as are the
/// `.` and `..` entries. If no parser recognizes the sample, the error
/// carries that line verbatim.
pub fn parse_listing(text: &str) -> FtpResult<Vec<File>> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let Some(sample) = lines.last() else {
        return Ok(Vec::new());
    };
    let parser = BUILTIN_PARSERS
        .iter()
        .find(|parser| parser.test_line(sample))
        .ok_or_else(|| {
            error!(
                "No builtin parser recognizes this listing; install one with `list_parser` or enable trace logging to inspect the raw lines"
            );
            FtpError::UnknownListFormat(sample.to_string())
        })?;
    Ok(parse_lines(*parser, &lines))
}

/// Parses a whole listing with the given parser, skipping detection.
pub fn parse_listing_with(parser: &dyn ListParser, text: &str) -> Vec<File> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    parse_lines(parser, &lines)
}

fn parse_lines(parser: &dyn ListParser, lines: &[&str]) -> Vec<File> {
    let mut files: Vec<File> = Vec::with_capacity(lines.len());
    for line in lines {
        match parser.parse_line(line) {
            Some(file) => files.push(file),
            None => trace!("Skipped listing line: {line}"),
        }
    }
    parser
        .transform_list(files)
        .into_iter()
        .filter(|file| file.name() != "." && file.name() != "..")
        .collect()
}

// -- time parsing

/// Returns from a `ls -l` command output file name token, the name of the file and the symbolic link (if there is any)
fn get_name_and_link(token: &str) -> (String, Option<PathBuf>) {
    let tokens: Vec<&str> = token.split(" -> ").collect();
    let filename: String = String::from(*tokens.first().unwrap_or(&token));
    let symlink: Option<PathBuf> = tokens.get(1).map(PathBuf::from);
    (filename, symlink)
}

/// Convert ls syntax time to System Time.
/// ls time has two possible syntax:
/// 1. if year is current: %b %d %H:%M (e.g. Nov 5 13:46)
/// 2. else: %b %d %Y (e.g. Nov 5 2019)
fn parse_lstime(tm: &str, fmt_year: &str, fmt_hours: &str) -> Option<SystemTime> {
    let datetime: NaiveDateTime = match NaiveDate::parse_from_str(tm, fmt_year) {
        // Case 2. Midnight of the printed day
        Ok(date) => date.and_hms_opt(0, 0, 0)?,
        // Might be case 1. The current year is appended before parsing
        Err(_) => {
            let this_year: i32 = Utc::now().year();
            let date_time_str: String = format!("{tm} {this_year}");
            NaiveDateTime::parse_from_str(date_time_str.as_ref(), format!("{fmt_hours} %Y").as_ref())
                .ok()?
        }
    };
    SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(datetime.and_utc().timestamp().max(0) as u64))
}

/// Parse date time string in DOS representation ("%m-%d-%y %I:%M%p")
fn parse_dostime(tm: &str) -> Option<SystemTime> {
    NaiveDateTime::parse_from_str(tm, "%m-%d-%y %I:%M%p")
        .ok()
        .and_then(|dt| {
            SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(dt.and_utc().timestamp().max(0) as u64))
        })
}

/// Convert MLSD `modify` fact to System Time; fractional seconds, when
/// printed, are dropped
fn parse_mlsx_time(tm: &str) -> Option<SystemTime> {
    let tm = tm.split_once('.').map_or(tm, |(secs, _)| secs);
    NaiveDateTime::parse_from_str(tm, "%Y%m%d%H%M%S")
        .ok()
        .and_then(|dt| {
            SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(dt.and_utc().timestamp().max(0) as u64))
        })
}

#[cfg(test)]
mod test {

    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn file_getters() {
        let file: File = File {
            name: String::from("provola.txt"),
            file_type: FileType::File,
            size: 2048,
            modified: Some(SystemTime::UNIX_EPOCH),
            modified_raw: String::from("Jan 1 1970"),
            link_count: Some(1),
            owner: Some(String::from("root")),
            group: Some(String::from("dialout")),
            uid: Some(0),
            gid: Some(20),
            unique: None,
            posix_pex: Some((PosixPex::from(7), PosixPex::from(5), PosixPex::from(4))),
        };
        assert_eq!(file.name(), "provola.txt");
        assert_eq!(file.is_directory(), false);
        assert_eq!(file.is_file(), true);
        assert_eq!(file.is_symlink(), false);
        assert_eq!(file.symlink(), None);
        assert_eq!(file.size(), 2048);
        assert_eq!(file.modified(), Some(SystemTime::UNIX_EPOCH));
        assert_eq!(file.modified_raw(), "Jan 1 1970");
        assert_eq!(file.link_count(), Some(1));
        assert_eq!(file.owner(), Some("root"));
        assert_eq!(file.group(), Some("dialout"));
        assert_eq!(file.uid(), Some(0));
        assert_eq!(file.gid(), Some(20));
        assert_eq!(file.unique(), None);
        // -- posix pex
        assert_eq!(file.can_read(PosixPexQuery::Owner), true);
        assert_eq!(file.can_write(PosixPexQuery::Owner), true);
        assert_eq!(file.can_execute(PosixPexQuery::Owner), true);
        assert_eq!(file.can_read(PosixPexQuery::Group), true);
        assert_eq!(file.can_write(PosixPexQuery::Group), false);
        assert_eq!(file.can_execute(PosixPexQuery::Group), true);
        assert_eq!(file.can_read(PosixPexQuery::Others), true);
        assert_eq!(file.can_write(PosixPexQuery::Others), false);
        assert_eq!(file.can_execute(PosixPexQuery::Others), false);
    }

    #[test]
    fn parse_posix_line() {
        let file = UnixParser
            .parse_line("-rw-rw-r-- 1 0  1  8192 Nov 5 2018 omar.txt")
            .unwrap();
        assert_eq!(file.name(), "omar.txt");
        assert_eq!(file.size(), 8192);
        assert_eq!(file.is_file(), true);
        assert_eq!(file.link_count(), Some(1));
        assert_eq!(file.owner(), Some("0"));
        assert_eq!(file.group(), Some("1"));
        assert_eq!(file.uid(), Some(0));
        assert_eq!(file.gid(), Some(1));
        assert_eq!(file.modified_raw(), "Nov 5 2018");
        assert_eq!(file.can_read(PosixPexQuery::Owner), true);
        assert_eq!(file.can_write(PosixPexQuery::Owner), true);
        assert_eq!(file.can_execute(PosixPexQuery::Owner), false);
        assert_eq!(file.can_read(PosixPexQuery::Group), true);
        assert_eq!(file.can_write(PosixPexQuery::Group), true);
        assert_eq!(file.can_execute(PosixPexQuery::Group), false);
        assert_eq!(file.can_read(PosixPexQuery::Others), true);
        assert_eq!(file.can_write(PosixPexQuery::Others), false);
        assert_eq!(file.can_execute(PosixPexQuery::Others), false);
        assert_eq!(
            file.modified()
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(1541376000)
        );
        // Group and user as strings; directory
        let file = UnixParser
            .parse_line("drwxrwxr-x 1 root  dialout  4096 Nov 5 2018 provola")
            .unwrap();
        assert_eq!(file.name(), "provola");
        assert_eq!(file.size(), 4096);
        assert_eq!(file.is_directory(), true);
        assert_eq!(file.owner(), Some("root"));
        assert_eq!(file.group(), Some("dialout"));
        assert_eq!(file.uid(), None);
        assert_eq!(file.gid(), None);
        assert_eq!(file.can_execute(PosixPexQuery::Others), true);
        assert_eq!(file.can_write(PosixPexQuery::Others), false);
        // Symlink with target
        let file = UnixParser
            .parse_line("lrwxrwxrwx 1 root  root  4 Nov 5 2018 Cargo -> Cargo.toml")
            .unwrap();
        assert_eq!(file.name(), "Cargo");
        assert_eq!(file.is_symlink(), true);
        assert_eq!(file.symlink(), Some(Path::new("Cargo.toml")));
        // Devices and sockets parse as unknown kinds
        let file = UnixParser
            .parse_line("brw-rw---- 1 root  disk  0 Nov 5 2018 sda")
            .unwrap();
        assert_eq!(file.is_file(), false);
        assert_eq!(file.is_directory(), false);
        assert_eq!(file.is_symlink(), false);
    }

    #[test]
    fn parse_posix_line_with_setuid_and_sticky_bits() {
        let file = UnixParser
            .parse_line("drws------    2 u-redacted g-redacted      3864 Feb 17  2023 sas")
            .unwrap();
        assert_eq!(file.is_directory(), true);
        assert_eq!(file.can_execute(PosixPexQuery::Owner), true);
        let file = UnixParser
            .parse_line("drwS------    2 u-redacted g-redacted      3864 Feb 17  2023 sas")
            .unwrap();
        assert_eq!(file.can_execute(PosixPexQuery::Owner), false);
        assert_eq!(file.can_read(PosixPexQuery::Owner), true);
        let file = UnixParser
            .parse_line("drwx--s---    2 u-redacted g-redacted      3864 Feb 17  2023 sas")
            .unwrap();
        assert_eq!(file.can_execute(PosixPexQuery::Group), true);
        let file = UnixParser
            .parse_line("drwx--S---    2 u-redacted g-redacted      3864 Feb 17  2023 sas")
            .unwrap();
        assert_eq!(file.can_execute(PosixPexQuery::Group), false);
        let file = UnixParser
            .parse_line("drwx-----t    2 u-redacted g-redacted      3864 Feb 17  2023 sas")
            .unwrap();
        assert_eq!(file.can_execute(PosixPexQuery::Others), true);
        let file = UnixParser
            .parse_line("drwx-----T    2 u-redacted g-redacted      3864 Feb 17  2023 sas")
            .unwrap();
        assert_eq!(file.can_execute(PosixPexQuery::Others), false);
    }

    #[test]
    fn should_not_parse_invalid_posix_lines() {
        // missing size
        assert!(UnixParser
            .parse_line("drwxrwxr-x 1 0  9  Nov 5 2018 docs")
            .is_none());
        assert!(UnixParser.parse_line("total 28").is_none());
    }

    #[test]
    fn should_keep_raw_date_when_unparseable() {
        let file = UnixParser
            .parse_line("drwxrwxr-x 1 root  dialout  4096 Nov 31 2018 provola")
            .unwrap();
        assert_eq!(file.modified(), None);
        assert_eq!(file.modified_raw(), "Nov 31 2018");
    }

    #[test]
    fn should_parse_utf8_names_in_ls_output() {
        let file = UnixParser
            .parse_line("-rw-rw-r-- 1 омар  www-data  8192 Nov 5 2018 фообар.txt")
            .unwrap();
        assert_eq!(file.name(), "фообар.txt");
        assert_eq!(file.owner(), Some("омар"));
    }

    #[test]
    fn should_parse_name_starting_with_tricky_numbers() {
        let file = UnixParser
            .parse_line("-r--r--r--    1 23        23         1234567 Jan 1  2000 01 1234 foo.mp3")
            .unwrap();
        assert_eq!(file.name(), "01 1234 foo.mp3");
        assert_eq!(file.size(), 1234567);
        assert_eq!(
            file.modified()
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(946684800)
        );
    }

    #[test]
    fn parse_dos_line() {
        let file = DosParser
            .parse_line("04-08-14  03:09PM  8192 omar.txt")
            .unwrap();
        assert_eq!(file.name(), "omar.txt");
        assert_eq!(file.size(), 8192);
        assert!(file.is_file());
        assert_eq!(file.owner(), None);
        assert_eq!(file.group(), None);
        assert_eq!(file.posix_pex(), None);
        // access is assumed when permissions are unknown
        assert_eq!(file.can_read(PosixPexQuery::Owner), true);
        assert_eq!(file.can_write(PosixPexQuery::Others), true);
        assert_eq!(
            file.modified()
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(1396969740)
        );
        // thousands separators in sizes
        let file = DosParser
            .parse_line("04-08-14  03:09PM  1,234 omar.txt")
            .unwrap();
        assert_eq!(file.size(), 1234);
    }

    #[test]
    fn parse_dos_directory_line() {
        let dir = DosParser
            .parse_line("12-05-96  05:03PM       <DIR>          myDir")
            .unwrap();
        assert_eq!(dir.name(), "myDir");
        assert!(dir.is_directory());
        assert_eq!(dir.size(), 0);
        assert_eq!(dir.modified_raw(), "12-05-96  05:03PM");
        assert!(dir.modified().is_some());
    }

    #[test]
    fn should_not_parse_invalid_dos_lines() {
        assert!(DosParser.parse_line("-08-14  03:09PM  <DIR> docs").is_none());
        // unparseable size
        assert!(DosParser.parse_line("04-08-14  03:09PM  OMAR docs").is_none());
        // unparseable date keeps the entry, drops the timestamp
        let file = DosParser.parse_line("34-08-14  03:09PM  <DIR> docs").unwrap();
        assert_eq!(file.modified(), None);
        assert_eq!(file.modified_raw(), "34-08-14  03:09PM");
    }

    #[test]
    fn parse_mlsd_line() {
        let file = MlsdParser
            .parse_line("type=file;size=8192;modify=20181105163248; omar.txt")
            .unwrap();
        assert_eq!(file.name(), "omar.txt");
        assert_eq!(file.size(), 8192);
        assert!(file.is_file());
        assert_eq!(file.modified_raw(), "20181105163248");
        assert!(file.modified().is_some());

        let file = MlsdParser
            .parse_line("type=dir;size=4096;modify=20181105163248; docs")
            .unwrap();
        assert_eq!(file.name(), "docs");
        assert!(file.is_directory());

        let file = MlsdParser
            .parse_line("type=file;size=4096;modify=20181105163248;UNIX.mode=644; omar.txt")
            .unwrap();
        assert_eq!(
            file.posix_pex(),
            Some((PosixPex::from(6), PosixPex::from(4), PosixPex::from(4)))
        );
        // 0-padded mode words
        let file = MlsdParser
            .parse_line("type=file;UNIX.mode=0644;UNIX.uid=1000;UNIX.gid=100; a.txt")
            .unwrap();
        assert_eq!(
            file.posix_pex(),
            Some((PosixPex::from(6), PosixPex::from(4), PosixPex::from(4)))
        );
        assert_eq!(file.uid(), Some(1000));
        assert_eq!(file.gid(), Some(100));
    }

    #[test]
    fn mlsd_facts_are_case_insensitive_and_unknown_facts_ignored() {
        let file = MlsdParser
            .parse_line("Type=FILE;Size=100;perm=adfrw;media-type=text/plain; a.txt")
            .unwrap();
        assert!(file.is_file());
        assert_eq!(file.size(), 100);
    }

    #[test]
    fn mlsd_name_may_contain_spaces_and_semicolons() {
        let file = MlsdParser
            .parse_line("type=file;size=10; my file; with oddities.txt")
            .unwrap();
        assert_eq!(file.name(), "my file; with oddities.txt");
    }

    #[test]
    fn mlsd_skips_cdir_and_pdir() {
        assert!(MlsdParser
            .parse_line("type=cdir;modify=20181105163248; /pub")
            .is_none());
        assert!(MlsdParser
            .parse_line("type=pdir;modify=20181105163248; /")
            .is_none());
    }

    #[test]
    fn mlsd_embedded_symlink_target() {
        let file = MlsdParser
            .parse_line("type=OS.unix=slink:/usr/share; share")
            .unwrap();
        assert!(file.is_symlink());
        assert_eq!(file.symlink(), Some(Path::new("/usr/share")));
    }

    #[test]
    fn mlsd_symlink_resolved_by_unique_id() {
        let files = parse_listing_with(
            &MlsdParser,
            "type=OS.unix=symlink;unique=1234; link\ntype=file;unique=1234; target\n",
        );
        assert_eq!(files.len(), 2);
        let link = files.iter().find(|f| f.name() == "link").unwrap();
        assert!(link.is_symlink());
        assert_eq!(link.symlink(), Some(Path::new("target")));
    }

    #[test]
    fn mlsd_symlink_without_matching_unique_stays_unresolved() {
        let files = parse_listing_with(
            &MlsdParser,
            "type=OS.unix=symlink;unique=1234; link\ntype=file;unique=9999; other\n",
        );
        let link = files.iter().find(|f| f.name() == "link").unwrap();
        assert!(link.is_symlink());
        assert_eq!(link.symlink(), Some(Path::new("")));
    }

    #[test]
    fn mlsd_excludes_link_target_placeholders() {
        let files = parse_listing_with(
            &MlsdParser,
            "type=OS.unix=symlink;unique=77; link\ntype=dir;unique=77; sub/real\n",
        );
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "link");
        assert_eq!(files[0].symlink(), Some(Path::new("sub/real")));
    }

    #[test]
    fn parse_eplf_line() {
        let file = EplfParser
            .parse_line("+i8388621.48594,m825718503,r,s280,\tdjb.html")
            .unwrap();
        assert_eq!(file.name(), "djb.html");
        assert!(file.is_file());
        assert_eq!(file.size(), 280);
        assert_eq!(file.unique(), Some("8388621.48594"));
        assert_eq!(file.modified_raw(), "825718503");
        assert_eq!(
            file.modified()
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(825718503)
        );

        let dir = EplfParser.parse_line("+m825718503,/,\tpub").unwrap();
        assert_eq!(dir.name(), "pub");
        assert!(dir.is_directory());

        let file = EplfParser.parse_line("+r,s100,up644,\ta.txt").unwrap();
        assert_eq!(
            file.posix_pex(),
            Some((PosixPex::from(6), PosixPex::from(4), PosixPex::from(4)))
        );
    }

    #[test]
    fn eplf_space_separator_fallback() {
        let file = EplfParser.parse_line("+r,s42, readme").unwrap();
        assert_eq!(file.name(), "readme");
        assert_eq!(file.size(), 42);
    }

    #[test]
    fn should_detect_unix_listing_with_total_header() {
        let listing = "total 28\ndrwxrwxr-x 1 root  dialout  4096 Nov 5 2018 docs\n-rw-rw-r-- 1 0  1  8192 Nov 5 2018 omar.txt\n";
        let files = parse_listing(listing).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].is_directory());
        assert!(files[1].is_file());
    }

    #[test]
    fn should_detect_dos_listing() {
        let files = parse_listing("04-08-14  03:09PM  8192 omar.txt\n12-05-96  05:03PM       <DIR>          myDir\n")
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[1].is_directory());
    }

    #[test]
    fn should_detect_mlsd_listing_and_skip_dot_entries() {
        let listing = "type=cdir;unique=1; .\ntype=pdir;unique=2; ..\ntype=file;size=8192; omar.txt\n";
        let files = parse_listing(listing).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "omar.txt");
    }

    #[test]
    fn should_detect_eplf_listing() {
        let files = parse_listing("+r,s280,\tdjb.html\n+/,\tpub\n").unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn should_skip_dot_entries_in_unix_listing() {
        let listing = "drwxr-xr-x 2 0 0 4096 Nov 5 2018 .\ndrwxr-xr-x 2 0 0 4096 Nov 5 2018 ..\ndrwxr-xr-x 2 0 0 4096 Nov 5 2018 pub\n";
        let files = parse_listing(listing).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "pub");
    }

    #[test]
    fn should_fail_on_unknown_listing_format() {
        let result = parse_listing("something unrecognizable\nanother odd line");
        match result {
            Err(FtpError::UnknownListFormat(line)) => assert_eq!(line, "another odd line"),
            other => panic!("expected UnknownListFormat, got {other:?}"),
        }
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        assert_eq!(parse_listing("").unwrap(), vec![]);
        assert_eq!(parse_listing("\r\n\r\n").unwrap(), vec![]);
    }

    #[test]
    fn custom_parser_can_be_used_directly() {
        struct NamesOnly;
        impl ListParser for NamesOnly {
            fn test_line(&self, _line: &str) -> bool {
                true
            }
            fn parse_line(&self, line: &str) -> Option<File> {
                Some(File {
                    name: line.to_string(),
                    file_type: FileType::File,
                    ..Default::default()
                })
            }
        }
        let files = parse_listing_with(&NamesOnly, "a.txt\nb.txt\n");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name(), "a.txt");
    }

    #[test]
    fn parse_lstime_formats() {
        assert!(parse_lstime("Nov 5 16:32", "%b %d %Y", "%b %d %H:%M").is_some());
        assert_eq!(
            parse_lstime("Nov 5 2018", "%b %d %Y", "%b %d %H:%M")
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(1541376000)
        );
        assert_eq!(
            parse_lstime("Mar 18 2018", "%b %d %Y", "%b %d %H:%M")
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(1521331200)
        );
        // bad cases
        assert!(parse_lstime("Oma 31 2018", "%b %d %Y", "%b %d %H:%M").is_none());
        assert!(parse_lstime("Feb 31 2018", "%b %d %Y", "%b %d %H:%M").is_none());
        assert!(parse_lstime("Feb 15 25:32", "%b %d %Y", "%b %d %H:%M").is_none());
    }

    #[test]
    fn parse_dostime_format() {
        assert_eq!(
            parse_dostime("04-08-14  03:09PM")
                .unwrap()
                .duration_since(SystemTime::UNIX_EPOCH)
                .ok()
                .unwrap(),
            Duration::from_secs(1396969740)
        );
        assert!(parse_dostime("04-08-14").is_none());
    }

    #[test]
    fn parse_mlsx_time_with_fraction() {
        assert_eq!(
            parse_mlsx_time("20181105163248"),
            parse_mlsx_time("20181105163248.000")
        );
        assert!(parse_mlsx_time("notadate").is_none());
    }
}
