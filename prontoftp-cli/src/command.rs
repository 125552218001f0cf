use std::path::PathBuf;
use std::str::FromStr;

use prontoftp::Mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Appe(PathBuf, String),
    Cdup,
    Connect(String, bool),
    Cwd(String),
    Feat,
    Help,
    List(Option<String>),
    Login,
    Mdtm(String),
    Mkdir(String),
    Mode(Mode),
    Noop,
    Opts(String, Option<String>),
    Put(PathBuf, String),
    Pwd,
    Quit,
    Rename(String, String),
    Retr(String, PathBuf),
    Rm(String),
    Rmdir(String),
    Size(String),
}

impl FromStr for Command {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let keyword = match tokens.next() {
            Some(keyword) => keyword.to_uppercase(),
            None => return Err("empty command"),
        };
        let command = match keyword.as_str() {
            "APPE" => Self::Appe(
                PathBuf::from(next_arg(&mut tokens)?),
                next_arg(&mut tokens)?.to_string(),
            ),
            "CDUP" => Self::Cdup,
            "CONNECT" => Self::Connect(next_arg(&mut tokens)?.to_string(), false),
            "CONNECT+S" => Self::Connect(next_arg(&mut tokens)?.to_string(), true),
            "CWD" => Self::Cwd(next_arg(&mut tokens)?.to_string()),
            "FEAT" => Self::Feat,
            "HELP" => Self::Help,
            "LIST" => Self::List(tokens.next().map(String::from)),
            "LOGIN" => Self::Login,
            "MDTM" => Self::Mdtm(next_arg(&mut tokens)?.to_string()),
            "MKDIR" => Self::Mkdir(next_arg(&mut tokens)?.to_string()),
            "MODE" => Self::Mode(parse_mode(next_arg(&mut tokens)?)?),
            "NOOP" => Self::Noop,
            "OPTS" => Self::Opts(
                next_arg(&mut tokens)?.to_string(),
                tokens.next().map(String::from),
            ),
            "PUT" => Self::Put(
                PathBuf::from(next_arg(&mut tokens)?),
                next_arg(&mut tokens)?.to_string(),
            ),
            "PWD" => Self::Pwd,
            "QUIT" => Self::Quit,
            "RENAME" => Self::Rename(
                next_arg(&mut tokens)?.to_string(),
                next_arg(&mut tokens)?.to_string(),
            ),
            "RETR" => Self::Retr(
                next_arg(&mut tokens)?.to_string(),
                PathBuf::from(next_arg(&mut tokens)?),
            ),
            "RM" => Self::Rm(next_arg(&mut tokens)?.to_string()),
            "RMDIR" => Self::Rmdir(next_arg(&mut tokens)?.to_string()),
            "SIZE" => Self::Size(next_arg(&mut tokens)?.to_string()),
            _ => return Err("unknown command"),
        };
        Ok(command)
    }
}

fn next_arg<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<&'a str, &'static str> {
    tokens.next().ok_or("missing argument")
}

fn parse_mode(token: &str) -> Result<Mode, &'static str> {
    match token.to_uppercase().as_str() {
        "PASSIVE" => Ok(Mode::Passive),
        "EXTPASSIVE" => Ok(Mode::ExtendedPassive),
        _ => Err("unknown mode"),
    }
}
