//! # ProntoFTP Client
//!
//! This is a client you can install via `cargo install prontoftp-cli` on your system to connect and work with FTP servers
//!

// -- mods
mod actions;
mod args;
mod command;

use std::io;
use std::io::Write;
use std::str::FromStr;

use actions::*;
use args::Args;
use command::Command;
use env_logger::Builder as LogBuilder;
use log::LevelFilter;
use prontoftp::NativeTlsFtpClient as FtpClient;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() {
    println!("Available commands:");
    println!("APPE <file> <dest>                  Append content of local file `file` to `dest`");
    println!("CDUP                                Go to parent directory");
    println!("CONNECT <addr:port>                 Connect to remote host");
    println!("CONNECT+S <addr:port>               Connect to remote host using FTPS");
    println!("CWD <dir>                           Change working directory");
    println!("FEAT                                Get supported features on the server");
    println!("HELP                                Print this help");
    println!("LIST [dir]                          List files. If directory is not provided, current directory is used");
    println!("LOGIN                               Login to remote");
    println!("MDTM <file>                         Get modification time for `file`");
    println!("MODE <PASSIVE|EXTPASSIVE>           Set mode");
    println!("NOOP                                Ping server");
    println!("OPTS <feature-name> [feature-value] Set a feature on the server (e.g. OPTS UTF8 ON)");
    println!("PUT <file> <dest>                   Upload local file `file` to `dest`");
    println!("PWD                                 Print working directory");
    println!("QUIT                                Quit prontoftp");
    println!("RENAME <source> <dest>              Rename file `source` to `dest`");
    println!("RETR <file> <dest>                  Download `file` to `dest`");
    println!("RM <file>                           Remove file");
    println!("RMDIR <dir>                         Remove directory");
    println!("SIZE <file>                         Get `file` size");
}

fn input() -> Command {
    loop {
        print!(">> ");
        let _ = io::stdout().flush();
        let mut input: String = String::new();
        io::stdin()
            .read_line(&mut input)
            .expect("Failed to read stdin");
        // Try to create command
        if let Ok(cmd) = Command::from_str(input.as_str()) {
            return cmd;
        }
        println!("Unknown command");
    }
}

#[async_std::main]
async fn main() {
    let args: Args = argh::from_env();
    // print version
    if args.version {
        println!("prontoftp {APP_VERSION}")
    }
    // init logger
    LogBuilder::new()
        .filter_level(if args.debug {
            LevelFilter::Trace
        } else if args.verbose {
            LevelFilter::Info
        } else {
            LevelFilter::Off
        })
        .init();
    // Main loop
    let mut ftp: Option<FtpClient> = None;

    // connect if host is specified
    if let Some(host) = args.host {
        perform(&mut ftp, Command::Connect(host, false)).await;
    }

    loop {
        match input() {
            Command::Quit => {
                // Break if quit
                quit(ftp).await;
                break;
            }
            Command::Help => usage(),
            cmd => perform(&mut ftp, cmd).await,
        }
    }
}

async fn perform(ftp: &mut Option<FtpClient>, command: Command) {
    match ftp {
        Some(ftp) => perform_connected(ftp, command).await,
        None => {
            if let Some(stream) = perform_uninitialized(command).await {
                *ftp = Some(stream);
            }
        }
    }
}

async fn perform_uninitialized(command: Command) -> Option<FtpClient> {
    match command {
        Command::Connect(remote, secure) => connect(remote.as_str(), secure).await,
        _ => {
            eprintln!("Can't perform command: you must connect to remote first");
            None
        }
    }
}

async fn perform_connected(ftp: &mut FtpClient, command: Command) {
    match command {
        Command::Appe(src, dest) => appe(ftp, src.as_path(), dest.as_str()).await,
        Command::Cdup => cdup(ftp).await,
        Command::Connect(remote, secure) => {
            if let Some(stream) = connect(remote.as_str(), secure).await {
                *ftp = stream;
            }
        }
        Command::Cwd(dir) => cwd(ftp, dir.as_str()).await,
        Command::List(p) => list(ftp, p.as_deref()).await,
        Command::Feat => feat(ftp).await,
        Command::Login => login(ftp).await,
        Command::Mdtm(p) => mdtm(ftp, p.as_str()).await,
        Command::Mkdir(p) => mkdir(ftp, p.as_str()).await,
        Command::Mode(m) => set_mode(ftp, m),
        Command::Noop => noop(ftp).await,
        Command::Opts(feature, value) => opts(ftp, feature, value).await,
        Command::Put(src, dest) => put(ftp, src.as_path(), dest.as_str()).await,
        Command::Pwd => pwd(ftp).await,
        Command::Rename(src, dest) => rename(ftp, src.as_str(), dest.as_str()).await,
        Command::Retr(file, dest) => retr(ftp, file.as_str(), dest.as_path()).await,
        Command::Rm(file) => rm(ftp, file.as_str()).await,
        Command::Rmdir(file) => rmdir(ftp, file.as_str()).await,
        Command::Size(file) => size(ftp, file.as_str()).await,
        Command::Help | Command::Quit => {
            panic!("Something unexpected happened")
        }
    }
}
