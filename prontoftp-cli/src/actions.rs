use std::io;
use std::io::Write as _;
use std::path::Path;

use async_std::fs::File;
use prontoftp::async_native_tls::TlsConnector;
use prontoftp::types::FileType;
use prontoftp::{Mode, NativeTlsConnector};

use super::FtpClient;

pub async fn quit(ftp: Option<FtpClient>) {
    if let Some(ftp) = ftp {
        match ftp.quit().await {
            Ok(_) => println!("OK"),
            Err(err) => eprintln!("Failed to disconnect from remote: {err}"),
        }
    }
}

pub async fn cdup(ftp: &mut FtpClient) {
    match ftp.cdup().await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("CDUP error: {err}"),
    }
}

pub async fn connect(remote: &str, secure: bool) -> Option<FtpClient> {
    let mut client: FtpClient = match FtpClient::connect(remote).await {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Failed to connect to remote: {err}");
            return None;
        }
    };
    // if secure, enable TLS
    if secure {
        let ctx = TlsConnector::new()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
        // Get address without port
        let address: &str = remote.split(':').next().unwrap();
        client = match client
            .into_secure(NativeTlsConnector::from(ctx), address)
            .await
        {
            Ok(c) => c,
            Err(err) => {
                eprintln!("Failed to setup TLS stream: {err}");
                return None;
            }
        };
    }
    // Set transfer type to binary
    if let Err(err) = client.transfer_type(FileType::Binary).await {
        eprintln!("Failed to set transfer type to binary: {err}");
    }
    println!("OK");
    Some(client)
}

pub async fn cwd(ftp: &mut FtpClient, dir: &str) {
    match ftp.cwd(dir).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("CWD error: {err}"),
    }
}

pub async fn feat(ftp: &mut FtpClient) {
    match ftp.feat().await {
        Ok(features) => {
            for (feature, value) in features.iter() {
                match value {
                    Some(value) => println!("{feature}: {value}"),
                    None => println!("{feature}"),
                }
            }
        }
        Err(err) => eprintln!("FEAT error: {err}"),
    }
}

pub async fn list(ftp: &mut FtpClient, p: Option<&str>) {
    match ftp.list(p).await {
        Ok(files) => {
            for file in files.iter() {
                let marker = if file.is_directory() { "<DIR>" } else { "" };
                println!(
                    "{:<5} {:>12} {:<12} {}",
                    marker,
                    file.size(),
                    file.modified_raw(),
                    file.name()
                );
            }
        }
        Err(err) => eprintln!("LIST error: {err}"),
    }
}

pub async fn login(ftp: &mut FtpClient) {
    // Read username
    print!("Username: ");
    let _ = io::stdout().flush();
    let mut username = String::new();
    if let Err(err) = io::stdin().read_line(&mut username) {
        eprintln!("Could not read username: {err}");
        return;
    }
    // Read password
    let password = match rpassword::prompt_password("Password: ") {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Could not read password: {err}");
            return;
        }
    };
    // Login
    match ftp.login(username.trim(), password.as_str()).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("LOGIN error: {err}"),
    }
}

pub async fn mdtm(ftp: &mut FtpClient, f: &str) {
    match ftp.mdtm(f).await {
        Ok(time) => println!("OK: {time}"),
        Err(err) => eprintln!("MDTM error: {err}"),
    }
}

pub async fn mkdir(ftp: &mut FtpClient, f: &str) {
    match ftp.mkdir(f).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("MKDIR error: {err}"),
    }
}

pub fn set_mode(ftp: &mut FtpClient, mode: Mode) {
    ftp.set_mode(mode);
    println!("OK");
}

pub async fn noop(ftp: &mut FtpClient) {
    match ftp.noop().await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("NOOP error: {err}"),
    }
}

pub async fn opts(ftp: &mut FtpClient, feature: String, value: Option<String>) {
    match ftp.opts(feature.as_str(), value.as_deref()).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("OPTS error: {err}"),
    }
}

pub async fn appe(ftp: &mut FtpClient, local: &Path, dest: &str) {
    let mut reader = match File::open(local).await {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to open local file for read: {err}");
            return;
        }
    };
    match ftp.append_from(dest, &mut reader).await {
        Ok(sent) => println!("OK: appended {sent} bytes"),
        Err(err) => eprintln!("APPE error: {err}"),
    }
}

pub async fn put(ftp: &mut FtpClient, local: &Path, dest: &str) {
    let mut reader = match File::open(local).await {
        Ok(r) => r,
        Err(err) => {
            eprintln!("Failed to open local file for read: {err}");
            return;
        }
    };
    match ftp.upload_from(dest, &mut reader).await {
        Ok(sent) => println!("OK: sent {sent} bytes"),
        Err(err) => eprintln!("PUT error: {err}"),
    }
}

pub async fn pwd(ftp: &mut FtpClient) {
    match ftp.pwd().await {
        Ok(p) => println!("OK: {p}"),
        Err(err) => eprintln!("PWD error: {err}"),
    }
}

pub async fn rename(ftp: &mut FtpClient, src: &str, dest: &str) {
    match ftp.rename(src, dest).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RENAME error: {err}"),
    }
}

pub async fn retr(ftp: &mut FtpClient, file: &str, dest: &Path) {
    let mut dest = match File::create(dest).await {
        Ok(d) => d,
        Err(err) => {
            eprintln!("Failed to open destination file: {err}");
            return;
        }
    };
    match ftp.download_to(file, &mut dest, 0).await {
        Ok(received) => println!("OK: received {received} bytes"),
        Err(err) => eprintln!("RETR error: {err}"),
    }
}

pub async fn rm(ftp: &mut FtpClient, file: &str) {
    match ftp.rm(file).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RM error: {err}"),
    }
}

pub async fn rmdir(ftp: &mut FtpClient, dir: &str) {
    match ftp.rmdir(dir).await {
        Ok(_) => println!("OK"),
        Err(err) => eprintln!("RMDIR error: {err}"),
    }
}

pub async fn size(ftp: &mut FtpClient, file: &str) {
    match ftp.size(file).await {
        Ok(size) => println!("OK: {size}"),
        Err(err) => eprintln!("SIZE error: {err}"),
    }
}
