//! To run this example enable the rustls feature (--features rustls).
//! If you use this code in your own project you need to enable prontoftp's
//! rustls feature through Cargo.toml and also include the webpki-roots crate
//! as a dependency (this includes Mozilla's root certificates for use with
//! rustls).

use std::sync::Arc;

use async_std::task;
use prontoftp::futures_rustls::rustls::{ClientConfig, RootCertStore};
use prontoftp::futures_rustls::TlsConnector;
use prontoftp::{FtpResult, RustlsConnector, RustlsFtpClient};

fn main() -> FtpResult<()> {
    task::block_on(async {
        let root_store =
            RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        // Create a connection to an FTP server and authenticate to it.
        let mut client = RustlsFtpClient::connect("test.rebex.net:21")
            .await?
            .into_secure(
                RustlsConnector::from(TlsConnector::from(Arc::new(config))),
                "test.rebex.net",
            )
            .await?;
        client.login("demo", "password").await?;

        println!("Current directory: {}", client.pwd().await?);

        // Terminate the connection to the server.
        client.quit().await
    })
}
