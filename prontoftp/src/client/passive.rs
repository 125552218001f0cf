//! # Passive
//!
//! Data-connection negotiation: EPSV with a PASV fallback, each attempt
//! carried through reply scraping and the connect itself, plus the NAT
//! address workaround.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;

use async_std::net::TcpStream;

use super::channel::ControlChannel;
use super::tls::TlsStream;
use crate::command::Command;
use crate::regex::{EPSV_PORT_RE, PASV_PORT_RE};
use crate::types::{FtpError, FtpResult, Mode};
use crate::Status;

/// A function that creates a new stream for the data connection in passive mode.
///
/// It takes a [`SocketAddr`] and returns a [`TcpStream`].
pub type PassiveStreamBuilder = dyn Fn(SocketAddr) -> Pin<Box<dyn Future<Output = FtpResult<TcpStream>> + Send + Sync>>
    + Send
    + Sync;

pub(crate) fn default_passive_stream_builder() -> Box<PassiveStreamBuilder> {
    Box::new(|address| {
        Box::pin(async move {
            TcpStream::connect(address)
                .await
                .map_err(FtpError::ConnectionError)
        })
    })
}

/// Ask the server for a data-connection address and connect to it, trying
/// `primary` first. An attempt fails over to `fallback` whether its reply was
/// no good or the announced address did not answer; a fault on the control
/// connection aborts straight away. Returns the mode that produced a live
/// socket so the caller can remember it.
pub(crate) async fn negotiate_data_addr<T>(
    channel: &mut ControlChannel<T>,
    stream_builder: &PassiveStreamBuilder,
    primary: Mode,
    fallback: Option<Mode>,
) -> FtpResult<(Mode, TcpStream)>
where
    T: TlsStream + Send,
{
    let failure = match request_data_addr(channel, primary).await {
        Ok(addr) => match stream_builder(addr).await {
            Ok(stream) => return Ok((primary, stream)),
            Err(err) => err,
        },
        Err(err) if negotiation_failure(&err) => err,
        Err(err) => return Err(err),
    };
    let mode = match fallback {
        Some(mode) => mode,
        None => return Err(failure),
    };
    debug!("{primary:?} mode attempt failed ({failure}), falling back to {mode:?}");
    let addr = request_data_addr(channel, mode).await?;
    let stream = stream_builder(addr).await?;
    Ok((mode, stream))
}

/// Replies that fail a candidate without compromising the control channel
fn negotiation_failure(err: &FtpError) -> bool {
    matches!(
        err,
        FtpError::UnexpectedResponse(_) | FtpError::BadResponse(_) | FtpError::InvalidAddress(_)
    )
}

async fn request_data_addr<T>(channel: &mut ControlChannel<T>, mode: Mode) -> FtpResult<SocketAddr>
where
    T: TlsStream + Send,
{
    match mode {
        Mode::ExtendedPassive => epsv(channel).await,
        Mode::Passive => pasv(channel).await,
    }
}

async fn epsv<T>(channel: &mut ControlChannel<T>) -> FtpResult<SocketAddr>
where
    T: TlsStream + Send,
{
    debug!("EPSV command");
    channel.send_command(Command::Epsv).await?;
    // EPSV response format : 229 Entering Extended Passive Mode (|||PORT|)
    let response = channel
        .read_reply_in(&[Status::ExtendedPassiveMode])
        .await?;
    let new_port = EPSV_PORT_RE
        .captures(&response.message)
        .and_then(|caps| caps[1].parse::<u16>().ok())
        .ok_or_else(|| FtpError::BadResponse(response.message.clone()))?;
    trace!("Got port number from EPSV: {new_port}");
    let mut remote = channel.peer_addr()?;
    remote.set_port(new_port);
    trace!("Remote address for extended passive mode is {remote}");
    Ok(remote)
}

async fn pasv<T>(channel: &mut ControlChannel<T>) -> FtpResult<SocketAddr>
where
    T: TlsStream + Send,
{
    debug!("PASV command");
    channel.send_command(Command::Pasv).await?;
    // PASV response format : 227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)
    let response = channel.read_reply_in(&[Status::PassiveMode]).await?;
    let (announced, port) = parse_pasv_message(&response.message)?;
    let remote = correct_nat_addr(announced, port, channel.peer_addr()?);
    trace!("Passive address: {remote}");
    Ok(remote)
}

/// Scrape the host and port out of a PASV reply
fn parse_pasv_message(message: &str) -> FtpResult<(Ipv4Addr, u16)> {
    let caps = PASV_PORT_RE
        .captures(message)
        .ok_or_else(|| FtpError::BadResponse(message.to_string()))?;
    let announced = format!("{}.{}.{}.{}", &caps[1], &caps[2], &caps[3], &caps[4])
        .parse::<Ipv4Addr>()
        .map_err(FtpError::InvalidAddress)?;
    let octet = |index: usize| {
        caps[index]
            .parse::<u16>()
            .ok()
            .filter(|&value| value < 256)
            .ok_or_else(|| FtpError::BadResponse(message.to_string()))
    };
    let port = (octet(5)? << 8) | octet(6)?;
    Ok((announced, port))
}

/// A server behind NAT announces the address of its own network interface,
/// which is unreachable from here. When the announced host is RFC1918-private
/// but the control connection's peer is not, the peer address is the one that
/// actually routes, so use it.
fn correct_nat_addr(announced: Ipv4Addr, port: u16, control_peer: SocketAddr) -> SocketAddr {
    let peer_private = match control_peer.ip() {
        IpAddr::V4(ip) => ip.is_private(),
        IpAddr::V6(ip) => ip.to_ipv4_mapped().is_some_and(|ip| ip.is_private()),
    };
    if announced.is_private() && !peer_private {
        let remote = SocketAddr::new(control_peer.ip(), port);
        trace!("Replacing site local address {announced}:{port} with {remote}");
        remote
    } else {
        SocketAddr::new(IpAddr::V4(announced), port)
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_parse_pasv_message() {
        crate::log_init();
        let (addr, port) =
            parse_pasv_message("227 Entering Passive Mode (213,229,112,130,216,4)").unwrap();
        assert_eq!(addr, Ipv4Addr::new(213, 229, 112, 130));
        assert_eq!(port, 216 * 256 + 4);
    }

    #[test]
    fn should_refuse_pasv_message_without_a_tuple() {
        crate::log_init();
        assert!(matches!(
            parse_pasv_message("227 Entering Passive Mode"),
            Err(FtpError::BadResponse(raw)) if raw.as_str() == "227 Entering Passive Mode"
        ));
    }

    #[test]
    fn should_refuse_pasv_host_that_is_no_address() {
        crate::log_init();
        assert!(matches!(
            parse_pasv_message("227 Entering Passive Mode (300,1,2,3,4,5)"),
            Err(FtpError::InvalidAddress(_))
        ));
    }

    #[test]
    fn should_refuse_pasv_port_octet_out_of_range() {
        crate::log_init();
        assert!(matches!(
            parse_pasv_message("227 Entering Passive Mode (192,168,1,7,999,22)"),
            Err(FtpError::BadResponse(_))
        ));
    }

    #[test]
    fn should_substitute_private_announcement_with_public_peer() {
        crate::log_init();
        let peer: SocketAddr = "203.0.113.5:21".parse().unwrap();
        assert_eq!(
            correct_nat_addr(Ipv4Addr::new(192, 168, 1, 7), 2121, peer),
            "203.0.113.5:2121".parse().unwrap()
        );
    }

    #[test]
    fn should_substitute_when_the_peer_is_loopback() {
        crate::log_init();
        // loopback is not an RFC1918 network, so a private announcement over
        // it is still considered bogus
        let peer: SocketAddr = "127.0.0.1:21".parse().unwrap();
        assert_eq!(
            correct_nat_addr(Ipv4Addr::new(10, 0, 0, 2), 3000, peer),
            "127.0.0.1:3000".parse().unwrap()
        );
    }

    #[test]
    fn should_keep_private_announcement_inside_a_private_network() {
        crate::log_init();
        let peer: SocketAddr = "192.168.1.2:21".parse().unwrap();
        assert_eq!(
            correct_nat_addr(Ipv4Addr::new(192, 168, 1, 7), 2121, peer),
            "192.168.1.7:2121".parse().unwrap()
        );
    }

    #[test]
    fn should_keep_public_announcement() {
        crate::log_init();
        let peer: SocketAddr = "198.51.100.4:21".parse().unwrap();
        assert_eq!(
            correct_nat_addr(Ipv4Addr::new(203, 0, 113, 9), 2121, peer),
            "203.0.113.9:2121".parse().unwrap()
        );
    }

    #[test]
    fn should_see_through_a_mapped_ipv6_peer() {
        crate::log_init();
        let mapped: SocketAddr = "[::ffff:192.168.1.2]:21".parse().unwrap();
        // the mapped peer is itself private, so the announcement stands
        assert_eq!(
            correct_nat_addr(Ipv4Addr::new(192, 168, 1, 7), 2121, mapped),
            "192.168.1.7:2121".parse().unwrap()
        );
        let mapped_public: SocketAddr = "[::ffff:203.0.113.5]:21".parse().unwrap();
        assert_eq!(
            correct_nat_addr(Ipv4Addr::new(192, 168, 1, 7), 2121, mapped_public),
            SocketAddr::new(mapped_public.ip(), 2121)
        );
    }
}
