//! Startup readiness probe
//!
//! Polls the listening address with TCP connects until the server accepts.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Delay between connection attempts
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Give up after this long
pub const READY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error("server at {addr} not accepting connections after {waited:?}")]
    Timeout { addr: SocketAddr, waited: Duration },
}

/// Wait until `addr` accepts TCP connections
pub async fn wait_until_ready(
    addr: SocketAddr,
    interval: Duration,
    timeout: Duration,
) -> Result<(), ReadinessError> {
    let target = probe_addr(addr);
    let started = Instant::now();
    let deadline = started + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Ok(Ok(_stream)) = tokio::time::timeout(remaining, TcpStream::connect(target)).await
        {
            return Ok(());
        }
        if Instant::now() + interval > deadline {
            return Err(ReadinessError::Timeout {
                addr,
                waited: started.elapsed(),
            });
        }
        tokio::time::sleep(interval).await;
    }
}

/// Wildcard listeners are probed over loopback
fn probe_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_when_listening() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        wait_until_ready(addr, POLL_INTERVAL, READY_TIMEOUT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_times_out_when_nothing_listens() {
        // Reserve a port, then free it
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = wait_until_ready(addr, Duration::from_millis(20), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Timeout { .. }));
    }

    #[test]
    fn test_probe_addr_maps_wildcard() {
        assert_eq!(
            probe_addr("0.0.0.0:8080".parse().unwrap()),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            probe_addr("[::]:8080".parse().unwrap()),
            "[::1]:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            probe_addr("10.1.2.3:80".parse().unwrap()),
            "10.1.2.3:80".parse::<SocketAddr>().unwrap()
        );
    }
}
