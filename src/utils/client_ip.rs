//! Client address resolution for per-client admission control.

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use std::net::{IpAddr, SocketAddr};

/// Key shared by requests that carry no usable address.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolves the limiter key for a request: the client IP, without port.
///
/// With `behind_proxy`, the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`; both are only trustworthy behind a proxy that overwrites
/// them. Otherwise the socket peer from [`ConnectInfo`] is used.
pub fn client_key(parts: &Parts, behind_proxy: bool) -> String {
    if behind_proxy && let Some(ip) = forwarded_ip(parts) {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(parts: &Parts) -> Option<IpAddr> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next().and_then(|hop| hop.trim().parse().ok()))
        .or_else(|| header("x-real-ip").and_then(|v| v.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)], peer: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = builder.body(()).unwrap();
        if let Some(peer) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        }
        request.into_parts().0
    }

    #[test]
    fn test_peer_ip_without_port() {
        let parts = parts(&[], Some("10.1.2.3:51234"));
        assert_eq!(client_key(&parts, false), "10.1.2.3");
    }

    #[test]
    fn test_same_host_different_ports_share_key() {
        let a = parts(&[], Some("10.1.2.3:1000"));
        let b = parts(&[], Some("10.1.2.3:2000"));
        assert_eq!(client_key(&a, false), client_key(&b, false));
    }

    #[test]
    fn test_forwarded_headers_ignored_without_proxy() {
        let parts = parts(&[("x-forwarded-for", "203.0.113.9")], Some("10.1.2.3:1000"));
        assert_eq!(client_key(&parts, false), "10.1.2.3");
    }

    #[test]
    fn test_first_forwarded_hop_behind_proxy() {
        let parts = parts(
            &[("x-forwarded-for", "203.0.113.9, 10.0.0.1"), ("x-real-ip", "198.51.100.7")],
            Some("10.1.2.3:1000"),
        );
        assert_eq!(client_key(&parts, true), "203.0.113.9");
    }

    #[test]
    fn test_real_ip_fallback_behind_proxy() {
        let parts = parts(&[("x-real-ip", "198.51.100.7")], Some("10.1.2.3:1000"));
        assert_eq!(client_key(&parts, true), "198.51.100.7");
    }

    #[test]
    fn test_garbage_header_falls_back_to_peer() {
        let parts = parts(&[("x-forwarded-for", "not-an-ip")], Some("10.1.2.3:1000"));
        assert_eq!(client_key(&parts, true), "10.1.2.3");
    }

    #[test]
    fn test_no_address_is_unknown() {
        assert_eq!(client_key(&parts(&[], None), false), UNKNOWN_CLIENT);
    }
}
