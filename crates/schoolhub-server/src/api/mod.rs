pub mod admin;
pub mod audit_log;
pub mod school;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, StatusCode},
    Json,
};
use schoolhub_core::RequestMeta;
use schoolhub_db::AppState;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Error half of every handler result: a status plus `{"error": ...}`.
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

/// Client address and user agent of the current request.
///
/// The address is the socket peer. `X-Forwarded-For` is only followed when
/// the peer is a trusted proxy, and then only back to the first hop that is
/// not itself trusted.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub RequestMeta);

impl FromRequestParts<Arc<AppState>> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta(client_meta(parts, &state.trusted_proxies)))
    }
}

fn client_meta(parts: &Parts, trusted_proxies: &[IpAddr]) -> RequestMeta {
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());

    let user_agent = parts
        .headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    RequestMeta {
        ip_address: peer
            .map(|peer| client_ip(peer, forwarded, trusted_proxies))
            .map(|ip| ip.to_string()),
        user_agent,
    }
}

fn client_ip(peer: IpAddr, forwarded: Option<&str>, trusted_proxies: &[IpAddr]) -> IpAddr {
    let mut client = peer;
    if !trusted_proxies.contains(&peer) {
        return client;
    }
    let Some(forwarded) = forwarded else {
        return client;
    };

    for hop in forwarded.rsplit(',').map(str::trim) {
        match hop.parse::<IpAddr>() {
            Ok(ip) => {
                client = ip;
                if !trusted_proxies.contains(&ip) {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    client
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const PROXY: [u8; 4] = [10, 0, 0, 1];

    fn parts(peer: Option<[u8; 4]>, forwarded: Option<&str>) -> Parts {
        let mut req = Request::builder().header("User-Agent", "Mozilla/5.0");
        if let Some(forwarded) = forwarded {
            req = req.header("X-Forwarded-For", forwarded);
        }
        let mut req = req.body(()).unwrap();
        if let Some(peer) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(SocketAddr::from((peer, 51000))));
        }
        req.into_parts().0
    }

    fn trusted() -> Vec<IpAddr> {
        vec![IpAddr::from(PROXY)]
    }

    #[test]
    fn untrusted_peer_ignores_forwarded_header() {
        let meta = client_meta(
            &parts(Some([198, 51, 100, 4]), Some("1.2.3.4")),
            &trusted(),
        );
        assert_eq!(meta.ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn no_trusted_proxies_means_peer_address() {
        let meta = client_meta(&parts(Some(PROXY), Some("203.0.113.7")), &[]);
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn trusted_proxy_forwards_client_address() {
        let meta = client_meta(&parts(Some(PROXY), Some("203.0.113.7")), &trusted());
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn forged_leftmost_hop_is_not_believed() {
        // The client prepended a fake hop; the proxy appended the real one.
        let meta = client_meta(
            &parts(Some(PROXY), Some("6.6.6.6, 203.0.113.7, 10.0.0.1")),
            &trusted(),
        );
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn garbage_hop_stops_at_last_known_address() {
        let meta = client_meta(&parts(Some(PROXY), Some("nonsense")), &trusted());
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn without_peer_nothing_is_known() {
        let meta = client_meta(&parts(None, Some("203.0.113.7")), &trusted());
        assert_eq!(meta.ip_address, None);
    }

    #[test]
    fn api_error_wraps_message() {
        let (status, Json(body)) = api_error(StatusCode::NOT_FOUND, "missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "missing");
    }
}
