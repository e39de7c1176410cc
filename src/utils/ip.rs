//! 客户端 IP 解析
//!
//! 曝光和点击明细要记录来访 IP。只有当连接来自可信代理时才采信
//! X-Forwarded-For / X-Real-IP，否则使用连接地址，防止伪造。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;

/// 私有网段或本机地址
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// 解析 "ip" 或 "ip:port"
fn parse_peer(peer: &str) -> Option<IpAddr> {
    peer.parse::<SocketAddr>()
        .map(|s| s.ip())
        .or_else(|_| peer.parse::<IpAddr>())
        .ok()
}

pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<u32>()) else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            (u32::from(*ip) & mask) == (u32::from(net) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            (u128::from(*ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// 连接地址是否命中可信代理列表（单 IP 或 CIDR）
pub fn is_trusted_proxy(peer: &str, trusted_proxies: &[String]) -> bool {
    let Some(addr) = parse_peer(peer) else {
        return false;
    };
    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&addr, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == addr)
        }
    })
}

/// 决定最终记录的客户端 IP
///
/// - 配置了 trusted_proxies：仅在命中时采信转发头
/// - 未配置：连接来自私网或本机时视为反向代理
/// - 其余情况使用连接地址
pub fn resolve_client_ip(
    peer: Option<&str>,
    forwarded: Option<String>,
    trusted_proxies: &[String],
) -> Option<String> {
    let Some(peer) = peer else {
        return forwarded;
    };
    let peer_ip = parse_peer(peer)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| peer.to_string());

    let trust_forwarded = if trusted_proxies.is_empty() {
        parse_peer(peer).is_some_and(|ip| is_private_or_local(&ip))
    } else {
        is_trusted_proxy(peer, trusted_proxies)
    };

    match forwarded {
        Some(real_ip) if trust_forwarded => {
            debug!("Forwarded client IP via proxy {}: {}", peer_ip, real_ip);
            Some(real_ip)
        }
        _ => Some(peer_ip),
    }
}

/// X-Forwarded-For 的第一个地址，其次 X-Real-IP
pub fn forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

pub fn extract_client_ip(req: &HttpRequest, trusted_proxies: &[String]) -> Option<String> {
    let peer = req.peer_addr().map(|addr| addr.to_string());
    resolve_client_ip(
        peer.as_deref(),
        forwarded_ip_from_headers(req.headers()),
        trusted_proxies,
    )
}
