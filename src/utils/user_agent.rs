// ABOUTME: Login-device extraction from the User-Agent and X-Forwarded-For headers
// ABOUTME: Produces the device name, browser name and client IP recorded after a successful login
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::net::SocketAddr;

use http::header::USER_AGENT;
use http::HeaderMap;
use warden_core::models::LoginDevice;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_IP: &str = "Unknown IP";

/// Login device for a request with `headers`, received from `peer`
#[must_use]
pub fn login_device(headers: &HeaderMap, peer: Option<SocketAddr>) -> LoginDevice {
    let defaults = LoginDevice::default();
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ua| !ua.is_empty());

    LoginDevice {
        device: user_agent
            .and_then(device_name)
            .map_or(defaults.device, str::to_owned),
        client: user_agent
            .and_then(browser_name)
            .map_or(defaults.client, str::to_owned),
        ip_address: client_ip(headers, peer),
    }
}

/// Client address: first `X-Forwarded-For` entry, else the peer address
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_owned())
}

/// Device name, checked from most to least specific
fn device_name(ua: &str) -> Option<&'static str> {
    // iOS agents also contain "like Mac OS X"
    if ua.contains("iPhone") {
        return Some("Apple iPhone");
    }
    if ua.contains("iPad") {
        return Some("Apple iPad");
    }
    if ua.contains("Android") {
        return Some(if ua.contains("Mobile") {
            "Android Mobile"
        } else {
            "Android Tablet"
        });
    }
    if ua.contains("Windows") {
        return Some("Windows Desktop");
    }
    if ua.contains("Macintosh") || ua.contains("Mac OS X") {
        return Some("Apple Macintosh");
    }
    if ua.contains("CrOS") {
        return Some("Chromebook");
    }
    if ua.contains("Linux") {
        return Some("Linux Desktop");
    }
    None
}

/// Browser name; Chromium derivatives before Chrome, Chrome before Safari
fn browser_name(ua: &str) -> Option<&'static str> {
    if ua.contains("Edg/") || ua.contains("Edge/") {
        return Some("Edge");
    }
    if ua.contains("OPR/") || ua.contains("Opera") {
        return Some("Opera");
    }
    if ua.contains("Firefox/") {
        return Some("Firefox");
    }
    if ua.contains("Chrome/") || ua.contains("CriOS/") {
        return Some("Chrome");
    }
    if ua.contains("Safari/") {
        return Some("Safari");
    }
    if ua.contains("MSIE") || ua.contains("Trident/") {
        return Some("Internet Explorer");
    }
    if ua.starts_with("curl/") {
        return Some("curl");
    }
    None
}
