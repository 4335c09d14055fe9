//! Detectors for network resources: URLs, images and IP addresses

use crate::detector::{compile, single_token, Detector};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::Url;

const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ws", "wss", "file"];

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico", "avif", "tiff",
];

/// Parse a URL candidate, accepting bare `www.` hosts
fn parse_url(token: &str) -> Option<Url> {
    let url = if token.starts_with("www.") {
        Url::parse(&format!("https://{}", token)).ok()?
    } else {
        if !token.contains("://") {
            return None;
        }
        Url::parse(token).ok()?
    };

    if !URL_SCHEMES.contains(&url.scheme()) {
        return None;
    }
    if url.scheme() != "file" && url.host_str().map_or(true, str::is_empty) {
        return None;
    }
    Some(url)
}

/// URL detector backed by the `url` parser
pub struct UrlDetector;

impl Detector for UrlDetector {
    fn name(&self) -> &str {
        "url"
    }

    fn format(&self) -> FormatType {
        FormatType::Url
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let url = parse_url(single_token(content)?)?;

        let label = match url.scheme() {
            "ws" | "wss" => "WebSocket URL",
            "file" => "File URL",
            _ => "URL",
        };

        let mut result = ClassificationResult::new(FormatType::Url, 90, label)
            .with_field("Scheme", url.scheme());
        if let Some(host) = url.host_str() {
            result = result.with_field("Host", host);
        }
        if let Some(port) = url.port() {
            result = result.with_field("Port", port.to_string());
        }
        if url.path() != "/" && !url.path().is_empty() {
            result = result.with_field("Path", url.path());
        }
        let params: Vec<String> = url
            .query_pairs()
            .take(10)
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !params.is_empty() {
            result = result.with_field("Query", params.join("&"));
        }
        if let Some(fragment) = url.fragment() {
            result = result.with_field("Fragment", fragment);
        }

        Some(result)
    }
}

/// Image detector: `data:image/*` URIs and links to image files
pub struct ImageDetector {
    data_uri: Regex,
}

impl ImageDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            data_uri: compile(
                "image data uri",
                r"^data:image/([A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/]+={0,2})$",
            )?,
        })
    }
}

impl Detector for ImageDetector {
    fn name(&self) -> &str {
        "image"
    }

    fn format(&self) -> FormatType {
        FormatType::Image
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;

        if let Some(caps) = self.data_uri.captures(token) {
            let bytes = STANDARD.decode(&caps[2]).ok()?;
            return Some(
                ClassificationResult::new(FormatType::Image, 95, "Image")
                    .with_field("Source", "data URI")
                    .with_field("Format", caps[1].to_ascii_uppercase())
                    .with_field("Size", format!("{} bytes", bytes.len())),
            );
        }

        let url = parse_url(token)?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let extension = url
            .path()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())?;
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return None;
        }

        Some(
            ClassificationResult::new(FormatType::Image, 92, "Image")
                .with_field("Source", "remote")
                .with_field("Format", extension.to_ascii_uppercase())
                .with_field("Host", url.host_str().unwrap_or_default()),
        )
    }
}

/// IPv4 / IPv6 address detector
pub struct IpDetector;

impl IpDetector {
    fn v4_scope(ip: &Ipv4Addr) -> &'static str {
        if ip.is_loopback() {
            "loopback"
        } else if ip.is_private() {
            "private"
        } else if ip.is_link_local() {
            "link-local"
        } else if ip.is_multicast() {
            "multicast"
        } else if ip.is_broadcast() {
            "broadcast"
        } else if ip.is_unspecified() {
            "unspecified"
        } else {
            "public"
        }
    }

    fn v6_scope(ip: &Ipv6Addr) -> &'static str {
        let head = ip.segments()[0];
        if ip.is_loopback() {
            "loopback"
        } else if ip.is_unspecified() {
            "unspecified"
        } else if ip.is_multicast() {
            "multicast"
        } else if head & 0xffc0 == 0xfe80 {
            "link-local"
        } else if head & 0xfe00 == 0xfc00 {
            "unique-local"
        } else {
            "public"
        }
    }
}

impl Detector for IpDetector {
    fn name(&self) -> &str {
        "ip_address"
    }

    fn format(&self) -> FormatType {
        FormatType::IpAddress
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;

        let (ip, port) = match token.parse::<IpAddr>() {
            Ok(ip) => (ip, None),
            Err(_) => {
                let socket = token.parse::<SocketAddr>().ok()?;
                (socket.ip(), Some(socket.port()))
            }
        };

        let (version, scope) = match &ip {
            IpAddr::V4(v4) => ("IPv4", Self::v4_scope(v4)),
            IpAddr::V6(v6) => ("IPv6", Self::v6_scope(v6)),
        };

        let mut result = ClassificationResult::new(FormatType::IpAddress, 90, version)
            .with_field("Address", ip.to_string())
            .with_field("Version", version)
            .with_field("Scope", scope);
        if let Some(port) = port {
            result = result.with_field("Port", port.to_string());
        }
        Some(result)
    }
}
