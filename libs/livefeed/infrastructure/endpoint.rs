//! WebSocket endpoint resolution
//!
//! The stream URL is derived from where the dashboard is served, unless an
//! explicit API base is configured.

use thiserror::Error;
use url::Url;

/// Port the backend listens on in local development
pub const BACKEND_PORT: u16 = 8000;

/// Path of the market push endpoint on the backend
pub const STREAM_PATH: &str = "/ws/market";

const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Unsupported scheme '{0}' for API base URL")]
    UnsupportedScheme(String),
}

pub type Result<T> = std::result::Result<T, EndpointError>;

fn parse(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|source| EndpointError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

fn host_of(url: &Url) -> Result<String> {
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .ok_or_else(|| EndpointError::MissingHost(url.to_string()))
}

fn build(scheme: &str, host: &str, port: Option<u16>, path: &str) -> Result<Url> {
    let raw = match port {
        Some(port) => format!("{}://{}:{}{}", scheme, host, port, path),
        None => format!("{}://{}{}", scheme, host, path),
    };
    parse(&raw)
}

pub fn is_local_host(host: &str) -> bool {
    LOCAL_HOSTS.iter().any(|local| local.eq_ignore_ascii_case(host))
}

/// Resolve the market stream URL
///
/// With `api_base_override` the override's scheme, host, port and path are
/// used (`http` maps to `ws`, `https` to `wss`). Otherwise the page origin
/// decides: `wss` for https pages, `ws` for everything else. A local page
/// served from any port but [`BACKEND_PORT`] is a dev server, so the
/// backend port is used instead.
pub fn resolve_ws_url(page_origin: &str, api_base_override: Option<&str>) -> Result<Url> {
    if let Some(base) = api_base_override.filter(|b| !b.trim().is_empty()) {
        let base = parse(base)?;
        let scheme = match base.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };
        let path = format!("{}{}", base.path().trim_end_matches('/'), STREAM_PATH);
        return build(scheme, &host_of(&base)?, base.port(), &path);
    }

    let origin = parse(page_origin)?;
    let scheme = if origin.scheme() == "https" { "wss" } else { "ws" };
    let host = host_of(&origin)?;

    let port = if is_local_host(&host) && origin.port_or_known_default() != Some(BACKEND_PORT) {
        Some(BACKEND_PORT)
    } else {
        origin.port()
    };

    build(scheme, &host, port, STREAM_PATH)
}
