use std::fmt;

#[derive(Debug)]
pub enum FlightError {
    Timeout,
    ConnectionFailed(String),
    DnsResolution(String),
    ProxyError(String),
    TlsError(String),
    RateLimited,
    HttpStatus(u16),
    InvalidResponse(String),
    InvalidDate(String),
    Validation(String),
}

impl FlightError {
    /// HTTP status of a failed upstream call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(429),
            Self::HttpStatus(status) => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::ConnectionFailed(_)
                | Self::DnsResolution(_)
                | Self::ProxyError(_)
                | Self::TlsError(_)
                | Self::RateLimited
                | Self::HttpStatus(_)
        )
    }
}

impl fmt::Display for FlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(
                f,
                "request timed out — the flight API may be slow or unreachable. \
                 Try increasing --timeout or check your connection"
            ),
            Self::ConnectionFailed(detail) => write!(
                f,
                "connection failed — check your internet connection ({detail})"
            ),
            Self::DnsResolution(host) => write!(
                f,
                "DNS resolution failed for {host} — check your internet connection"
            ),
            Self::ProxyError(detail) => write!(
                f,
                "proxy error — check your --proxy URL is correct ({detail})"
            ),
            Self::TlsError(detail) => write!(
                f,
                "TLS/SSL error — connection to the flight API failed ({detail})"
            ),
            Self::RateLimited => write!(
                f,
                "rate limited by the flight API (HTTP 429) — wait a moment before retrying"
            ),
            Self::HttpStatus(status) => {
                write!(f, "API error: unexpected HTTP status {status}")?;
                if matches!(status, 401 | 403) {
                    write!(f, " — check that RAPIDAPI_KEY / --api-key is set")?;
                }
                Ok(())
            }
            Self::InvalidResponse(detail) => write!(
                f,
                "the flight API returned a response that is not JSON ({detail})"
            ),
            Self::InvalidDate(date) => write!(
                f,
                "invalid date \"{date}\" — must be YYYY-MM-DD format (e.g. 2026-03-01)"
            ),
            Self::Validation(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FlightError {}

pub fn from_http_error(err: wreq::Error) -> FlightError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();

    if err.is_timeout() {
        return FlightError::Timeout;
    }

    if err.is_connect() {
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("getaddrinfo") {
            return FlightError::DnsResolution(msg);
        }
        return FlightError::ConnectionFailed(msg);
    }

    if lower.contains("proxy") || lower.contains("socks") {
        return FlightError::ProxyError(msg);
    }

    if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        return FlightError::TlsError(msg);
    }

    if lower.contains("builder error") && lower.contains("uri") {
        return FlightError::ProxyError(msg);
    }

    FlightError::ConnectionFailed(msg)
}

#[derive(Debug)]
pub enum StoreError {
    Io { key: String, source: std::io::Error },
    Malformed { key: String, detail: String },
    UnsupportedVersion { key: String, version: u32 },
    Encode { key: String, detail: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { key, source } => {
                write!(f, "could not access stored \"{key}\" ({source})")
            }
            Self::Malformed { key, detail } => {
                write!(f, "stored \"{key}\" is not valid JSON ({detail})")
            }
            Self::UnsupportedVersion { key, version } => write!(
                f,
                "stored \"{key}\" uses schema version {version}, which this build does not understand"
            ),
            Self::Encode { key, detail } => {
                write!(f, "could not encode \"{key}\" for storage ({detail})")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
