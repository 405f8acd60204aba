use thiserror::Error;

#[derive(Error, Debug)]
pub enum BugscanError {
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("TLS error: {0}")]
    Tls(#[from] tokio_rustls::rustls::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Classification of a failed SNI handshake attempt.
///
/// `Timeout`, `ConnectionRefused` and `HandshakeFailure` are expected
/// network-level failures and map to a negative probe result. `Other`
/// carries anything unexpected and is propagated instead of being
/// absorbed into the scan output.
#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("handshake timed out")]
    Timeout,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("TLS handshake failed: {0}")]
    HandshakeFailure(String),
    #[error("unexpected handshake error: {0}")]
    Other(std::io::Error),
}

impl HandshakeError {
    /// Whether this failure is an expected network condition that should
    /// be recorded as a negative result rather than surfaced.
    pub fn is_negative(&self) -> bool {
        !matches!(self, HandshakeError::Other(_))
    }
}

impl From<std::io::Error> for HandshakeError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut => HandshakeError::Timeout,
            ErrorKind::ConnectionRefused => HandshakeError::ConnectionRefused,
            // tokio-rustls surfaces protocol-level failures as InvalidData;
            // a peer hanging up mid-handshake shows up as one of the rest.
            ErrorKind::InvalidData
            | ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => HandshakeError::HandshakeFailure(err.to_string()),
            _ => HandshakeError::Other(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn expected_failures_map_to_negative() {
        let timeout: HandshakeError = io::Error::from(io::ErrorKind::TimedOut).into();
        let refused: HandshakeError = io::Error::from(io::ErrorKind::ConnectionRefused).into();
        let protocol: HandshakeError = io::Error::new(io::ErrorKind::InvalidData, "bad record").into();

        assert!(matches!(timeout, HandshakeError::Timeout));
        assert!(matches!(refused, HandshakeError::ConnectionRefused));
        assert!(matches!(protocol, HandshakeError::HandshakeFailure(_)));
        assert!(timeout.is_negative());
        assert!(refused.is_negative());
        assert!(protocol.is_negative());
    }

    #[test]
    fn unexpected_failures_are_not_negative() {
        let odd: HandshakeError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(odd, HandshakeError::Other(_)));
        assert!(!odd.is_negative());
    }
}
