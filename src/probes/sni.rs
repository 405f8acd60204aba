//! SNI passthrough probe.
//!
//! Opens a TCP connection to a fixed, well-known handshake endpoint and
//! attempts a TLS 1.2 handshake that advertises the candidate hostname in
//! the SNI extension. The endpoint's own identity is irrelevant (and
//! configurable); a completed handshake is evidence that something on the
//! path routes on the SNI value alone. Certificate verification is
//! disabled for the same reason: the signal is the handshake, not the
//! certificate.

use log::debug;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::client::{ServerCertVerified, ServerCertVerifier};
use tokio_rustls::rustls::{self, Certificate, ClientConfig, ServerName};
use tokio_rustls::TlsConnector;

use crate::error::{BugscanError, HandshakeError};

/// Accepts any server certificate. The probe asks "does the handshake
/// complete", never "is this certificate valid".
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

/// Takes the last `deep` dot-separated labels of `hostname`.
///
/// A depth of zero or one reaching past the label count returns the whole
/// hostname unchanged.
pub fn sni_suffix(hostname: &str, deep: usize) -> String {
    let labels: Vec<&str> = hostname.split('.').collect();
    if deep == 0 || deep >= labels.len() {
        return hostname.to_string();
    }
    labels[labels.len() - deep..].join(".")
}

pub struct SniProbe {
    connector: TlsConnector,
    handshake_addr: String,
    timeout: Duration,
}

impl SniProbe {
    /// `handshake_host` is the TCP endpoint hosting the handshake, reached
    /// on port 443.
    pub fn new(handshake_host: &str, timeout: Duration) -> Result<Self, BugscanError> {
        let config = ClientConfig::builder()
            .with_safe_default_cipher_suites()
            .with_safe_default_kx_groups()
            .with_protocol_versions(&[&rustls::version::TLS12])?
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth();

        Ok(SniProbe {
            connector: TlsConnector::from(Arc::new(config)),
            handshake_addr: format!("{}:443", handshake_host),
            timeout,
        })
    }

    /// Attempts the handshake for `sni`. Expected network failures come
    /// back as `Ok(false)`; anything unexpected propagates.
    pub async fn probe(&self, sni: &str) -> Result<bool, BugscanError> {
        match self.attempt(sni).await {
            Ok(()) => Ok(true),
            Err(HandshakeError::Other(err)) => Err(BugscanError::Network(err)),
            Err(err) => {
                debug!("SNI {} rejected: {}", sni, err);
                Ok(false)
            }
        }
    }

    async fn attempt(&self, sni: &str) -> Result<(), HandshakeError> {
        let server_name = ServerName::try_from(sni).map_err(|err| {
            HandshakeError::HandshakeFailure(format!("invalid SNI {}: {}", sni, err))
        })?;

        let stream = timeout(self.timeout, TcpStream::connect(&self.handshake_addr))
            .await
            .map_err(|_| HandshakeError::Timeout)??;

        timeout(self.timeout, self.connector.connect(server_name, stream))
            .await
            .map_err(|_| HandshakeError::Timeout)??;

        Ok(())
    }
}
