//! HTTP transport construction for the NiFi API

use std::path::PathBuf;
use std::time::Duration;

use super::error::ApiError;
use super::poll::PollPolicy;

/// Client certificate + key pair presented to a secured NiFi instance.
#[derive(Debug, Clone)]
pub struct ClientCertificate {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

pub struct ClientConfig {
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub certificate: Option<ClientCertificate>,
    /// Polling applied while a connection queue is purged.
    pub drain_poll: PollPolicy,
    /// Polling applied while a port converges to a requested state.
    pub port_poll: PollPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(90),
            certificate: None,
            drain_poll: PollPolicy::fixed(Duration::from_secs(3), 10),
            port_poll: PollPolicy::fixed(Duration::from_secs(3), 5),
        }
    }
}

impl ClientConfig {
    /// Plain http unless a client certificate is configured.
    pub fn scheme(&self) -> &'static str {
        if self.certificate.is_some() {
            "https"
        } else {
            "http"
        }
    }

    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connection_timeout)
            .pool_idle_timeout(self.idle_timeout);

        if let Some(certificate) = &self.certificate {
            let identity = load_identity(certificate)?;
            // Admin certificates are usually issued by the NiFi toolkit's own CA.
            builder = builder
                .use_rustls_tls()
                .identity(identity)
                .danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}

fn load_identity(certificate: &ClientCertificate) -> Result<reqwest::Identity, ApiError> {
    let mut pem = std::fs::read(&certificate.cert_path).map_err(|e| {
        ApiError::Tls(format!(
            "failed to read certificate {}: {}",
            certificate.cert_path.display(),
            e
        ))
    })?;
    let key = std::fs::read(&certificate.key_path).map_err(|e| {
        ApiError::Tls(format!(
            "failed to read key {}: {}",
            certificate.key_path.display(),
            e
        ))
    })?;
    pem.push(b'\n');
    pem.extend_from_slice(&key);

    reqwest::Identity::from_pem(&pem)
        .map_err(|e| ApiError::Tls(format!("invalid certificate/key pair: {}", e)))
}
