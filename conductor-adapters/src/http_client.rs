use std::sync::Arc;
use std::time::Duration;

use hyper::client::HttpConnector;
use hyper::{Body, Client};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::AdapterResult;

/// Hyper client over rustls, shared by every outbound HTTP caller.
pub type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Connection options for the shared outbound client.
///
/// The generation client is happy with the defaults; callers fanning out to
/// arbitrary third-party hosts (the tool gateway) bound the TCP connect so a
/// black-holed address fails fast instead of eating the whole call budget.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpClientConfig {
    connect_timeout: Option<Duration>,
    pool_idle_timeout: Option<Duration>,
}

impl HttpClientConfig {
    /// Creates the default configuration: no connect bound, hyper's pooling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps how long establishing a TCP connection may take.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Caps how long an idle pooled connection is kept around.
    #[must_use]
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }
}

/// Builds the shared HTTPS client with the bundled webpki roots and default
/// connection options.
pub fn build_https_client() -> AdapterResult<HyperClient> {
    build_https_client_with(HttpClientConfig::new())
}

/// Builds the shared HTTPS client with explicit connection options.
///
/// Plain `http://` targets are also accepted; local tools and self-hosted
/// gateways commonly sit on loopback without TLS.
#[allow(clippy::unnecessary_wraps)]
pub fn build_https_client_with(options: HttpClientConfig) -> AdapterResult<HyperClient> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(options.connect_timeout);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    let mut builder = Client::builder();
    if let Some(idle) = options.pool_idle_timeout {
        builder.pool_idle_timeout(idle);
    }
    Ok(builder.build::<_, Body>(connector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_and_without_options() {
        assert!(build_https_client().is_ok());
        let options = HttpClientConfig::new()
            .with_connect_timeout(Duration::from_secs(5))
            .with_pool_idle_timeout(Duration::from_secs(30));
        assert!(build_https_client_with(options).is_ok());
    }
}
