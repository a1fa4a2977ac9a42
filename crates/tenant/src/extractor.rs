// Pulls the tenant identifier out of an incoming request.

use axum::extract::Request;
use axum::http::header::HOST;

pub trait IdentifierExtractor: Send + Sync {
    /// Identifier for `request`, or `None` when it carries none
    fn extract(&self, request: &Request) -> Option<String>;
}

impl<F> IdentifierExtractor for F
where
    F: Fn(&Request) -> Option<String> + Send + Sync,
{
    fn extract(&self, request: &Request) -> Option<String> {
        self(request)
    }
}

/// Leftmost label of the request host: `acme.example.com` gives `acme`
#[derive(Debug, Clone, Copy, Default)]
pub struct SubdomainExtractor;

impl SubdomainExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn from_host(host: &str) -> Option<String> {
        let host = host.split(':').next().unwrap_or(host);
        let label = host.split('.').next()?.trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }
}

impl IdentifierExtractor for SubdomainExtractor {
    fn extract(&self, request: &Request) -> Option<String> {
        let host = request
            .headers()
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| request.uri().host())?;

        Self::from_host(host)
    }
}
