use url::Url;

use crate::error::{SessionError, SessionResult};

/// Where the console backend lives and whether it speaks TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    /// Path prefix of the HTTP API (e.g. "/api/v1")
    pub api_base: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
            api_base: "/api/v1".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn base(&self, scheme: &str) -> SessionResult<Url> {
        Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port))
            .map_err(|e| SessionError::InvalidEndpoint(format!("{}: {}", self.host, e)))
    }

    /// WebSocket URL of the kubectl terminal for a cluster and starting namespace
    pub fn terminal_url(&self, target: &str, namespace: &str) -> SessionResult<Url> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = self.base(scheme)?;
        url.path_segments_mut()
            .map_err(|_| SessionError::InvalidEndpoint(self.host.clone()))?
            .clear()
            .extend(["ws", "clusters", target, "terminal"]);
        url.query_pairs_mut().append_pair("namespace", namespace);
        Ok(url)
    }

    /// HTTP URL of the streaming chat endpoint for a cluster
    pub fn chat_url(&self, target: &str) -> SessionResult<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let mut url = self.base(scheme)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SessionError::InvalidEndpoint(self.host.clone()))?;
            segments.clear();
            segments.extend(self.api_base.split('/').filter(|s| !s.is_empty()));
            segments.extend(["clusters", target, "ai", "chat"]);
        }
        Ok(url)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::new("localhost", 8080, false)
    }
}
