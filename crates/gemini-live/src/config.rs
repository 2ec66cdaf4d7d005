//! Connection descriptor for the Live API endpoint.

/// Host serving the generative language WebSocket endpoints.
pub const DEFAULT_HOST: &str = "generativelanguage.googleapis.com";

/// Versioned RPC path of the bidirectional streaming endpoint.
pub const BIDI_RPC_PATH: &str =
    "/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

/// The URI + credential pair used to establish a realtime session.
///
/// Resolved once at startup and immutable afterwards. The API key is
/// attached to the URI only at connect time; `uri()` is safe to log.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    host: String,
    path: String,
    api_key: String,
}

impl ConnectionDescriptor {
    /// Descriptor for the production endpoint with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            path: BIDI_RPC_PATH.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the host, for test servers.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// The WebSocket URI without the credential.
    pub fn uri(&self) -> String {
        format!("wss://{}{}", self.host, self.path)
    }

    /// The full connect URI with the key as a query parameter.
    pub(crate) fn connect_uri(&self) -> String {
        format!("{}?key={}", self.uri(), self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_targets_the_versioned_rpc_path() {
        let descriptor = ConnectionDescriptor::new("abc123");
        assert_eq!(
            descriptor.uri(),
            "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent"
        );
    }

    #[test]
    fn connect_uri_carries_the_key() {
        let descriptor = ConnectionDescriptor::new("abc123");
        assert!(descriptor.connect_uri().ends_with("?key=abc123"));
        // The credential never appears in the loggable form.
        assert!(!descriptor.uri().contains("abc123"));
    }
}
