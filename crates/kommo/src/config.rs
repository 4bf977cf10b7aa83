//! Configuration types for the Kommo client.

/// OAuth application credentials for a Kommo integration.
#[derive(Debug, Clone)]
pub struct KommoConfig {
    /// Integration client ID.
    pub client_id: String,
    /// Integration client secret.
    pub client_secret: String,
    /// Redirect URI registered with the integration.
    pub redirect_uri: String,
}

impl KommoConfig {
    /// Create a new configuration.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// URL a user visits to authorize the integration.
    pub fn consent_url(&self) -> String {
        format!(
            "https://www.kommo.com/oauth/authorize?client_id={}&redirect_uri={}&mode=post_message",
            self.client_id,
            urlencoding::encode(&self.redirect_uri)
        )
    }
}

/// Resolve an account domain to an API base URL.
///
/// Full URLs pass through untouched (which also lets tests point at a
/// local server). Bare subdomains get the vendor suffix; the vendor apex
/// and already-qualified domains are used as-is.
pub fn api_base_url(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        return domain.trim_end_matches('/').to_string();
    }

    let host = if domain == "kommo.com" || domain.ends_with(".kommo.com") {
        domain.to_string()
    } else {
        format!("{domain}.kommo.com")
    };
    format!("https://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_url_encodes_redirect() {
        let config = KommoConfig::new(
            "client-123",
            "secret",
            "https://relay.example.com/kommo/callback",
        );
        let url = config.consent_url();

        assert!(url.starts_with("https://www.kommo.com/oauth/authorize?client_id=client-123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Frelay.example.com%2Fkommo%2Fcallback"));
        assert!(url.ends_with("&mode=post_message"));
    }

    #[test]
    fn base_url_from_subdomain() {
        assert_eq!(api_base_url("acme"), "https://acme.kommo.com");
        assert_eq!(api_base_url("acme.kommo.com"), "https://acme.kommo.com");
        assert_eq!(api_base_url("kommo.com"), "https://kommo.com");
        assert_eq!(api_base_url("www.kommo.com"), "https://www.kommo.com");
    }

    #[test]
    fn base_url_passes_through_full_urls() {
        assert_eq!(api_base_url("http://127.0.0.1:9200"), "http://127.0.0.1:9200");
        assert_eq!(
            api_base_url("https://acme.kommo.com/"),
            "https://acme.kommo.com"
        );
    }
}
