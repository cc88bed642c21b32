use std::fmt;

/// Credential presented to the search service.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Admin or query key, sent as the `api-key` header.
    ApiKey(String),
    /// Entra ID access token, sent as `Authorization: Bearer`.
    BearerToken(String),
}

impl Credential {
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credential::ApiKey(key) => request.header("api-key", key),
            Credential::BearerToken(token) => request.bearer_auth(token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credential::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}
