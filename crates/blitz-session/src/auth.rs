use std::collections::HashMap;

/// Verified identity of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{uid}")]
pub struct Identity {
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum AuthError {
    #[display("missing token")]
    MissingToken,
    #[display("invalid token")]
    InvalidToken,
}

/// Maps a bearer token to an identity.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Accepts any non-empty token as the fixed `test-user` identity.
///
/// Meant for local play and tests, where no identity provider is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubVerifier;

impl StubVerifier {
    pub const UID: &'static str = "test-user";
}

impl TokenVerifier for StubVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(Identity {
            uid: Self::UID.to_owned(),
        })
    }
}

/// Verifies tokens against a fixed token-to-uid table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    #[must_use]
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Parses a JSON object of the form `{"<token>": "<uid>", ...}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens
            .get(token)
            .map(|uid| Identity { uid: uid.clone() })
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_accepts_any_token() {
        let identity = StubVerifier.verify("whatever").unwrap();
        assert_eq!(identity.uid, "test-user");
        assert_eq!(StubVerifier.verify(""), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_static_table() {
        let verifier = StaticTokenVerifier::from_json(r#"{"t-1": "alice", "t-2": "bob"}"#).unwrap();
        assert_eq!(verifier.len(), 2);
        assert_eq!(verifier.verify("t-2").unwrap().to_string(), "bob");
        assert_eq!(verifier.verify("t-3"), Err(AuthError::InvalidToken));
        assert_eq!(verifier.verify(""), Err(AuthError::MissingToken));
        assert!(StaticTokenVerifier::from_json("[1, 2]").is_err());
    }
}
