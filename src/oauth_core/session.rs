//! Per-login authorization session.

use uuid::Uuid;

use super::types::{AccessToken, OAuthError};

/// Progress of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    AuthorizationUrlIssued,
    CodeReceived,
    TokenAcquired,
}

/// Temporary credentials issued by a signed-request provider before redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// Mutable state of one login attempt.
///
/// `access_token` is only ever `Some` in [`SessionPhase::TokenAcquired`].
#[derive(Debug, Clone)]
pub struct AuthorizationSession {
    state: String,
    authorization_code: String,
    access_token: Option<AccessToken>,
    request_token: Option<RequestToken>,
    phase: SessionPhase,
}

impl AuthorizationSession {
    /// Starts a session with a caller-supplied anti-forgery state.
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            authorization_code: String::new(),
            access_token: None,
            request_token: None,
            phase: SessionPhase::Created,
        }
    }

    /// Starts a session with a random UUID as state.
    pub fn with_random_state() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn authorization_code(&self) -> &str {
        &self.authorization_code
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn request_token(&self) -> Option<&RequestToken> {
        self.request_token.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Records the provider callback after checking the returned state.
    ///
    /// For signed-request providers `code` is the `oauth_verifier`.
    pub fn receive_callback(&mut self, code: impl Into<String>, returned_state: &str) -> Result<(), OAuthError> {
        if returned_state != self.state {
            return Err(OAuthError::protocol("receive_callback", "state mismatch"));
        }
        let code = code.into();
        if code.is_empty() {
            return Err(OAuthError::configuration("receive_callback", "code"));
        }
        self.access_token = None;
        self.authorization_code = code;
        self.phase = SessionPhase::CodeReceived;
        Ok(())
    }

    /// [`receive_callback`](Self::receive_callback) for signed-request providers,
    /// which also echo the temporary `oauth_token` issued before the redirect.
    pub fn receive_signed_callback(
        &mut self,
        oauth_token: &str,
        verifier: impl Into<String>,
        returned_state: &str,
    ) -> Result<(), OAuthError> {
        match &self.request_token {
            Some(pending) if pending.token == oauth_token => {}
            Some(_) => return Err(OAuthError::protocol("receive_callback", "oauth_token mismatch")),
            None => return Err(OAuthError::configuration("receive_callback", "request_token")),
        }
        self.receive_callback(verifier, returned_state)
    }

    /// Sets the code without a state check, for callers that verified it elsewhere.
    pub fn set_authorization_code(&mut self, code: impl Into<String>) {
        self.access_token = None;
        self.authorization_code = code.into();
        self.phase = SessionPhase::CodeReceived;
    }

    /// Hands the token to the caller; the session is done after this.
    pub fn into_access_token(self) -> Option<AccessToken> {
        self.access_token
    }

    pub(crate) fn mark_url_issued(&mut self, request_token: Option<RequestToken>) {
        self.access_token = None;
        self.authorization_code.clear();
        self.request_token = request_token;
        self.phase = SessionPhase::AuthorizationUrlIssued;
    }

    pub(crate) fn discard_request_token(&mut self) {
        self.request_token = None;
    }

    pub(crate) fn clear_token(&mut self) {
        self.access_token = None;
        if self.phase == SessionPhase::TokenAcquired {
            self.phase = SessionPhase::CodeReceived;
        }
    }

    pub(crate) fn store_token(&mut self, token: AccessToken) {
        self.access_token = Some(token);
        self.request_token = None;
        self.phase = SessionPhase::TokenAcquired;
    }

    /// The token, or a configuration error when the exchange has not happened.
    pub(crate) fn require_token(&self, operation: &'static str) -> Result<&AccessToken, OAuthError> {
        match (&self.access_token, self.phase) {
            (Some(token), SessionPhase::TokenAcquired) => Ok(token),
            _ => Err(OAuthError::configuration(operation, "access_token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_with_foreign_state_is_rejected() {
        let mut session = AuthorizationSession::new("xyz123");
        let err = session.receive_callback("code", "other").unwrap_err();
        assert!(matches!(err, OAuthError::Protocol { .. }));
        assert_eq!(session.phase(), SessionPhase::Created);
        assert_eq!(session.authorization_code(), "");
    }

    #[test]
    fn callback_advances_phase() {
        let mut session = AuthorizationSession::new("xyz123");
        session.receive_callback("code", "xyz123").unwrap();
        assert_eq!(session.phase(), SessionPhase::CodeReceived);
        assert_eq!(session.authorization_code(), "code");
    }

    #[test]
    fn reissuing_url_drops_previous_token() {
        let mut session = AuthorizationSession::new("xyz123");
        session.receive_callback("code", "xyz123").unwrap();
        session.store_token(AccessToken::bearer("OLD"));
        session.mark_url_issued(None);
        assert_eq!(session.phase(), SessionPhase::AuthorizationUrlIssued);
        assert!(session.access_token().is_none());
        assert_eq!(session.authorization_code(), "");
        assert!(session.into_access_token().is_none());
    }

    #[test]
    fn signed_callback_checks_temporary_token() {
        let mut session = AuthorizationSession::new("xyz123");
        let err = session.receive_signed_callback("RT", "verifier", "xyz123").unwrap_err();
        assert!(matches!(err, OAuthError::Configuration { field: "request_token", .. }));

        session.mark_url_issued(Some(RequestToken { token: "RT".into(), secret: "RS".into() }));
        let err = session.receive_signed_callback("FORGED", "verifier", "xyz123").unwrap_err();
        assert!(matches!(err, OAuthError::Protocol { .. }));
        assert_eq!(session.phase(), SessionPhase::AuthorizationUrlIssued);

        session.receive_signed_callback("RT", "verifier", "xyz123").unwrap();
        assert_eq!(session.phase(), SessionPhase::CodeReceived);
        assert_eq!(session.authorization_code(), "verifier");
    }

    #[test]
    fn token_required_before_acquired() {
        let session = AuthorizationSession::with_random_state();
        assert!(!session.state().is_empty());
        assert!(matches!(
            session.require_token("fetch_profile"),
            Err(OAuthError::Configuration { field: "access_token", .. })
        ));
    }
}
