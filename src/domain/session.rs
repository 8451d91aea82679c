//! Session state for API access.
//!
//! Held by value and handed to whatever talks to the API, so the token's
//! lifetime follows login/logout explicitly.

use std::fmt;

pub const ACCESS_TOKEN_ENV: &str = "WEALTHLOG_ACCESS_TOKEN";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    access_token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let mut session = Self::default();
        session.login(token);
        session
    }

    /// Blank tokens are treated as logged out.
    pub fn login(&mut self, token: impl Into<String>) {
        let token = token.into();
        let trimmed = token.trim();
        self.access_token = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn logout(&mut self) {
        self.access_token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

// Never print the token.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_header() {
        let session = SessionContext::anonymous();
        assert!(!session.is_authenticated());
        assert_eq!(session.authorization_header(), None);
    }

    #[test]
    fn login_sets_bearer_header() {
        let session = SessionContext::with_token("abc.def.ghi");
        assert!(session.is_authenticated());
        assert_eq!(
            session.authorization_header().as_deref(),
            Some("Bearer abc.def.ghi")
        );
    }

    #[test]
    fn logout_clears_token() {
        let mut session = SessionContext::with_token("abc");
        session.logout();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn blank_token_is_logged_out() {
        let session = SessionContext::with_token("   ");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn debug_hides_token() {
        let session = SessionContext::with_token("secret-token");
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("authenticated: true"));
    }
}
