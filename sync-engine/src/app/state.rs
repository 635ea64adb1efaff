//! # Session State Types

/// Logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
}

/// Authentication state. `login()` and `logout()` are the only writers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<CurrentUser>,
    pub auth_token: Option<String>,
}

impl SessionState {
    pub fn logged_in(username: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            user: Some(CurrentUser {
                username: username.into(),
            }),
            auth_token: Some(auth_token.into()),
        }
    }

    /// Both a user and a token are present
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.auth_token.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}
