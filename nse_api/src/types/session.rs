use serde::{Deserialize, Serialize};

/// A cookie harvested from a browser session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Authentication artifacts replayed on plain HTTP requests: every cookie
/// from the browser session plus the user agent the browser reported.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub cookies: Vec<SessionCookie>,
    pub user_agent: String,
}

impl SessionCredentials {
    pub fn new(cookies: Vec<SessionCookie>, user_agent: impl Into<String>) -> Self {
        Self {
            cookies,
            user_agent: user_agent.into(),
        }
    }

    /// Renders the cookies as a single `Cookie` header value
    /// (`a=1; b=2`), in harvest order. `None` when there are no cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
