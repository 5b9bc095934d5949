//! Double-submit token guarding the form posts.
//!
//! The token travels twice: once in a `SameSite=Strict` cookie set when the page is rendered and
//! once in a hidden form field. A cross-site form can forge the field but never read the cookie.
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

pub const CSRF_COOKIE: &str = "csrf_token";
const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn generate() -> Self {
        let mut rng = thread_rng();
        let token = std::iter::repeat_with(|| rng.sample(Alphanumeric))
            .map(char::from)
            .take(TOKEN_LENGTH)
            .collect();
        Self(token)
    }

    /// The token already held by the browser, if it is well formed.
    pub fn from_request(request: &HttpRequest) -> Option<Self> {
        request
            .cookie(CSRF_COOKIE)
            .and_then(|c| Self::try_from(c.value().to_string()).ok())
    }

    /// Reuses the browser's token so that several open tabs keep working.
    pub fn from_request_or_generate(request: &HttpRequest) -> Self {
        Self::from_request(request).unwrap_or_else(Self::generate)
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(CSRF_COOKIE, self.0.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }
}

impl TryFrom<String> for CsrfToken {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() != TOKEN_LENGTH {
            anyhow::bail!("The form token must be {TOKEN_LENGTH} characters long");
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!("The form token must be alphanumeric");
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for CsrfToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CsrfError {
    #[error("The request carries no form token cookie")]
    MissingCookie,
    #[error("The submitted form token does not match the cookie")]
    Mismatch,
}

/// Checks the hidden field against the cookie.
pub fn verify_csrf(request: &HttpRequest, submitted: &str) -> Result<CsrfToken, CsrfError> {
    let expected = CsrfToken::from_request(request).ok_or(CsrfError::MissingCookie)?;
    if submitted.trim() != expected.as_ref() {
        return Err(CsrfError::Mismatch);
    }
    Ok(expected)
}
