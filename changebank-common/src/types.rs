use http::header::{HeaderValue, InvalidHeaderValue};

/// The value of an `Authorization` header.
pub enum AuthorizationToken {
    Bearer(String),
    Basic(String),
}

impl TryFrom<AuthorizationToken> for HeaderValue {
    type Error = InvalidHeaderValue;

    fn try_from(token: AuthorizationToken) -> Result<Self, Self::Error> {
        let mut value = HeaderValue::from_str(&match token {
            AuthorizationToken::Bearer(t) => format!("Bearer {t}"),
            AuthorizationToken::Basic(t) => format!("Basic {t}"),
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}
