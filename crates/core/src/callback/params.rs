//! Redirect query parsing

use url::Url;

use super::handler::CallbackFailure;

/// Query parameters the authorization server appends to the redirect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Parse a full redirect URL (`http://127.0.0.1:8888/callback?code=...`).
    ///
    /// Empty values are treated as absent.
    ///
    /// # Errors
    /// Returns `CallbackFailure::InvalidRedirect` when `redirect_url` is not
    /// an absolute URL.
    pub fn parse(redirect_url: &str) -> Result<Self, CallbackFailure> {
        let url = Url::parse(redirect_url)
            .map_err(|err| CallbackFailure::InvalidRedirect(err.to_string()))?;
        Ok(Self::from_query_pairs(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned()))))
    }

    /// Build from already-decoded query pairs. Later duplicates are ignored.
    pub fn from_query_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_str() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}
