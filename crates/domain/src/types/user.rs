//! User profile types
//!
//! Profile of the signed-in listener, fetched after login.

use serde::{Deserialize, Serialize};

/// Signed-in user's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub followers: Option<u64>,
}

impl UserProfile {
    /// Name to greet the user with, falling back to the account id.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}
