use serde::Serialize;

use crate::schemas::user::UserResponse;

/// Issued on signup and login. The token's `sub` is the user id, which is
/// the only identity the rest of the API ever sees.
#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}

impl TokenResponse {
    pub(crate) fn bearer(access_token: String, user: UserResponse) -> Self {
        Self { access_token, token_type: "bearer".to_string(), user }
    }
}
