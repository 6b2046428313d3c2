use jsonwebtoken::TokenData;

use crate::{entities::token::Claims, errors::AuthError};

pub trait SessionTokenVerifier: Send + Sync {
    /// Verifies an identity-provider session token and returns its claims
    fn decode_session(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;
}
