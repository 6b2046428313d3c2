use actix_web::{FromRequest, HttpRequest, HttpMessage};
use futures_util::future::{ready, Ready};
use crate::{entities::{token::Claims, user::Identity}, errors::AuthError};

/// Extractor for the signed-in caller.
/// Returns 401 if the auth middleware did not attach session claims.
/// Usage: Add `user: AuthUser` as a parameter to your handler function.
#[derive(Debug)]
pub struct AuthUser(pub Identity);

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthUser(Identity::from(claims.clone())))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}
