use jsonwebtoken::{decode, TokenData, Validation};

use crate::entities::token::Claims;
use crate::errors::AuthError;
use crate::repositories::token::SessionTokenVerifier;
use crate::settings::IdentityKeys;

/// Verifies session tokens minted by the identity provider. This service
/// never issues tokens of its own.
#[derive(Clone)]
pub struct JwtVerifier {
    keys: IdentityKeys,
}

impl JwtVerifier {
    pub fn new(keys: IdentityKeys) -> Self {
        JwtVerifier { keys }
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(self.keys.algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.keys.issuer {
            validation.set_issuer(&[issuer]);
        }

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}

impl SessionTokenVerifier for JwtVerifier {
    fn decode_session(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        self.decode_jwt(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-at-least-32-chars";

    fn verifier(issuer: Option<&str>) -> JwtVerifier {
        JwtVerifier::new(IdentityKeys {
            decoding: DecodingKey::from_secret(SECRET.as_bytes()),
            algorithm: Algorithm::HS256,
            issuer: issuer.map(str::to_string),
        })
    }

    fn token(exp_offset: i64, iss: Option<&str>) -> String {
        let now = Utc::now().timestamp();
        let mut claims = serde_json::json!({
            "sub": "user_2abc",
            "iat": now,
            "exp": now + exp_offset,
            "name": "Ada",
        });
        if let Some(iss) = iss {
            claims["iss"] = serde_json::Value::String(iss.to_string());
        }
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_claims() {
        let claims = verifier(None).decode_jwt(&token(300, None)).unwrap().claims;
        assert_eq!(claims.sub, "user_2abc");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert_eq!(claims.email, None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let err = verifier(None).decode_jwt(&token(-3600, None)).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let v = verifier(Some("https://clerk.adlume.app"));
        assert!(v.decode_jwt(&token(300, Some("https://clerk.adlume.app"))).is_ok());
        assert!(matches!(
            v.decode_jwt(&token(300, Some("https://evil.example"))),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(verifier(None).decode_jwt("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
