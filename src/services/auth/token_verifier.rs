use std::collections::HashSet;
use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

// Errors returned by access-token verification. Callers only see "invalid token";
// the variant is for the log line.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("missing '{0}' claim")]
    MissingClaim(&'static str),
}

/// Raw claim set as it appears in the token.
///
/// NOTE:
/// - `role` must be a string when present; any other JSON type fails deserialization
///   and therefore verification.
/// - `exp` / `nbf` are checked by `jsonwebtoken` itself and are not needed here.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// 検証済みの identity (sub / role)
///
/// - `role` が `None` なのは claim 自体が無い場合のみ (空文字とは区別する)
/// - 値はトークンに入っていた通り (trim / case 変換はしない)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub role: Option<String>,
}

/// HMAC (HS256/384/512) access-token verifier.
///
/// - The secret is injected at construction and never printed via Debug.
/// - Nothing is cached: every call runs the full signature check.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: &str, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // exp/nbf are validated when present but not required
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify signature + temporal claims, then pull out `sub` and `role`.
    ///
    /// A token without a usable subject is not an identity, so a missing or
    /// blank `sub` fails the same way a bad signature does.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, VerificationError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let subject = match claims.sub {
            Some(sub) if !sub.trim().is_empty() => sub,
            _ => return Err(VerificationError::MissingClaim("sub")),
        };

        Ok(VerifiedClaims {
            subject,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "fixture-secret-fixture-secret-0123456789";

    fn sign(alg: Algorithm, secret: &str, claims: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn returns_subject_and_role_as_encoded() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({ "sub": "u1", "role": " Employer ", "exp": in_one_hour() }),
        );

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.subject, "u1");
        assert_eq!(claims.role.as_deref(), Some(" Employer "));
    }

    #[test]
    fn absent_role_is_none_and_empty_role_is_kept() {
        let verifier = TokenVerifier::new(SECRET, 0);

        let no_role = sign(Algorithm::HS256, SECRET, json!({ "sub": "u3" }));
        assert_eq!(verifier.verify(&no_role).unwrap().role, None);

        let empty_role = sign(Algorithm::HS256, SECRET, json!({ "sub": "u3", "role": "" }));
        assert_eq!(
            verifier.verify(&empty_role).unwrap().role.as_deref(),
            Some("")
        );
    }

    #[test]
    fn verification_is_repeatable() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({ "sub": "u1", "role": "EMPLOYER", "exp": in_one_hour() }),
        );

        let first = verifier.verify(&token).unwrap();
        let second = verifier.verify(&token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn accepts_every_hmac_variant() {
        let verifier = TokenVerifier::new(SECRET, 0);
        for alg in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            let token = sign(alg, SECRET, json!({ "sub": "u1" }));
            assert!(verifier.verify(&token).is_ok(), "{alg:?} should verify");
        }
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign(
            Algorithm::HS256,
            "another-secret-another-secret-0123456789",
            json!({ "sub": "u1" }),
        );

        assert!(matches!(
            verifier.verify(&token),
            Err(VerificationError::Jwt(_))
        ));
    }

    #[test]
    fn rejects_expired_and_not_yet_valid_tokens() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let now = chrono::Utc::now().timestamp();

        let expired = sign(Algorithm::HS256, SECRET, json!({ "sub": "u1", "exp": now - 3600 }));
        assert!(verifier.verify(&expired).is_err());

        let early = sign(Algorithm::HS256, SECRET, json!({ "sub": "u1", "nbf": now + 3600 }));
        assert!(verifier.verify(&early).is_err());
    }

    #[test]
    fn leeway_tolerates_small_clock_skew() {
        let verifier = TokenVerifier::new(SECRET, 120);
        let just_expired = sign(
            Algorithm::HS256,
            SECRET,
            json!({ "sub": "u1", "exp": chrono::Utc::now().timestamp() - 30 }),
        );

        assert!(verifier.verify(&just_expired).is_ok());
    }

    #[test]
    fn missing_or_blank_subject_fails() {
        let verifier = TokenVerifier::new(SECRET, 0);

        let missing = sign(Algorithm::HS256, SECRET, json!({ "role": "EMPLOYER" }));
        assert!(matches!(
            verifier.verify(&missing),
            Err(VerificationError::MissingClaim("sub"))
        ));

        let blank = sign(Algorithm::HS256, SECRET, json!({ "sub": "  " }));
        assert!(matches!(
            verifier.verify(&blank),
            Err(VerificationError::MissingClaim("sub"))
        ));
    }

    #[test]
    fn non_string_role_fails() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign(Algorithm::HS256, SECRET, json!({ "sub": "u1", "role": 7 }));

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let verifier = TokenVerifier::new(SECRET, 0);
        assert!(verifier.verify("not-a-jwt").is_err());
        assert!(verifier.verify("a.b.c").is_err());
    }

    #[test]
    fn debug_output_hides_key() {
        let verifier = TokenVerifier::new(SECRET, 0);
        assert!(!format!("{verifier:?}").contains(SECRET));
    }
}
