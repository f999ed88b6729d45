//! SessionService: signed session tokens and revocation
//!
//! ## Token format
//!
//! ```text
//! base64url(claims_json) "." base64url(signature)
//! ```
//!
//! Both parts are unpadded. The signature covers the encoded claims text.
//!
//! ## Lifecycle
//!
//! A token is valid while `now < expires_at` and its id is not revoked.
//! Expiry needs no storage. Revocation stores a marker under
//! `Key::new_revoked(id)` that expires together with the token, so the
//! revocation set never outgrows the set of live tokens.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use genesis_core::{GenesisError, Key, Result, Timestamp};
use genesis_engine::Database;
use genesis_security::TokenSigner;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::registry::Account;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Unique token id (UUID v4)
    pub id: String,
    /// Account name the token was issued to
    pub user: String,
    /// Moment the token stops being valid
    pub expires_at: Timestamp,
}

/// Issues, parses and revokes session tokens
#[derive(Clone)]
pub struct SessionService {
    db: Arc<Database>,
    signer: Arc<dyn TokenSigner>,
    ttl: Duration,
}

impl SessionService {
    /// Create a service issuing tokens valid for `ttl`
    pub fn new(db: Arc<Database>, signer: Arc<dyn TokenSigner>, ttl: Duration) -> Self {
        Self { db, signer, ttl }
    }

    /// Lifetime of newly issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `account`
    pub fn issue(&self, account: &Account) -> Result<String> {
        let claims = Claims {
            id: Uuid::new_v4().to_string(),
            user: account.name.clone(),
            expires_at: Timestamp::now().saturating_add(self.ttl),
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| GenesisError::internal(format!("failed to encode claims: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self
            .signer
            .sign(payload.as_bytes())
            .map_err(|e| GenesisError::internal(format!("failed to sign token: {}", e)))?;

        Ok(format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Verify a token and return its claims
    ///
    /// Fails with `InvalidToken` for anything that does not decode or
    /// verify, `Expired` past the expiry and `Revoked` after logout.
    pub fn parse(&self, token: &str) -> Result<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| GenesisError::invalid_token("malformed token"))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| GenesisError::invalid_token("malformed signature"))?;
        if !self.signer.verify(payload.as_bytes(), &signature) {
            return Err(GenesisError::invalid_token("signature mismatch"));
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| GenesisError::invalid_token("malformed claims"))?;
        let claims: Claims = serde_json::from_slice(&json)
            .map_err(|_| GenesisError::invalid_token("malformed claims"))?;

        if claims.expires_at.has_passed_at(Timestamp::now()) {
            return Err(GenesisError::Expired);
        }
        if self.is_revoked(&claims.id)? {
            return Err(GenesisError::Revoked);
        }
        Ok(claims)
    }

    /// Revoke the token described by `claims`
    ///
    /// The marker lives exactly as long as the token would have. Returns
    /// false without writing when the token has already expired.
    pub fn revoke(&self, claims: &Claims) -> Result<bool> {
        let remaining = claims.expires_at.remaining_at(Timestamp::now());
        if remaining.is_zero() {
            return Ok(false);
        }

        let key = Key::new_revoked(&claims.id);
        let expires_at = claims.expires_at;
        self.db
            .transaction(|txn| txn.put_expiring(key.clone(), Vec::new(), Some(expires_at)))?;
        debug!(user = %claims.user, ttl_ms = remaining.as_millis() as u64, "session revoked");
        Ok(true)
    }

    /// Whether the token id is in the revocation set
    pub fn is_revoked(&self, id: &str) -> Result<bool> {
        Ok(self.db.get(&Key::new_revoked(id))?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_security::HmacSigner;

    fn account(name: &str) -> Account {
        Account {
            name: name.to_string(),
            password_digest: Vec::new(),
            admin: false,
        }
    }

    fn service(ttl: Duration) -> SessionService {
        SessionService::new(
            Database::ephemeral().unwrap(),
            Arc::new(HmacSigner::random()),
            ttl,
        )
    }

    #[test]
    fn test_issue_then_parse() {
        let sessions = service(Duration::from_secs(60));
        let token = sessions.issue(&account("alice")).unwrap();

        let claims = sessions.parse(&token).unwrap();
        assert_eq!(claims.user, "alice");
        assert!(claims.expires_at.is_after(Timestamp::now()));
        assert!(Uuid::parse_str(&claims.id).is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let sessions = service(Duration::from_secs(60));
        let a = sessions.parse(&sessions.issue(&account("alice")).unwrap()).unwrap();
        let b = sessions.parse(&sessions.issue(&account("alice")).unwrap()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_token_shape() {
        let sessions = service(Duration::from_secs(60));
        let token = sessions.issue(&account("alice")).unwrap();
        assert_eq!(token.matches('.').count(), 1);
        assert!(!token.contains('='));
        assert!(!token.contains('+') && !token.contains('/'));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let sessions = service(Duration::from_secs(60));
        for token in ["", "abc", "a.b", "...", "!!.!!"] {
            assert!(matches!(
                sessions.parse(token),
                Err(GenesisError::InvalidToken(_))
            ));
        }
    }

    #[test]
    fn test_tampered_claims_are_invalid() {
        let sessions = service(Duration::from_secs(60));
        let token = sessions.issue(&account("alice")).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = Claims {
            id: Uuid::new_v4().to_string(),
            user: "admin".to_string(),
            expires_at: Timestamp::MAX,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{}.{}", payload, signature);

        assert!(matches!(
            sessions.parse(&forged_token),
            Err(GenesisError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_other_signer_is_invalid() {
        let db = Database::ephemeral().unwrap();
        let issuer = SessionService::new(
            Arc::clone(&db),
            Arc::new(HmacSigner::random()),
            Duration::from_secs(60),
        );
        let verifier = SessionService::new(db, Arc::new(HmacSigner::random()), Duration::from_secs(60));

        let token = issuer.issue(&account("alice")).unwrap();
        assert!(matches!(
            verifier.parse(&token),
            Err(GenesisError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired() {
        let sessions = service(Duration::ZERO);
        let token = sessions.issue(&account("alice")).unwrap();
        assert!(matches!(sessions.parse(&token), Err(GenesisError::Expired)));
    }

    #[test]
    fn test_revoke() {
        let sessions = service(Duration::from_secs(60));
        let token = sessions.issue(&account("alice")).unwrap();
        let claims = sessions.parse(&token).unwrap();

        assert!(sessions.revoke(&claims).unwrap());
        assert!(sessions.is_revoked(&claims.id).unwrap());
        assert!(matches!(sessions.parse(&token), Err(GenesisError::Revoked)));

        // Other tokens of the same account are unaffected.
        let other = sessions.issue(&account("alice")).unwrap();
        assert!(sessions.parse(&other).is_ok());
    }

    #[test]
    fn test_revoke_expired_claims_is_noop() {
        let sessions = service(Duration::from_secs(60));
        let claims = Claims {
            id: Uuid::new_v4().to_string(),
            user: "alice".to_string(),
            expires_at: Timestamp::EPOCH,
        };
        assert!(!sessions.revoke(&claims).unwrap());
        assert!(!sessions.is_revoked(&claims.id).unwrap());
        assert_eq!(sessions.db.current_version(), 0);
    }

    #[test]
    fn test_revocation_marker_expires_with_token() {
        let sessions = service(Duration::from_millis(60));
        let token = sessions.issue(&account("alice")).unwrap();
        let claims = sessions.parse(&token).unwrap();
        sessions.revoke(&claims).unwrap();
        assert!(sessions.is_revoked(&claims.id).unwrap());

        std::thread::sleep(Duration::from_millis(100));

        assert!(!sessions.is_revoked(&claims.id).unwrap());
        assert!(matches!(sessions.parse(&token), Err(GenesisError::Expired)));
    }
}
