use crate::model::user::User;
use argon2::{
    Argon2, Params,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_URL_SAFE_NO_PAD};
use std::{
    fmt::{Debug, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const SESSION_TOKEN_CORE_LEN: usize = 24;
pub const SESSION_TOKEN_SALT_LEN: usize = 18;
pub const SESSION_TOKEN_HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

/// How long a session stays valid after sign-in.
pub const SESSION_LIFETIME: Duration = Duration::days(30);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing session token failed: {0}")]
pub struct SessionTokenHashError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionTokenDecodeError {
    #[error("Not enough parts separated by '.'")]
    NotEnoughParts,
    #[error("Invalid user id: {0}")]
    InvalidUserId(ParseIntError),
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the core part is incorrect")]
    InvalidCoreLength,
    #[error("The length of the salt part is incorrect")]
    InvalidSaltLength,
}

/// Bearer token handed out at sign-in, presented on every authenticated
/// request. Only its argon2 hash is stored.
///
/// Wire format: `<user id>.<base64 core>.<base64 salt>`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionToken {
    pub user_id: u64,
    pub core: [u8; SESSION_TOKEN_CORE_LEN],
    pub salt: [u8; SESSION_TOKEN_SALT_LEN],
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionTokenHash(pub Box<[u8; SESSION_TOKEN_HASH_LEN]>);

/// Stored session: the owning user plus the token hash and validity window.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Session {
    pub user: User,
    pub token_hash: SessionTokenHash,
    pub created_at: UtcDateTime,
    pub expires_at: UtcDateTime,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: UtcDateTime) -> bool {
        self.expires_at < now
    }
}

impl SessionToken {
    #[must_use]
    pub fn generate_random(user_id: u64) -> Self {
        let core = rand::random();
        let salt = rand::random();

        Self {
            user_id,
            core,
            salt,
        }
    }

    #[must_use]
    pub fn as_token_str(&self) -> String {
        let user_id = self.user_id;
        let encoded_core = Base64Display::new(&self.core, &BASE64_URL_SAFE_NO_PAD);
        let encoded_salt = Base64Display::new(&self.salt, &BASE64_URL_SAFE_NO_PAD);

        format!("{user_id}.{encoded_core}.{encoded_salt}")
    }

    pub fn hash(&self) -> Result<SessionTokenHash, SessionTokenHashError> {
        let argon2 = Argon2::default();

        let mut hash = Box::new([0; SESSION_TOKEN_HASH_LEN]);
        argon2
            .hash_password_into(&self.core, &self.salt, &mut *hash)
            .map_err(SessionTokenHashError)?;

        Ok(SessionTokenHash(hash))
    }
}

impl FromStr for SessionToken {
    type Err = SessionTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');

        let user_id_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let core_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let salt_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;

        let user_id = u64::from_str(user_id_part).map_err(Self::Err::InvalidUserId)?;
        let core = BASE64_URL_SAFE_NO_PAD
            .decode(core_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidCoreLength)?;
        let salt = BASE64_URL_SAFE_NO_PAD
            .decode(salt_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidSaltLength)?;

        Ok(Self {
            user_id,
            core,
            salt,
        })
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("user_id", &self.user_id)
            .field("core", &"[redacted]")
            .field("salt", &"[redacted]")
            .finish()
    }
}

impl Debug for SessionTokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionTokenHash")
            .field(&"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The session token hash had an invalid length")]
pub struct InvalidSessionTokenHashError;

impl TryFrom<Box<[u8]>> for SessionTokenHash {
    type Error = InvalidSessionTokenHashError;

    fn try_from(value: Box<[u8]>) -> Result<Self, Self::Error> {
        Ok(Self(
            value.try_into().map_err(|_| InvalidSessionTokenHashError)?,
        ))
    }
}

impl SessionTokenHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &*self.0
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(password_hash::Error);

/// Hash a password for storage, PHC string format.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError)?;

    Ok(hash.to_string())
}

/// Check a password attempt against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(PasswordError)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(other) => Err(PasswordError(other)),
    }
}

#[cfg(test)]
mod tests {
    use crate::model::session::{
        Session, SessionToken, SessionTokenDecodeError, hash_password, verify_password,
    };
    use crate::model::user::{User, Username};
    use time::{Duration, macros::utc_datetime};

    #[test]
    fn token_round_trip() {
        let token = SessionToken::generate_random(42);
        let parsed: SessionToken = token.as_token_str().parse().unwrap();

        assert_eq!(parsed, token);
        assert_eq!(parsed.user_id, 42);
    }

    #[test]
    fn malformed_tokens() {
        assert!(matches!(
            "no-dots".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::NotEnoughParts)
        ));
        assert!(matches!(
            "abc.AAAA.AAAA".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::InvalidUserId(_))
        ));
        assert!(matches!(
            "1.AAAA.AAAA".parse::<SessionToken>(),
            Err(SessionTokenDecodeError::InvalidCoreLength)
        ));
    }

    #[test]
    fn hash_is_deterministic() {
        let token = SessionToken::generate_random(7);

        assert_eq!(token.hash().unwrap(), token.hash().unwrap());

        let other = SessionToken::generate_random(7);
        assert_ne!(token.hash().unwrap(), other.hash().unwrap());
    }

    #[test]
    fn debug_redacts_secrets() {
        let token = SessionToken::generate_random(13);

        let debug = format!("{token:?}");
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains(&token.as_token_str()));
    }

    #[test]
    fn session_expiry() {
        let now = utc_datetime!(2026-02-01 12:00);
        let session = Session {
            user: User {
                id: 1.into(),
                username: Username::new("auth".to_owned()).unwrap(),
            },
            token_hash: SessionToken::generate_random(1).hash().unwrap(),
            created_at: now - Duration::days(1),
            expires_at: now + Duration::days(29),
        };

        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::days(30)));
    }

    #[test]
    fn password_round_trip() {
        let stored = hash_password("wool sock").unwrap();

        assert!(verify_password("wool sock", &stored).unwrap());
        assert!(!verify_password("silk sock", &stored).unwrap());
    }
}
