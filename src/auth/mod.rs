//! Login gate
//!
//! Credentials are checked by an injected [`Authenticator`]. The stock
//! implementation reads salted SHA-256 digests from the config; no password
//! is ever stored in clear.

pub mod session;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::UserCredential;

pub use session::{Session, SessionContext};

/// Something that can verify a username/password pair
pub trait Authenticator {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Hex SHA-256 of `salt || password`
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Random hex string of `bytes` random bytes
pub(crate) fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// Build a config entry for a new user with a fresh salt
pub fn new_credential(username: &str, password: &str) -> UserCredential {
    let salt = random_hex(16);
    UserCredential {
        username: username.to_string(),
        password_sha256: hash_password(&salt, password),
        salt,
    }
}

/// Digest comparison without an early exit on the first differing byte
///
/// Inputs of different length compare unequal immediately; stored digests
/// are fixed-width hex, so the length carries no secret.
fn digest_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Authenticator backed by the `[[auth.users]]` config entries
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: Vec<UserCredential>,
}

impl CredentialStore {
    pub fn new(users: Vec<UserCredential>) -> Self {
        CredentialStore { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authenticator for CredentialStore {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.users.iter().find(|u| u.username == username) {
            Some(user) => digest_eq(
                &hash_password(&user.salt, password),
                &user.password_sha256.to_ascii_lowercase(),
            ),
            None => false,
        }
    }
}
