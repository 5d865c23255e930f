use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::{MotorlotError, MotorlotResult};

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(secret: &str) -> MotorlotResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| MotorlotError::invalid(format!("hash password: {err}")))
}

/// False for a wrong secret or a malformed hash.
pub fn verify_password(secret: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        log::debug!("rejecting malformed password hash");
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn same_secret_hashes_differently() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &first));
        assert!(verify_password("s3cret", &second));
    }

    #[test]
    fn wrong_secret_or_garbage_fails() {
        let hash = hash_password("s3cret").unwrap();
        assert!(!verify_password("other", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }
}
