use crate::{CoreError, CoreResult};

/// Hash a plaintext password before it ever reaches the persistence layer.
///
/// Hashing happens here, at record-construction time, so the store stays a
/// pure store-and-retrieve collaborator with no hidden mutation on save.
pub fn hash_password(plain: &str) -> CoreResult<String> {
    if plain.len() < 8 {
        return Err(CoreError::ValidationError(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| CoreError::IdentityError(e.to_string()))
}

pub fn verify_password(plain: &str, hashed: &str) -> CoreResult<bool> {
    bcrypt::verify(plain, hashed).map_err(|e| CoreError::IdentityError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert_ne!(hash, "correct-horse-battery");
        assert!(verify_password("correct-horse-battery", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn short_passwords_are_rejected() {
        let result = hash_password("short");
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }
}
