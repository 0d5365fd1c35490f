use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;

const ITERATIONS: u32 = 10_000;
const KEY_LEN: usize = 64;
const SALT_LEN: usize = 16;

/// Derives a hex-encoded PBKDF2-SHA512 hash. With no salt given, a fresh
/// random one is generated; with the same (password, salt) the result is
/// always identical.
pub fn hash_password(password: &str, salt: Option<&str>) -> (String, String) {
    let salt = salt.map(str::to_owned).unwrap_or_else(generate_salt);
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), ITERATIONS, &mut key);
    (hex::encode(key), salt)
}

pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    let (derived, _) = hash_password(password, Some(salt));
    derived == hash
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let (hash, salt) = hash_password("Secur3P@ssw0rd!", None);
        assert!(verify_password("Secur3P@ssw0rd!", &hash, &salt));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let (hash, salt) = hash_password("correct-horse-battery-staple", None);
        assert!(!verify_password("wrong-password", &hash, &salt));
    }

    #[test]
    fn same_salt_derives_same_hash() {
        let (first, salt) = hash_password("pw", None);
        let (second, _) = hash_password("pw", Some(&salt));
        assert_eq!(first, second);
    }

    #[test]
    fn fresh_salts_are_unique_and_128_bit() {
        let (_, a) = hash_password("pw", None);
        let (_, b) = hash_password("pw", None);
        assert_ne!(a, b);
        assert_eq!(a.len(), SALT_LEN * 2); // hex
    }
}
