use sha2::{Digest, Sha256};

const SCHEME: &str = "sha256";
const ROUNDS: u32 = 10_000;

/// Salted, iterated SHA-256 in the form `sha256$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    let digest = digest(&salt, password);
    format!("{SCHEME}${salt}${digest}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    constant_time_eq(digest(salt, password).as_bytes(), expected.as_bytes())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut hash = hasher.finalize();
    for _ in 1..ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(hash);
        hasher.update(salt.as_bytes());
        hash = hasher.finalize();
    }
    format!("{:x}", hash)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_never_contain_the_password() {
        let stored = hash_password("admin123");
        assert!(stored.starts_with("sha256$"));
        assert!(!stored.contains("admin123"));
        assert!(verify_password("admin123", &stored));
        assert!(!verify_password("admin124", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "md5$salt$abc"));
    }
}
