use sha2::{Digest, Sha256};

pub fn hash_password(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(plain: &str, digest: &str) -> bool {
    hash_password(plain).eq_ignore_ascii_case(digest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_matches_only_same_password() {
        let d = hash_password("s3cret");
        assert!(verify_password("s3cret", &d));
        assert!(!verify_password("S3cret", &d));
    }
}
