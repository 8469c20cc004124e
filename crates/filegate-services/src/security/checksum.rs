use filegate_core::HashAlgorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Hex-encoded digest of `content`. Unsalted, so identical bytes always
/// produce the same checksum.
pub fn calculate_checksum(content: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(content)),
        HashAlgorithm::Sha384 => hex::encode(Sha384::digest(content)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(content)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            calculate_checksum(b"abc", HashAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(calculate_checksum(b"", HashAlgorithm::Sha384).len(), 96);
        assert_eq!(calculate_checksum(b"", HashAlgorithm::Sha512).len(), 128);
    }

    #[test]
    fn deterministic() {
        let a = calculate_checksum(b"same bytes", HashAlgorithm::Sha512);
        let b = calculate_checksum(b"same bytes", HashAlgorithm::Sha512);
        assert_eq!(a, b);
        assert_ne!(a, calculate_checksum(b"other bytes", HashAlgorithm::Sha512));
    }
}
