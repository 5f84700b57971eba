use ariteg_types::{HashAlgorithm, Multihash};
use sha2::{Digest, Sha256, Sha512};

/// Computes digests for a single hash algorithm.
///
/// Implementations must be pure: the same bytes always produce the same
/// multihash.
pub trait MultihashProvider: Send + Sync {
    /// The algorithm this provider computes.
    fn algorithm(&self) -> HashAlgorithm;

    /// Digest `data` and wrap the result as a multihash.
    fn digest(&self, data: &[u8]) -> Multihash;
}

/// SHA2-256 (multicodec `0x12`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha2_256Provider;

impl MultihashProvider for Sha2_256Provider {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha2_256
    }

    fn digest(&self, data: &[u8]) -> Multihash {
        Multihash::wrap(HashAlgorithm::Sha2_256, Sha256::digest(data).to_vec())
    }
}

/// SHA2-512 (multicodec `0x13`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha2_512Provider;

impl MultihashProvider for Sha2_512Provider {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha2_512
    }

    fn digest(&self, data: &[u8]) -> Multihash {
        Multihash::wrap(HashAlgorithm::Sha2_512, Sha512::digest(data).to_vec())
    }
}

/// BLAKE3 with the default 32-byte output (multicodec `0x1e`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Provider;

impl MultihashProvider for Blake3Provider {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Blake3
    }

    fn digest(&self, data: &[u8]) -> Multihash {
        Multihash::wrap(HashAlgorithm::Blake3, blake3::hash(data).as_bytes().to_vec())
    }
}

/// Identity "hash": the digest is the data itself. Only useful for tiny
/// payloads and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityProvider;

impl MultihashProvider for IdentityProvider {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Identity
    }

    fn digest(&self, data: &[u8]) -> Multihash {
        Multihash::wrap(HashAlgorithm::Identity, data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha2_256_known_vector() {
        let mh = Sha2_256Provider.digest(b"abc");
        assert_eq!(
            hex::encode(mh.digest()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(mh.algorithm(), HashAlgorithm::Sha2_256);
    }

    #[test]
    fn sha2_512_length() {
        let mh = Sha2_512Provider.digest(b"abc");
        assert_eq!(mh.digest().len(), 64);
        assert!(hex::encode(mh.digest()).starts_with("ddaf35a193617aba"));
    }

    #[test]
    fn blake3_matches_library() {
        let mh = Blake3Provider.digest(b"hello world");
        assert_eq!(mh.digest(), blake3::hash(b"hello world").as_bytes());
    }

    #[test]
    fn provider_output_is_valid_multihash() {
        let providers: [&dyn MultihashProvider; 4] = [
            &Sha2_256Provider,
            &Sha2_512Provider,
            &Blake3Provider,
            &IdentityProvider,
        ];
        for p in providers {
            let mh = p.digest(b"payload");
            let decoded = Multihash::decode(&mh.encode()).unwrap();
            assert_eq!(decoded, mh);
            assert_eq!(decoded.algorithm(), p.algorithm());
        }
    }

    #[test]
    fn identity_echoes_input() {
        assert_eq!(IdentityProvider.digest(b"xyz").digest(), b"xyz");
    }
}
