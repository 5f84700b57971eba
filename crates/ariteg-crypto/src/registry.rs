use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ariteg_types::{HashAlgorithm, Multihash};

use crate::provider::{
    Blake3Provider, IdentityProvider, MultihashProvider, Sha2_256Provider, Sha2_512Provider,
};

/// No provider is registered for the requested algorithm.
///
/// This is a capability gap, not a failure: the set of supported algorithms
/// grows independently of the set of algorithms Ariteg can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("hash algorithm not implemented: {0}")]
pub struct UnsupportedAlgorithm(pub HashAlgorithm);

/// Maps hash algorithms to the providers that compute them.
#[derive(Clone)]
pub struct MultihashRegistry {
    providers: HashMap<HashAlgorithm, Arc<dyn MultihashProvider>>,
}

impl MultihashRegistry {
    /// An empty registry; every algorithm is unsupported.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register (or replace) the provider for its algorithm.
    pub fn register(&mut self, provider: Arc<dyn MultihashProvider>) {
        self.providers.insert(provider.algorithm(), provider);
    }

    /// Builder-style [`MultihashRegistry::register`].
    pub fn with(mut self, provider: impl MultihashProvider + 'static) -> Self {
        self.register(Arc::new(provider));
        self
    }

    /// Returns `true` if a provider is registered for `algorithm`.
    pub fn supports(&self, algorithm: HashAlgorithm) -> bool {
        self.providers.contains_key(&algorithm)
    }

    /// Supported algorithms, in multicodec order.
    pub fn algorithms(&self) -> Vec<HashAlgorithm> {
        let mut algs: Vec<_> = self.providers.keys().copied().collect();
        algs.sort_by_key(|a| a.code());
        algs
    }

    /// Look up the provider for `algorithm`.
    pub fn provider(
        &self,
        algorithm: HashAlgorithm,
    ) -> Result<&Arc<dyn MultihashProvider>, UnsupportedAlgorithm> {
        self.providers
            .get(&algorithm)
            .ok_or(UnsupportedAlgorithm(algorithm))
    }

    /// Digest `data` with `algorithm`.
    pub fn digest(
        &self,
        algorithm: HashAlgorithm,
        data: &[u8],
    ) -> Result<Multihash, UnsupportedAlgorithm> {
        Ok(self.provider(algorithm)?.digest(data))
    }

    /// Recompute the digest of `data` with the algorithm named by `expected`
    /// and compare.
    pub fn verify(&self, expected: &Multihash, data: &[u8]) -> Result<bool, UnsupportedAlgorithm> {
        Ok(self.digest(expected.algorithm(), data)? == *expected)
    }
}

impl Default for MultihashRegistry {
    /// Registry with every built-in provider: identity, SHA2-256, SHA2-512,
    /// and BLAKE3.
    fn default() -> Self {
        Self::empty()
            .with(IdentityProvider)
            .with(Sha2_256Provider)
            .with(Sha2_512Provider)
            .with(Blake3Provider)
    }
}

impl fmt::Debug for MultihashRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultihashRegistry")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}
