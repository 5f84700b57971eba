use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Hash algorithms identified by their multicodec code.
///
/// Only some of these have a digest provider registered at runtime; the rest
/// are recognized on the wire so that links produced elsewhere can still be
/// decoded and reported as unsupported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "identity")]
    Identity,
    #[serde(rename = "sha2-256")]
    Sha2_256,
    #[serde(rename = "sha2-512")]
    Sha2_512,
    #[serde(rename = "sha3-512")]
    Sha3_512,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "blake2b-512")]
    Blake2b_512,
    #[serde(rename = "blake3")]
    Blake3,
}

impl HashAlgorithm {
    /// Every algorithm code Ariteg can decode.
    pub const ALL: [HashAlgorithm; 7] = [
        Self::Identity,
        Self::Sha2_256,
        Self::Sha2_512,
        Self::Sha3_512,
        Self::Sha3_256,
        Self::Blake2b_512,
        Self::Blake3,
    ];

    /// The multicodec code of this algorithm.
    pub const fn code(&self) -> u64 {
        match self {
            Self::Identity => 0x00,
            Self::Sha2_256 => 0x12,
            Self::Sha2_512 => 0x13,
            Self::Sha3_512 => 0x14,
            Self::Sha3_256 => 0x16,
            Self::Blake2b_512 => 0xb240,
            Self::Blake3 => 0x1e,
        }
    }

    /// Look up an algorithm by multicodec code.
    pub fn from_code(code: u64) -> Result<Self, TypeError> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.code() == code)
            .ok_or(TypeError::UnknownAlgorithm(code))
    }

    /// Expected digest length in bytes, or `None` for variable-length output.
    pub const fn digest_len(&self) -> Option<usize> {
        match self {
            Self::Identity => None,
            Self::Sha2_256 | Self::Sha3_256 | Self::Blake3 => Some(32),
            Self::Sha2_512 | Self::Sha3_512 | Self::Blake2b_512 => Some(64),
        }
    }

    /// Canonical multicodec name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Sha2_256 => "sha2-256",
            Self::Sha2_512 => "sha2-512",
            Self::Sha3_512 => "sha3-512",
            Self::Sha3_256 => "sha3-256",
            Self::Blake2b_512 => "blake2b-512",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Self-describing digest: algorithm code, digest length, digest bytes.
///
/// The encoded form is `varint(code) || varint(len) || digest`, matching the
/// multiformats multihash layout, so any conforming reader can tell which
/// algorithm produced a digest without outside context.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Multihash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Multihash {
    /// Create a multihash, checking the digest length against the algorithm.
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self, TypeError> {
        if let Some(expected) = algorithm.digest_len() {
            if digest.len() != expected {
                return Err(TypeError::InvalidLength {
                    expected,
                    actual: digest.len(),
                });
            }
        }
        Ok(Self { algorithm, digest })
    }

    /// Wrap a digest produced by a trusted provider for `algorithm`.
    ///
    /// The caller guarantees the digest length matches the algorithm.
    pub fn wrap(algorithm: HashAlgorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Encode into the self-describing multihash byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.digest.len() + 4);
        write_varint(&mut out, self.algorithm.code());
        write_varint(&mut out, self.digest.len() as u64);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Decode from the self-describing multihash byte layout.
    ///
    /// The input must contain exactly one multihash.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        let (code, rest) = read_varint(bytes)?;
        let algorithm = HashAlgorithm::from_code(code)?;
        let (len, rest) = read_varint(rest)?;
        let len = len as usize;
        if rest.len() < len {
            return Err(TypeError::InvalidLength {
                expected: len,
                actual: rest.len(),
            });
        }
        if rest.len() > len {
            return Err(TypeError::TrailingBytes(rest.len() - len));
        }
        Self::new(algorithm, rest.to_vec())
    }

    /// Hex encoding of the multihash bytes (algorithm prefix included).
    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    /// Parse from the hex produced by [`Multihash::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// Short hex of the digest (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..self.digest.len().min(4)])
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multihash({}:{})", self.algorithm, self.short_hex())
    }
}

impl fmt::Display for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Multihash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Unsigned LEB128, at most 9 bytes per the multiformats unsigned-varint limit.
const MAX_VARINT_LEN: usize = 9;

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(bytes: &[u8]) -> Result<(u64, &[u8]), TypeError> {
    let mut value = 0u64;
    for (i, byte) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            // Reject non-minimal encodings such as 0x80 0x00.
            if i > 0 && *byte == 0 {
                return Err(TypeError::MalformedVarint);
            }
            return Ok((value, &bytes[i + 1..]));
        }
    }
    Err(TypeError::MalformedVarint)
}

// Binary formats carry the raw multihash bytes; human-readable formats
// (JSON, TOML) carry the hex string.
impl Serialize for Multihash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.encode())
        }
    }
}

struct MultihashVisitor;

impl<'de> Visitor<'de> for MultihashVisitor {
    type Value = Multihash;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("multihash bytes or hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Multihash::from_hex(v).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Multihash::decode(v).map_err(E::custom)
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Multihash::decode(&v).map_err(E::custom)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Multihash::decode(&bytes).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Multihash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(MultihashVisitor)
        } else {
            deserializer.deserialize_byte_buf(MultihashVisitor)
        }
    }
}
