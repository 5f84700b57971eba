use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::multihash::Multihash;

/// Kind of node an [`AritegLink`] points at.
///
/// On the wire a link type is a small integer tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum LinkType {
    /// Raw chunk bytes.
    Blob,
    /// Ordered concatenation of blobs or lists (a chunked stream).
    List,
    /// Ordered `(name, link)` listing.
    Tree,
    /// Versioned snapshot pointing at a root and its parent commits.
    Commit,
}

impl LinkType {
    /// Wire tag for this type.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Blob => 1,
            Self::List => 2,
            Self::Tree => 3,
            Self::Commit => 4,
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            1 => Ok(Self::Blob),
            2 => Ok(Self::List),
            3 => Ok(Self::Tree),
            4 => Ok(Self::Commit),
            other => Err(TypeError::UnknownLinkType(other)),
        }
    }

    /// Lowercase name, used in the textual link form.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::List => "list",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl From<LinkType> for u8 {
    fn from(t: LinkType) -> Self {
        t.tag()
    }
}

impl TryFrom<u8> for LinkType {
    type Error = TypeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinkType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "list" => Ok(Self::List),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            other => Err(TypeError::InvalidLink(format!("unknown link type `{other}`"))),
        }
    }
}

/// Typed, content-addressed reference to a stored node.
///
/// Two links with the same multihash denote identical content no matter who
/// produced them. The type tells a reader how to decode the bytes behind the
/// digest; it does not take part in addressing.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AritegLink {
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub multihash: Multihash,
}

impl AritegLink {
    /// Create a new link.
    pub fn new(link_type: LinkType, multihash: Multihash) -> Self {
        Self {
            link_type,
            multihash,
        }
    }

    /// Convenience constructor for a blob link.
    pub fn blob(multihash: Multihash) -> Self {
        Self::new(LinkType::Blob, multihash)
    }

    /// Short form for logs, e.g. `tree:1a2b3c4d`.
    pub fn short(&self) -> String {
        format!("{}:{}", self.link_type, self.multihash.short_hex())
    }
}

impl fmt::Debug for AritegLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AritegLink({})", self.short())
    }
}

/// Textual form: `<type>:<multihash hex>`.
impl fmt::Display for AritegLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.link_type, self.multihash)
    }
}

impl FromStr for AritegLink {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, hex) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidLink(s.to_string()))?;
        Ok(Self::new(kind.parse()?, Multihash::from_hex(hex)?))
    }
}
