use std::fmt;

pub type RequestId = u64;

/// Opaque, server-assigned token naming the deferred fragment behind a placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheId(String);

impl CacheId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CacheId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Asset families tracked in the page-state fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Css, AssetKind::Js];

    /// Key used both in the settings store and on the wire.
    pub fn key(self) -> &'static str {
        match self {
            AssetKind::Css => "css",
            AssetKind::Js => "js",
        }
    }
}
