use std::{fmt, ops::Deref, sync::Arc};

/// Identifier helper for [`Observer`](crate::Observer) implementations.
///
/// Observers with a natural identity (a connection address, a user id) can
/// return that from `uid()` directly. For everything else `Uid::random()`
/// produces a UUID v4 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Uid(Arc<str>);

impl Uid {
    pub fn random() -> Self {
        Self(Arc::from(uuid::Uuid::new_v4().to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::random()
    }
}

impl From<&str> for Uid {
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for Uid {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl Deref for Uid {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
