use std::collections::BTreeMap;

use super::ObjectPath;

/// Property or option value.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Value {
    Bool(bool),
    U16(u16),
    I16(i16),
    Str(String),
    Path(ObjectPath),
    Bytes(Vec<u8>),
    Strs(Vec<String>),
    Paths(Vec<ObjectPath>),
    /// Company ID to data map (`a{qv}`).
    ByteMap(BTreeMap<u16, Vec<u8>>),
    /// UUID string to data map (`a{sv}`).
    UuidMap(BTreeMap<String, Vec<u8>>),
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u16(&self) -> Option<u16> {
        match *self {
            Self::U16(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Self::Str(ref v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_path(&self) -> Option<&ObjectPath> {
        match *self {
            Self::Path(ref v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match *self {
            Self::Bytes(ref v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_strs(&self) -> Option<&[String]> {
        match *self {
            Self::Strs(ref v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_paths(&self) -> Option<&[ObjectPath]> {
        match *self {
            Self::Paths(ref v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    #[inline(always)]
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u16> for Value {
    #[inline(always)]
    fn from(v: u16) -> Self {
        Self::U16(v)
    }
}

impl From<&str> for Value {
    #[inline(always)]
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ObjectPath> for Value {
    #[inline(always)]
    fn from(v: ObjectPath) -> Self {
        Self::Path(v)
    }
}

impl From<Vec<u8>> for Value {
    #[inline(always)]
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<String>> for Value {
    #[inline(always)]
    fn from(v: Vec<String>) -> Self {
        Self::Strs(v)
    }
}

impl From<Vec<ObjectPath>> for Value {
    #[inline(always)]
    fn from(v: Vec<ObjectPath>) -> Self {
        Self::Paths(v)
    }
}
