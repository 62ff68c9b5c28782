use std::borrow::Borrow;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Hierarchical object identifier, such as
/// `/org/bluez/example/service0/char1`. Cloning is cheap.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct ObjectPath(Arc<str>);

impl ObjectPath {
    /// Creates an object path.
    #[inline]
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(Arc::from(s.as_ref()))
    }

    /// Returns the child path `<self>/<name><index>`.
    #[inline]
    #[must_use]
    pub fn child(&self, name: &str, index: usize) -> Self {
        Self::new(format!("{}/{name}{index}", self.0))
    }

    /// Returns the parent path or [`None`] for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.0.rfind('/') {
            Some(0) if self.0.len() > 1 => Some(Self::new("/")),
            Some(i) if i > 0 => Some(Self::new(&self.0[..i])),
            _ => None,
        }
    }

    /// Returns whether `self` is `other` or one of its descendants.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        (self.0.strip_prefix(&*other.0))
            .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// Returns the path as a string slice.
    #[inline(always)]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectPath {
    #[inline]
    fn default() -> Self {
        Self::new("/")
    }
}

impl serde::Serialize for ObjectPath {
    #[inline]
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl Debug for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectPath {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectPath {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for ObjectPath {
    #[inline(always)]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ObjectPath {
    #[inline(always)]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ObjectPath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ObjectPath {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy() {
        let app = ObjectPath::new("/org/bluez/example");
        let chr = app.child("service", 0).child("char", 2);
        assert_eq!(chr, "/org/bluez/example/service0/char2");
        assert_eq!(chr.parent().unwrap(), "/org/bluez/example/service0");
        assert!(chr.starts_with(&app));
        assert!(!ObjectPath::new("/org/bluez/example2").starts_with(&app));
        assert_eq!(ObjectPath::new("/org").parent().unwrap(), "/");
        assert_eq!(ObjectPath::default().parent(), None);
    }
}
