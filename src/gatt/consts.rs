use bitflags::bitflags;

bitflags! {
    /// Characteristic flags ([Vol 3] Part G, Section 3.3.1.1 plus BlueZ
    /// security extensions). Each flag name maps to the BlueZ `Flags` string
    /// by lowercasing it and replacing `_` with `-`.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    #[repr(transparent)]
    pub struct CharFlags: u32 {
        const BROADCAST = 1 << 0;
        const READ = 1 << 1;
        const WRITE_WITHOUT_RESPONSE = 1 << 2;
        const WRITE = 1 << 3;
        const NOTIFY = 1 << 4;
        const INDICATE = 1 << 5;
        const AUTHENTICATED_SIGNED_WRITES = 1 << 6;
        const EXTENDED_PROPERTIES = 1 << 7;
        const RELIABLE_WRITE = 1 << 8;
        const WRITABLE_AUXILIARIES = 1 << 9;
        const ENCRYPT_READ = 1 << 10;
        const ENCRYPT_WRITE = 1 << 11;
        const ENCRYPT_NOTIFY = 1 << 12;
        const ENCRYPT_INDICATE = 1 << 13;
        const ENCRYPT_AUTHENTICATED_READ = 1 << 14;
        const ENCRYPT_AUTHENTICATED_WRITE = 1 << 15;
        const ENCRYPT_AUTHENTICATED_NOTIFY = 1 << 16;
        const ENCRYPT_AUTHENTICATED_INDICATE = 1 << 17;
        const SECURE_READ = 1 << 18;
        const SECURE_WRITE = 1 << 19;
        const SECURE_NOTIFY = 1 << 20;
        const SECURE_INDICATE = 1 << 21;
        const AUTHORIZE = 1 << 22;
    }
}

impl CharFlags {
    /// Returns whether the characteristic value can be read.
    #[inline(always)]
    #[must_use]
    pub const fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns whether the characteristic value can be written.
    #[inline(always)]
    #[must_use]
    pub const fn can_write(self) -> bool {
        self.intersects(Self::WRITE.union(Self::WRITE_WITHOUT_RESPONSE))
    }

    /// Returns whether the characteristic can notify or indicate.
    #[inline(always)]
    #[must_use]
    pub const fn can_notify(self) -> bool {
        self.intersects(Self::NOTIFY.union(Self::INDICATE))
    }

    /// Returns the BlueZ flag strings.
    #[inline]
    #[must_use]
    pub fn names(self) -> Vec<String> {
        names(self.iter_names())
    }

    /// Parses BlueZ flag strings. Returns [`None`] for an unknown flag.
    #[inline]
    #[must_use]
    pub fn from_names<T: AsRef<str>>(it: impl IntoIterator<Item = T>) -> Option<Self> {
        from_names(it)
    }
}

bitflags! {
    /// Descriptor flags.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    #[repr(transparent)]
    pub struct DescFlags: u16 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const ENCRYPT_READ = 1 << 2;
        const ENCRYPT_WRITE = 1 << 3;
        const ENCRYPT_AUTHENTICATED_READ = 1 << 4;
        const ENCRYPT_AUTHENTICATED_WRITE = 1 << 5;
        const SECURE_READ = 1 << 6;
        const SECURE_WRITE = 1 << 7;
        const AUTHORIZE = 1 << 8;
    }
}

impl DescFlags {
    /// Returns whether the descriptor value can be read.
    #[inline(always)]
    #[must_use]
    pub const fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns whether the descriptor value can be written.
    #[inline(always)]
    #[must_use]
    pub const fn can_write(self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Returns the BlueZ flag strings.
    #[inline]
    #[must_use]
    pub fn names(self) -> Vec<String> {
        names(self.iter_names())
    }

    /// Parses BlueZ flag strings. Returns [`None`] for an unknown flag.
    #[inline]
    #[must_use]
    pub fn from_names<T: AsRef<str>>(it: impl IntoIterator<Item = T>) -> Option<Self> {
        from_names(it)
    }
}

fn names<T>(it: impl Iterator<Item = (&'static str, T)>) -> Vec<String> {
    it.map(|(n, _)| n.to_ascii_lowercase().replace('_', "-"))
        .collect()
}

fn from_names<F: bitflags::Flags, T: AsRef<str>>(it: impl IntoIterator<Item = T>) -> Option<F> {
    let mut flags = F::empty();
    for n in it {
        flags.insert(F::from_name(&n.as_ref().to_ascii_uppercase().replace('-', "_"))?);
    }
    Some(flags)
}

/// Characteristic presentation format types ([Assigned Numbers] Section 2.4.1).
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum Format {
    /// Unsigned 1-bit (0 = false; 1 = true).
    Bool = 0x01,
    /// Unsigned 8-bit integer.
    U8 = 0x04,
    /// Unsigned 16-bit integer.
    U16 = 0x06,
    /// Unsigned 32-bit integer.
    U32 = 0x08,
    /// Signed 8-bit integer.
    I8 = 0x0C,
    /// Signed 16-bit integer.
    I16 = 0x0E,
    /// Signed 32-bit integer.
    I32 = 0x10,
    /// IEEE-754 32-bit floating point.
    F32 = 0x14,
    /// UTF-8 string.
    Utf8 = 0x19,
    /// Opaque structure.
    Struct = 0x1B,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_names() {
        let f = CharFlags::READ | CharFlags::WRITE_WITHOUT_RESPONSE | CharFlags::NOTIFY;
        assert_eq!(f.names(), ["read", "write-without-response", "notify"]);
        assert_eq!(CharFlags::from_names(f.names()), Some(f));
        assert_eq!(
            CharFlags::from_names(["encrypt-authenticated-write"]),
            Some(CharFlags::ENCRYPT_AUTHENTICATED_WRITE)
        );
        assert_eq!(CharFlags::from_names(["fly"]), None);
        assert_eq!(DescFlags::READ.names(), ["read"]);
    }

    #[test]
    fn capabilities() {
        assert!(CharFlags::WRITE_WITHOUT_RESPONSE.can_write());
        assert!(!CharFlags::READ.can_write());
        assert!(CharFlags::INDICATE.can_notify());
        assert!(!CharFlags::empty().can_read());
    }
}
