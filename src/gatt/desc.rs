use parking_lot::Mutex;
use tracing::debug;

use crate::Uuid;

use super::*;

/// Characteristic descriptor.
#[derive(Debug)]
pub struct Descriptor {
    path: ObjectPath,
    uuid: Uuid,
    flags: DescFlags,
    chr: ObjectPath,
    io: Io,
    val: Mutex<Vec<u8>>,
}

impl Descriptor {
    pub(super) fn new(
        path: ObjectPath,
        uuid: Uuid,
        flags: DescFlags,
        chr: ObjectPath,
        io: Io,
        val: Vec<u8>,
    ) -> Self {
        Self {
            path,
            uuid,
            flags,
            chr,
            io,
            val: Mutex::new(val),
        }
    }

    /// Returns the descriptor object path.
    #[inline(always)]
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Returns the descriptor UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the descriptor flags.
    #[inline(always)]
    #[must_use]
    pub const fn flags(&self) -> DescFlags {
        self.flags
    }

    /// Returns the owning characteristic path.
    #[inline(always)]
    #[must_use]
    pub const fn characteristic(&self) -> &ObjectPath {
        &self.chr
    }

    /// Returns a copy of the stored value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Vec<u8> {
        self.val.lock().clone()
    }

    /// Handles `ReadValue`.
    pub fn read_value(&self, opts: &ReadOptions) -> Result<Vec<u8>> {
        if !self.flags.can_read() {
            return Err(Error::NotPermitted);
        }
        let mut r = ReadReq {
            uuid: self.uuid,
            off: opts.offset(),
            val: self.value(),
        };
        self.io.exec(IoReq::Read(&mut r))?;
        let v = (r.val.get(r.off..).ok_or(Error::InvalidOffset))?.to_vec();
        *self.val.lock() = r.val;
        debug!("{} ReadValue: {v:02X?}", self.path);
        Ok(v)
    }

    /// Handles `WriteValue`. The stored value is only updated if the I/O
    /// callback accepts the write.
    pub fn write_value(&self, v: &[u8], opts: &WriteOptions) -> Result<()> {
        if !self.flags.can_write() {
            return Err(Error::NotPermitted);
        }
        let off = opts.offset();
        let mut val = self.value();
        splice(&mut val, off, v)?;
        debug!("{} WriteValue: {v:02X?}", self.path);
        let w = WriteReq {
            uuid: self.uuid,
            off,
            val: v,
        };
        self.io.exec(IoReq::Write(&w))?;
        *self.val.lock() = val;
        Ok(())
    }

    /// Returns the `org.bluez.GattDescriptor1` properties.
    #[must_use]
    pub fn properties(&self) -> Props {
        let mut p = Props::new();
        p.insert("UUID".into(), self.uuid.hyphenated().to_string().into());
        p.insert("Characteristic".into(), self.chr.clone().into());
        p.insert("Flags".into(), self.flags.names().into());
        let v = self.value();
        if !v.is_empty() {
            p.insert("Value".into(), v.into());
        }
        p
    }

    /// Returns the properties of interface `iface`.
    pub fn get_all(&self, iface: &str) -> Result<Props> {
        check_iface(iface, GATT_DESCRIPTOR)?;
        Ok(self.properties())
    }
}

/// Replaces the contents of `dst` from offset `off` onward with `v`.
pub(super) fn splice(dst: &mut Vec<u8>, off: usize, v: &[u8]) -> Result<()> {
    if off > dst.len() {
        return Err(Error::InvalidOffset);
    }
    dst.truncate(off);
    dst.extend_from_slice(v);
    Ok(())
}
