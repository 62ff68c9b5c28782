use smallvec::SmallVec;

use crate::Uuid;

use super::*;

/// GATT service.
#[derive(Debug)]
pub struct Service {
    pub(super) path: ObjectPath,
    pub(super) uuid: Uuid,
    pub(super) primary: bool,
    pub(super) app: ObjectPath,
    pub(super) includes: SmallVec<[ObjectPath; 2]>,
    pub(super) chars: Vec<Characteristic>,
}

impl Service {
    /// Returns the service object path.
    #[inline(always)]
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Returns the service UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns whether this is a primary service.
    #[inline(always)]
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    /// Returns the owning application path.
    #[inline(always)]
    #[must_use]
    pub const fn application(&self) -> &ObjectPath {
        &self.app
    }

    /// Returns the included service paths.
    #[inline(always)]
    #[must_use]
    pub fn includes(&self) -> &[ObjectPath] {
        &self.includes
    }

    /// Returns the service characteristics.
    #[inline(always)]
    #[must_use]
    pub fn characteristics(&self) -> &[Characteristic] {
        &self.chars
    }

    /// Returns the `org.bluez.GattService1` properties.
    #[must_use]
    pub fn properties(&self) -> Props {
        let mut p = Props::new();
        p.insert("UUID".into(), self.uuid.hyphenated().to_string().into());
        p.insert("Primary".into(), self.primary.into());
        let chars: Vec<ObjectPath> = self.chars.iter().map(|c| c.path().clone()).collect();
        p.insert("Characteristics".into(), chars.into());
        if !self.includes.is_empty() {
            p.insert("Includes".into(), self.includes.to_vec().into());
        }
        p
    }

    /// Returns the properties of interface `iface`.
    pub fn get_all(&self, iface: &str) -> Result<Props> {
        check_iface(iface, GATT_SERVICE)?;
        Ok(self.properties())
    }

    /// Returns the characteristic at `path`.
    pub fn characteristic(&self, path: &ObjectPath) -> Option<&Characteristic> {
        self.chars.iter().find(|c| c.path() == path)
    }
}
