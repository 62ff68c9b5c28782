//! Generic Access Profile service ([Vol 3] Part C, Section 12).

use perigatt_const::{Characteristic, Service};

use crate::bus::ObjectPath;
use crate::gatt::{Application, Builder};
use crate::Appearance;

/// Generic Access service exposing the device name and appearance.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct GapService {
    pub name: String,
    pub appearance: Appearance,
}

impl GapService {
    /// Default device name.
    pub const DEFAULT_NAME: &'static str = "DevName";

    /// Creates a service with the specified device name and appearance.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, appearance: Appearance) -> Self {
        Self {
            name: name.into(),
            appearance,
        }
    }

    /// Defines the service.
    pub fn define(&self, b: &mut Builder<Application>) -> ObjectPath {
        let (path, ()) = b.primary_service(Service::GenericAccess, [], |b| {
            b.ro_characteristic(Characteristic::DeviceName, self.name.as_bytes(), |_| {});
            let app = self.appearance.to_bytes();
            b.ro_characteristic(Characteristic::Appearance, app, |_| {});
        });
        path
    }
}

impl Default for GapService {
    #[inline]
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, Appearance::CyclingComputer)
    }
}
