//! Device Information Service ([DIS]).
//!
//! This service exposes manufacturer and/or vendor information about a device.
//!
//! [DIS]: https://www.bluetooth.com/specifications/specs/device-information-service-1-1/

use perigatt_const::{Characteristic, Service};

use crate::bus::ObjectPath;
use crate::gatt::{Application, Builder, ServiceDef};

/// Device Information Service configuration. Values are exposed as read-only
/// characteristics in field order; unset fields are omitted.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct DeviceInfoService {
    pub manufacturer_name: Option<Vec<u8>>,
    pub model_num: Option<Vec<u8>>,
    pub serial_num: Option<Vec<u8>>,
    pub hardware_rev: Option<Vec<u8>>,
    pub firmware_rev: Option<Vec<u8>>,
    pub software_rev: Option<Vec<u8>>,
}

/// Implements `with_<x>` methods for string characteristics. Values are raw
/// bytes since some devices report non-UTF-8 identifiers.
macro_rules! with_str {
    ($($(#[$doc:meta])* $f:ident),*$(,)?) => {$(::paste::paste! {
        $(#[$doc])*
        #[inline(always)]
        #[must_use]
        pub fn [<with_ $f>](mut self, v: impl AsRef<[u8]>) -> Self {
            self.$f = Some(v.as_ref().to_vec());
            self
        }
    })*}
}

impl DeviceInfoService {
    /// Creates an empty device information service.
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    with_str! {
        /// Sets device manufacturer name.
        manufacturer_name,
        /// Sets device model number.
        model_num,
        /// Sets device serial number.
        serial_num,
        /// Sets device hardware revision.
        hardware_rev,
        /// Sets device firmware revision.
        firmware_rev,
        /// Sets device software revision.
        software_rev,
    }

    /// Defines the service.
    pub fn define(&self, b: &mut Builder<Application>) -> ObjectPath {
        fn chr(b: &mut Builder<ServiceDef>, c: Characteristic, v: Option<&Vec<u8>>) {
            if let Some(v) = v {
                b.ro_characteristic(c, v, |_| {});
            }
        }
        let (path, ()) = b.primary_service(Service::DeviceInformation, [], |b| {
            use Characteristic::*;
            chr(b, ManufacturerNameString, self.manufacturer_name.as_ref());
            chr(b, ModelNumberString, self.model_num.as_ref());
            chr(b, SerialNumberString, self.serial_num.as_ref());
            chr(b, HardwareRevisionString, self.hardware_rev.as_ref());
            chr(b, FirmwareRevisionString, self.firmware_rev.as_ref());
            chr(b, SoftwareRevisionString, self.software_rev.as_ref());
        });
        path
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::bus::{Discard, ReadOptions};

    use super::*;

    #[test]
    fn define() {
        let dis = DeviceInfoService::new()
            .with_model_num("1.0")
            .with_firmware_rev("2.3.4");
        let mut b = Application::build(Arc::new(Discard));
        let path = dis.define(&mut b);
        let app = b.freeze();
        let s = app.service(&path).unwrap();
        assert_eq!(s.uuid(), Service::DeviceInformation);
        assert!(s.is_primary());

        let cs = s.characteristics();
        assert_eq!(cs.len(), 2);
        assert_eq!(cs[0].uuid(), Characteristic::ModelNumberString);
        assert_eq!(cs[0].read_value(&ReadOptions::default()).unwrap(), b"1.0");
        assert_eq!(cs[1].uuid(), Characteristic::FirmwareRevisionString);
        assert_eq!(cs[1].read_value(&ReadOptions::at(2)).unwrap(), b"3.4");
    }
}
