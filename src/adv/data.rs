//! Length-type-value Advertising Data (AD) format
//! ([Core Specification Supplement] Part A, Section 1 and [Assigned Numbers]
//! Section 2.3).

use structbuf::{Pack, Packer, StructBuf};
use tracing::warn;

use crate::{Appearance, CompanyId, Uuid};

/// Maximum legacy advertising data length ([Vol 6] Part B, Section 2.3.1.1).
pub const LEGACY_MAX: usize = 31;

/// Maximum extended advertising data length ([Vol 6] Part B, Section 2.3.4).
const EXTENDED_MAX: usize = 254;

/// AD types used by [`AdvData`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive)]
#[repr(u8)]
enum AdType {
    Flags = 0x01,
    IncompleteServiceClass16 = 0x02,
    CompleteLocalName = 0x09,
    TxPower = 0x0A,
    ServiceSolicitation16 = 0x14,
    ServiceSolicitation128 = 0x15,
    ServiceData16 = 0x16,
    ServiceSolicitation32 = 0x1F,
    ServiceData32 = 0x20,
    ServiceData128 = 0x21,
    Appearance = 0x19,
    ManufacturerData = 0xFF,
}

bitflags::bitflags! {
    /// Advertising flags (\[CSS\] Part A, Section 1.3).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct AdvFlag: u8 {
        const LE_LIMITED = 1 << 0;
        const LE_GENERAL = 1 << 1;
        const NO_BREDR = 1 << 2;
    }
}

/// Advertising data builder.
#[derive(Clone, Debug)]
pub struct AdvData(StructBuf);

impl AdvData {
    /// Creates an empty advertising data buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(StructBuf::new(EXTENDED_MAX))
    }

    /// Returns the encoded bytes.
    #[inline]
    #[must_use]
    pub fn get(self) -> Vec<u8> {
        self.0.as_ref().to_vec()
    }

    /// Appends advertising flags (\[CSS\] Part A, Section 1.3).
    pub fn flags(&mut self, v: AdvFlag) -> &mut Self {
        self.put(AdType::Flags, |b| {
            b.u8(v.bits());
        })
    }

    /// Appends service class UUIDs (\[CSS\] Part A, Section 1.1). Each UUID is
    /// encoded in the optimal format and empty lists are omitted.
    pub fn service_class(&mut self, uuids: &[Uuid]) -> &mut Self {
        self.uuid_lists(u8::from(AdType::IncompleteServiceClass16), 2, uuids)
    }

    /// Appends service solicitation UUIDs (\[CSS\] Part A, Section 1.10).
    pub fn solicit(&mut self, uuids: &[Uuid]) -> &mut Self {
        self.maybe_put(AdType::ServiceSolicitation16, |b| {
            uuids.iter().filter_map(|u| u.as_u16()).for_each(|v| {
                b.u16(v);
            });
        });
        self.maybe_put(AdType::ServiceSolicitation32, |b| {
            uuids.iter().filter_map(|u| u.as_u32()).for_each(|v| {
                b.u32(v);
            });
        });
        self.maybe_put(AdType::ServiceSolicitation128, |b| {
            uuids.iter().filter_map(|u| u.as_u128()).for_each(|v| {
                b.u128(v);
            });
        })
    }

    /// Appends the complete local device name (\[CSS\] Part A, Section 1.2).
    pub fn local_name(&mut self, v: impl AsRef<str>) -> &mut Self {
        self.put(AdType::CompleteLocalName, |b| {
            b.put(v.as_ref().as_bytes());
        })
    }

    /// Appends manufacturer-specific data (\[CSS\] Part A, Section 1.4).
    pub fn manufacturer_data(&mut self, id: CompanyId, v: &[u8]) -> &mut Self {
        self.put(AdType::ManufacturerData, |b| {
            b.u16(id.raw()).put(v);
        })
    }

    /// Appends TX power level (\[CSS\] Part A, Section 1.5).
    pub fn tx_power(&mut self, dbm: i8) -> &mut Self {
        self.put(AdType::TxPower, |b| {
            b.i8(dbm);
        })
    }

    /// Appends service data (\[CSS\] Part A, Section 1.11).
    pub fn service_data(&mut self, uuid: Uuid, v: &[u8]) -> &mut Self {
        if let Some(u) = uuid.as_u16() {
            self.put(AdType::ServiceData16, |b| {
                b.u16(u).put(v);
            })
        } else if let Some(u) = uuid.as_u32() {
            self.put(AdType::ServiceData32, |b| {
                b.u32(u).put(v);
            })
        } else {
            self.put(AdType::ServiceData128, |b| {
                b.u128(uuid).put(v);
            })
        }
    }

    /// Appends device appearance (\[CSS\] Part A, Section 1.12).
    pub fn appearance(&mut self, v: Appearance) -> &mut Self {
        self.put(AdType::Appearance, |b| {
            b.u16(v);
        })
    }

    /// Appends 16-, 32-, and 128-bit UUID lists starting at AD type `typ`,
    /// with `step` between the types of consecutive sizes.
    fn uuid_lists(&mut self, typ: u8, step: u8, uuids: &[Uuid]) -> &mut Self {
        self.maybe_put(typ, |b| {
            uuids.iter().filter_map(|u| u.as_u16()).for_each(|v| {
                b.u16(v);
            });
        });
        self.maybe_put(typ + step, |b| {
            uuids.iter().filter_map(|u| u.as_u32()).for_each(|v| {
                b.u32(v);
            });
        });
        self.maybe_put(typ + 2 * step, |b| {
            uuids.iter().filter_map(|u| u.as_u128()).for_each(|v| {
                b.u128(v);
            });
        })
    }

    /// Appends a length-type-data field to the buffer, calling `f` to provide
    /// the data.
    #[inline]
    fn put<T: Into<u8>>(&mut self, typ: T, f: impl Fn(&mut Packer)) -> &mut Self {
        self.field(true, typ.into(), f)
    }

    /// Appends a length-type-data field unless the data is empty.
    #[inline]
    fn maybe_put<T: Into<u8>>(&mut self, typ: T, f: impl Fn(&mut Packer)) -> &mut Self {
        self.field(false, typ.into(), f)
    }

    fn field(&mut self, keep_empty: bool, typ: u8, f: impl Fn(&mut Packer)) -> &mut Self {
        let i = self.0.len();
        if i + 2 > self.0.lim() {
            warn!("No space for AD field {typ:#04X}");
            return self;
        }
        f(self.0.append().put([0, typ]));
        let Ok(n) = u8::try_from(self.0.len() - (i + 1)) else {
            warn!("Dropping oversized AD field {typ:#04X}");
            self.0.truncate(i);
            return self;
        };
        self.0[i] = n;
        if !keep_empty && n < 2 {
            self.0.truncate(i);
        }
        self
    }
}

impl Default for AdvData {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use perigatt_const::Service;

    use super::*;

    #[test]
    fn css_example_2_1_2() {
        let mut ad = AdvData::new();
        ad.flags(AdvFlag::LE_LIMITED).local_name("Pedometer");
        let want = &[
            0x02, // Length of this Data
            0x01, // <Flags>
            0x01, // LE Limited Discoverable Flag set
            0x0A, // Length of this Data
            0x09, // <Complete local name>
            0x50, // 'P'
            0x65, // 'e'
            0x64, // 'd'
            0x6F, // 'o'
            0x6D, // 'm'
            0x65, // 'e'
            0x74, // 't'
            0x65, // 'e'
            0x72, // 'r'
        ];
        assert_eq!(ad.get(), want);
    }

    #[test]
    fn service_class() {
        let custom: Uuid = "712ea4d1-ec01-4654-bc82-1b15c14fbe2d".parse().unwrap();
        let mut ad = AdvData::new();
        ad.service_class(&[Service::CyclingPower.uuid()]);
        assert_eq!(ad.clone().get(), [0x03, 0x02, 0x18, 0x18]);
        ad.service_class(&[custom]);
        let v = ad.get();
        assert_eq!(v.len(), 4 + 2 + 16);
        assert_eq!(v[4..6], [17, 0x06]);
        assert_eq!(v[6..], custom.to_bytes());
    }

    #[test]
    fn manufacturer_data() {
        let mut ad = AdvData::new();
        ad.manufacturer_data(CompanyId::TESTING, &[0, 1, 2, 3, 4])
            .service_data(Service::Battery.uuid(), &[100]);
        assert_eq!(
            ad.get(),
            [8, 0xFF, 0xFF, 0xFF, 0, 1, 2, 3, 4, 4, 0x16, 0x0F, 0x18, 100]
        );
    }
}
