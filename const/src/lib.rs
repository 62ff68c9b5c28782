//! Bluetooth assigned numbers used by GATT peripheral profiles.

#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(single_use_lifetimes)]
#![warn(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::empty_structs_with_brackets)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::mod_module_files)]
#![warn(clippy::print_stdout)]
#![warn(clippy::str_to_string)]
#![warn(clippy::todo)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::unseparated_literal_suffix)]

use std::fmt::{Debug, Display, Formatter};

pub use uuid::*;

mod uuid;

/// Company identifier ([Assigned Numbers] Section 7.1).
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct CompanyId(pub u16);

impl CompanyId {
    /// Identifier reserved for internal use and testing.
    pub const TESTING: Self = Self(0xFFFF);

    /// Returns the raw company ID.
    #[inline(always)]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl Debug for CompanyId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CompanyId")
            .field(&format_args!("{:#06X}", self.0))
            .finish()
    }
}

impl Display for CompanyId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

impl From<u16> for CompanyId {
    #[inline(always)]
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl From<CompanyId> for u16 {
    #[inline(always)]
    fn from(id: CompanyId) -> Self {
        id.raw()
    }
}

/// External appearance of the device ([Assigned Numbers] Section 2.6).
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u16)]
pub enum Appearance {
    GenericUnknown = 0x0000,
    GenericComputer = 0x0080,
    GenericSensor = 0x0540,
    GenericCycling = 0x0480,
    CyclingComputer = 0x0481,
    CyclingSpeedSensor = 0x0482,
    CyclingCadenceSensor = 0x0483,
    CyclingPowerSensor = 0x0484,
    CyclingSpeedAndCadenceSensor = 0x0485,
}

impl Default for Appearance {
    #[inline(always)]
    fn default() -> Self {
        Self::GenericUnknown
    }
}

impl Appearance {
    /// Returns the little-endian characteristic value encoding.
    #[inline]
    #[must_use]
    pub fn to_bytes(self) -> [u8; 2] {
        u16::from(self).to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appearance() {
        // Cycling subtype of the cycling computer category
        assert_eq!(u16::from(Appearance::CyclingComputer), 1153);
        assert_eq!(Appearance::CyclingComputer.to_bytes(), [0x81, 0x04]);
        assert!(matches!(
            Appearance::try_from(0x0484),
            Ok(Appearance::CyclingPowerSensor)
        ));
        assert!(Appearance::try_from(0x0001).is_err());
    }

    #[test]
    fn company_id() {
        assert_eq!(CompanyId::TESTING.to_string(), "0xFFFF");
        assert_eq!(format!("{:?}", CompanyId(0x004C)), "CompanyId(0x004C)");
    }
}
