//! Object exposure vocabulary shared with the host bus.
//!
//! Every exposed object has an [`ObjectPath`] and one property dictionary per
//! interface it implements. Method calls arrive as [`Request`]s and value
//! changes leave through a [`Bus`] sink.

use std::collections::BTreeMap;

pub use {call::*, path::*, signal::*, value::*};

use crate::{Error, Result};

mod call;
mod path;
mod signal;
mod value;

/// GATT service interface.
pub const GATT_SERVICE: &str = "org.bluez.GattService1";
/// GATT characteristic interface.
pub const GATT_CHARACTERISTIC: &str = "org.bluez.GattCharacteristic1";
/// GATT descriptor interface.
pub const GATT_DESCRIPTOR: &str = "org.bluez.GattDescriptor1";
/// LE advertisement interface.
pub const LE_ADVERTISEMENT: &str = "org.bluez.LEAdvertisement1";
/// Host interface for registering GATT applications.
pub const GATT_MANAGER: &str = "org.bluez.GattManager1";
/// Host interface for registering LE advertisements.
pub const LE_ADVERTISING_MANAGER: &str = "org.bluez.LEAdvertisingManager1";
/// Host adapter interface.
pub const ADAPTER: &str = "org.bluez.Adapter1";

/// Property dictionary of one interface.
pub type Props = BTreeMap<String, Value>;

/// Property dictionaries keyed by interface name.
pub type Interfaces = BTreeMap<String, Props>;

/// Object tree snapshot returned by `GetManagedObjects`.
pub type ManagedObjects = BTreeMap<ObjectPath, Interfaces>;

/// Returns an `InvalidArguments` error unless `iface` matches `want`.
#[inline]
pub(crate) fn check_iface(iface: &str, want: &str) -> Result<()> {
    if iface == want {
        Ok(())
    } else {
        Err(Error::InvalidArguments(format!("unknown interface {iface}")))
    }
}
