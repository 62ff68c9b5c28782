//! Host Bluetooth stack interface.
//!
//! The host owns the adapters and accepts GATT application and advertisement
//! registrations. Every registration is answered exactly once through the
//! returned [`Answer`].

use std::fmt::Debug;

use futures_core::future::BoxFuture;

pub use loopback::*;

use crate::bus::{ManagedObjects, ObjectPath, Props};
use crate::register::Answer;
use crate::Result;

mod loopback;

/// Host Bluetooth stack.
pub trait Host: Debug + Send + Sync {
    /// Returns the host object tree used for adapter discovery.
    fn managed_objects(&self) -> BoxFuture<'_, Result<ManagedObjects>>;

    /// Submits a GATT application rooted at `app` to `adapter`.
    fn register_application(&self, adapter: &ObjectPath, app: &ObjectPath, opts: Props)
        -> Answer;

    /// Removes a registered GATT application.
    fn unregister_application(
        &self,
        adapter: &ObjectPath,
        app: &ObjectPath,
    ) -> BoxFuture<'_, Result<()>>;

    /// Submits an LE advertisement to `adapter`.
    fn register_advertisement(&self, adapter: &ObjectPath, adv: &ObjectPath, opts: Props)
        -> Answer;

    /// Removes a registered LE advertisement.
    fn unregister_advertisement(
        &self,
        adapter: &ObjectPath,
        adv: &ObjectPath,
    ) -> BoxFuture<'_, Result<()>>;
}

/// Returns the first object that implements interface `iface`, such as
/// [`GATT_MANAGER`](crate::bus::GATT_MANAGER) or
/// [`LE_ADVERTISING_MANAGER`](crate::bus::LE_ADVERTISING_MANAGER).
#[must_use]
pub fn find_adapter(objs: &ManagedObjects, iface: &str) -> Option<ObjectPath> {
    (objs.iter())
        .find(|(_, ifaces)| ifaces.contains_key(iface))
        .map(|(path, _)| path.clone())
}

#[cfg(test)]
mod tests {
    use crate::bus::{ADAPTER, GATT_MANAGER, LE_ADVERTISING_MANAGER};

    use super::*;

    #[test]
    fn find() {
        let o = Loopback::adapter_objects(&[ADAPTER, GATT_MANAGER, LE_ADVERTISING_MANAGER]);
        assert_eq!(find_adapter(&o, GATT_MANAGER).unwrap(), Loopback::ADAPTER);
        assert_eq!(
            find_adapter(&o, LE_ADVERTISING_MANAGER).unwrap(),
            Loopback::ADAPTER
        );
    }

    #[test]
    fn missing_manager() {
        let o = Loopback::adapter_objects(&[ADAPTER, GATT_MANAGER]);
        assert_eq!(find_adapter(&o, LE_ADVERTISING_MANAGER), None);
        assert_eq!(find_adapter(&ManagedObjects::new(), GATT_MANAGER), None);
    }
}
