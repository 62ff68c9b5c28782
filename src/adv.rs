//! LE advertisement exposed to the host.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use smallvec::SmallVec;
use tracing::{debug, info, warn};

pub use data::*;

use crate::bus::*;
use crate::host::Host;
use crate::register::{RegState, Registrar, Registration};
use crate::{Appearance, CompanyId, Error, Result, Uuid};

mod data;

/// Advertising type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AdvType {
    /// Connectable and discoverable.
    #[default]
    Peripheral,
    /// Non-connectable.
    Broadcast,
}

impl AdvType {
    /// Returns the host name of the advertising type.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Peripheral => "peripheral",
            Self::Broadcast => "broadcast",
        }
    }
}

/// LE advertisement. Contents may only be changed before the advertisement is
/// submitted to the host.
#[derive(Debug)]
pub struct Advertisement {
    path: ObjectPath,
    typ: AdvType,
    service_uuids: SmallVec<[Uuid; 4]>,
    solicit_uuids: SmallVec<[Uuid; 2]>,
    manufacturer_data: BTreeMap<CompanyId, Vec<u8>>,
    service_data: BTreeMap<Uuid, Vec<u8>>,
    local_name: Option<String>,
    appearance: Option<Appearance>,
    include_tx_power: bool,
    released: AtomicBool,
    reg: Registrar,
}

impl Advertisement {
    /// Creates an empty advertisement at `<base>/advertisement<index>`.
    #[must_use]
    pub fn new(base: impl Into<ObjectPath>, index: usize, typ: AdvType) -> Self {
        Self {
            path: base.into().child("advertisement", index),
            typ,
            service_uuids: SmallVec::new(),
            solicit_uuids: SmallVec::new(),
            manufacturer_data: BTreeMap::new(),
            service_data: BTreeMap::new(),
            local_name: None,
            appearance: None,
            include_tx_power: false,
            released: AtomicBool::new(false),
            reg: Registrar::new("LE advertisement"),
        }
    }

    /// Returns the advertisement object path.
    #[inline(always)]
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Returns the advertising type.
    #[inline(always)]
    #[must_use]
    pub const fn typ(&self) -> AdvType {
        self.typ
    }

    /// Returns the advertised service UUIDs.
    #[inline(always)]
    #[must_use]
    pub fn service_uuids(&self) -> &[Uuid] {
        &self.service_uuids
    }

    /// Returns the advertised local name.
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_deref()
    }

    /// Returns the registration state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> RegState {
        self.reg.state()
    }

    /// Returns whether the host has released the advertisement.
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Appends a service UUID. Duplicates are ignored.
    pub fn add_service_uuid(&mut self, u: impl Into<Uuid>) -> Result<&mut Self> {
        self.mutable()?;
        let u = u.into();
        if !self.service_uuids.contains(&u) {
            self.service_uuids.push(u);
        }
        Ok(self)
    }

    /// Appends a service solicitation UUID. Duplicates are ignored.
    pub fn add_solicit_uuid(&mut self, u: impl Into<Uuid>) -> Result<&mut Self> {
        self.mutable()?;
        let u = u.into();
        if !self.solicit_uuids.contains(&u) {
            self.solicit_uuids.push(u);
        }
        Ok(self)
    }

    /// Sets manufacturer-specific data for company `id`, replacing any
    /// previous data for the same company.
    pub fn add_manufacturer_data(
        &mut self,
        id: CompanyId,
        v: impl Into<Vec<u8>>,
    ) -> Result<&mut Self> {
        self.mutable()?;
        self.manufacturer_data.insert(id, v.into());
        Ok(self)
    }

    /// Sets service data for service `uuid`.
    pub fn add_service_data(
        &mut self,
        uuid: impl Into<Uuid>,
        v: impl Into<Vec<u8>>,
    ) -> Result<&mut Self> {
        self.mutable()?;
        self.service_data.insert(uuid.into(), v.into());
        Ok(self)
    }

    /// Sets the advertised local name.
    pub fn add_local_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.mutable()?;
        self.local_name = Some(name.into());
        Ok(self)
    }

    /// Sets the advertised appearance.
    pub fn set_appearance(&mut self, v: Appearance) -> Result<&mut Self> {
        self.mutable()?;
        self.appearance = Some(v);
        Ok(self)
    }

    /// Requests the host to include the TX power level.
    pub fn set_include_tx_power(&mut self, v: bool) -> Result<&mut Self> {
        self.mutable()?;
        self.include_tx_power = v;
        Ok(self)
    }

    /// Returns the advertisement properties. Fields that were never set are
    /// omitted.
    #[must_use]
    pub fn properties(&self) -> Props {
        fn strs(v: &[Uuid]) -> Value {
            Value::Strs(v.iter().map(|u| u.hyphenated().to_string()).collect())
        }
        let mut p = Props::new();
        p.insert("Type".into(), self.typ.as_str().into());
        if !self.service_uuids.is_empty() {
            p.insert("ServiceUUIDs".into(), strs(&self.service_uuids));
        }
        if !self.solicit_uuids.is_empty() {
            p.insert("SolicitUUIDs".into(), strs(&self.solicit_uuids));
        }
        if !self.manufacturer_data.is_empty() {
            let m = (self.manufacturer_data.iter())
                .map(|(id, v)| (id.raw(), v.clone()))
                .collect();
            p.insert("ManufacturerData".into(), Value::ByteMap(m));
        }
        if !self.service_data.is_empty() {
            let m = (self.service_data.iter())
                .map(|(u, v)| (u.hyphenated().to_string(), v.clone()))
                .collect();
            p.insert("ServiceData".into(), Value::UuidMap(m));
        }
        if let Some(ref name) = self.local_name {
            p.insert("LocalName".into(), name.as_str().into());
        }
        if let Some(a) = self.appearance {
            p.insert("Appearance".into(), u16::from(a).into());
        }
        p.insert("IncludeTxPower".into(), self.include_tx_power.into());
        p
    }

    /// Returns the properties of interface `iface`.
    pub fn get_all(&self, iface: &str) -> Result<Props> {
        check_iface(iface, LE_ADVERTISEMENT)?;
        Ok(self.properties())
    }

    /// Handles the host releasing the advertisement. Returns `false` if it
    /// was already released.
    pub fn release(&self) -> bool {
        let first = !self.released.swap(true, Ordering::AcqRel);
        if first {
            info!("Advertisement {} released", self.path);
        }
        first
    }

    /// Routes a host method call to the advertisement.
    pub fn dispatch(&self, path: &ObjectPath, call: Call) -> Result<Reply> {
        if *path != self.path {
            return Err(Error::UnknownObject(path.clone()));
        }
        debug!("{path} {call}");
        match call {
            Call::Release => {
                self.release();
                Ok(Reply::Done)
            }
            Call::GetAll(iface) => self.get_all(&iface).map(Reply::Props),
            call => Err(Error::Failed(format!("{call} is not supported by {path}"))),
        }
    }

    /// Dispatches a request and sends the reply.
    pub fn handle(&self, req: Request) {
        let r = self.dispatch(&req.path, req.call.clone());
        if let Err(ref e) = r {
            debug!("{} {} failed: {e} ({})", req.path, req.call, e.name());
        }
        req.respond(r);
    }

    /// Submits the advertisement to the host. Must be called from within a
    /// tokio runtime.
    pub fn register(&self, host: &dyn Host, adapter: &ObjectPath) -> Result<Registration> {
        self.reg.begin()?;
        info!("Registering advertisement {} on {adapter}", self.path);
        let ans = host.register_advertisement(adapter, &self.path, Props::new());
        Ok(self.reg.track(ans))
    }

    /// Unregisters the advertisement if the host had acknowledged it and has
    /// not released it.
    pub async fn unregister(&self, host: &dyn Host, adapter: &ObjectPath) -> Result<()> {
        if !self.reg.take_registered() || self.is_released() {
            debug!("Advertisement {} not registered", self.path);
            return Ok(());
        }
        info!("Unregistering advertisement {}", self.path);
        host.unregister_advertisement(adapter, &self.path).await
    }

    /// Returns the legacy Advertising Data encoding of the advertisement. The
    /// TX power field uses a level of 0 dBm.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut ad = AdvData::new();
        ad.flags(match self.typ {
            AdvType::Peripheral => AdvFlag::LE_GENERAL | AdvFlag::NO_BREDR,
            AdvType::Broadcast => AdvFlag::NO_BREDR,
        });
        ad.service_class(&self.service_uuids);
        ad.solicit(&self.solicit_uuids);
        if let Some(a) = self.appearance {
            ad.appearance(a);
        }
        if let Some(ref name) = self.local_name {
            ad.local_name(name);
        }
        if self.include_tx_power {
            ad.tx_power(0);
        }
        for (&id, v) in &self.manufacturer_data {
            ad.manufacturer_data(id, v);
        }
        for (&u, v) in &self.service_data {
            ad.service_data(u, v);
        }
        let v = ad.get();
        if v.len() > LEGACY_MAX {
            warn!(
                "Advertisement {} needs {} bytes, legacy limit is {LEGACY_MAX}",
                self.path,
                v.len()
            );
        }
        v
    }

    fn mutable(&self) -> Result<()> {
        if self.reg.is_submitted() {
            return Err(Error::InvalidState("advertisement already submitted"));
        }
        Ok(())
    }
}
