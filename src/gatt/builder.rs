use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use structbuf::{Pack, StructBuf};
use tracing::debug;

use perigatt_const::{Descriptor as Desc, Unit};

use crate::notify::Scheduler;
use crate::register::Registrar;
use crate::Uuid;

use super::*;

/// Service definition marker type.
#[derive(Debug)]
pub struct ServiceDef;

/// Characteristic definition marker type.
#[derive(Debug)]
pub struct CharacteristicDef;

/// Application builder used to define services, characteristics, and
/// descriptors. Object paths are assigned in definition order.
#[derive(Debug)]
#[repr(transparent)]
pub struct Builder<T>(AppBuilder, PhantomData<T>);

impl Builder<Application> {
    /// Creates a new application builder rooted at `base`.
    #[must_use]
    pub(super) fn new(base: ObjectPath, bus: Arc<dyn Bus>) -> Self {
        Self(
            AppBuilder {
                path: base,
                services: Vec::with_capacity(8),
                reg: Registrar::new("GATT application"),
                sched: Arc::new(Scheduler::new(bus)),
            },
            PhantomData,
        )
    }

    /// Returns the final immutable application.
    #[must_use]
    pub fn freeze(self) -> Application {
        let b = self.0;
        debug!(
            "Defined application {} with {} service(s)",
            b.path,
            b.services.len()
        );
        Application {
            path: b.path,
            services: b.services,
            reg: b.reg,
            sched: b.sched,
        }
    }

    /// Defines a primary service. `include` lists previously defined services
    /// to be included by this one.
    ///
    /// # Panics
    ///
    /// Panics if an included service is not defined.
    #[inline]
    pub fn primary_service<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        include: impl AsRef<[ObjectPath]>,
        chars: impl FnOnce(&mut Builder<ServiceDef>) -> T,
    ) -> (ObjectPath, T) {
        let path = self.service(uuid.into(), true, include.as_ref());
        (path, chars(self.0.builder()))
    }

    /// Defines a secondary service.
    ///
    /// # Panics
    ///
    /// Panics if an included service is not defined.
    #[inline]
    pub fn secondary_service<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        include: impl AsRef<[ObjectPath]>,
        chars: impl FnOnce(&mut Builder<ServiceDef>) -> T,
    ) -> (ObjectPath, T) {
        let path = self.service(uuid.into(), false, include.as_ref());
        (path, chars(self.0.builder()))
    }

    fn service(&mut self, uuid: Uuid, primary: bool, include: &[ObjectPath]) -> ObjectPath {
        let b = &mut self.0;
        for inc in include {
            assert!(
                b.services.iter().any(|s| s.path == *inc),
                "undefined included service {inc}"
            );
        }
        let path = b.path.child("service", b.services.len());
        b.services.push(Service {
            path: path.clone(),
            uuid,
            primary,
            app: b.path.clone(),
            includes: include.iter().cloned().collect(),
            chars: Vec::new(),
        });
        path
    }
}

impl Builder<ServiceDef> {
    /// Defines a characteristic with the specified flags and I/O callback.
    /// Descriptors are defined by `descs`.
    pub fn characteristic<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        flags: CharFlags,
        io: impl Into<Io>,
        descs: impl FnOnce(&mut Builder<CharacteristicDef>) -> T,
    ) -> (ObjectPath, T) {
        let b = &mut self.0;
        let reg = b.reg.subscribe();
        let sched = Arc::clone(&b.sched);
        let s = b.service_mut();
        let path = s.path.child("char", s.chars.len());
        s.chars.push(Characteristic::new(
            path.clone(),
            uuid.into(),
            flags,
            s.path.clone(),
            io.into(),
            reg,
            sched,
        ));
        (path, descs(b.builder()))
    }

    /// Defines a read-only characteristic with a fixed value.
    pub fn ro_characteristic<T>(
        &mut self,
        uuid: impl Into<Uuid>,
        val: impl AsRef<[u8]>,
        descs: impl FnOnce(&mut Builder<CharacteristicDef>) -> T,
    ) -> T {
        let val = val.as_ref().to_vec();
        let (_, v) = self.characteristic(uuid, CharFlags::READ, Io::NONE, |b| {
            b.value(val);
            descs(b)
        });
        v
    }
}

impl Builder<CharacteristicDef> {
    /// Defines a descriptor with the specified flags and I/O callback.
    pub fn descriptor(
        &mut self,
        uuid: impl Into<Uuid>,
        flags: DescFlags,
        io: impl Into<Io>,
    ) -> ObjectPath {
        self.desc(uuid.into(), flags, io.into(), Vec::new())
    }

    /// Defines a read-only descriptor with a fixed value.
    pub fn ro_descriptor(&mut self, uuid: impl Into<Uuid>, val: impl AsRef<[u8]>) -> ObjectPath {
        self.desc(uuid.into(), DescFlags::READ, Io::NONE, val.as_ref().to_vec())
    }

    /// Defines a Characteristic User Description descriptor
    /// ([Vol 3] Part G, Section 3.3.3.2).
    #[inline]
    pub fn user_description(&mut self, s: impl AsRef<str>) -> ObjectPath {
        self.ro_descriptor(Desc::CharacteristicUserDescription, s.as_ref())
    }

    /// Defines a Characteristic Presentation Format descriptor
    /// ([Vol 3] Part G, Section 3.3.3.5) with the Bluetooth SIG namespace and
    /// an unknown description.
    pub fn presentation_fmt(&mut self, fmt: Format, exp: i8, unit: Unit) -> ObjectPath {
        const SIG_NAMESPACE: u8 = 0x01;
        let mut v = StructBuf::new(7);
        v.append().u8(fmt).i8(exp).u16(unit).u8(SIG_NAMESPACE).u16(0_u16);
        self.ro_descriptor(Desc::CharacteristicPresentationFormat, v)
    }

    /// Sets the interval between value change notifications.
    #[inline]
    pub fn notify_interval(&mut self, d: Duration) -> &mut Self {
        self.0.char_mut().interval = d;
        self
    }

    /// Sets the initial characteristic value.
    #[inline]
    pub fn value(&mut self, v: impl Into<Vec<u8>>) -> &mut Self {
        self.0.char_mut().set_value(v.into());
        self
    }

    fn desc(&mut self, uuid: Uuid, flags: DescFlags, io: Io, val: Vec<u8>) -> ObjectPath {
        let c = self.0.char_mut();
        let path = c.path().child("desc", c.descs.len());
        let d = Descriptor::new(path.clone(), uuid, flags, c.path().clone(), io, val);
        c.descs.push(d);
        path
    }
}

/// Shared [`Application`] builder state.
#[derive(Debug)]
pub struct AppBuilder {
    path: ObjectPath,
    services: Vec<Service>,
    reg: Registrar,
    sched: Arc<Scheduler>,
}

impl AppBuilder {
    /// Returns the service being defined.
    #[inline]
    fn service_mut(&mut self) -> &mut Service {
        let i = self.services.len() - 1;
        &mut self.services[i]
    }

    /// Returns the characteristic being defined.
    #[inline]
    fn char_mut(&mut self) -> &mut Characteristic {
        let s = self.service_mut();
        let i = s.chars.len() - 1;
        &mut s.chars[i]
    }

    /// Returns a new builder.
    #[inline(always)]
    fn builder<T>(&mut self) -> &mut Builder<T> {
        // SAFETY: Builder is a `repr(transparent)` newtype
        unsafe { &mut *(self as *mut Self).cast() }
    }
}
