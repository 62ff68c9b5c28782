use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::host::Host;
use crate::notify::Scheduler;
use crate::register::{RegState, Registrar, Registration};

use super::*;

/// Default application object path.
pub const DEFAULT_BASE: &str = "/org/bluez/example";

/// GATT application: the root of the exposed object tree, registered with the
/// host as a single unit.
#[derive(Debug)]
pub struct Application {
    pub(super) path: ObjectPath,
    pub(super) services: Vec<Service>,
    pub(super) reg: Registrar,
    pub(super) sched: Arc<Scheduler>,
}

/// Exposed object resolved from a path.
#[derive(Clone, Copy, Debug)]
enum Node<'a> {
    App,
    Service(&'a Service),
    Char(&'a Characteristic),
    Desc(&'a Descriptor),
}

impl Application {
    /// Returns a builder for an application at [`DEFAULT_BASE`] that emits
    /// value changes to `bus`.
    #[inline]
    #[must_use]
    pub fn build(bus: Arc<dyn Bus>) -> Builder<Self> {
        Self::build_at(DEFAULT_BASE, bus)
    }

    /// Returns a builder for an application at `base`.
    #[inline]
    #[must_use]
    pub fn build_at(base: impl Into<ObjectPath>, bus: Arc<dyn Bus>) -> Builder<Self> {
        Builder::new(base.into(), bus)
    }

    /// Returns the application object path.
    #[inline(always)]
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Returns the application services.
    #[inline(always)]
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Returns the registration state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> RegState {
        self.reg.state()
    }

    /// Returns the notification scheduler.
    #[inline(always)]
    #[must_use]
    pub const fn scheduler(&self) -> &Arc<Scheduler> {
        &self.sched
    }

    /// Returns the property snapshot of every service, characteristic, and
    /// descriptor keyed by object path and interface name. The application
    /// object itself is not included.
    #[must_use]
    pub fn managed_objects(&self) -> ManagedObjects {
        fn ifaces(iface: &str, p: Props) -> Interfaces {
            Interfaces::from([(iface.to_owned(), p)])
        }
        let mut objs = ManagedObjects::new();
        for s in &self.services {
            objs.insert(s.path.clone(), ifaces(GATT_SERVICE, s.properties()));
            for c in &s.chars {
                objs.insert(c.path().clone(), ifaces(GATT_CHARACTERISTIC, c.properties()));
                for d in c.descriptors() {
                    objs.insert(d.path().clone(), ifaces(GATT_DESCRIPTOR, d.properties()));
                }
            }
        }
        objs
    }

    /// Returns the properties of interface `iface` of the object at `path`.
    pub fn get_all(&self, path: &ObjectPath, iface: &str) -> Result<Props> {
        match self.node(path)? {
            Node::App => Err(Error::InvalidArguments(format!("unknown interface {iface}"))),
            Node::Service(s) => s.get_all(iface),
            Node::Char(c) => c.get_all(iface),
            Node::Desc(d) => d.get_all(iface),
        }
    }

    /// Returns the service at `path`.
    pub fn service(&self, path: &ObjectPath) -> Result<&Service> {
        match self.node(path)? {
            Node::Service(s) => Ok(s),
            _ => Err(Error::UnknownObject(path.clone())),
        }
    }

    /// Returns the characteristic at `path`.
    pub fn characteristic(&self, path: &ObjectPath) -> Result<&Characteristic> {
        match self.node(path)? {
            Node::Char(c) => Ok(c),
            _ => Err(Error::UnknownObject(path.clone())),
        }
    }

    /// Returns the descriptor at `path`.
    pub fn descriptor(&self, path: &ObjectPath) -> Result<&Descriptor> {
        match self.node(path)? {
            Node::Desc(d) => Ok(d),
            _ => Err(Error::UnknownObject(path.clone())),
        }
    }

    /// Routes a host method call to the object at `path`.
    pub fn dispatch(&self, path: &ObjectPath, call: Call) -> Result<Reply> {
        let node = self.node(path)?;
        debug!("{path} {call}");
        match (node, call) {
            (Node::App, Call::GetManagedObjects) => Ok(Reply::Objects(self.managed_objects())),
            (_, Call::GetAll(iface)) => self.get_all(path, &iface).map(Reply::Props),
            (Node::Char(c), Call::ReadValue(opts)) => {
                c.read_value(&ReadOptions::parse(&opts)?).map(Reply::Value)
            }
            (Node::Desc(d), Call::ReadValue(opts)) => {
                d.read_value(&ReadOptions::parse(&opts)?).map(Reply::Value)
            }
            (Node::Char(c), Call::WriteValue(v, opts)) => {
                (c.write_value(&v, &WriteOptions::parse(&opts)?)).map(|_| Reply::Done)
            }
            (Node::Desc(d), Call::WriteValue(v, opts)) => {
                (d.write_value(&v, &WriteOptions::parse(&opts)?)).map(|_| Reply::Done)
            }
            (Node::Char(c), Call::StartNotify) => c.start_notify().map(|_| Reply::Done),
            (Node::Char(c), Call::StopNotify) => c.stop_notify().map(|_| Reply::Done),
            (_, call) => Err(Error::Failed(format!("{call} is not supported by {path}"))),
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

    /// Submits the application to the host for registration on `adapter`.
    /// Must be called from within a tokio runtime.
    pub fn register(&self, host: &dyn Host, adapter: &ObjectPath) -> Result<Registration> {
        self.reg.begin()?;
        info!("Registering GATT application {} on {adapter}", self.path);
        self.dump();
        let ans = host.register_application(adapter, &self.path, Props::new());
        Ok(self.reg.track(ans))
    }

    /// Stops all notifications and unregisters the application if the host had
    /// acknowledged it. Calling this more than once has no further effect.
    pub async fn unregister(&self, host: &dyn Host, adapter: &ObjectPath) -> Result<()> {
        self.sched.clear();
        for c in self.services.iter().flat_map(|s| s.chars.iter()) {
            c.reset_notifying();
        }
        if !self.reg.take_registered() {
            debug!("GATT application {} not registered", self.path);
            return Ok(());
        }
        info!("Unregistering GATT application {}", self.path);
        host.unregister_application(adapter, &self.path).await
    }

    /// Logs the exposed object tree at debug level.
    pub fn dump(&self) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        match serde_json::to_string_pretty(&self.managed_objects()) {
            Ok(s) => debug!("Application {}:\n{s}", self.path),
            Err(e) => warn!("Failed to serialize application {}: {e}", self.path),
        }
    }

    /// Overrides the registration state.
    #[cfg(test)]
    pub(crate) fn force_state(&self, st: RegState) {
        self.reg.force(st);
    }

    /// Resolves `path` to an object in the tree.
    fn node(&self, path: &ObjectPath) -> Result<Node<'_>> {
        if *path == self.path {
            return Ok(Node::App);
        }
        let unknown = || Error::UnknownObject(path.clone());
        let s = (self.services.iter())
            .find(|s| path.starts_with(&s.path))
            .ok_or_else(unknown)?;
        if *path == s.path {
            return Ok(Node::Service(s));
        }
        let c = (s.chars.iter())
            .find(|c| path.starts_with(c.path()))
            .ok_or_else(unknown)?;
        if path == c.path() {
            return Ok(Node::Char(c));
        }
        c.descriptor(path).map(Node::Desc).ok_or_else(unknown)
    }
}
