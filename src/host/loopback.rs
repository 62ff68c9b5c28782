use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bus::{Interfaces, Props, ADAPTER, GATT_MANAGER, LE_ADVERTISING_MANAGER};
use crate::register::{self, Responder};

use super::*;

/// Kind of submitted object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Application,
    Advertisement,
}

/// Registration submitted to a manual [`Loopback`] host, waiting for an answer.
#[derive(Debug)]
#[non_exhaustive]
pub struct Submission {
    pub kind: Kind,
    pub adapter: ObjectPath,
    pub path: ObjectPath,
    pub responder: Responder,
}

/// Host call recorded by [`Loopback`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostEvent {
    Register(Kind, ObjectPath),
    Unregister(Kind, ObjectPath),
}

#[derive(Debug)]
enum Mode {
    Accept,
    Reject(String),
    Manual(mpsc::UnboundedSender<Submission>),
}

/// In-process host with a single adapter. Registrations are either answered
/// immediately or handed to the caller for a manual answer.
#[derive(Debug)]
pub struct Loopback {
    objs: ManagedObjects,
    mode: Mode,
    events: Mutex<Vec<HostEvent>>,
}

impl Loopback {
    /// Adapter object path.
    pub const ADAPTER: &'static str = "/org/bluez/hci0";

    /// Creates a host that accepts all registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(Mode::Accept)
    }

    /// Creates a host that rejects all registrations with `detail`.
    #[must_use]
    pub fn rejecting(detail: impl Into<String>) -> Self {
        Self::with_mode(Mode::Reject(detail.into()))
    }

    /// Creates a host that forwards all registrations to the returned receiver.
    #[must_use]
    pub fn manual() -> (Self, mpsc::UnboundedReceiver<Submission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_mode(Mode::Manual(tx)), rx)
    }

    /// Replaces the host object tree.
    #[must_use]
    pub fn with_objects(mut self, objs: ManagedObjects) -> Self {
        self.objs = objs;
        self
    }

    /// Returns an object tree with one adapter implementing the interfaces in
    /// `ifaces`.
    #[must_use]
    pub fn adapter_objects(ifaces: &[&str]) -> ManagedObjects {
        let hci = (ifaces.iter())
            .map(|&i| (i.to_owned(), Props::new()))
            .collect::<Interfaces>();
        ManagedObjects::from([
            (ObjectPath::new("/org/bluez"), Interfaces::new()),
            (ObjectPath::new(Self::ADAPTER), hci),
        ])
    }

    /// Returns all recorded host calls.
    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            objs: Self::adapter_objects(&[ADAPTER, GATT_MANAGER, LE_ADVERTISING_MANAGER]),
            mode,
            events: Mutex::default(),
        }
    }

    fn submit(&self, kind: Kind, adapter: &ObjectPath, path: &ObjectPath) -> Answer {
        debug!("{kind:?} {path} submitted to {adapter}");
        self.events
            .lock()
            .push(HostEvent::Register(kind, path.clone()));
        match self.mode {
            Mode::Accept => Answer::ok(),
            Mode::Reject(ref detail) => Answer::err(detail.as_str()),
            Mode::Manual(ref tx) => {
                let (responder, ans) = register::channel();
                let sub = Submission {
                    kind,
                    adapter: adapter.clone(),
                    path: path.clone(),
                    responder,
                };
                // A closed receiver drops the responder, failing the
                // registration.
                let _ = tx.send(sub);
                ans
            }
        }
    }

    fn remove(&self, kind: Kind, path: &ObjectPath) -> BoxFuture<'_, Result<()>> {
        info!("{kind:?} {path} unregistered");
        self.events
            .lock()
            .push(HostEvent::Unregister(kind, path.clone()));
        Box::pin(async { Ok(()) })
    }
}

impl Default for Loopback {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Host for Loopback {
    fn managed_objects(&self) -> BoxFuture<'_, Result<ManagedObjects>> {
        let objs = self.objs.clone();
        Box::pin(async move { Ok(objs) })
    }

    fn register_application(&self, adapter: &ObjectPath, app: &ObjectPath, _: Props) -> Answer {
        self.submit(Kind::Application, adapter, app)
    }

    fn unregister_application(
        &self,
        _: &ObjectPath,
        app: &ObjectPath,
    ) -> BoxFuture<'_, Result<()>> {
        self.remove(Kind::Application, app)
    }

    fn register_advertisement(&self, adapter: &ObjectPath, adv: &ObjectPath, _: Props) -> Answer {
        self.submit(Kind::Advertisement, adapter, adv)
    }

    fn unregister_advertisement(
        &self,
        _: &ObjectPath,
        adv: &ObjectPath,
    ) -> BoxFuture<'_, Result<()>> {
        self.remove(Kind::Advertisement, adv)
    }
}
