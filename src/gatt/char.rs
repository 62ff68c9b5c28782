use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::notify::Scheduler;
use crate::register::RegState;
use crate::Uuid;

use super::desc::splice;
use super::*;

/// Default interval between value change notifications.
pub const DEFAULT_NOTIFY_INTERVAL: Duration = Duration::from_millis(100);

/// GATT characteristic.
#[derive(Debug)]
pub struct Characteristic {
    path: ObjectPath,
    flags: CharFlags,
    service: ObjectPath,
    pub(super) descs: Vec<Descriptor>,
    pub(super) interval: Duration,
    shared: Arc<Shared>,
    reg: watch::Receiver<RegState>,
    sched: Arc<Scheduler>,
}

/// Characteristic state shared with its notification task.
#[derive(Debug)]
struct Shared {
    uuid: Uuid,
    io: Io,
    st: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    val: Vec<u8>,
    notifying: bool,
}

impl Shared {
    /// Obtains the next notification value and stores it.
    fn next_value(&self) -> Option<Vec<u8>> {
        let mut n = NotifyReq {
            uuid: self.uuid,
            val: Some(self.st.lock().val.clone()),
        };
        if let Err(e) = self.io.exec(IoReq::Notify(&mut n)) {
            warn!("Notification callback for {} failed: {e}", self.uuid);
            return None;
        }
        let v = n.val?;
        self.st.lock().val.clone_from(&v);
        Some(v)
    }
}

impl Characteristic {
    pub(super) fn new(
        path: ObjectPath,
        uuid: Uuid,
        flags: CharFlags,
        service: ObjectPath,
        io: Io,
        reg: watch::Receiver<RegState>,
        sched: Arc<Scheduler>,
    ) -> Self {
        Self {
            path,
            flags,
            service,
            descs: Vec::new(),
            interval: DEFAULT_NOTIFY_INTERVAL,
            shared: Arc::new(Shared {
                uuid,
                io,
                st: Mutex::default(),
            }),
            reg,
            sched,
        }
    }

    /// Returns the characteristic object path.
    #[inline(always)]
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Returns the characteristic UUID.
    #[inline(always)]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.shared.uuid
    }

    /// Returns the characteristic flags.
    #[inline(always)]
    #[must_use]
    pub const fn flags(&self) -> CharFlags {
        self.flags
    }

    /// Returns the owning service path.
    #[inline(always)]
    #[must_use]
    pub const fn service(&self) -> &ObjectPath {
        &self.service
    }

    /// Returns the characteristic descriptors.
    #[inline(always)]
    #[must_use]
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descs
    }

    /// Returns the notification interval.
    #[inline(always)]
    #[must_use]
    pub const fn notify_interval(&self) -> Duration {
        self.interval
    }

    /// Returns a copy of the stored value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Vec<u8> {
        self.shared.st.lock().val.clone()
    }

    /// Returns whether value change notifications are enabled.
    #[inline]
    #[must_use]
    pub fn is_notifying(&self) -> bool {
        self.shared.st.lock().notifying
    }

    /// Sets the initial value.
    pub(super) fn set_value(&self, v: Vec<u8>) {
        self.shared.st.lock().val = v;
    }

    /// Handles `ReadValue`. The value is produced by the I/O callback, if any,
    /// and stored before the requested offset is applied.
    pub fn read_value(&self, opts: &ReadOptions) -> Result<Vec<u8>> {
        if !self.flags.can_read() {
            return Err(Error::NotPermitted);
        }
        let mut r = ReadReq {
            uuid: self.shared.uuid,
            off: opts.offset(),
            val: self.value(),
        };
        self.shared.io.exec(IoReq::Read(&mut r))?;
        let v = (r.val.get(r.off..).ok_or(Error::InvalidOffset))?.to_vec();
        self.shared.st.lock().val = r.val;
        debug!("{} ReadValue: {v:02X?}", self.path);
        Ok(v)
    }

    /// Handles `WriteValue`. The bytes replace the stored value from the
    /// requested offset onward. The stored value is only updated if the I/O
    /// callback accepts the write. Writes are only accepted while the
    /// application is registered.
    pub fn write_value(&self, v: &[u8], opts: &WriteOptions) -> Result<()> {
        if !self.flags.can_write() {
            return Err(Error::NotPermitted);
        }
        if !self.reg.borrow().is_registered() {
            return Err(Error::InvalidState("application not registered"));
        }
        let off = opts.offset();
        let mut val = self.value();
        splice(&mut val, off, v)?;
        debug!("{} WriteValue: {v:02X?}", self.path);
        let w = WriteReq {
            uuid: self.shared.uuid,
            off,
            val: v,
        };
        self.shared.io.exec(IoReq::Write(&w))?;
        self.shared.st.lock().val = val;
        Ok(())
    }

    /// Handles `StartNotify`. The first value change is emitted one interval
    /// later. Calling this while already notifying has no effect.
    pub fn start_notify(&self) -> Result<()> {
        if !self.flags.can_notify() {
            return Err(Error::NotPermitted);
        }
        {
            let mut st = self.shared.st.lock();
            if st.notifying {
                trace!("{} already notifying", self.path);
                return Ok(());
            }
            st.notifying = true;
        }
        debug!("{} StartNotify", self.path);
        let shared = Arc::clone(&self.shared);
        self.sched
            .arm(self.path.clone(), self.interval, move || shared.next_value());
        Ok(())
    }

    /// Handles `StopNotify`. Calling this while not notifying has no effect.
    pub fn stop_notify(&self) -> Result<()> {
        if !self.flags.can_notify() {
            return Err(Error::NotPermitted);
        }
        if !std::mem::take(&mut self.shared.st.lock().notifying) {
            trace!("{} not notifying", self.path);
            return Ok(());
        }
        debug!("{} StopNotify", self.path);
        self.sched.disarm(&self.path);
        Ok(())
    }

    /// Clears the notifying flag without touching the scheduler.
    pub(super) fn reset_notifying(&self) {
        self.shared.st.lock().notifying = false;
    }

    /// Returns the `org.bluez.GattCharacteristic1` properties.
    #[must_use]
    pub fn properties(&self) -> Props {
        let mut p = Props::new();
        p.insert("UUID".into(), self.uuid().hyphenated().to_string().into());
        p.insert("Service".into(), self.service.clone().into());
        p.insert("Flags".into(), self.flags.names().into());
        let descs: Vec<ObjectPath> = self.descs.iter().map(|d| d.path().clone()).collect();
        p.insert("Descriptors".into(), descs.into());
        let (v, notifying) = {
            let st = self.shared.st.lock();
            (st.val.clone(), st.notifying)
        };
        if self.flags.can_notify() {
            p.insert("Notifying".into(), notifying.into());
        }
        if !v.is_empty() {
            p.insert("Value".into(), v.into());
        }
        p
    }

    /// Returns the properties of interface `iface`.
    pub fn get_all(&self, iface: &str) -> Result<Props> {
        check_iface(iface, GATT_CHARACTERISTIC)?;
        Ok(self.properties())
    }

    /// Returns the descriptor at `path`.
    pub fn descriptor(&self, path: &ObjectPath) -> Option<&Descriptor> {
        self.descs.iter().find(|d| d.path() == path)
    }
}
