//! Periodic characteristic value notifications.
//!
//! Each notifying characteristic owns one repeating task keyed by its object
//! path. Disarming removes the key and the task exits on its next tick without
//! firing. Keys carry a generation number so that a task from an earlier
//! subscription never fires for a later one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::bus::{Bus, ObjectPath, Signal};

/// Notification scheduler shared by all characteristics of an application.
#[derive(Debug)]
pub struct Scheduler {
    bus: Arc<dyn Bus>,
    tasks: Mutex<HashMap<ObjectPath, u64>>,
    next: AtomicU64,
}

impl Scheduler {
    /// Creates a scheduler that emits value changes to `bus`.
    #[must_use]
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self {
            bus,
            tasks: Mutex::new(HashMap::new()),
            next: AtomicU64::new(0),
        }
    }

    /// Arms a repeating task for `path`. Every `interval`, starting one
    /// interval from now, `f` is called to obtain a fresh value, which is
    /// emitted as a `PropertiesChanged` signal. [`None`] skips the firing.
    /// Returns `false` if `path` is already armed. Must be called from within a
    /// tokio runtime.
    pub fn arm<F>(self: &Arc<Self>, path: ObjectPath, interval: Duration, f: F) -> bool
    where
        F: Fn() -> Option<Vec<u8>> + Send + 'static,
    {
        let gen = {
            let mut tasks = self.tasks.lock();
            if tasks.contains_key(&path) {
                trace!("Notifications for {path} already armed");
                return false;
            }
            let gen = self.next.fetch_add(1, Ordering::Relaxed);
            tasks.insert(path.clone(), gen);
            gen
        };
        debug!("Arming notifications for {path} every {interval:?}");
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = interval_at(Instant::now() + interval, interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                if !this.is_current(&path, gen) {
                    trace!("Notification task for {path} exiting");
                    break;
                }
                if let Some(v) = f() {
                    trace!("Notifying {path}: {v:02X?}");
                    this.bus.emit(Signal::value_changed(path.clone(), v));
                }
            }
        });
        true
    }

    /// Disarms the task for `path`. Returns `false` if it was not armed.
    pub fn disarm(&self, path: &ObjectPath) -> bool {
        let armed = self.tasks.lock().remove(path).is_some();
        if armed {
            debug!("Disarmed notifications for {path}");
        }
        armed
    }

    /// Returns whether `path` is armed.
    #[inline]
    #[must_use]
    pub fn is_armed(&self, path: &ObjectPath) -> bool {
        self.tasks.lock().contains_key(path)
    }

    /// Returns the number of armed tasks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns whether no tasks are armed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Disarms all tasks and returns how many were armed.
    pub fn clear(&self) -> usize {
        let n = {
            let mut tasks = self.tasks.lock();
            let n = tasks.len();
            tasks.clear();
            n
        };
        if n > 0 {
            debug!("Disarmed {n} notification task(s)");
        }
        n
    }

    #[inline]
    fn is_current(&self, path: &ObjectPath, gen: u64) -> bool {
        self.tasks.lock().get(path) == Some(&gen)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::time::sleep;

    use crate::bus::signals;

    use super::*;

    const IV: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn arm_disarm() {
        let (bus, mut rx) = signals();
        let s = Arc::new(Scheduler::new(Arc::new(bus)));
        let p = ObjectPath::new("/app/service0/char0");
        let n = Arc::new(AtomicUsize::new(0));
        let f = {
            let n = Arc::clone(&n);
            move || Some(vec![u8::try_from(n.fetch_add(1, Ordering::Relaxed)).unwrap_or(0)])
        };

        assert!(s.arm(p.clone(), IV, f.clone()));
        assert!(!s.arm(p.clone(), IV, f.clone()));
        assert_eq!(s.len(), 1);

        sleep(IV / 2).await;
        assert!(rx.try_recv().is_err());
        sleep(IV).await;
        let sig = rx.try_recv().unwrap();
        assert_eq!(sig.path(), &p);
        assert_eq!(sig.value(), Some(&[0][..]));
        sleep(IV).await;
        assert_eq!(rx.try_recv().unwrap().value(), Some(&[1][..]));

        assert!(s.disarm(&p));
        assert!(!s.disarm(&p));

        // Re-arming before the old task wakes up must not let it fire
        assert!(s.arm(p.clone(), IV, f));
        sleep(IV * 3 / 4).await;
        assert!(rx.try_recv().is_err());
        sleep(IV / 2).await;
        assert_eq!(rx.try_recv().unwrap().value(), Some(&[2][..]));
        assert!(rx.try_recv().is_err());

        assert_eq!(s.clear(), 1);
        assert!(s.is_empty());
        sleep(IV * 3).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(n.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn skip() {
        let (bus, mut rx) = signals();
        let s = Arc::new(Scheduler::new(Arc::new(bus)));
        let p = ObjectPath::new("/app/service0/char0");
        s.arm(p.clone(), IV, || None);
        sleep(IV * 3 + IV / 2).await;
        assert!(rx.try_recv().is_err());
        assert!(s.is_armed(&p));
    }
}
