use std::fmt::Debug;

use tokio::sync::mpsc;
use tracing::trace;

use super::*;

/// Signal emitted by an exposed object.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Signal {
    /// `org.freedesktop.DBus.Properties.PropertiesChanged`.
    PropertiesChanged {
        path: ObjectPath,
        iface: &'static str,
        changed: Props,
    },
}

impl Signal {
    /// Returns a characteristic `Value` change signal.
    #[must_use]
    pub fn value_changed(path: ObjectPath, v: Vec<u8>) -> Self {
        Self::PropertiesChanged {
            path,
            iface: GATT_CHARACTERISTIC,
            changed: Props::from([("Value".to_owned(), Value::Bytes(v))]),
        }
    }

    /// Returns the path of the emitting object.
    #[inline]
    #[must_use]
    pub const fn path(&self) -> &ObjectPath {
        match *self {
            Self::PropertiesChanged { ref path, .. } => path,
        }
    }

    /// Returns the changed `Value` property, if any.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        match *self {
            Self::PropertiesChanged { ref changed, .. } => {
                changed.get("Value").and_then(Value::as_bytes)
            }
        }
    }
}

/// Sink for signals emitted by exposed objects.
pub trait Bus: Debug + Send + Sync {
    /// Emits a signal. This must not block.
    fn emit(&self, sig: Signal);
}

/// Bus that drops all signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Bus for Discard {
    #[inline]
    fn emit(&self, sig: Signal) {
        trace!("Discarding {sig:?}");
    }
}

/// Bus that forwards signals to a channel.
#[derive(Clone, Debug)]
#[repr(transparent)]
pub struct SignalSender(mpsc::UnboundedSender<Signal>);

impl Bus for SignalSender {
    #[inline]
    fn emit(&self, sig: Signal) {
        trace!("Emitting {sig:?}");
        if self.0.send(sig).is_err() {
            trace!("Signal receiver closed");
        }
    }
}

/// Returns a channel-backed bus and the receiver of emitted signals.
#[must_use]
pub fn signals() -> (SignalSender, mpsc::UnboundedReceiver<Signal>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender(tx), rx)
}
