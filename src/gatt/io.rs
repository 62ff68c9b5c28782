use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::Uuid;

use super::*;

/// I/O callback result type.
pub type IoResult = Result<()>;

/// Characteristic or descriptor I/O callback. Objects without a callback
/// serve their stored value.
#[derive(Clone, Default)]
#[repr(transparent)]
pub struct Io(Option<Arc<dyn for<'a> Fn(IoReq<'a>) -> IoResult + Send + Sync>>);

impl Io {
    /// Callback that leaves all requests to the default behavior.
    pub const NONE: Self = Self(None);

    /// Returns an I/O callback for a method of `T`.
    #[inline(always)]
    pub fn with<T: Send + Sync + 'static>(
        this: &Arc<T>,
        f: impl Fn(&T, IoReq) -> IoResult + Send + Sync + 'static,
    ) -> Self {
        let this = Arc::clone(this);
        Self(Some(Arc::new(move |req: IoReq| f(&this, req))))
    }

    /// Returns an I/O callback that passes written values to a command handler
    /// and notifies the client of queued replies. An empty value is notified
    /// when no reply is queued.
    pub fn command(h: impl CommandHandler) -> Self {
        let q = Mutex::new(VecDeque::<Vec<u8>>::new());
        Self::from(move |req: IoReq| -> IoResult {
            match req {
                IoReq::Write(w) => {
                    if let Some(rsp) = h.handle(w.value())? {
                        q.lock().push_back(rsp);
                    }
                }
                IoReq::Notify(n) => n.notify(q.lock().pop_front().unwrap_or_default()),
                IoReq::Read(_) => {}
            }
            Ok(())
        })
    }

    /// Returns whether a callback is set.
    #[inline(always)]
    #[must_use]
    pub const fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Executes the specified request.
    #[inline]
    pub(super) fn exec(&self, req: IoReq) -> IoResult {
        self.0.as_ref().map_or(Ok(()), |f| f(req))
    }
}

impl Debug for Io {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let p = self.0.as_ref().map(|f| Arc::as_ptr(f).cast::<()>());
        f.debug_tuple("Io").field(&p).finish()
    }
}

impl<T: Fn(IoReq) -> IoResult + Send + Sync + 'static> From<T> for Io {
    #[inline(always)]
    fn from(f: T) -> Self {
        Self(Some(Arc::new(f)))
    }
}

/// Characteristic or descriptor I/O request.
#[derive(Debug)]
#[non_exhaustive]
pub enum IoReq<'a> {
    Read(&'a mut ReadReq),
    Write(&'a WriteReq<'a>),
    Notify(&'a mut NotifyReq),
}

/// Characteristic or descriptor read request. The request starts out holding
/// the stored value, which is returned unless the callback completes the
/// request with a fresh one.
#[derive(Debug)]
pub struct ReadReq {
    pub(super) uuid: Uuid,
    pub(super) off: usize,
    pub(super) val: Vec<u8>,
}

impl ReadReq {
    /// Returns the attribute UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the value offset requested by the client.
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.off
    }

    /// Returns the current value.
    #[inline(always)]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.val
    }

    /// Provides the complete attribute value. The requested offset is applied
    /// by the caller.
    #[inline]
    pub fn complete(&mut self, v: impl AsRef<[u8]>) -> IoResult {
        let v = v.as_ref();
        if v.len() < self.off {
            return Err(Error::InvalidOffset);
        }
        self.val.clear();
        self.val.extend_from_slice(v);
        Ok(())
    }
}

/// Characteristic or descriptor write request.
#[derive(Debug)]
pub struct WriteReq<'a> {
    pub(super) uuid: Uuid,
    pub(super) off: usize,
    pub(super) val: &'a [u8],
}

impl<'a> WriteReq<'a> {
    /// Returns the attribute UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the value offset.
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.off
    }

    /// Returns the bytes written at the specified offset.
    #[inline(always)]
    #[must_use]
    pub const fn value(&self) -> &'a [u8] {
        self.val
    }
}

impl AsRef<[u8]> for WriteReq<'_> {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        self.val
    }
}

/// Periodic notification request. The request starts out holding the stored
/// value, which is pushed to the client unless the callback replaces it or
/// skips this firing.
#[derive(Debug)]
pub struct NotifyReq {
    pub(super) uuid: Uuid,
    pub(super) val: Option<Vec<u8>>,
}

impl NotifyReq {
    /// Returns the characteristic UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Sets the value to notify.
    #[inline]
    pub fn notify(&mut self, v: impl Into<Vec<u8>>) {
        self.val = Some(v.into());
    }

    /// Suppresses the notification for this firing.
    #[inline]
    pub fn skip(&mut self) {
        self.val = None;
    }
}

/// Handler of commands written to a control characteristic.
pub trait CommandHandler: Send + Sync + 'static {
    /// Handles a written command and optionally returns a reply to be notified
    /// on the next firing.
    fn handle(&self, cmd: &[u8]) -> Result<Option<Vec<u8>>>;
}

impl<F> CommandHandler for F
where
    F: Fn(&[u8]) -> Result<Option<Vec<u8>>> + Send + Sync + 'static,
{
    #[inline(always)]
    fn handle(&self, cmd: &[u8]) -> Result<Option<Vec<u8>>> {
        self(cmd)
    }
}

/// Command handler that accepts and ignores all commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ignore;

impl CommandHandler for Ignore {
    fn handle(&self, cmd: &[u8]) -> Result<Option<Vec<u8>>> {
        debug!("Ignoring command {cmd:02X?}");
        Ok(None)
    }
}

/// Command handler that notifies every command back to the client.
#[derive(Clone, Copy, Debug, Default)]
pub struct Echo;

impl CommandHandler for Echo {
    fn handle(&self, cmd: &[u8]) -> Result<Option<Vec<u8>>> {
        if cmd.is_empty() {
            warn!("Empty command");
            return Err(Error::InvalidArguments("empty command".to_owned()));
        }
        Ok(Some(cmd.to_vec()))
    }
}
