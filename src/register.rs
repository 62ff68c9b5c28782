//! Registration protocol.
//!
//! An application or advertisement is submitted to the host, which answers
//! exactly once through a [`Responder`]. The answer moves the registration
//! state from `Pending` to either `Registered` or `Failed`. There is no timeout
//! and no retry.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info};

use crate::{Error, Result};

/// Registration state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum RegState {
    #[default]
    Unregistered,
    Pending,
    Registered,
    Failed(String),
}

impl RegState {
    /// Returns whether the registration was acknowledged.
    #[inline(always)]
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        matches!(*self, Self::Registered)
    }

    /// Returns whether the host answered.
    #[inline(always)]
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(*self, Self::Registered | Self::Failed(_))
    }
}

impl Display for RegState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Unregistered => f.write_str("unregistered"),
            Self::Pending => f.write_str("pending"),
            Self::Registered => f.write_str("registered"),
            Self::Failed(ref d) => write!(f, "failed ({d})"),
        }
    }
}

type Outcome = std::result::Result<(), String>;

/// Returns a connected responder and answer pair.
#[must_use]
pub fn channel() -> (Responder, Answer) {
    let (tx, rx) = oneshot::channel();
    (Responder(tx), Answer(rx))
}

/// Host side of a registration. Dropping it without answering fails the
/// registration.
#[derive(Debug)]
#[must_use]
#[repr(transparent)]
pub struct Responder(oneshot::Sender<Outcome>);

impl Responder {
    /// Acknowledges the registration.
    #[inline]
    pub fn succeed(self) {
        let _ = self.0.send(Ok(()));
    }

    /// Rejects the registration.
    #[inline]
    pub fn fail(self, detail: impl Into<String>) {
        let _ = self.0.send(Err(detail.into()));
    }
}

/// Pending host answer to a registration.
#[derive(Debug)]
#[repr(transparent)]
pub struct Answer(oneshot::Receiver<Outcome>);

impl Answer {
    /// Returns an answer that has already succeeded.
    #[must_use]
    pub fn ok() -> Self {
        let (tx, rx) = channel();
        tx.succeed();
        rx
    }

    /// Returns an answer that has already failed with `detail`.
    #[must_use]
    pub fn err(detail: impl Into<String>) -> Self {
        let (tx, rx) = channel();
        tx.fail(detail);
        rx
    }
}

/// Registration state owner of an application or advertisement. An object
/// is submitted at most once; teardown does not allow a second submission.
#[derive(Debug)]
pub struct Registrar {
    what: &'static str,
    tx: Arc<watch::Sender<RegState>>,
    submitted: AtomicBool,
}

impl Registrar {
    /// Creates an unregistered state owner. `what` names the object in logs.
    #[must_use]
    pub fn new(what: &'static str) -> Self {
        let (tx, _) = watch::channel(RegState::Unregistered);
        Self {
            what,
            tx: Arc::new(tx),
            submitted: AtomicBool::new(false),
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> RegState {
        self.tx.borrow().clone()
    }

    /// Returns a state change receiver.
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RegState> {
        self.tx.subscribe()
    }

    /// Returns whether the object was ever submitted to the host.
    #[inline]
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::Acquire)
    }

    /// Transitions from `Unregistered` to `Pending`. Fails if the object was
    /// already submitted, even if it has since been unregistered.
    pub fn begin(&self) -> Result<()> {
        if self.submitted.swap(true, Ordering::AcqRel) {
            return Err(Error::InvalidState("registration already submitted"));
        }
        self.tx.send_replace(RegState::Pending);
        Ok(())
    }

    /// Resolves the pending registration when the host answers. Must be called
    /// from within a tokio runtime.
    pub fn track(&self, ans: Answer) -> Registration {
        let (what, tx) = (self.what, Arc::clone(&self.tx));
        tokio::spawn(async move {
            let st = match ans.0.await {
                Ok(Ok(())) => {
                    info!("{what} registered");
                    RegState::Registered
                }
                Ok(Err(detail)) => {
                    error!("Failed to register {what}: {detail}");
                    RegState::Failed(detail)
                }
                Err(_) => {
                    error!("Failed to register {what}: no reply");
                    RegState::Failed("no reply".to_owned())
                }
            };
            tx.send_if_modified(|s| {
                let pending = *s == RegState::Pending;
                if pending {
                    *s = st;
                } else {
                    debug!("Ignoring late {what} registration answer");
                }
                pending
            });
        });
        Registration {
            rx: self.tx.subscribe(),
        }
    }

    /// Resets a pending or acknowledged registration to `Unregistered` and
    /// returns whether the host had acknowledged it. A failed registration
    /// keeps its state.
    pub fn take_registered(&self) -> bool {
        let mut was = false;
        self.tx.send_if_modified(|s| match *s {
            RegState::Pending | RegState::Registered => {
                was = s.is_registered();
                *s = RegState::Unregistered;
                true
            }
            _ => false,
        });
        was
    }

    /// Overrides the current state.
    #[cfg(test)]
    pub(crate) fn force(&self, st: RegState) {
        self.tx.send_replace(st);
    }
}

/// Handle used to wait for the host answer.
#[derive(Debug)]
pub struct Registration {
    rx: watch::Receiver<RegState>,
}

impl Registration {
    /// Waits until the host answers. Returns `RegistrationFailed` if the
    /// registration was rejected or the host went away without answering.
    pub async fn wait(&mut self) -> Result<()> {
        let st = match self.rx.wait_for(RegState::is_settled).await {
            Ok(st) => st.clone(),
            Err(_) => RegState::Failed("no reply".to_owned()),
        };
        match st {
            RegState::Failed(detail) => Err(Error::RegistrationFailed(detail)),
            _ => Ok(()),
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> RegState {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeed() {
        let r = Registrar::new("application");
        r.begin().unwrap();
        assert_eq!(r.state(), RegState::Pending);
        assert_eq!(r.begin(), Err(Error::InvalidState("registration already submitted")));

        let (tx, rx) = channel();
        let mut reg = r.track(rx);
        assert_eq!(reg.state(), RegState::Pending);
        tx.succeed();
        reg.wait().await.unwrap();
        assert_eq!(r.state(), RegState::Registered);

        assert!(r.take_registered());
        assert!(!r.take_registered());
        assert_eq!(r.state(), RegState::Unregistered);
    }

    #[tokio::test]
    async fn single_submission() {
        let r = Registrar::new("advertisement");
        assert!(!r.is_submitted());
        r.begin().unwrap();
        let mut reg = r.track(Answer::ok());
        reg.wait().await.unwrap();
        assert!(r.take_registered());
        assert_eq!(r.state(), RegState::Unregistered);
        assert!(r.is_submitted());
        assert_eq!(r.begin(), Err(Error::InvalidState("registration already submitted")));
        assert_eq!(r.state(), RegState::Unregistered);
    }

    #[tokio::test]
    async fn fail() {
        let r = Registrar::new("advertisement");
        r.begin().unwrap();
        let mut reg = r.track(Answer::err("no adapter"));
        assert_eq!(
            reg.wait().await,
            Err(Error::RegistrationFailed("no adapter".to_owned()))
        );
        assert_eq!(r.state(), RegState::Failed("no adapter".to_owned()));
        assert!(r.begin().is_err());
        assert!(!r.take_registered());
        assert_eq!(r.state(), RegState::Failed("no adapter".to_owned()));
    }

    #[tokio::test]
    async fn dropped_responder() {
        let r = Registrar::new("application");
        r.begin().unwrap();
        let (tx, rx) = channel();
        let mut reg = r.track(rx);
        drop(tx);
        assert_eq!(
            reg.wait().await,
            Err(Error::RegistrationFailed("no reply".to_owned()))
        );
    }

    #[tokio::test]
    async fn late_answer() {
        let r = Registrar::new("application");
        r.begin().unwrap();
        let (tx, rx) = channel();
        let _reg = r.track(rx);
        assert!(!r.take_registered());
        tx.succeed();
        tokio::task::yield_now().await;
        assert_eq!(r.state(), RegState::Unregistered);
    }
}
