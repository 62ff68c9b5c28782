//! Peripheral event loop.

use std::future::pending;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::adv::Advertisement;
use crate::bus::*;
use crate::gatt::{Application, DEFAULT_BASE};
use crate::host::{find_adapter, Host};
use crate::register::Registration;
use crate::{Error, Result};

/// Peripheral configuration.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
    /// Base object path of the application and advertisement.
    pub base: ObjectPath,
    /// Maximum time allowed for teardown.
    pub grace: Duration,
}

impl Config {
    /// Default teardown grace period.
    pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

    /// Sets the base object path.
    #[inline]
    #[must_use]
    pub fn with_base(mut self, base: impl Into<ObjectPath>) -> Self {
        self.base = base.into();
        self
    }

    /// Sets the teardown grace period.
    #[inline]
    #[must_use]
    pub fn with_grace(mut self, d: Duration) -> Self {
        self.grace = d;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: ObjectPath::new(DEFAULT_BASE),
            grace: Self::DEFAULT_GRACE,
        }
    }
}

/// GATT peripheral: an application and an optional advertisement served by a
/// single event loop.
#[derive(Debug)]
pub struct Peripheral {
    app: Application,
    adv: Option<Advertisement>,
    cfg: Config,
}

/// Adapters selected for each registration.
#[derive(Debug)]
struct Adapters {
    gatt: ObjectPath,
    adv: Option<ObjectPath>,
}

impl Peripheral {
    /// Creates a peripheral serving `app`.
    #[inline]
    #[must_use]
    pub fn new(app: Application, cfg: Config) -> Self {
        Self {
            app,
            adv: None,
            cfg,
        }
    }

    /// Adds an advertisement.
    #[inline]
    #[must_use]
    pub fn with_advertisement(mut self, adv: Advertisement) -> Self {
        self.adv = Some(adv);
        self
    }

    /// Returns the application.
    #[inline(always)]
    #[must_use]
    pub const fn application(&self) -> &Application {
        &self.app
    }

    /// Returns the advertisement.
    #[inline(always)]
    #[must_use]
    pub const fn advertisement(&self) -> Option<&Advertisement> {
        self.adv.as_ref()
    }

    /// Returns the configuration.
    #[inline(always)]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.cfg
    }

    /// Registers the application and advertisement with `host` and serves
    /// `requests` until `stop` is cancelled or either registration fails.
    /// A registration failure cancels `stop` and is returned after teardown.
    /// The request channel is closed before teardown begins, so no request is
    /// dispatched after the loop exits.
    pub async fn run(
        &self,
        host: &dyn Host,
        mut requests: Requests,
        stop: CancellationToken,
    ) -> Result<()> {
        let ad = match self.adapters(host).await {
            Ok(ad) => ad,
            Err(e) => {
                stop.cancel();
                return Err(e);
            }
        };
        let r = match self.submit(host, &ad) {
            Ok((app, adv)) => self.serve(&mut requests, app, adv, &stop).await,
            Err(e) => {
                stop.cancel();
                Err(e)
            }
        };
        requests.close();
        drop(requests);
        self.teardown(host, &ad).await;
        r
    }

    /// Locates the adapters implementing the GATT and advertising managers.
    async fn adapters(&self, host: &dyn Host) -> Result<Adapters> {
        let objs = host.managed_objects().await?;
        let Some(gatt) = find_adapter(&objs, GATT_MANAGER) else {
            error!("No adapter implements {GATT_MANAGER}");
            return Err(Error::NotFound(GATT_MANAGER.to_owned()));
        };
        let adv = self.adv.as_ref().and_then(|_| {
            let a = find_adapter(&objs, LE_ADVERTISING_MANAGER);
            if a.is_none() {
                warn!("No adapter implements {LE_ADVERTISING_MANAGER}, not advertising");
            }
            a
        });
        Ok(Adapters { gatt, adv })
    }

    /// Submits the application and advertisement for registration.
    fn submit(
        &self,
        host: &dyn Host,
        ad: &Adapters,
    ) -> Result<(Registration, Option<Registration>)> {
        let app = self.app.register(host, &ad.gatt)?;
        let adv = match (self.adv.as_ref(), ad.adv.as_ref()) {
            (Some(adv), Some(adapter)) => {
                debug!("Advertising data: {:02X?}", adv.encode());
                Some(adv.register(host, adapter)?)
            }
            _ => None,
        };
        Ok((app, adv))
    }

    async fn serve(
        &self,
        requests: &mut Requests,
        mut app: Registration,
        mut adv: Option<Registration>,
        stop: &CancellationToken,
    ) -> Result<()> {
        let (mut app_done, mut adv_done, mut open) = (false, adv.is_none(), true);
        loop {
            tokio::select! {
                biased;
                () = stop.cancelled() => {
                    info!("Stopping peripheral");
                    return Ok(());
                }
                r = app.wait(), if !app_done => {
                    if let Err(e) = r {
                        stop.cancel();
                        return Err(e);
                    }
                    app_done = true;
                }
                r = wait_opt(adv.as_mut()), if !adv_done => {
                    if let Err(e) = r {
                        stop.cancel();
                        return Err(e);
                    }
                    adv_done = true;
                }
                req = requests.recv(), if open => match req {
                    Some(req) => self.dispatch(req),
                    None => {
                        debug!("Request channel closed");
                        open = false;
                    }
                },
            }
        }
    }

    /// Routes a request to the advertisement or the application.
    fn dispatch(&self, req: Request) {
        match self.adv {
            Some(ref adv) if req.path.starts_with(adv.path()) => adv.handle(req),
            _ => self.app.handle(req),
        }
    }

    /// Unregisters the advertisement and application within the grace period.
    async fn teardown(&self, host: &dyn Host, ad: &Adapters) {
        let f = async {
            if let Some(ref adv) = self.adv {
                if let Some(ref adapter) = ad.adv {
                    if let Err(e) = adv.unregister(host, adapter).await {
                        warn!("Failed to unregister advertisement: {e}");
                    }
                }
                adv.release();
            }
            if let Err(e) = self.app.unregister(host, &ad.gatt).await {
                warn!("Failed to unregister GATT application: {e}");
            }
        };
        if tokio::time::timeout(self.cfg.grace, f).await.is_err() {
            warn!("Teardown did not finish within {:?}", self.cfg.grace);
        } else {
            debug!("Teardown complete");
        }
    }
}

/// Waits for an optional registration. [`None`] never completes.
async fn wait_opt(r: Option<&mut Registration>) -> Result<()> {
    match r {
        Some(r) => r.wait().await,
        None => pending().await,
    }
}
