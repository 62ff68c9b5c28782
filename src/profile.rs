//! GATT profiles and the cycling peripheral assembly.

use std::sync::Arc;

pub use {cps::*, custom::*, dis::*, gaps::*};

use crate::adv::{AdvType, Advertisement};
use crate::bus::{Bus, ObjectPath};
use crate::gatt::Application;
use crate::{CompanyId, Result};

mod cps;
mod custom;
mod dis;
mod gaps;

/// Cycling power sensor peripheral: device information, cycling power, and
/// custom data and control services, plus a connectable advertisement.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Cycling {
    pub dis: DeviceInfoService,
    pub cps: CyclingPowerService,
    pub data: CustomService,
    pub control: CustomService,
    pub gap: Option<GapService>,
    pub local_name: String,
}

impl Cycling {
    /// Manufacturer data advertised with [`CompanyId::TESTING`].
    pub const MANUFACTURER_DATA: [u8; 5] = [0, 1, 2, 3, 4];

    /// Creates the default cycling peripheral profile. Commands written to
    /// the custom characteristics are ignored.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dis: DeviceInfoService::new()
                .with_manufacturer_name([0, 0])
                .with_model_num("1.0")
                .with_serial_num([0, 0]),
            cps: CyclingPowerService::new(),
            data: CustomService::data(crate::gatt::Ignore),
            control: CustomService::control(crate::gatt::Ignore),
            gap: None,
            local_name: GapService::DEFAULT_NAME.to_owned(),
        }
    }

    /// Includes a Generic Access service. Most hosts provide their own.
    #[inline]
    #[must_use]
    pub fn with_gap(mut self, v: GapService) -> Self {
        self.gap = Some(v);
        self
    }

    /// Returns the application tree rooted at `base`. Services are defined in
    /// the order: GAP (if enabled), DIS, CPS, data, control.
    #[must_use]
    pub fn application(&self, base: impl Into<ObjectPath>, bus: Arc<dyn Bus>) -> Application {
        let mut b = Application::build_at(base, bus);
        if let Some(ref gap) = self.gap {
            gap.define(&mut b);
        }
        self.dis.define(&mut b);
        self.cps.define(&mut b);
        self.data.define(&mut b);
        self.control.define(&mut b);
        b.freeze()
    }

    /// Returns the advertisement for `<base>/advertisement0`.
    pub fn advertisement(&self, base: impl Into<ObjectPath>) -> Result<Advertisement> {
        let mut adv = Advertisement::new(base, 0, AdvType::Peripheral);
        (adv.add_service_uuid(perigatt_const::Service::CyclingPower)?)
            .add_manufacturer_data(CompanyId::TESTING, Self::MANUFACTURER_DATA)?
            .add_local_name(self.local_name.as_str())?
            .set_include_tx_power(true)?;
        Ok(adv)
    }
}

impl Default for Cycling {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
