//! Cycling Power Service ([CPS]).
//!
//! Exposes power measurements from a cycling power sensor. Only the
//! Instantaneous Power field of the measurement is supported.
//!
//! [CPS]: https://www.bluetooth.com/specifications/specs/cycling-power-service-1-1/

use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use perigatt_const::{Characteristic, Service};

use crate::bus::ObjectPath;
use crate::gatt::{Application, Builder, CharFlags, Io, IoReq, IoResult};

/// Cycling power sensor location (\[GSS\] Section 3.196).
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum SensorLocation {
    Other = 0,
    TopOfShoe = 1,
    InShoe = 2,
    Hip = 3,
    FrontWheel = 4,
    LeftCrank = 5,
    RightCrank = 6,
    LeftPedal = 7,
    RightPedal = 8,
    FrontHub = 9,
    RearDropout = 10,
    Chainstay = 11,
    RearWheel = 12,
    RearHub = 13,
    Chest = 14,
    Spider = 15,
    ChainRing = 16,
}

impl Default for SensorLocation {
    #[inline(always)]
    fn default() -> Self {
        Self::RearWheel
    }
}

/// Cycling Power Service state.
#[derive(Clone, Debug)]
pub struct CyclingPowerService {
    power: Arc<AtomicI16>,
    location: SensorLocation,
    interval: Duration,
}

impl CyclingPowerService {
    /// Default measurement notification interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

    /// Default instantaneous power in watts.
    pub const DEFAULT_POWER: i16 = 150;

    /// Creates a rear wheel sensor reporting [`Self::DEFAULT_POWER`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            power: Arc::new(AtomicI16::new(Self::DEFAULT_POWER)),
            location: SensorLocation::default(),
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Sets the sensor location.
    #[inline(always)]
    #[must_use]
    pub const fn with_location(mut self, v: SensorLocation) -> Self {
        self.location = v;
        self
    }

    /// Sets the measurement notification interval.
    #[inline(always)]
    #[must_use]
    pub const fn with_interval(mut self, v: Duration) -> Self {
        self.interval = v;
        self
    }

    /// Sets the instantaneous power in watts reported by the next
    /// measurement.
    #[inline]
    pub fn set_power(&self, watts: i16) {
        self.power.store(watts, Ordering::Relaxed);
    }

    /// Returns the current measurement value (\[GSS\] Section 3.59): no
    /// optional fields followed by the instantaneous power.
    #[must_use]
    pub fn measurement(&self) -> [u8; 4] {
        measurement(&self.power)
    }

    /// Defines the service and returns the measurement characteristic path.
    pub fn define(&self, b: &mut Builder<Application>) -> ObjectPath {
        let power = Arc::clone(&self.power);
        let io = Io::from(move |req: IoReq| -> IoResult {
            if let IoReq::Notify(n) = req {
                let v = measurement(&power);
                trace!("Power measurement: {v:02X?}");
                n.notify(v);
            }
            Ok(())
        });
        let (_, meas) = b.primary_service(Service::CyclingPower, [], |b| {
            let (meas, ()) = b.characteristic(
                Characteristic::CyclingPowerMeasurement,
                CharFlags::NOTIFY,
                io,
                |b| {
                    b.notify_interval(self.interval);
                },
            );
            b.ro_characteristic(Characteristic::CyclingPowerFeature, [0_u8; 4], |_| {});
            let loc = [u8::from(self.location)];
            b.ro_characteristic(Characteristic::SensorLocation, loc, |_| {});
            meas
        });
        meas
    }
}

impl Default for CyclingPowerService {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn measurement(power: &AtomicI16) -> [u8; 4] {
    let [lo, hi] = power.load(Ordering::Relaxed).to_le_bytes();
    [0, 0, lo, hi]
}

#[cfg(test)]
mod tests {
    use crate::bus::{signals, ReadOptions, WriteOptions};
    use crate::gatt::DEFAULT_BASE;
    use crate::Error;

    use super::*;

    #[test]
    fn measurement() {
        let cps = CyclingPowerService::new();
        assert_eq!(cps.measurement(), [0, 0, 150, 0]);
        cps.set_power(300);
        assert_eq!(cps.measurement(), [0, 0, 0x2C, 0x01]);
        cps.set_power(-1);
        assert_eq!(cps.measurement(), [0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn location() {
        assert_eq!(u8::from(SensorLocation::default()), 12);
        assert!(matches!(
            SensorLocation::try_from(5),
            Ok(SensorLocation::LeftCrank)
        ));
        assert!(SensorLocation::try_from(17).is_err());
        assert!(SensorLocation::try_from(u8::MAX).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn notify() {
        let (bus, mut rx) = signals();
        let cps = CyclingPowerService::new().with_location(SensorLocation::Spider);
        let mut b = Application::build(Arc::new(bus));
        let path = cps.define(&mut b);
        let app = b.freeze();
        assert_eq!(path, "/org/bluez/example/service0/char0");
        assert_eq!(app.path(), DEFAULT_BASE);

        let loc = app
            .characteristic(&ObjectPath::new("/org/bluez/example/service0/char2"))
            .unwrap();
        assert_eq!(loc.read_value(&ReadOptions::default()).unwrap(), [15]);

        let m = app.characteristic(&path).unwrap();
        assert_eq!(m.read_value(&ReadOptions::default()), Err(Error::NotPermitted));
        assert_eq!(
            m.write_value(&[1], &WriteOptions::default()),
            Err(Error::NotPermitted)
        );
        m.start_notify().unwrap();
        cps.set_power(200);
        tokio::time::sleep(CyclingPowerService::DEFAULT_INTERVAL + Duration::from_millis(1)).await;
        let sig = rx.try_recv().unwrap();
        assert_eq!(sig.value(), Some([0, 0, 200, 0].as_slice()));
        assert_eq!(m.value(), [0, 0, 200, 0]);
        m.stop_notify().unwrap();
    }
}
