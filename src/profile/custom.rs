//! Vendor-specific services with a write/notify command characteristic.

use std::time::Duration;

use crate::bus::ObjectPath;
use crate::gatt::{Application, Builder, CharFlags, CommandHandler, Io};
use crate::Uuid;

/// Custom service with a single characteristic. Written values are passed to
/// a [`CommandHandler`], and queued replies are notified to the client at a
/// fixed interval.
#[derive(Clone, Debug)]
pub struct CustomService {
    uuid: Uuid,
    chr: Uuid,
    io: Io,
    interval: Duration,
    desc: Option<String>,
}

impl CustomService {
    /// Data service UUID.
    pub const DATA_SERVICE: Uuid =
        // SAFETY: Non-zero
        unsafe { Uuid::new_unchecked(0x712ea4d1_ec01_4654_bc82_1b15c14fbe2d) };
    /// Control service UUID.
    pub const CONTROL_SERVICE: Uuid =
        // SAFETY: Non-zero
        unsafe { Uuid::new_unchecked(0x31842d98_c4f6_487b_80c5_715aa5657460) };
    /// Command characteristic UUID shared by both services.
    pub const COMMAND: Uuid =
        // SAFETY: Non-zero
        unsafe { Uuid::new_unchecked(0x31842d98_c4f6_487b_80c5_715aa5657461) };

    /// Default notification interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    /// Creates a service `uuid` with a command characteristic `chr`.
    #[must_use]
    pub fn new(uuid: Uuid, chr: Uuid, h: impl CommandHandler) -> Self {
        Self {
            uuid,
            chr,
            io: Io::command(h),
            interval: Self::DEFAULT_INTERVAL,
            desc: None,
        }
    }

    /// Creates the data service.
    #[inline]
    #[must_use]
    pub fn data(h: impl CommandHandler) -> Self {
        Self::new(Self::DATA_SERVICE, Self::COMMAND, h).with_description("Data")
    }

    /// Creates the control service.
    #[inline]
    #[must_use]
    pub fn control(h: impl CommandHandler) -> Self {
        Self::new(Self::CONTROL_SERVICE, Self::COMMAND, h).with_description("Control")
    }

    /// Sets the characteristic user description.
    #[inline]
    #[must_use]
    pub fn with_description(mut self, v: impl Into<String>) -> Self {
        self.desc = Some(v.into());
        self
    }

    /// Sets the notification interval.
    #[inline]
    #[must_use]
    pub fn with_interval(mut self, v: Duration) -> Self {
        self.interval = v;
        self
    }

    /// Returns the service UUID.
    #[inline(always)]
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Defines the service and returns the command characteristic path.
    pub fn define(&self, b: &mut Builder<Application>) -> ObjectPath {
        let flags = CharFlags::WRITE | CharFlags::NOTIFY;
        let (_, chr) = b.primary_service(self.uuid, [], |b| {
            let (chr, ()) = b.characteristic(self.chr, flags, self.io.clone(), |b| {
                b.notify_interval(self.interval);
                if let Some(ref d) = self.desc {
                    b.user_description(d);
                }
            });
            chr
        });
        chr
    }
}
