//! Bluetooth LE GATT peripheral object model.
//!
//! A peripheral is described as a tree of [services](gatt::Service),
//! [characteristics](gatt::Characteristic), and [descriptors](gatt::Descriptor)
//! rooted at an [`Application`](gatt::Application), plus an optional
//! [`Advertisement`](adv::Advertisement). Both are registered with a host
//! Bluetooth stack through the [`Host`](host::Host) trait, which answers each
//! registration asynchronously. The host routes client method calls back to the
//! tree as [`Request`](bus::Request)s, and notifying characteristics push value
//! changes to a [`Bus`](bus::Bus) at a fixed cadence.
//!
//! Object paths and property dictionaries follow the BlueZ GATT and LE
//! advertising D-Bus APIs, so a bus adapter can expose the tree unchanged.

#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(single_use_lifetimes)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::get_unwrap)]
#![warn(clippy::mod_module_files)]
#![warn(clippy::print_stdout)]
#![warn(clippy::str_to_string)]
#![warn(clippy::todo)]
#![warn(clippy::undocumented_unsafe_blocks)]

pub use perigatt_const::{Appearance, CompanyId, Uuid, Uuid16};

use bus::ObjectPath;

pub mod adv;
pub mod bus;
pub mod gatt;
pub mod host;
pub mod notify;
pub mod peripheral;
pub mod profile;
pub mod register;

/// Error type returned by the object model and reported to the host.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("operation not permitted")]
    NotPermitted,
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("no object implements {0}")]
    NotFound(String),
    #[error("registration failed: {0}")]
    RegistrationFailed(String),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("unknown object {0}")]
    UnknownObject(ObjectPath),
    #[error("invalid value offset")]
    InvalidOffset,
    #[error("{0}")]
    Failed(String),
}

impl Error {
    /// Returns the error name used in host method replies.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match *self {
            Self::NotPermitted => "org.bluez.Error.NotPermitted",
            Self::InvalidArguments(_) => "org.freedesktop.DBus.Error.InvalidArgs",
            Self::NotFound(_) => "org.bluez.Error.DoesNotExist",
            Self::RegistrationFailed(_) => "org.bluez.Error.Failed",
            Self::InvalidState(_) => "org.bluez.Error.NotReady",
            Self::UnknownObject(_) => "org.freedesktop.DBus.Error.UnknownObject",
            Self::InvalidOffset => "org.bluez.Error.InvalidOffset",
            Self::Failed(_) => "org.bluez.Error.Failed",
        }
    }
}

/// Common result type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_names() {
        assert_eq!(Error::NotPermitted.name(), "org.bluez.Error.NotPermitted");
        assert_eq!(
            Error::InvalidArguments("x".into()).name(),
            "org.freedesktop.DBus.Error.InvalidArgs"
        );
        assert_eq!(Error::InvalidOffset.name(), "org.bluez.Error.InvalidOffset");
        assert_eq!(
            Error::RegistrationFailed("no adapter".into()).to_string(),
            "registration failed: no adapter"
        );
    }
}
