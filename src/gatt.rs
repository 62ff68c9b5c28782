//! Generic Attribute Profile object tree.
//!
//! An [`Application`] owns an ordered list of [`Service`]s, each owning its
//! [`Characteristic`]s, which in turn own their [`Descriptor`]s. The tree is
//! defined once through a [`Builder`] and is immutable in topology afterwards.

pub use {app::*, builder::*, char::*, consts::*, desc::*, io::*, service::*};

use crate::bus::*;
use crate::{Error, Result};

mod app;
mod builder;
mod char;
mod consts;
mod desc;
mod io;
mod service;

#[cfg(test)]
mod tests;
