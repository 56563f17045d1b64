//! Kernel services for bare-metal targets
//!
//! # Module Organization
//!
//! - [`object`]: named, typed registry of every stateful component
//! - [`mm`]: block allocator over a static arena
//! - [`config`]: table and arena sizes
//!
//! Call [`init`] once at startup before allocating.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod kcore;
pub mod mm;
pub mod object;

pub use common::{Error, Result};
pub use kcore::init::init;
pub use object::{OBJECTS, Object, ObjectEntry, ObjectName, ObjectRegistry, ObjectType};
