//! Utility re-exports and helper macros for the Drive/Lift Bot.
//!
//! This module re-exports the slave components and provides a helper macro:
//!
//! - `protocol`: I2C frame layouts, decoding and encoding
//! - `controllers`: actuator port, motors, lift, gripper and the controller
//! - `math`: differential-drive kinematics
//! - `config`: per-slave configuration with the flashed defaults
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod config;
pub mod controllers;
pub mod math;
pub mod protocol;

pub use config::SlaveConfig;
pub use controllers::{SystemController, COMMAND_MAILBOX};
pub use embassy_time::*;
#[doc(hidden)]
pub use static_cell::StaticCell;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `StaticCell` for type `$t` and initializes it with
/// `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::StaticCell<$t> = $crate::utils::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
