//! Command decoding and motion conversion for the Drive/Lift Bot I2C slaves
//! on no-std embedded platforms.
//!
//! For a host-side run of a slave, see `dlb-app/mock-mcu`.
#![no_std]

pub mod utils;
