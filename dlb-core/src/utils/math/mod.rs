//! Math utilities for the Drive/Lift Bot.
//!
//! This module provides differential-drive mixing for the two-wheeled base.

pub mod kinematics;
