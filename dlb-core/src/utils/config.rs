//! Per-slave configuration.
//!
//! Defaults reproduce the values flashed on the robot. Hosts may load a
//! `SlaveConfig` from JSON; every field is optional there.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use super::{
    controllers::{
        lift::DEFAULT_LIFT_ANGLE,
        motor::Polarity,
        sequencer::SettleTicks,
    },
    protocol::{DriveProtocol, ProtocolVariant},
};

/// 7-bit address both slaves were flashed with.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x08;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaveConfig {
    /// 7-bit I2C slave address.
    pub address: u8,
    /// Layout of incoming frames; also decides the slave's role.
    pub protocol: ProtocolVariant,
    /// Control loop period.
    pub poll_interval_ms: u32,
    pub drive: DriveConfig,
    pub manipulator: ManipulatorConfig,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_I2C_ADDRESS,
            protocol: ProtocolVariant::Drive(DriveProtocol::ModeAscii),
            poll_interval_ms: 10,
            drive: DriveConfig::default(),
            manipulator: ManipulatorConfig::default(),
        }
    }
}

impl SlaveConfig {
    pub fn drive(protocol: DriveProtocol) -> Self {
        Self {
            protocol: ProtocolVariant::Drive(protocol),
            ..Self::default()
        }
    }

    pub fn manipulator() -> Self {
        Self {
            protocol: ProtocolVariant::Manipulator,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms.max(1)))
    }

    /// Whole control ticks covering `ms`, rounded up.
    pub fn ticks(
        &self,
        ms: u32,
    ) -> u32 {
        ms.div_ceil(self.poll_interval_ms.max(1))
    }

    pub fn sweep_step_ticks(&self) -> u32 {
        self.ticks(self.manipulator.sweep_step_ms).max(1)
    }

    pub fn settle_ticks(&self) -> SettleTicks {
        SettleTicks {
            level: self.ticks(self.manipulator.level_settle_ms),
            gripper: self.ticks(self.manipulator.gripper_settle_ms),
        }
    }
}

/// Geometry and calibration of the differential-drive base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Distance between wheels (m)
    pub wheel_base: f32,
    /// Wheel radius (m)
    pub wheel_radius: f32,
    /// PWM counts per wheel rad/s
    pub scaling_factor: f32,
    pub left_polarity: Polarity,
    pub right_polarity: Polarity,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            wheel_base: 0.15,
            wheel_radius: 0.04,
            scaling_factor: 10.2,
            left_polarity: Polarity::ForwardHigh,
            right_polarity: Polarity::ForwardHigh,
        }
    }
}

/// Servo angles and timing of the lift/gripper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulatorConfig {
    pub initial_lift_angle: u8,
    pub gripper_open_angle: u8,
    pub gripper_closed_angle: u8,
    /// Pause between one-degree lift writes.
    pub sweep_step_ms: u32,
    /// Pause after the lift reaches a level.
    pub level_settle_ms: u32,
    /// Pause after each gripper write.
    pub gripper_settle_ms: u32,
}

impl Default for ManipulatorConfig {
    fn default() -> Self {
        Self {
            initial_lift_angle: DEFAULT_LIFT_ANGLE,
            gripper_open_angle: 170,
            gripper_closed_angle: 0,
            sweep_step_ms: 20,
            level_settle_ms: 1000,
            gripper_settle_ms: 1000,
        }
    }
}
