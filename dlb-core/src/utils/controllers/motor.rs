//! Signed wheel speed to H-bridge phase + PWM duty.
//!
//! The two slave boards disagreed on which phase level means "forward", so the
//! mapping is per-wheel calibration ([`Polarity`]) rather than a constant.

use serde::{Deserialize, Serialize};

use super::port::{ActuatorPort, Level, Wheel};
use crate::utils::math::kinematics::{WheelSpeedPair, MAX_WHEEL_DUTY};

/// Phase level that drives a wheel forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// speed >= 0 drives the phase pin HIGH.
    #[default]
    ForwardHigh,
    /// speed >= 0 drives the phase pin LOW.
    ForwardLow,
}

impl Polarity {
    pub fn level(
        self,
        speed: i16,
    ) -> Level {
        match (self, speed >= 0) {
            (Polarity::ForwardHigh, true) | (Polarity::ForwardLow, false) => Level::High,
            (Polarity::ForwardHigh, false) | (Polarity::ForwardLow, true) => Level::Low,
        }
    }
}

/// Fire-and-forget driver for both motors.
#[derive(Debug, Clone, Copy)]
pub struct MotorActuator {
    left: Polarity,
    right: Polarity,
}

impl MotorActuator {
    pub fn new(
        left: Polarity,
        right: Polarity,
    ) -> Self {
        Self { left, right }
    }

    /// Direction first, then `|speed|` as duty, clamped to 255.
    pub fn apply<P: ActuatorPort>(
        &self,
        port: &mut P,
        wheel: Wheel,
        speed: i16,
    ) -> Result<(), P::Error> {
        let polarity = match wheel {
            Wheel::Left => self.left,
            Wheel::Right => self.right,
        };
        let duty = speed.unsigned_abs().min(MAX_WHEEL_DUTY as u16) as u8;

        port.set_direction(wheel, polarity.level(speed))?;
        port.set_pwm(wheel, duty)
    }

    pub fn apply_pair<P: ActuatorPort>(
        &self,
        port: &mut P,
        speeds: WheelSpeedPair,
    ) -> Result<(), P::Error> {
        self.apply(port, Wheel::Left, speeds.left)?;
        self.apply(port, Wheel::Right, speeds.right)
    }

    pub fn stop<P: ActuatorPort>(
        &self,
        port: &mut P,
    ) -> Result<(), P::Error> {
        port.set_pwm(Wheel::Left, 0)?;
        port.set_pwm(Wheel::Right, 0)
    }
}
