//! Kinematics for the two-wheeled differential-drive base.
//!
//! `DriveKinematics` mixes a forward and a rotational velocity (both in
//! percent) into signed per-wheel PWM values.
//!
//! # Example
//! ```rust
//! use dlb_core::utils::math::kinematics::DriveKinematics;
//! let kin = DriveKinematics::new(0.15, 0.04, 10.2);
//! let speeds = kin.compute(100, 0);
//! assert_eq!(speeds.left, speeds.right);
//! ```
//!

/// Largest PWM magnitude either wheel can be driven with.
pub const MAX_WHEEL_DUTY: i16 = 255;

/// Signed duty per wheel. Sign is direction, magnitude is PWM duty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelSpeedPair {
    pub left: i16,
    pub right: i16,
}

impl WheelSpeedPair {
    pub fn stop() -> Self {
        Self::default()
    }
}

/// Geometry of the differential-drive base.
#[derive(Debug, Clone, Copy)]
pub struct DriveKinematics {
    /// Distance between the wheel contact points (m)
    wheel_base: f32,
    /// Radius of each wheel (m)
    wheel_radius: f32,
    /// PWM counts per wheel rad/s
    scaling_factor: f32,
}

impl DriveKinematics {
    pub fn new(
        wheel_base: f32,
        wheel_radius: f32,
        scaling_factor: f32,
    ) -> Self {
        Self {
            wheel_base,
            wheel_radius,
            scaling_factor,
        }
    }

    /// Mix `forward_pct` and `rotational_pct` into wheel speeds.
    pub fn compute(
        &self,
        forward_pct: i8,
        rotational_pct: i8,
    ) -> WheelSpeedPair {
        compute(
            forward_pct,
            rotational_pct,
            self.wheel_base,
            self.wheel_radius,
            self.scaling_factor,
        )
    }
}

/// Differential-drive mixing over explicit geometry.
///
/// Percent is a fraction of 1 m/s forward or 1 rad/s rotation. Each wheel is
/// rounded and clamped to ±[`MAX_WHEEL_DUTY`] on its own, so a combined
/// max-forward/max-turn request may saturate one wheel before the other.
pub fn compute(
    forward_pct: i8,
    rotational_pct: i8,
    wheel_base: f32,
    wheel_radius: f32,
    scaling_factor: f32,
) -> WheelSpeedPair {
    let scale = scaling_factor / (100.0 * wheel_radius);
    let forward = f32::from(forward_pct) * scale;
    let correction = f32::from(rotational_pct) * scale * wheel_base / 2.0;

    WheelSpeedPair {
        left: clamp_duty(forward + correction),
        right: clamp_duty(forward - correction),
    }
}

fn clamp_duty(speed: f32) -> i16 {
    let rounded = libm::roundf(speed);
    let max = f32::from(MAX_WHEEL_DUTY);
    if libm::fabsf(rounded) > max {
        tracing::warn!(speed, "wheel speed out of range, clamping to ±{}", MAX_WHEEL_DUTY);
    }
    rounded.clamp(-max, max) as i16
}
