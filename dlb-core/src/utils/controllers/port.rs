//! Actuator primitives the controllers write through.
//!
//! The core never touches pins directly; a backend such as the PCA9685 port
//! or a host-side logger implements [`ActuatorPort`].

/// Motor channel of the differential-drive base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

/// Servo outputs of the manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoId {
    Lift,
    Gripper,
}

/// Logic level for an H-bridge phase pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

/// Raw actuator primitives the core drives but does not own.
///
/// Implemented by hardware backends (e.g. [`super::i2c::Pca9685Port`]) and by
/// logging or recording ports on the host.
pub trait ActuatorPort {
    type Error: core::fmt::Debug;

    /// PWM duty on a motor enable output, 0..=255.
    fn set_pwm(
        &mut self,
        wheel: Wheel,
        duty: u8,
    ) -> Result<(), Self::Error>;

    /// Phase (direction) output of a motor.
    fn set_direction(
        &mut self,
        wheel: Wheel,
        level: Level,
    ) -> Result<(), Self::Error>;

    /// Servo position in degrees, 0..=180.
    fn set_servo_angle(
        &mut self,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), Self::Error>;
}

impl<P: ActuatorPort + ?Sized> ActuatorPort for &mut P {
    type Error = P::Error;

    fn set_pwm(
        &mut self,
        wheel: Wheel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        (**self).set_pwm(wheel, duty)
    }

    fn set_direction(
        &mut self,
        wheel: Wheel,
        level: Level,
    ) -> Result<(), Self::Error> {
        (**self).set_direction(wheel, level)
    }

    fn set_servo_angle(
        &mut self,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), Self::Error> {
        (**self).set_servo_angle(servo, angle)
    }
}
