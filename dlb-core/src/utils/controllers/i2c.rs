//! PCA9685-backed actuator port.
//!
//! Drives both H-bridge channels (phase + enable) and both servos from one
//! PCA9685 on a shared I2C bus. The chip runs at the 50 Hz servo frame rate;
//! H-bridge enables are plain duty on the same timer; phase pins and
//! the 0 and 255 duty ends are held steady with the full-on/full-off bits.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use super::port::{ActuatorPort, Level, ServoId, Wheel};
use crate::utils::controllers::lift::MAX_ANGLE;

/// Default I2C address of the PWM expander.
pub const PWM_ADDRESS: u8 = 0x40;
/// Prescale for a 50 Hz frame with the 25 MHz internal oscillator.
pub const SERVO_PRESCALE: u8 = 121;
/// Counter top of the 12-bit PWM.
pub const MAX_TICKS: u16 = 4095;
/// 0.5 ms and 2.5 ms pulses out of a 20 ms frame.
pub const SERVO_MIN_TICKS: u16 = 102;
pub const SERVO_MAX_TICKS: u16 = 512;

/// Errors that can occur when talking to the PWM expander.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
}

/// Actuator port over a PCA9685.
pub struct Pca9685Port<'a, I2C: 'static> {
    pwm: Pca9685<RefCellDevice<'a, I2C>>,
    /// (phase, enable) per wheel, left then right
    motor_channels: [(Channel, Channel); 2],
    /// lift, gripper
    servo_channels: [Channel; 2],
}

impl<'a, I2C, E> Pca9685Port<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Attach to the expander at `address` with the default channel map.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
    ) -> Result<Self, DeviceError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(i2c_bus), PwmAddress::from(address))
            .map_err(DeviceError::PwmError)?;
        Ok(Pca9685Port {
            pwm,
            motor_channels: [(Channel::C0, Channel::C1), (Channel::C2, Channel::C3)],
            servo_channels: [Channel::C4, Channel::C5],
        })
    }

    /// Enable the oscillator and set the 50 Hz servo frame.
    pub fn configure(&mut self) -> Result<(), DeviceError<E>> {
        self.pwm.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        self.pwm
            .set_prescale(SERVO_PRESCALE)
            .map_err(DeviceError::PwmError)?;
        tracing::info!("PWM prescale set to 50Hz");
        Ok(())
    }

    fn motor(
        &self,
        wheel: Wheel,
    ) -> (Channel, Channel) {
        match wheel {
            Wheel::Left => self.motor_channels[0],
            Wheel::Right => self.motor_channels[1],
        }
    }

    fn write(
        &mut self,
        channel: Channel,
        off: u16,
    ) -> Result<(), DeviceError<E>> {
        self.pwm
            .set_channel_on_off(channel, 0, off)
            .map_err(DeviceError::PwmError)
    }

    /// Steady output with no PWM edges.
    ///
    /// Full-off overrides full-on, so going high also clears the OFF
    /// register after setting the full-on bit.
    fn hold(
        &mut self,
        channel: Channel,
        level: Level,
    ) -> Result<(), DeviceError<E>> {
        match level {
            Level::High => {
                self.pwm
                    .set_channel_full_on(channel, 0)
                    .map_err(DeviceError::PwmError)?;
                self.pwm
                    .set_channel_off(channel, 0)
                    .map_err(DeviceError::PwmError)
            }
            Level::Low => self
                .pwm
                .set_channel_full_off(channel)
                .map_err(DeviceError::PwmError),
        }
    }
}

/// 8-bit duty to 12-bit off count.
pub fn duty_ticks(duty: u8) -> u16 {
    (u32::from(duty) * u32::from(MAX_TICKS) / 255) as u16
}

/// Servo angle to pulse width in ticks of a 50 Hz frame.
pub fn servo_ticks(angle: u8) -> u16 {
    let angle = u32::from(angle.min(MAX_ANGLE));
    let span = u32::from(SERVO_MAX_TICKS - SERVO_MIN_TICKS);
    SERVO_MIN_TICKS + (angle * span / u32::from(MAX_ANGLE)) as u16
}

impl<'a, I2C, E> ActuatorPort for Pca9685Port<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = DeviceError<E>;

    fn set_pwm(
        &mut self,
        wheel: Wheel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        let (_, enable) = self.motor(wheel);
        match duty {
            0 => self.hold(enable, Level::Low),
            u8::MAX => self.hold(enable, Level::High),
            _ => self.write(enable, duty_ticks(duty)),
        }
    }

    fn set_direction(
        &mut self,
        wheel: Wheel,
        level: Level,
    ) -> Result<(), Self::Error> {
        let (phase, _) = self.motor(wheel);
        self.hold(phase, level)
    }

    fn set_servo_angle(
        &mut self,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), Self::Error> {
        let channel = match servo {
            ServoId::Lift => self.servo_channels[0],
            ServoId::Gripper => self.servo_channels[1],
        };
        self.write(channel, servo_ticks(angle))
    }
}
