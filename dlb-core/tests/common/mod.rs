#![allow(dead_code)]

use std::convert::Infallible;

use dlb_core::utils::controllers::{ActuatorPort, Level, ServoId, Wheel};

/// One primitive actuator write, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Pwm(Wheel, u8),
    Direction(Wheel, Level),
    Servo(ServoId, u8),
}

/// Port that records every write instead of touching hardware.
#[derive(Debug, Default)]
pub struct RecordingPort {
    pub writes: Vec<Write>,
}

impl RecordingPort {
    /// Angles written to one servo, in order.
    pub fn servo_angles(
        &self,
        servo: ServoId,
    ) -> Vec<u8> {
        self.writes
            .iter()
            .filter_map(|w| match *w {
                Write::Servo(s, a) if s == servo => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl ActuatorPort for RecordingPort {
    type Error = Infallible;

    fn set_pwm(
        &mut self,
        wheel: Wheel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        self.writes.push(Write::Pwm(wheel, duty));
        Ok(())
    }

    fn set_direction(
        &mut self,
        wheel: Wheel,
        level: Level,
    ) -> Result<(), Self::Error> {
        self.writes.push(Write::Direction(wheel, level));
        Ok(())
    }

    fn set_servo_angle(
        &mut self,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), Self::Error> {
        self.writes.push(Write::Servo(servo, angle));
        Ok(())
    }
}

/// Port whose servo writes start failing after `budget` successful ones.
#[derive(Debug, Default)]
pub struct FlakyPort {
    pub budget: usize,
    pub inner: RecordingPort,
}

#[derive(Debug, PartialEq, Eq)]
pub struct BusFault;

impl ActuatorPort for FlakyPort {
    type Error = BusFault;

    fn set_pwm(
        &mut self,
        wheel: Wheel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        self.inner.set_pwm(wheel, duty).map_err(|e| match e {})
    }

    fn set_direction(
        &mut self,
        wheel: Wheel,
        level: Level,
    ) -> Result<(), Self::Error> {
        self.inner.set_direction(wheel, level).map_err(|e| match e {})
    }

    fn set_servo_angle(
        &mut self,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), Self::Error> {
        if self.budget == 0 {
            return Err(BusFault);
        }
        self.budget -= 1;
        self.inner.set_servo_angle(servo, angle).map_err(|e| match e {})
    }
}
