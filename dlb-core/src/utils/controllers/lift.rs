//! Lift servo position tracking and incremental sweeps.
//!
//! The lift servo reports nothing back, so the last commanded angle is the
//! only knowledge of where it is. A sweep walks one degree per step toward its
//! target, with `step_ticks` control ticks between writes.

use serde::{Deserialize, Serialize};

use super::port::{ActuatorPort, ServoId};

/// Servo travel limit in degrees.
pub const MAX_ANGLE: u8 = 180;
/// Assumed lift angle at power-up.
pub const DEFAULT_LIFT_ANGLE: u8 = 45;

/// Named lift presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftLevel {
    Level1,
    Level2,
    Level3,
}

impl LiftLevel {
    pub fn angle(self) -> u8 {
        match self {
            LiftLevel::Level1 => 10,
            LiftLevel::Level2 => 90,
            LiftLevel::Level3 => 150,
        }
    }

    /// ASCII digit `'1'..='3'` as sent on the wire.
    pub fn from_digit(byte: u8) -> Option<Self> {
        match byte {
            b'1' => Some(LiftLevel::Level1),
            b'2' => Some(LiftLevel::Level2),
            b'3' => Some(LiftLevel::Level3),
            _ => None,
        }
    }

    pub fn digit(self) -> u8 {
        match self {
            LiftLevel::Level1 => b'1',
            LiftLevel::Level2 => b'2',
            LiftLevel::Level3 => b'3',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiftStatus {
    /// Writes or the post-write pause remain.
    Moving,
    /// `last_pos` equals the target.
    Arrived,
}

/// Owned lift state. Only the control loop may touch it.
#[derive(Debug, Clone)]
pub struct LiftStateMachine {
    last_pos: u8,
    target: u8,
    step_ticks: u32,
    wait: u32,
}

impl LiftStateMachine {
    pub fn new(
        initial: u8,
        step_ticks: u32,
    ) -> Self {
        let initial = initial.min(MAX_ANGLE);
        Self {
            last_pos: initial,
            target: initial,
            step_ticks: step_ticks.max(1),
            wait: 0,
        }
    }

    /// Last angle written to the servo.
    pub fn last_pos(&self) -> u8 {
        self.last_pos
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn is_moving(&self) -> bool {
        self.last_pos != self.target || self.wait > 0
    }

    /// Arm a sweep toward `target` and return the number of one-degree
    /// steps it will take. Zero means no motion.
    pub fn move_to(
        &mut self,
        target: u8,
    ) -> u8 {
        self.target = target.min(MAX_ANGLE);
        self.wait = 0;
        self.last_pos.abs_diff(self.target)
    }

    /// Advance the sweep by one control tick.
    pub fn step<P: ActuatorPort>(
        &mut self,
        port: &mut P,
    ) -> Result<LiftStatus, P::Error> {
        if self.wait > 0 {
            self.wait -= 1;
            return Ok(self.status());
        }
        if self.last_pos == self.target {
            return Ok(LiftStatus::Arrived);
        }

        let next = if self.target > self.last_pos {
            self.last_pos + 1
        } else {
            self.last_pos - 1
        };
        port.set_servo_angle(ServoId::Lift, next)?;
        self.last_pos = next;
        self.wait = self.step_ticks - 1;
        Ok(self.status())
    }

    fn status(&self) -> LiftStatus {
        if self.is_moving() {
            LiftStatus::Moving
        } else {
            LiftStatus::Arrived
        }
    }
}
