//! Gripper open/close on its own servo channel.

use super::port::{ActuatorPort, ServoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperState {
    Open,
    Closed,
}

/// Two-position gripper servo. Open-loop: the state is what was last written.
#[derive(Debug, Clone)]
pub struct GripperActuator {
    open_angle: u8,
    closed_angle: u8,
    state: GripperState,
}

impl GripperActuator {
    pub fn new(
        open_angle: u8,
        closed_angle: u8,
    ) -> Self {
        Self {
            open_angle,
            closed_angle,
            state: GripperState::Open,
        }
    }

    pub fn state(&self) -> GripperState {
        self.state
    }

    pub fn angle(
        &self,
        state: GripperState,
    ) -> u8 {
        match state {
            GripperState::Open => self.open_angle,
            GripperState::Closed => self.closed_angle,
        }
    }

    pub fn open<P: ActuatorPort>(
        &mut self,
        port: &mut P,
    ) -> Result<(), P::Error> {
        self.set(port, GripperState::Open)
    }

    pub fn close<P: ActuatorPort>(
        &mut self,
        port: &mut P,
    ) -> Result<(), P::Error> {
        self.set(port, GripperState::Closed)
    }

    pub fn set<P: ActuatorPort>(
        &mut self,
        port: &mut P,
        state: GripperState,
    ) -> Result<(), P::Error> {
        port.set_servo_angle(ServoId::Gripper, self.angle(state))?;
        self.state = state;
        Ok(())
    }
}
