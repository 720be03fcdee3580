//! Timed pick/place plans for the lift and gripper.
//!
//! A plan is a short queue of [`Stage`]s. [`ManipulatorSequencer::tick`] is
//! called once per control tick and performs at most one timed action: a sweep
//! step or one tick of a settle pause. Gripper writes and empty sweeps take no
//! time and run back-to-back within the same tick.

use core::fmt;

use heapless::Deque;

use super::{
    gripper::{GripperActuator, GripperState},
    lift::{LiftLevel, LiftStateMachine, LiftStatus},
    port::ActuatorPort,
};

/// Longest plan the sequencer holds.
pub const PLAN_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Sweep the lift to an angle.
    Sweep(u8),
    /// Drive the gripper to a position.
    Gripper(GripperState),
    /// Wait for the mechanism to settle.
    Settle(Pause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After the lift reaches a level.
    Level,
    /// After a gripper write.
    Gripper,
}

/// Settle pauses expressed in control ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTicks {
    pub level: u32,
    pub gripper: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// A plan is still running; it cannot be cancelled or replaced.
    Busy,
    /// More stages than [`PLAN_CAPACITY`].
    PlanTooLong,
}

impl fmt::Display for SequenceError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            SequenceError::Busy => f.write_str("manipulator busy"),
            SequenceError::PlanTooLong => f.write_str("plan exceeds sequencer capacity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    Running,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Sweep,
    Settle(u32),
}

pub struct ManipulatorSequencer {
    lift: LiftStateMachine,
    gripper: GripperActuator,
    settle: SettleTicks,
    plan: Deque<Stage, PLAN_CAPACITY>,
    active: Option<Active>,
}

impl ManipulatorSequencer {
    pub fn new(
        lift: LiftStateMachine,
        gripper: GripperActuator,
        settle: SettleTicks,
    ) -> Self {
        Self {
            lift,
            gripper,
            settle,
            plan: Deque::new(),
            active: None,
        }
    }

    pub fn lift(&self) -> &LiftStateMachine {
        &self.lift
    }

    pub fn gripper(&self) -> &GripperActuator {
        &self.gripper
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.plan.is_empty()
    }

    /// Write the startup pose: lift held at its tracked angle, gripper open.
    pub fn home<P: ActuatorPort>(
        &mut self,
        port: &mut P,
    ) -> Result<(), P::Error> {
        port.set_servo_angle(super::port::ServoId::Lift, self.lift.last_pos())?;
        self.gripper.open(port)
    }

    /// Lift to `level`, then close the gripper on the item.
    pub fn lift_to_level(
        &mut self,
        level: LiftLevel,
    ) -> Result<(), SequenceError> {
        self.start(&Self::pick_stages(level))
    }

    pub fn pick(
        &mut self,
        level: LiftLevel,
    ) -> Result<(), SequenceError> {
        self.lift_to_level(level)
    }

    /// Lower to the first level (gripping), then open the gripper.
    pub fn release(&mut self) -> Result<(), SequenceError> {
        let [a, b, c, d] = Self::pick_stages(LiftLevel::Level1);
        self.start(&[
            a,
            b,
            c,
            d,
            Stage::Settle(Pause::Level),
            Stage::Gripper(GripperState::Open),
            Stage::Settle(Pause::Gripper),
        ])
    }

    pub fn place(&mut self) -> Result<(), SequenceError> {
        self.release()
    }

    fn pick_stages(level: LiftLevel) -> [Stage; 4] {
        [
            Stage::Sweep(level.angle()),
            Stage::Settle(Pause::Level),
            Stage::Gripper(GripperState::Closed),
            Stage::Settle(Pause::Gripper),
        ]
    }

    /// Queue a plan. Refused while another one is running.
    pub fn start(
        &mut self,
        stages: &[Stage],
    ) -> Result<(), SequenceError> {
        if self.is_busy() {
            return Err(SequenceError::Busy);
        }
        if stages.len() > self.plan.capacity() {
            return Err(SequenceError::PlanTooLong);
        }
        for &stage in stages {
            self.plan
                .push_back(stage)
                .map_err(|_| SequenceError::PlanTooLong)?;
        }
        Ok(())
    }

    /// Advance the running plan by one control tick.
    ///
    /// A port failure drops the rest of the plan; the lift keeps the last
    /// angle that was actually written.
    pub fn tick<P: ActuatorPort>(
        &mut self,
        port: &mut P,
    ) -> Result<SequenceStatus, P::Error> {
        match self.advance(port) {
            Ok(()) => Ok(self.status()),
            Err(e) => {
                tracing::warn!("manipulator plan aborted after actuator failure");
                self.plan.clear();
                self.active = None;
                Err(e)
            }
        }
    }

    fn advance<P: ActuatorPort>(
        &mut self,
        port: &mut P,
    ) -> Result<(), P::Error> {
        loop {
            match self.active {
                Some(Active::Sweep) => {
                    if self.lift.step(port)? == LiftStatus::Arrived {
                        self.active = None;
                    }
                    return Ok(());
                }
                Some(Active::Settle(remaining)) => {
                    self.active = (remaining > 1).then_some(Active::Settle(remaining - 1));
                    return Ok(());
                }
                None => {}
            }

            let Some(stage) = self.plan.pop_front() else {
                return Ok(());
            };
            tracing::debug!(?stage, "entering stage");
            match stage {
                Stage::Sweep(target) => {
                    if self.lift.move_to(target) > 0 {
                        self.active = Some(Active::Sweep);
                    }
                }
                Stage::Gripper(state) => self.gripper.set(port, state)?,
                Stage::Settle(pause) => {
                    let ticks = match pause {
                        Pause::Level => self.settle.level,
                        Pause::Gripper => self.settle.gripper,
                    };
                    if ticks > 0 {
                        self.active = Some(Active::Settle(ticks));
                    }
                }
            }
        }
    }

    fn status(&self) -> SequenceStatus {
        if self.is_busy() {
            SequenceStatus::Running
        } else {
            SequenceStatus::Idle
        }
    }
}
