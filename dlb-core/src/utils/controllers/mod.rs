//! Module Exports
//!
//! This file exports the actuation side of a slave and the controller that
//! ties it to the command protocol.
//!
//! - `port`: actuator primitives (`ActuatorPort`)
//! - `i2c`: PCA9685 hardware backend for `ActuatorPort`
//! - `mailbox`: receive-interrupt to control-loop handoff
//! - `motor`, `lift`, `gripper`, `sequencer`: motion conversion per role

pub mod gripper;
/// Module for driving actuators through a PCA9685 on the I2C bus.
pub mod i2c;
pub mod lift;
pub mod mailbox;
pub mod motor;
pub mod port;
pub mod sequencer;

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};

use crate::utils::{
    config::SlaveConfig,
    math::kinematics::{DriveKinematics, WheelSpeedPair},
    protocol::{
        decoder, DecodeError, DriveCommand, DriveProtocol, ManipulatorCommand, ProtocolVariant,
        RawCommand,
    },
};

pub use gripper::{GripperActuator, GripperState};
pub use lift::{LiftLevel, LiftStateMachine};
pub use mailbox::{CommandMailbox, COMMAND_MAILBOX};
pub use motor::{MotorActuator, Polarity};
pub use port::{ActuatorPort, Level, ServoId, Wheel};
pub use sequencer::{ManipulatorSequencer, SequenceError, SequenceStatus};

/// Anything that can go wrong while handling one command.
#[derive(Debug)]
pub enum ControlError<E: fmt::Debug> {
    Decode(DecodeError),
    Sequence(SequenceError),
    Port(E),
}

impl<E: fmt::Debug> fmt::Display for ControlError<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ControlError::Decode(e) => write!(f, "{e}"),
            ControlError::Sequence(e) => write!(f, "{e}"),
            ControlError::Port(e) => write!(f, "actuator error: {e:?}"),
        }
    }
}

/// What a slave actuates, chosen by its protocol variant.
pub enum Role {
    Drive {
        protocol: DriveProtocol,
        kinematics: DriveKinematics,
        motors: MotorActuator,
    },
    Manipulator(ManipulatorSequencer),
}

impl Role {
    pub fn from_config(config: &SlaveConfig) -> Self {
        match config.protocol {
            ProtocolVariant::Drive(protocol) => Role::Drive {
                protocol,
                kinematics: DriveKinematics::new(
                    config.drive.wheel_base,
                    config.drive.wheel_radius,
                    config.drive.scaling_factor,
                ),
                motors: MotorActuator::new(
                    config.drive.left_polarity,
                    config.drive.right_polarity,
                ),
            },
            ProtocolVariant::Manipulator => {
                let m = &config.manipulator;
                Role::Manipulator(ManipulatorSequencer::new(
                    LiftStateMachine::new(m.initial_lift_angle, config.sweep_step_ticks()),
                    GripperActuator::new(m.gripper_open_angle, m.gripper_closed_angle),
                    config.settle_ticks(),
                ))
            }
        }
    }
}

/// Owns the actuator port and all actuator state of one slave.
///
/// The control loop is the only caller; nothing here is reachable from the
/// receive interrupt.
pub struct SystemController<P: ActuatorPort> {
    port: P,
    role: Role,
    poll_interval: Duration,
}

impl<P: ActuatorPort> SystemController<P> {
    /// Build the role state and drive the outputs to their startup state.
    pub fn new(
        port: P,
        config: &SlaveConfig,
    ) -> Self {
        let mut ctrl = SystemController {
            port,
            role: Role::from_config(config),
            poll_interval: config.poll_interval(),
        };

        let startup = match &mut ctrl.role {
            Role::Drive { motors, .. } => motors.stop(&mut ctrl.port),
            Role::Manipulator(seq) => seq.home(&mut ctrl.port),
        };
        match startup {
            Ok(()) => tracing::info!(address = config.address, "slave ready"),
            Err(e) => tracing::warn!("startup actuator write failed: {:?}", e),
        }
        ctrl
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Tracked lift angle, for the manipulator role.
    pub fn lift_position(&self) -> Option<u8> {
        match &self.role {
            Role::Manipulator(seq) => Some(seq.lift().last_pos()),
            Role::Drive { .. } => None,
        }
    }

    pub fn gripper_state(&self) -> Option<GripperState> {
        match &self.role {
            Role::Manipulator(seq) => Some(seq.gripper().state()),
            Role::Drive { .. } => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        match &self.role {
            Role::Manipulator(seq) => seq.is_busy(),
            Role::Drive { .. } => false,
        }
    }

    /// Decode one frame and act on it.
    ///
    /// Drive commands are applied immediately. Manipulator commands start a
    /// plan that [`Self::tick`] carries out.
    pub fn handle(
        &mut self,
        raw: &RawCommand,
    ) -> Result<(), ControlError<P::Error>> {
        tracing::info!("Received command: {}", raw);

        match &mut self.role {
            Role::Drive {
                protocol,
                kinematics,
                motors,
            } => {
                let command =
                    decoder::decode_drive(*protocol, raw.as_bytes()).map_err(ControlError::Decode)?;
                tracing::debug!(?command, "decoded drive command");
                let speeds = match command {
                    DriveCommand::Velocity {
                        forward_pct,
                        rotational_pct,
                    } => kinematics.compute(forward_pct, rotational_pct),
                    DriveCommand::Wheels {
                        left_raw,
                        right_raw,
                    } => WheelSpeedPair {
                        left: left_raw,
                        right: right_raw,
                    },
                };
                tracing::debug!(?speeds, "wheel speeds");
                motors
                    .apply_pair(&mut self.port, speeds)
                    .map_err(ControlError::Port)
            }
            Role::Manipulator(seq) => {
                let command =
                    decoder::decode_manipulator(raw.as_bytes()).map_err(ControlError::Decode)?;
                tracing::debug!(?command, "decoded manipulator command");
                let started = match command {
                    ManipulatorCommand::Open { level } => seq.pick(level),
                    ManipulatorCommand::Close => seq.place(),
                };
                started.map_err(ControlError::Sequence)
            }
        }
    }

    /// Advance any running manipulator plan by one control tick.
    pub fn tick(&mut self) -> Result<SequenceStatus, ControlError<P::Error>> {
        match &mut self.role {
            Role::Manipulator(seq) => seq.tick(&mut self.port).map_err(ControlError::Port),
            Role::Drive { .. } => Ok(SequenceStatus::Idle),
        }
    }

    /// One control-loop iteration.
    ///
    /// While a plan runs the mailbox is left alone, so at most one frame (the
    /// latest) waits for it to finish.
    pub fn poll<M: RawMutex>(
        &mut self,
        mailbox: &CommandMailbox<M>,
    ) -> Result<(), ControlError<P::Error>> {
        if !self.is_busy() {
            if let Some(raw) = mailbox.take() {
                self.handle(&raw)?;
            }
        }
        self.tick().map(|_| ())
    }

    /// Poll `mailbox` forever at the configured interval.
    pub async fn run<M: RawMutex>(
        &mut self,
        mailbox: &CommandMailbox<M>,
    ) -> ! {
        let mut ticker = Ticker::every(self.poll_interval);
        loop {
            match self.poll(mailbox) {
                Ok(()) => {}
                Err(ControlError::Port(e)) => tracing::error!("actuator write failed: {:?}", e),
                Err(e) => tracing::warn!("command dropped: {}", e),
            }
            ticker.next().await;
        }
    }
}
