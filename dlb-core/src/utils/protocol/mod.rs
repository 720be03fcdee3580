//! I2C command protocol shared by the drive and manipulator slaves.
//!
//! Every frame the master writes lands in a [`RawCommand`]. Which layout the
//! bytes follow is fixed per slave by [`ProtocolVariant`]:
//!
//! - `decoder`: bytes to typed [`Command`] values
//! - `encoder`: typed values back to bytes, as the master builds them

pub mod decoder;
pub mod encoder;

use core::fmt;

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::utils::controllers::lift::LiftLevel;

pub use decoder::decode;

/// Largest frame the receive path keeps. Observed frames are 2 to 12 bytes.
pub const RAW_COMMAND_CAPACITY: usize = 16;

/// Byte offsets of every field, per layout.
///
/// Offset 0 is the SMBus command byte prepended by `write_i2c_block_data`
/// and is never interpreted.
pub mod layout {
    use core::ops::Range;

    pub const TAG: usize = 0;

    // Mode-ASCII drive frame: `[tag, m1, d, d, d, m2, d, d, d]`
    pub const LEFT_MODE: usize = 1;
    pub const LEFT_DIGITS: Range<usize> = 2..5;
    pub const RIGHT_MODE: usize = 5;
    pub const RIGHT_DIGITS: Range<usize> = 6..9;
    pub const MODE_ASCII_LEN: usize = 9;

    // Velocity drive frame: `[tag, forward as i8, rotational as i8]`
    pub const FORWARD: usize = 1;
    pub const ROTATIONAL: usize = 2;
    pub const VELOCITY_LEN: usize = 3;

    // Manipulator frame: operation tag at 9, level digit at 10
    pub const OPERATION: usize = 9;
    pub const LEVEL: usize = 10;
    pub const MANIPULATOR_LEN: usize = 10;
    pub const MANIPULATOR_OPEN_LEN: usize = 11;
}

/// Wire layout accepted by the drive slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveProtocol {
    /// Per wheel a mode char (`P`, `N`, `S`) and three ASCII digits of raw duty.
    ModeAscii,
    /// Two signed bytes: forward and rotational velocity in percent.
    Velocity,
}

/// Protocol a slave speaks, selected once through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    Drive(DriveProtocol),
    Manipulator,
}

/// Bytes of one received frame, copied out of the receive buffer.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawCommand(Vec<u8, RAW_COMMAND_CAPACITY>);

impl RawCommand {
    /// Copy a received frame. Frames beyond [`RAW_COMMAND_CAPACITY`] are malformed.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        Vec::from_slice(bytes)
            .map(Self)
            .map_err(|()| DecodeError::MalformedCommand {
                offset: RAW_COMMAND_CAPACITY,
                cause: Malformed::TooLong {
                    max: RAW_COMMAND_CAPACITY,
                },
            })
    }

    /// Build a frame from a fixed-size array known to fit.
    pub(crate) fn from_frame<const N: usize>(frame: [u8; N]) -> Self {
        const { assert!(N <= RAW_COMMAND_CAPACITY) };
        Self(frame.into_iter().collect())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Echoes the frame as characters, the way the serial console printed it.
impl fmt::Display for RawCommand {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for &b in self.0.iter() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for RawCommand {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "RawCommand({:02X?})", self.as_bytes())
    }
}

/// Typed command produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Drive(DriveCommand),
    Manipulator(ManipulatorCommand),
}

/// Motion request for the differential-drive base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveCommand {
    /// Body velocity in percent, each clamped to [-100, 100].
    Velocity { forward_pct: i8, rotational_pct: i8 },
    /// Signed raw duty per wheel, each clamped to [-255, 255].
    Wheels { left_raw: i16, right_raw: i16 },
}

/// Request for the lift/gripper slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManipulatorCommand {
    /// Move the lift to `level` and close the gripper on the item.
    Open { level: LiftLevel },
    /// Lower to the first level and open the gripper.
    Close,
}

/// Why a frame could not be turned into a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Wrong length or a non-numeric numeric field. The frame is dropped.
    MalformedCommand { offset: usize, cause: Malformed },
    /// Unrecognised operation tag, mode char or level. The frame is dropped.
    UnsupportedOperation { offset: usize, byte: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    TooShort { min: usize },
    TooLong { max: usize },
    NotADigit(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match *self {
            DecodeError::MalformedCommand { offset, cause } => match cause {
                Malformed::TooShort { min } => {
                    write!(f, "malformed command: {offset} bytes, need {min}")
                }
                Malformed::TooLong { max } => {
                    write!(f, "malformed command: longer than {max} bytes")
                }
                Malformed::NotADigit(b) => {
                    write!(f, "malformed command: byte 0x{b:02X} at {offset} is not a digit")
                }
            },
            DecodeError::UnsupportedOperation { offset, byte } => {
                write!(f, "unsupported operation 0x{byte:02X} at {offset}")
            }
        }
    }
}
