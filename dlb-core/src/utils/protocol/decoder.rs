//! Frame decoding for both slave roles.
//!
//! Decoding is pure: it inspects the bytes and returns a [`Command`] or a
//! [`DecodeError`], and never touches actuator state.

use core::ops::Range;

use super::{
    layout, Command, DecodeError, DriveCommand, DriveProtocol, Malformed, ManipulatorCommand,
    ProtocolVariant, RawCommand,
};
use crate::utils::controllers::lift::LiftLevel;

/// Largest duty a mode-ASCII wheel field may request.
pub const MAX_RAW_DUTY: i16 = 255;
/// Largest velocity percentage in either direction.
pub const MAX_PERCENT: i8 = 100;

/// Decode `raw` according to the slave's protocol variant.
pub fn decode(
    variant: ProtocolVariant,
    raw: &RawCommand,
) -> Result<Command, DecodeError> {
    match variant {
        ProtocolVariant::Drive(layout) => decode_drive(layout, raw.as_bytes()).map(Command::Drive),
        ProtocolVariant::Manipulator => {
            decode_manipulator(raw.as_bytes()).map(Command::Manipulator)
        }
    }
}

/// Decode a drive frame in the given layout.
pub fn decode_drive(
    protocol: DriveProtocol,
    bytes: &[u8],
) -> Result<DriveCommand, DecodeError> {
    match protocol {
        DriveProtocol::ModeAscii => {
            require_len(bytes, layout::MODE_ASCII_LEN)?;
            let left_raw = wheel_channel(bytes, layout::LEFT_MODE, layout::LEFT_DIGITS)?;
            let right_raw = wheel_channel(bytes, layout::RIGHT_MODE, layout::RIGHT_DIGITS)?;
            Ok(DriveCommand::Wheels {
                left_raw,
                right_raw,
            })
        }
        DriveProtocol::Velocity => {
            require_len(bytes, layout::VELOCITY_LEN)?;
            Ok(DriveCommand::Velocity {
                forward_pct: percent(bytes[layout::FORWARD]),
                rotational_pct: percent(bytes[layout::ROTATIONAL]),
            })
        }
    }
}

/// Decode a manipulator frame.
///
/// `C` ignores anything after the tag; `O` needs a level digit `1`..=`3`.
pub fn decode_manipulator(bytes: &[u8]) -> Result<ManipulatorCommand, DecodeError> {
    require_len(bytes, layout::MANIPULATOR_LEN)?;
    match bytes[layout::OPERATION] {
        b'C' => Ok(ManipulatorCommand::Close),
        b'O' => {
            require_len(bytes, layout::MANIPULATOR_OPEN_LEN)?;
            let byte = bytes[layout::LEVEL];
            LiftLevel::from_digit(byte)
                .map(|level| ManipulatorCommand::Open { level })
                .ok_or(DecodeError::UnsupportedOperation {
                    offset: layout::LEVEL,
                    byte,
                })
        }
        byte => Err(DecodeError::UnsupportedOperation {
            offset: layout::OPERATION,
            byte,
        }),
    }
}

fn require_len(
    bytes: &[u8],
    min: usize,
) -> Result<(), DecodeError> {
    if bytes.len() < min {
        return Err(DecodeError::MalformedCommand {
            offset: bytes.len(),
            cause: Malformed::TooShort { min },
        });
    }
    Ok(())
}

/// Mode char first: `S` stops the wheel without looking at its digits.
fn wheel_channel(
    bytes: &[u8],
    mode_at: usize,
    digits: Range<usize>,
) -> Result<i16, DecodeError> {
    match bytes[mode_at] {
        b'S' => Ok(0),
        b'P' => magnitude(bytes, digits),
        b'N' => magnitude(bytes, digits).map(|m| -m),
        byte => Err(DecodeError::UnsupportedOperation {
            offset: mode_at,
            byte,
        }),
    }
}

fn magnitude(
    bytes: &[u8],
    digits: Range<usize>,
) -> Result<i16, DecodeError> {
    let start = digits.start;
    let value = bytes[digits]
        .iter()
        .enumerate()
        .try_fold(0i16, |acc, (i, &b)| {
            if b.is_ascii_digit() {
                Ok(acc * 10 + i16::from(b - b'0'))
            } else {
                Err(DecodeError::MalformedCommand {
                    offset: start + i,
                    cause: Malformed::NotADigit(b),
                })
            }
        })?;

    if value > MAX_RAW_DUTY {
        tracing::warn!(value, "wheel duty out of range, clamping to {}", MAX_RAW_DUTY);
    }
    Ok(value.min(MAX_RAW_DUTY))
}

fn percent(byte: u8) -> i8 {
    let value = byte as i8;
    let clamped = value.clamp(-MAX_PERCENT, MAX_PERCENT);
    if clamped != value {
        tracing::warn!(value, "velocity percentage out of range, clamping");
    }
    clamped
}
