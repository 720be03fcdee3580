//! Master-side frame builders.
//!
//! These produce exactly the layouts [`super::decoder`] accepts, with the
//! SMBus command byte (`0x00`) in front.

use super::{
    decoder::{MAX_PERCENT, MAX_RAW_DUTY},
    layout, Command, DriveCommand, ManipulatorCommand, RawCommand,
};

/// SMBus command byte the master writes ahead of each frame.
pub const REGISTER: u8 = 0x00;

/// Mode-ASCII frame, e.g. `[0x00, 'P','1','2','0', 'N','0','8','0']`.
///
/// A zero speed is sent as `S000`.
pub fn drive_wheels(
    left: i16,
    right: i16,
) -> RawCommand {
    let mut frame = [REGISTER; layout::MODE_ASCII_LEN];
    write_channel(&mut frame[layout::LEFT_MODE..layout::RIGHT_MODE], left);
    write_channel(&mut frame[layout::RIGHT_MODE..], right);
    RawCommand::from_frame(frame)
}

/// Velocity frame with forward and rotational percentages as signed bytes.
pub fn drive_velocity(
    forward_pct: i8,
    rotational_pct: i8,
) -> RawCommand {
    let forward = forward_pct.clamp(-MAX_PERCENT, MAX_PERCENT);
    let rotational = rotational_pct.clamp(-MAX_PERCENT, MAX_PERCENT);
    RawCommand::from_frame([REGISTER, forward as u8, rotational as u8])
}

/// Manipulator frame with the operation tag at byte 9.
pub fn manipulator(command: ManipulatorCommand) -> RawCommand {
    match command {
        ManipulatorCommand::Open { level } => {
            let mut frame = [REGISTER; layout::MANIPULATOR_OPEN_LEN];
            frame[layout::OPERATION] = b'O';
            frame[layout::LEVEL] = level.digit();
            RawCommand::from_frame(frame)
        }
        ManipulatorCommand::Close => {
            let mut frame = [REGISTER; layout::MANIPULATOR_LEN];
            frame[layout::OPERATION] = b'C';
            RawCommand::from_frame(frame)
        }
    }
}

/// Encode any typed command in the layout its variant implies.
pub fn encode(command: &Command) -> RawCommand {
    match *command {
        Command::Drive(DriveCommand::Wheels {
            left_raw,
            right_raw,
        }) => drive_wheels(left_raw, right_raw),
        Command::Drive(DriveCommand::Velocity {
            forward_pct,
            rotational_pct,
        }) => drive_velocity(forward_pct, rotational_pct),
        Command::Manipulator(m) => manipulator(m),
    }
}

/// Writes `mode d d d` into a four-byte slot.
fn write_channel(
    slot: &mut [u8],
    speed: i16,
) {
    let magnitude = speed.unsigned_abs().min(MAX_RAW_DUTY as u16);
    slot[0] = match speed {
        0 => b'S',
        s if s > 0 => b'P',
        _ => b'N',
    };
    slot[1] = b'0' + (magnitude / 100) as u8;
    slot[2] = b'0' + (magnitude / 10 % 10) as u8;
    slot[3] = b'0' + (magnitude % 10) as u8;
}
