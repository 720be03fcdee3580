mod common;

use common::{BusFault, FlakyPort, RecordingPort, Write};
use dlb_core::utils::{
    config::SlaveConfig,
    controllers::{
        ActuatorPort, CommandMailbox, ControlError, GripperState, Level, LiftLevel,
        LiftStateMachine, Polarity, SequenceError, ServoId, SystemController, Wheel,
    },
    protocol::{encoder, DecodeError, DriveProtocol, ManipulatorCommand},
};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;

const MAX_POLLS: usize = 100_000;

/// Poll until the controller is idle and nothing is waiting; returns the
/// number of polls taken.
fn run_until_idle<P: ActuatorPort>(
    ctrl: &mut SystemController<P>,
    mailbox: &CommandMailbox<NoopRawMutex>,
) -> usize {
    let mut polls = 0;
    loop {
        ctrl.poll(mailbox).unwrap();
        polls += 1;
        if !ctrl.is_busy() && !mailbox.is_pending() {
            return polls;
        }
        assert!(polls < MAX_POLLS, "controller never went idle");
    }
}

fn open(level: LiftLevel) -> ManipulatorCommand {
    ManipulatorCommand::Open { level }
}

/// Fast timing so plans finish in a handful of ticks.
fn quick_manipulator() -> SlaveConfig {
    let mut cfg = SlaveConfig::manipulator();
    cfg.poll_interval_ms = 20;
    cfg.manipulator.sweep_step_ms = 20;
    cfg.manipulator.level_settle_ms = 40;
    cfg.manipulator.gripper_settle_ms = 20;
    cfg
}

#[test]
fn open_level_three_sweeps_then_closes() {
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    let mut ctrl = SystemController::new(RecordingPort::default(), &SlaveConfig::manipulator());

    let frame = encoder::manipulator(open(LiftLevel::Level3));
    assert!(mailbox.on_receive(frame.as_bytes()));
    run_until_idle(&mut ctrl, &mailbox);

    assert_eq!(ctrl.lift_position(), Some(150));
    assert_eq!(ctrl.gripper_state(), Some(GripperState::Closed));

    let writes = &ctrl.port().writes;
    // Startup pose first.
    assert_eq!(writes[0], Write::Servo(ServoId::Lift, 45));
    assert_eq!(writes[1], Write::Servo(ServoId::Gripper, 170));

    let lift: Vec<u8> = ctrl.port().servo_angles(ServoId::Lift)[1..].to_vec();
    assert_eq!(lift, (46..=150).collect::<Vec<u8>>());

    let last_lift = writes
        .iter()
        .rposition(|w| matches!(w, Write::Servo(ServoId::Lift, _)))
        .unwrap();
    let close = writes
        .iter()
        .position(|w| *w == Write::Servo(ServoId::Gripper, 0))
        .unwrap();
    assert!(last_lift < close);
    assert_eq!(close, writes.len() - 1);
}

#[test]
fn default_timing_of_a_pick() {
    // 105 steps at 2 ticks each, 100 ticks level settle, 100 ticks gripper settle
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    let mut ctrl = SystemController::new(RecordingPort::default(), &SlaveConfig::manipulator());
    mailbox.on_receive(encoder::manipulator(open(LiftLevel::Level3)).as_bytes());
    assert_eq!(run_until_idle(&mut ctrl, &mailbox), 410);
}

#[test]
fn close_lowers_grips_then_opens() {
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    let mut ctrl = SystemController::new(RecordingPort::default(), &quick_manipulator());

    mailbox.on_receive(encoder::manipulator(open(LiftLevel::Level2)).as_bytes());
    run_until_idle(&mut ctrl, &mailbox);
    let before = ctrl.port().writes.len();

    mailbox.on_receive(encoder::manipulator(ManipulatorCommand::Close).as_bytes());
    run_until_idle(&mut ctrl, &mailbox);

    let release = &ctrl.port().writes[before..];
    let lift: Vec<u8> = release
        .iter()
        .filter_map(|w| match *w {
            Write::Servo(ServoId::Lift, a) => Some(a),
            _ => None,
        })
        .collect();
    assert_eq!(lift, (10..=89).rev().collect::<Vec<u8>>());
    assert_eq!(
        &release[release.len() - 2..],
        &[
            Write::Servo(ServoId::Gripper, 0),
            Write::Servo(ServoId::Gripper, 170)
        ]
    );
    assert_eq!(ctrl.lift_position(), Some(10));
    assert_eq!(ctrl.gripper_state(), Some(GripperState::Open));
}

#[test]
fn full_travel_visits_every_angle_once() {
    let mut port = RecordingPort::default();
    let mut lift = LiftStateMachine::new(180, 1);

    assert_eq!(lift.move_to(0), 180);
    while lift.is_moving() {
        lift.step(&mut port).unwrap();
    }
    let down = port.servo_angles(ServoId::Lift);
    assert_eq!(down, (0..=179).rev().collect::<Vec<u8>>());

    port.clear();
    assert_eq!(lift.move_to(180), 180);
    while lift.is_moving() {
        lift.step(&mut port).unwrap();
    }
    assert_eq!(port.servo_angles(ServoId::Lift), (1..=180).collect::<Vec<u8>>());
    assert_eq!(lift.last_pos(), 180);
}

#[test]
fn repeated_move_to_is_idempotent() {
    let mut port = RecordingPort::default();
    let mut lift = LiftStateMachine::new(45, 3);

    lift.move_to(60);
    while lift.is_moving() {
        lift.step(&mut port).unwrap();
    }
    let writes = port.writes.len();
    assert_eq!(lift.last_pos(), 60);

    assert_eq!(lift.move_to(60), 0);
    lift.step(&mut port).unwrap();
    assert_eq!(port.writes.len(), writes);
    assert_eq!(lift.last_pos(), 60);
}

#[test]
fn commands_during_a_plan_wait_and_latest_wins() {
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    let mut ctrl = SystemController::new(RecordingPort::default(), &quick_manipulator());

    mailbox.on_receive(encoder::manipulator(open(LiftLevel::Level3)).as_bytes());
    ctrl.poll(&mailbox).unwrap();
    assert!(ctrl.is_busy());

    // Both arrive mid-sweep; the second replaces the first.
    mailbox.on_receive(encoder::manipulator(open(LiftLevel::Level1)).as_bytes());
    mailbox.on_receive(encoder::manipulator(ManipulatorCommand::Close).as_bytes());
    ctrl.poll(&mailbox).unwrap();
    assert!(mailbox.is_pending());

    run_until_idle(&mut ctrl, &mailbox);
    assert_eq!(ctrl.lift_position(), Some(10));
    assert_eq!(ctrl.gripper_state(), Some(GripperState::Open));
    // The lift went all the way to 150 before coming down.
    assert!(ctrl.port().servo_angles(ServoId::Lift).contains(&150));
}

#[test]
fn sequencer_refuses_a_second_plan() {
    let cfg = quick_manipulator();
    let mut ctrl = SystemController::new(RecordingPort::default(), &cfg);
    let frame = encoder::manipulator(open(LiftLevel::Level2));

    ctrl.handle(&frame).unwrap();
    assert!(matches!(
        ctrl.handle(&frame),
        Err(ControlError::Sequence(SequenceError::Busy))
    ));
}

#[test]
fn unsupported_level_is_dropped_without_motion() {
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    let mut ctrl = SystemController::new(RecordingPort::default(), &quick_manipulator());
    let startup = ctrl.port().writes.len();

    mailbox.on_receive(b"\0........O7");
    assert!(matches!(
        ctrl.poll(&mailbox),
        Err(ControlError::Decode(DecodeError::UnsupportedOperation { .. }))
    ));
    assert!(!ctrl.is_busy());
    assert_eq!(ctrl.port().writes.len(), startup);

    // The loop carries on with the next frame.
    mailbox.on_receive(encoder::manipulator(open(LiftLevel::Level1)).as_bytes());
    run_until_idle(&mut ctrl, &mailbox);
    assert_eq!(ctrl.lift_position(), Some(10));
}

#[test]
fn actuator_failure_aborts_the_plan() {
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    // Two startup writes, then five lift steps succeed.
    let port = FlakyPort {
        budget: 7,
        ..FlakyPort::default()
    };
    let mut ctrl = SystemController::new(port, &quick_manipulator());

    mailbox.on_receive(encoder::manipulator(open(LiftLevel::Level2)).as_bytes());
    let mut result = Ok(());
    for _ in 0..10 {
        result = ctrl.poll(&mailbox);
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(result, Err(ControlError::Port(BusFault))));
    assert!(!ctrl.is_busy());
    assert_eq!(ctrl.lift_position(), Some(50));
}

#[test]
fn velocity_drive_full_forward() {
    let mut ctrl = SystemController::new(
        RecordingPort::default(),
        &SlaveConfig::drive(DriveProtocol::Velocity),
    );
    assert_eq!(
        ctrl.port().writes,
        vec![Write::Pwm(Wheel::Left, 0), Write::Pwm(Wheel::Right, 0)]
    );

    ctrl.handle(&encoder::drive_velocity(100, 0)).unwrap();
    assert_eq!(
        ctrl.port().writes[2..],
        [
            Write::Direction(Wheel::Left, Level::High),
            Write::Pwm(Wheel::Left, 255),
            Write::Direction(Wheel::Right, Level::High),
            Write::Pwm(Wheel::Right, 255),
        ]
    );
}

#[test]
fn polarity_calibration_is_per_wheel() {
    let mut cfg = SlaveConfig::drive(DriveProtocol::Velocity);
    cfg.drive.right_polarity = Polarity::ForwardLow;
    let mut ctrl = SystemController::new(RecordingPort::default(), &cfg);

    ctrl.handle(&encoder::drive_velocity(-40, 0)).unwrap();
    assert_eq!(
        ctrl.port().writes[2..],
        [
            Write::Direction(Wheel::Left, Level::Low),
            Write::Pwm(Wheel::Left, 102),
            Write::Direction(Wheel::Right, Level::High),
            Write::Pwm(Wheel::Right, 102),
        ]
    );
}

#[test]
fn mode_ascii_stop_is_per_channel() {
    let mailbox = CommandMailbox::<NoopRawMutex>::new();
    let mut ctrl = SystemController::new(
        RecordingPort::default(),
        &SlaveConfig::drive(DriveProtocol::ModeAscii),
    );

    assert!(mailbox.on_receive(b"\0N080S999"));
    ctrl.poll(&mailbox).unwrap();
    assert_eq!(
        ctrl.port().writes[2..],
        [
            Write::Direction(Wheel::Left, Level::Low),
            Write::Pwm(Wheel::Left, 80),
            Write::Direction(Wheel::Right, Level::High),
            Write::Pwm(Wheel::Right, 0),
        ]
    );
}

#[test]
fn drive_slave_rejects_truncated_frame() {
    let mut ctrl = SystemController::new(
        RecordingPort::default(),
        &SlaveConfig::drive(DriveProtocol::ModeAscii),
    );
    let frame = dlb_core::utils::protocol::RawCommand::from_slice(b"\0P100").unwrap();
    assert!(matches!(
        ctrl.handle(&frame),
        Err(ControlError::Decode(DecodeError::MalformedCommand { .. }))
    ));
    assert_eq!(ctrl.port().writes.len(), 2);
}
