use core::cell::RefCell;

use dlb_core::utils::{
    config::SlaveConfig,
    controllers::{
        i2c::{Pca9685Port, PWM_ADDRESS},
        MotorActuator, Polarity, SystemController, Wheel,
    },
    protocol::{encoder, DriveProtocol, RawCommand},
};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

/// MODE1 write that turns on register auto-increment before the first
/// multi-byte channel write.
const AUTO_INCREMENT: [u8; 2] = [0x00, 0x31];

/// Create a write transaction for the given I2C address and data payload.
pub fn write(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::write(addr, data)
}

/// Channel write with ON at 0 and OFF at `off`.
fn channel(
    register: u8,
    off: u16,
) -> I2cTrans {
    write(
        PWM_ADDRESS,
        vec![register, 0x00, 0x00, (off & 0xFF) as u8, (off >> 8) as u8],
    )
}

/// Full-on bit in the ON register; the channel is held high.
fn full_on(register: u8) -> [I2cTrans; 2] {
    [
        write(PWM_ADDRESS, vec![register, 0x00, 0x10]),
        write(PWM_ADDRESS, vec![register + 2, 0x00, 0x00]),
    ]
}

/// Full-off bit in the OFF register; the channel is held low.
fn full_off(register: u8) -> I2cTrans {
    write(PWM_ADDRESS, vec![register + 2, 0x00, 0x10])
}

// LEDn_ON_L registers of the default channel map.
const LEFT_PHASE: u8 = 0x06;
const LEFT_ENABLE: u8 = 0x0A;
const RIGHT_PHASE: u8 = 0x0E;
const RIGHT_ENABLE: u8 = 0x12;
const LIFT: u8 = 0x16;
const GRIPPER: u8 = 0x1A;

#[test]
fn test_configure_pwm() {
    // Enable, then prescale for 50Hz (sleep, write prescale, wake)
    let expectations = [
        write(PWM_ADDRESS, vec![0x00, 0x01]),
        write(PWM_ADDRESS, vec![0x00, 0x11]),
        write(PWM_ADDRESS, vec![0xFE, 121]),
        write(PWM_ADDRESS, vec![0x00, 0x01]),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut port = Pca9685Port::new(&i2c_bus, PWM_ADDRESS).unwrap();
    port.configure().unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_reverse_speed_sets_phase_low_then_duty() {
    let expectations = [
        write(PWM_ADDRESS, AUTO_INCREMENT.to_vec()),
        full_off(LEFT_PHASE),
        channel(LEFT_ENABLE, 2055),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut port = Pca9685Port::new(&i2c_bus, PWM_ADDRESS).unwrap();
    let motors = MotorActuator::new(Polarity::ForwardHigh, Polarity::ForwardHigh);
    motors.apply(&mut port, Wheel::Left, -128).unwrap();
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_drive_slave_startup_and_mode_ascii_command() {
    let mut expectations = vec![
        write(PWM_ADDRESS, AUTO_INCREMENT.to_vec()),
        // startup: both enables off
        full_off(LEFT_ENABLE),
        full_off(RIGHT_ENABLE),
    ];
    // P255: forward full duty
    expectations.extend(full_on(LEFT_PHASE));
    expectations.extend(full_on(LEFT_ENABLE));
    // S000: stopped, phase stays at the forward level
    expectations.extend(full_on(RIGHT_PHASE));
    expectations.push(full_off(RIGHT_ENABLE));

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let port = Pca9685Port::new(&i2c_bus, PWM_ADDRESS).unwrap();
    let mut ctrl = SystemController::new(port, &SlaveConfig::drive(DriveProtocol::ModeAscii));
    ctrl.handle(&encoder::drive_wheels(255, 0)).unwrap();
    drop(ctrl);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_manipulator_slave_homes_servos() {
    // Lift held at 45° (204 ticks), gripper open at 170° (489 ticks)
    let expectations = [
        write(PWM_ADDRESS, AUTO_INCREMENT.to_vec()),
        channel(LIFT, 204),
        channel(GRIPPER, 489),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let port = Pca9685Port::new(&i2c_bus, PWM_ADDRESS).unwrap();
    let ctrl = SystemController::new(port, &SlaveConfig::manipulator());
    assert_eq!(ctrl.lift_position(), Some(45));
    drop(ctrl);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_malformed_frame_touches_no_outputs() {
    let expectations = [
        write(PWM_ADDRESS, AUTO_INCREMENT.to_vec()),
        full_off(LEFT_ENABLE),
        full_off(RIGHT_ENABLE),
    ];

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let port = Pca9685Port::new(&i2c_bus, PWM_ADDRESS).unwrap();
    let mut ctrl = SystemController::new(port, &SlaveConfig::drive(DriveProtocol::ModeAscii));
    let raw = RawCommand::from_slice(b"\0P1x0P000").unwrap();
    assert!(ctrl.handle(&raw).is_err());
    drop(ctrl);
    i2c_bus.borrow_mut().done();
}

#[test]
fn test_phase_pin_is_held_not_pulsed() {
    // Reverse then forward: LOW is full-off, HIGH sets full-on and clears
    // the full-off bit left behind, so neither level carries PWM edges.
    let mut expectations = vec![
        write(PWM_ADDRESS, AUTO_INCREMENT.to_vec()),
        full_off(LEFT_PHASE),
        channel(LEFT_ENABLE, 1204),
    ];
    expectations.extend(full_on(LEFT_PHASE));
    expectations.push(channel(LEFT_ENABLE, 1204));

    let mock = I2cMock::new(&expectations);
    let i2c_bus = RefCell::new(mock);
    let mut port = Pca9685Port::new(&i2c_bus, PWM_ADDRESS).unwrap();
    let motors = MotorActuator::new(Polarity::ForwardHigh, Polarity::ForwardHigh);
    motors.apply(&mut port, Wheel::Left, -75).unwrap();
    motors.apply(&mut port, Wheel::Left, 75).unwrap();
    i2c_bus.borrow_mut().done();
}
