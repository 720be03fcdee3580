use std::{convert::Infallible, io::BufRead, path::PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use dlb_core::utils::{
    SlaveConfig, SystemController, COMMAND_MAILBOX,
    config::DEFAULT_I2C_ADDRESS,
    controllers::{ActuatorPort, Level, LiftLevel, ServoId, Wheel},
    protocol::{
        Command, DriveCommand, DriveProtocol, ManipulatorCommand, ProtocolVariant, RawCommand,
        encoder,
    },
};
use embassy_executor::{Executor, Spawner};
use heapless::Vec;
use tracing::{error, info, warn};

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    /// differential drive, mode-ASCII frames
    Drive,
    /// differential drive, signed velocity frames
    Velocity,
    /// lift + gripper
    Manipulator,
}

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Which slave to simulate
    #[clap(long, value_enum, default_value = "drive")]
    role: RoleArg,
    /// JSON slave configuration; overrides --role
    #[clap(long)]
    config: Option<PathBuf>,
    /// 7-bit I2C address to report, decimal or 0x-prefixed hex
    #[clap(long, value_parser = parse_address)]
    address: Option<u8>,
}

/// Actuator port that logs every write.
struct TracingPort;

impl ActuatorPort for TracingPort {
    type Error = Infallible;

    fn set_pwm(
        &mut self,
        wheel: Wheel,
        duty: u8,
    ) -> Result<(), Self::Error> {
        info!(?wheel, duty, "PWM");
        Ok(())
    }

    fn set_direction(
        &mut self,
        wheel: Wheel,
        level: Level,
    ) -> Result<(), Self::Error> {
        info!(?wheel, ?level, "DIR");
        Ok(())
    }

    fn set_servo_angle(
        &mut self,
        servo: ServoId,
        angle: u8,
    ) -> Result<(), Self::Error> {
        info!(?servo, angle, "SERVO");
        Ok(())
    }
}

fn parse_address(arg: &str) -> Result<u8> {
    let address = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => arg.parse::<u8>(),
    }
    .with_context(|| format!("invalid I2C address {arg:?}"))?;
    if address > 0x7F {
        bail!("I2C address {address:#04x} is not a 7-bit address");
    }
    Ok(address)
}

fn load_config(opts: &Opts) -> Result<SlaveConfig> {
    let mut config = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => match opts.role {
            RoleArg::Drive => SlaveConfig::drive(DriveProtocol::ModeAscii),
            RoleArg::Velocity => SlaveConfig::drive(DriveProtocol::Velocity),
            RoleArg::Manipulator => SlaveConfig::manipulator(),
        },
    };
    if let Some(address) = opts.address {
        config.address = address;
    }
    Ok(config)
}

/// Turn one console line into the frame a master would send.
///
/// `drive F R`, `wheels L R`, `open N`, `close`, or `raw TEXT` for an
/// arbitrary payload after the command byte.
fn parse_line(line: &str) -> Result<RawCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let mut arg = |name: &str| -> Result<i16> {
        words
            .next()
            .with_context(|| format!("missing {name}"))?
            .parse::<i16>()
            .with_context(|| format!("bad {name}"))
    };
    let command = match verb {
        "drive" => Command::Drive(DriveCommand::Velocity {
            forward_pct: arg("forward")?.clamp(-100, 100) as i8,
            rotational_pct: arg("rotational")?.clamp(-100, 100) as i8,
        }),
        "wheels" => Command::Drive(DriveCommand::Wheels {
            left_raw: arg("left")?,
            right_raw: arg("right")?,
        }),
        "open" => {
            let digit = arg("level")?;
            let level = u8::try_from(digit)
                .ok()
                .and_then(|d| LiftLevel::from_digit(b'0' + d.min(9)))
                .with_context(|| format!("no lift level {digit}"))?;
            Command::Manipulator(ManipulatorCommand::Open { level })
        }
        "close" => Command::Manipulator(ManipulatorCommand::Close),
        "raw" => {
            let text = line.trim_start().strip_prefix("raw").unwrap_or_default().trim();
            let mut frame: Vec<u8, 16> = Vec::new();
            frame
                .push(encoder::REGISTER)
                .map_err(|_| anyhow!("frame full"))?;
            frame
                .extend_from_slice(text.as_bytes())
                .map_err(|()| anyhow!("frame longer than 16 bytes"))?;
            return RawCommand::from_slice(&frame).map_err(|e| anyhow!("{e}"));
        }
        other => bail!("unknown command {other:?}"),
    };
    Ok(encoder::encode(&command))
}

/// Plays the I2C master: every console line becomes one receive callback.
fn console() {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(frame) => {
                if !COMMAND_MAILBOX.on_receive(frame.as_bytes()) {
                    warn!("frame ignored: {}", frame);
                }
            }
            Err(e) => error!("{e:#}"),
        }
    }
    info!("console closed");
    std::process::exit(0);
}

#[embassy_executor::task]
async fn control_task(mut ctrl: SystemController<TracingPort>) -> ! {
    ctrl.run(&COMMAND_MAILBOX).await
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    config: SlaveConfig,
) {
    let role = match config.protocol {
        ProtocolVariant::Drive(protocol) => format!("drive ({protocol:?})"),
        ProtocolVariant::Manipulator => "manipulator".to_string(),
    };
    info!("Simulating {} slave at {:#04x}", role, config.address);
    if config.address == DEFAULT_I2C_ADDRESS {
        warn!(
            "both slaves default to {:#04x}; give each its own address on a shared bus",
            DEFAULT_I2C_ADDRESS
        );
    }

    let ctrl = SystemController::new(TracingPort, &config);
    if let Err(e) = spawner.spawn(control_task(ctrl)) {
        error!("failed to spawn control task: {:?}", e);
        return;
    }

    std::thread::spawn(console);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let config = match load_config(&opts) {
        Ok(config) => config,
        Err(e) => {
            error!("bad configuration: {e:#}");
            std::process::exit(2);
        }
    };

    let executor = dlb_core::mk_static!(Executor, Executor::new());
    executor.run(|spawner| {
        if let Err(e) = spawner.spawn(main_task(spawner, config)) {
            error!("failed to spawn main task: {:?}", e);
        }
    });
}
