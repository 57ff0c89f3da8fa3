//! Drive the arm control loop against simulated hardware from a terminal.
//!
//! ```sh
//! cargo run --bin arm-console
//! cargo run --bin arm-console -- --config arm.ron --seed 7 --log-level debug
//! cargo run --bin arm-console -- --print-config > arm.ron
//! ```
//!
//! Stdin commands, one per line:
//!
//! - `pub <topic> <payload>`: deliver a message as the transport would.
//! - `joy <x> <y>`: hold the stick at raw readings (0–4095).
//! - `center`: release the stick.
//! - `press`: click the mode button once.
//! - `quit`: stop the loop (Ctrl-C works too).

use clap::Parser;
use cu_gesture_arm::clock::ArmClock;
use cu_gesture_arm::config::ArmConfig;
use cu_gesture_arm::controller::ArmController;
use cu_gesture_arm::router::Message;
use cu_gesture_arm::sim::{SimJoystick, SimJoystickHandle, SimServos};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};

#[derive(Parser, Debug)]
#[command(name = "arm-console", about = "Servo arm control loop on simulated hardware")]
struct Args {
    /// RON configuration file. Reference values when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the random gesture, overriding the configuration.
    #[arg(short, long)]
    seed: Option<u64>,

    /// off, error, warn, info, debug or trace.
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,

    /// Print the effective configuration as RON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ArmConfig::load(path)?,
        None => ArmConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    if args.print_config {
        println!("{}", config.to_ron()?);
        return Ok(());
    }

    TermLogger::init(
        args.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let stop = running.clone();
    ctrlc::set_handler(move || stop.store(false, Ordering::Release))?;

    let (stick, handle) = SimJoystick::new();
    let (tx, rx) = mpsc::channel();
    let stdin_running = running.clone();
    std::thread::spawn(move || read_commands(tx, handle, stdin_running));

    let mut controller =
        ArmController::new(&config, SimServos::default(), stick, rx, ArmClock::new())?;
    controller.run(&running)?;
    Ok(())
}

fn read_commands(tx: Sender<Message>, stick: SimJoystickHandle, running: Arc<AtomicBool>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let mut words = line.trim().splitn(3, ' ');
        match (words.next(), words.next(), words.next()) {
            (Some("pub"), Some(topic), payload) => {
                if tx.send(Message::new(topic, payload.unwrap_or_default())).is_err() {
                    break;
                }
            }
            (Some("joy"), Some(x), Some(y)) => match (x.parse(), y.parse()) {
                (Ok(x), Ok(y)) => stick.set_axes(x, y),
                _ => eprintln!("joy takes two readings in 0..=4095"),
            },
            (Some("center"), None, None) => stick.center(),
            (Some("press"), None, None) => stick.tap(),
            (Some("quit"), None, None) => break,
            (Some(""), None, None) => {}
            _ => eprintln!("commands: pub <topic> <payload> | joy <x> <y> | center | press | quit"),
        }
    }
    running.store(false, Ordering::Release);
}
