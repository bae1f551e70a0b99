//! thermctl — bench driver for the thermostat relay controller.
//!
//! Runs the controller over the simulated expander so the interrupt path,
//! the throttle, the relay sequencing and the watchdog can be exercised
//! from a terminal.
//!
//! ```text
//!   stdin ──▶ console ──▶ ThermController ──▶ SimExpander
//!                              │                  ▲
//!                              ▼                  │
//!                         LogEventSink      sens <n> <a|b>
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use thermrelay::adapters::config_file::JsonConfigFile;
use thermrelay::adapters::log_sink::LogEventSink;
use thermrelay::app::ports::ConfigPort;
use thermrelay::config::ControllerConfig;
use thermrelay::drivers::sim_expander::SimExpander;
use thermrelay::{Channel, ConfigError, SAFE_STATE, Sensor, ThermController, ThermState};

/// Drive the relay controller against a simulated MCP23S17.
#[derive(Parser)]
struct Cli {
    /// JSON config file (defaults are used if it does not exist)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Interactive console on stdin
    Console,
    /// Step the relays through a 3-bit counter
    Cycle {
        /// Delay between steps
        #[arg(long, default_value_t = 1500)]
        interval_ms: u64,

        /// Number of steps
        #[arg(long, default_value_t = 8)]
        count: u32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    let sim = SimExpander::new();
    let mut ctl = ThermController::new(sim.clone(), &config, Arc::new(LogEventSink::new()))
        .context("starting controller")?;

    match cli.mode {
        Mode::Console => console(&ctl, &sim)?,
        Mode::Cycle { interval_ms, count } => cycle(&ctl, Duration::from_millis(interval_ms), count),
    }

    ctl.close().context("closing controller")?;
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        return Ok(ControllerConfig::default());
    };
    let file = JsonConfigFile::new(path);
    match file.load() {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound) => {
            warn!("Config file {} not found, using defaults", file.path().display());
            Ok(ControllerConfig::default())
        }
        Err(e) => Err(e).context("loading config"),
    }
}

const HELP: &str = "\
commands:
  rel1 | rel2 | rel3   toggle a relay
  sens <n> <a|b>       toggle a sensor input on channel n
  state                print the current state
  safe                 release every relay
  help                 this text
  exit                 quit";

fn console(ctl: &ThermController<SimExpander>, sim: &SimExpander) -> Result<()> {
    println!("{HELP}");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = words.first() else {
            continue;
        };
        ctl.touch_watchdog();

        match cmd {
            "rel1" | "rel2" | "rel3" => {
                let ch = cmd
                    .strip_prefix("rel")
                    .and_then(|n| n.parse().ok())
                    .and_then(Channel::from_number);
                if let Some(ch) = ch {
                    let current = ctl.get_state();
                    report(ctl.set_state(&current.with_relay(ch, !current.relay(ch))));
                }
            }
            "sens" => match parse_sensor(&words[1..]) {
                Some((ch, sensor)) => {
                    let c = ctl.get_state().channel(ch);
                    let active = match sensor {
                        Sensor::A => c.sensor_a,
                        Sensor::B => c.sensor_b,
                    };
                    sim.set_sensor(ch, sensor, !active);
                }
                None => println!("usage: sens <1|2|3> <a|b>"),
            },
            "state" => print!("{}", ctl.get_state()),
            "safe" => report(ctl.set_state(&SAFE_STATE)),
            "help" => println!("{HELP}"),
            "exit" | "quit" => break,
            other => println!("unknown command '{other}', try 'help'"),
        }
    }
    Ok(())
}

fn parse_sensor(args: &[&str]) -> Option<(Channel, Sensor)> {
    let ch = Channel::from_number(args.first()?.parse().ok()?)?;
    let sensor = match *args.get(1)? {
        "a" | "A" => Sensor::A,
        "b" | "B" => Sensor::B,
        _ => return None,
    };
    Some((ch, sensor))
}

fn report(result: thermrelay::Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_throttled() => println!("busy: {e}"),
        Err(e) => println!("error: {e}"),
    }
}

fn cycle(ctl: &ThermController<SimExpander>, interval: Duration, count: u32) {
    info!("Cycling relays: {} steps every {:?}", count, interval);
    for step in 0..count {
        let mut target = ThermState::default();
        for (i, ch) in Channel::ALL.into_iter().enumerate() {
            target = target.with_relay(ch, step & (1 << i) != 0);
        }
        ctl.touch_watchdog();
        if let Err(e) = ctl.set_state(&target) {
            warn!("step {}: {}", step, e);
        }
        print!("{}", ctl.get_state());
        std::thread::sleep(interval);
    }
}
