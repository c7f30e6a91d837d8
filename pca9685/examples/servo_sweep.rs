//! Sweeps a servo back and forth once
use std::{thread, time::Duration};

use anyhow::Context;
use clap::Parser;
use pca9685::Pca9685;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Channel the servo is plugged into
    #[arg(short, long, default_value_t = 2)]
    channel: u8,
    /// Start of the sweep in microseconds
    #[arg(long, default_value_t = 800)]
    min: u32,
    /// End of the sweep in microseconds
    #[arg(long, default_value_t = 2000)]
    max: u32,
    #[arg(long, default_value_t = 5)]
    step: u32,
    /// Pause between steps in milliseconds
    #[arg(long, default_value_t = 2)]
    delay: u64,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::TRACE } else { Level::INFO })
        .init();
    info!("Starting servo sweep on channel {}", args.channel);

    let mut pca = Pca9685::open().context("Open PCA9685")?;
    pca.set_pwm_frequency(50).context("Set frequency")?;

    let delay = Duration::from_millis(args.delay);
    let step = args.step.max(1) as usize;

    for pulse in (args.min..args.max).step_by(step) {
        pca.set_servo_pulse(args.channel, pulse).context("Set pulse")?;
        thread::sleep(delay);
    }
    for pulse in (args.min + 1..=args.max).rev().step_by(step) {
        pca.set_servo_pulse(args.channel, pulse).context("Set pulse")?;
        thread::sleep(delay);
    }

    pca.set_all_pwm(0, 0).context("Stop outputs")?;
    pca.close().context("Close PCA9685")?;
    info!("Sweep done");

    Ok(())
}
