//! Cargo runner: ships a cross compiled binary to the Pi and runs it there
//!
//! Set `runner = "runner-rpi"` for the Pi target in `.cargo/config.toml`
use std::{env, process::Command};

use anyhow::{bail, Context};

const DEFAULT_HOST: &str = "pi@raspberrypi.local";
const DEFAULT_PATH: &str = "~/pca9685/exec";

struct Remote {
    host: String,
    path: String,
}

impl Remote {
    fn from_env() -> Self {
        Self {
            host: env::var("PCA9685_RUNNER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_owned()),
            path: env::var("PCA9685_RUNNER_PATH").unwrap_or_else(|_| DEFAULT_PATH.to_owned()),
        }
    }

    fn ssh(&self, remote_command: &str) -> anyhow::Result<bool> {
        let status = Command::new("ssh")
            .arg(&self.host)
            .arg(remote_command)
            .spawn()
            .context("Spawn ssh")?
            .wait()
            .context("Wait on ssh")?;

        Ok(status.success())
    }

    fn upload(&self, bin: &str) -> anyhow::Result<bool> {
        let status = Command::new("scp")
            .arg(bin)
            .arg(format!("{}:{}", self.host, self.path))
            .spawn()
            .context("Spawn scp")?
            .wait()
            .context("Wait on scp")?;

        Ok(status.success())
    }
}

pub fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let Some(bin) = args.next() else {
        bail!("No binary provided");
    };
    // Arguments after the binary are forwarded, e.g. `cargo run --example servo_sweep -- -c 3`
    let forwarded: Vec<String> = args.collect();

    let remote = Remote::from_env();

    eprintln!("Stopping previous run on {}", remote.host);
    if !remote.ssh(&format!("pkill -f {} || exit 0", remote.path))? {
        bail!("Could not stop previous run");
    }
    eprintln!();

    eprintln!("Uploading");
    if !remote.upload(&bin)? {
        bail!("Upload failed");
    }
    eprintln!("Upload success!");
    eprintln!();

    // i2c-dev needs root unless the user is in the i2c group
    eprintln!("Running binary");
    let command = format!("sudo {} {}", remote.path, forwarded.join(" "));
    if !remote.ssh(command.trim_end())? {
        bail!("Remote run failed");
    }
    eprintln!("Remote run success!");

    Ok(())
}
