use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bus::{Bus, I2cBus, OpenBus};
use crate::error::{Pca9685Error, Pca9685Result};
use crate::observer::{Observer, TracingObserver};
use crate::registers::*;

/// Power on reset time before the chip answers reliably
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);
/// Time given to the oscillator after leaving sleep, the datasheet asks for at least 500us
pub const OSCILLATOR_DELAY: Duration = Duration::from_millis(5);

/// Servo helpers assume a 50 Hz frame
pub const SERVO_FREQUENCY: u32 = 50;
pub const SERVO_FRAME_US: u32 = 20_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// I2C bus index, `/dev/i2c-{bus}`
    pub bus: u8,
    pub settle_delay: Duration,
    pub oscillator_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: PCA9685_I2C_BUS,
            settle_delay: SETTLE_DELAY,
            oscillator_delay: OSCILLATOR_DELAY,
        }
    }
}

/// Prescale register value for an output frequency
///
/// `round(25MHz / 4096 / frequency - 1)`, rounding half up. Fails when the result does not fit the
/// 8 bit register
pub fn prescale(frequency: u32) -> Pca9685Result<u8> {
    if frequency == 0 {
        return Err(Pca9685Error::InvalidFrequency(frequency));
    }

    let estimate = OSCILLATOR_HZ / TICKS_PER_PERIOD as f64 / frequency as f64 - 1.0;
    let prescale = (estimate + 0.5).floor();

    if !(0.0..=u8::MAX as f64).contains(&prescale) {
        return Err(Pca9685Error::InvalidFrequency(frequency));
    }

    Ok(prescale as u8)
}

/// Off tick for a servo pulse at 50 Hz, truncating
///
/// A full frame (20000us) yields 4096, one past the last valid tick
pub fn servo_ticks(pulse_us: u32) -> Pca9685Result<u16> {
    if pulse_us > SERVO_FRAME_US {
        return Err(Pca9685Error::InvalidPulse(pulse_us));
    }

    Ok((pulse_us * TICKS_PER_PERIOD as u32 / SERVO_FRAME_US) as u16)
}

fn check_channel(channel: u8) -> Pca9685Result<()> {
    if channel >= CHANNEL_COUNT {
        return Err(Pca9685Error::InvalidChannel(channel));
    }

    Ok(())
}

fn check_tick(tick: u16) -> Pca9685Result<()> {
    if tick > MAX_TICK {
        return Err(Pca9685Error::InvalidTick(tick));
    }

    Ok(())
}

/// PCA9685 16 channel PWM controller
///
/// Every method takes `&mut self`, share a handle between threads behind a `Mutex`
#[derive(Debug)]
pub struct Pca9685<B, O = TracingObserver> {
    bus: B,
    address: u16,
    config: Config,
    frequency: Option<u32>,
    observer: O,
}

impl Pca9685<I2cBus> {
    /// Opens the chip at 0x40 on i2c bus 1
    pub fn open() -> Pca9685Result<Self> {
        Self::open_with(Config::default())
    }

    pub fn open_with(config: Config) -> Pca9685Result<Self> {
        Self::connect(config)
    }
}

impl<B: OpenBus> Pca9685<B> {
    #[tracing::instrument]
    pub fn connect(config: Config) -> Pca9685Result<Self> {
        let bus = B::open(config.bus, PCA9685_ADDRESS).map_err(|source| {
            Pca9685Error::DeviceOpen {
                bus: config.bus,
                address: PCA9685_ADDRESS,
                source,
            }
        })?;

        Ok(Self::from_bus(bus, config))
    }
}

impl<B: Bus> Pca9685<B> {
    /// Adopts an already open bus, blocks for the settle delay
    pub fn from_bus(bus: B, config: Config) -> Self {
        thread::sleep(config.settle_delay);
        debug!("PCA9685 ready on bus {} at {PCA9685_ADDRESS:#04x}", config.bus);

        Self {
            bus,
            address: PCA9685_ADDRESS,
            config,
            frequency: None,
            observer: TracingObserver,
        }
    }
}

impl<B: Bus, O: Observer> Pca9685<B, O> {
    pub fn with_observer<O2: Observer>(self, observer: O2) -> Pca9685<B, O2> {
        Pca9685 {
            bus: self.bus,
            address: self.address,
            config: self.config,
            frequency: self.frequency,
            observer,
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Last frequency applied with [`Pca9685::set_pwm_frequency`]
    pub fn frequency(&self) -> Option<u32> {
        self.frequency
    }

    /// Hands back the bus without closing it
    pub fn into_bus(self) -> B {
        self.bus
    }

    pub fn write(&mut self, register: u8, value: u8) -> Pca9685Result<()> {
        self.bus
            .write_register(self.address, register, value)
            .map_err(Pca9685Error::transport(register))?;
        self.observer.on_write(register, value);

        Ok(())
    }

    pub fn read(&mut self, register: u8) -> Pca9685Result<u8> {
        let value = self
            .bus
            .read_register(self.address, register)
            .map_err(Pca9685Error::transport(register))?;
        self.observer.on_read(register, value);

        Ok(value)
    }

    /// Changes the output frequency of every channel
    ///
    /// The prescale register only latches while the oscillator is stopped, so MODE1 is put to
    /// sleep, the prescale written, the old mode restored and finally the restart bit set
    pub fn set_pwm_frequency(&mut self, frequency: u32) -> Pca9685Result<()> {
        let prescale = prescale(frequency)?;
        info!("Setting PWM frequency to {frequency} Hz");
        debug!("Final prescale: {prescale}");

        let old_mode = self.read(PCA9685_MODE1)?;
        let sleep_mode = (old_mode & !MODE1_RESTART) | MODE1_SLEEP;

        self.write(PCA9685_MODE1, sleep_mode)?;
        self.write(PCA9685_PRESCALE, prescale)?;
        self.write(PCA9685_MODE1, old_mode)?;
        thread::sleep(self.config.oscillator_delay);
        self.write(PCA9685_MODE1, old_mode | MODE1_RESTART)?;

        self.frequency = Some(frequency);

        Ok(())
    }

    /// Sets the on and off ticks of a channel, rejecting anything the chip can't represent
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Pca9685Result<()> {
        check_channel(channel)?;
        check_tick(on)?;
        check_tick(off)?;

        self.set_pwm_unchecked(channel, on, off)
    }

    /// Writes ON_L, ON_H, OFF_L, OFF_H of a channel without validating anything
    ///
    /// High bytes are `tick >> 8`, so 4096 sets the full on/off bit. The four writes are separate
    /// transfers, if one fails the channel is left partially updated
    pub fn set_pwm_unchecked(&mut self, channel: u8, on: u16, off: u16) -> Pca9685Result<()> {
        let [on_l, on_h, off_l, off_h] = channel_registers(channel);
        let (on_low, on_high) = split_tick(on);
        let (off_low, off_high) = split_tick(off);

        self.write(on_l, on_low)?;
        self.write(on_h, on_high)?;
        self.write(off_l, off_low)?;
        self.write(off_h, off_high)?;

        self.observer.on_pwm(channel, on, off);

        Ok(())
    }

    /// Drives every channel at once through the ALL_LED registers
    pub fn set_all_pwm(&mut self, on: u16, off: u16) -> Pca9685Result<()> {
        check_tick(on)?;
        check_tick(off)?;

        let (on_low, on_high) = split_tick(on);
        let (off_low, off_high) = split_tick(off);

        self.write(PCA9685_ALLLED_ON_L, on_low)?;
        self.write(PCA9685_ALLLED_ON_H, on_high)?;
        self.write(PCA9685_ALLLED_OFF_L, off_low)?;
        self.write(PCA9685_ALLLED_OFF_H, off_high)?;

        Ok(())
    }

    /// Outputs a servo pulse of `pulse_us` microseconds on `channel`
    ///
    /// Assumes a 50 Hz frame: call `set_pwm_frequency(50)` first. Other frequencies only log a
    /// warning
    pub fn set_servo_pulse(&mut self, channel: u8, pulse_us: u32) -> Pca9685Result<()> {
        check_channel(channel)?;
        let tick = servo_ticks(pulse_us)?;

        if self.frequency != Some(SERVO_FREQUENCY) {
            warn!(
                "Servo pulse on channel {channel} assumes {SERVO_FREQUENCY} Hz but the frequency is {:?}",
                self.frequency
            );
        }

        self.set_pwm_unchecked(channel, 0, tick)
    }

    /// Releases the bus, a second close fails
    pub fn close(&mut self) -> Pca9685Result<()> {
        self.bus.close().map_err(Pca9685Error::Close)?;
        debug!("PCA9685 closed");

        Ok(())
    }
}
