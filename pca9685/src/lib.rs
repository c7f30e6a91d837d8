//! Driver for the PCA9685 16 channel, 12 bit PWM controller on a Linux I2C bus
#![warn(
    meta_variable_misuse,
    //missing_debug_implementations,
    //missing_docs,
    //unsafe_code,
    //unused_results,
    //unreachable_pub,
    //clippy::pedantic,
    //clippy::nursery,
    //clippy::unwrap_used,
    //clippy::expect_used
)]

pub mod bus;
pub mod device;
pub mod error;
pub mod observer;
pub mod registers;

#[cfg(test)]
mod mock;

pub use bus::{Bus, BusError, I2cBus, OpenBus};
pub use device::{prescale, servo_ticks, Config, Pca9685};
pub use error::{Pca9685Error, Pca9685Result};
pub use observer::{Observer, SilentObserver, TracingObserver};
