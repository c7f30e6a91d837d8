use thiserror::Error;

use crate::bus::BusError;

pub type Pca9685Result<T> = Result<T, Pca9685Error>;

#[derive(Error, Debug)]
pub enum Pca9685Error {
    #[error("Could not open PCA9685 on bus {bus} at {address:#04x}: {source}")]
    DeviceOpen {
        bus: u8,
        address: u16,
        #[source]
        source: BusError,
    },
    #[error("Bus transfer to register {register:#04x} failed: {source}")]
    Transport {
        register: u8,
        #[source]
        source: BusError,
    },
    #[error("Could not close bus: {0}")]
    Close(#[source] BusError),
    #[error("Frequency {0} Hz does not map to a valid prescale")]
    InvalidFrequency(u32),
    #[error("Channel {0} is out of range (0-15)")]
    InvalidChannel(u8),
    #[error("Tick {0} is out of range (0-4095)")]
    InvalidTick(u16),
    #[error("Pulse of {0}us does not fit in a 20000us frame")]
    InvalidPulse(u32),
}

impl Pca9685Error {
    pub(crate) fn transport(register: u8) -> impl FnOnce(BusError) -> Self {
        move |source| Pca9685Error::Transport { register, source }
    }

    /// The underlying bus failure, if any
    pub fn bus_error(&self) -> Option<&BusError> {
        match self {
            Pca9685Error::DeviceOpen { source, .. }
            | Pca9685Error::Transport { source, .. }
            | Pca9685Error::Close(source) => Some(source),
            _ => None,
        }
    }
}
