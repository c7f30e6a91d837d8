use rppal::i2c::I2c;
use thiserror::Error;
use tracing::{debug, trace};

/// A register oriented connection to a device on a two wire bus
pub trait Bus {
    fn read_register(&mut self, address: u16, register: u8) -> Result<u8, BusError>;
    fn write_register(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError>;

    /// Releases the connection, later calls on the same bus should fail
    fn close(&mut self) -> Result<(), BusError>;
}

pub trait OpenBus: Bus + Sized {
    fn open(bus: u8, address: u16) -> Result<Self, BusError>;
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read_register(&mut self, address: u16, register: u8) -> Result<u8, BusError> {
        (**self).read_register(address, register)
    }

    fn write_register(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError> {
        (**self).write_register(address, register, value)
    }

    fn close(&mut self) -> Result<(), BusError> {
        (**self).close()
    }
}

#[derive(Error, Debug)]
pub enum BusError {
    #[error("I2C Error: {0}")]
    I2c(#[from] rppal::i2c::Error),
    #[error("Bus connection already closed")]
    Closed,
    #[error("Bus fault: {0}")]
    Fault(String),
}

/// Linux i2c-dev backed bus using SMBus byte data transfers
#[derive(Debug)]
pub struct I2cBus {
    i2c: Option<I2c>,
    bus: u8,
    address: u16,
}

impl I2cBus {
    fn select(&mut self, address: u16) -> Result<&I2c, BusError> {
        let i2c = self.i2c.as_mut().ok_or(BusError::Closed)?;

        if self.address != address {
            trace!("Selecting slave address {address:#04x}");
            i2c.set_slave_address(address)?;
            self.address = address;
        }

        Ok(i2c)
    }
}

impl OpenBus for I2cBus {
    #[tracing::instrument]
    fn open(bus: u8, address: u16) -> Result<Self, BusError> {
        let mut i2c = I2c::with_bus(bus)?;
        i2c.set_slave_address(address)?;

        debug!("Opened i2c bus {bus} at {address:#04x}");

        Ok(Self {
            i2c: Some(i2c),
            bus,
            address,
        })
    }
}

impl Bus for I2cBus {
    fn read_register(&mut self, address: u16, register: u8) -> Result<u8, BusError> {
        let i2c = self.select(address)?;
        Ok(i2c.smbus_read_byte(register)?)
    }

    fn write_register(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError> {
        let i2c = self.select(address)?;
        Ok(i2c.smbus_write_byte(register, value)?)
    }

    fn close(&mut self) -> Result<(), BusError> {
        // Dropping the handle closes the underlying file descriptor
        match self.i2c.take() {
            Some(_) => {
                debug!("Closed i2c bus {}", self.bus);
                Ok(())
            }
            None => Err(BusError::Closed),
        }
    }
}
