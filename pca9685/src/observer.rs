use tracing::trace;

/// Hook notified of every bus transaction the driver performs
///
/// All methods default to doing nothing
pub trait Observer {
    fn on_read(&mut self, _register: u8, _value: u8) {}
    fn on_write(&mut self, _register: u8, _value: u8) {}
    fn on_pwm(&mut self, _channel: u8, _on: u16, _off: u16) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_read(&mut self, register: u8, value: u8) {
        (**self).on_read(register, value)
    }

    fn on_write(&mut self, register: u8, value: u8) {
        (**self).on_write(register, value)
    }

    fn on_pwm(&mut self, channel: u8, on: u16, off: u16) {
        (**self).on_pwm(channel, on, off)
    }
}

/// Emits a trace event per transaction
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_read(&mut self, register: u8, value: u8) {
        trace!(register, value, "I2C read");
    }

    fn on_write(&mut self, register: u8, value: u8) {
        trace!(register, value, "I2C write");
    }

    fn on_pwm(&mut self, channel: u8, on: u16, off: u16) {
        trace!(channel, on, off, "PWM set");
    }
}

/// Drops every notification
#[derive(Debug, Default, Copy, Clone)]
pub struct SilentObserver;

impl Observer for SilentObserver {}
