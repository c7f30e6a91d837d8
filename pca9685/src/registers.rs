//! PCA9685 register map
//! See the NXP PCA9685 datasheet, section 7.3

pub const PCA9685_I2C_BUS: u8       =  1;
pub const PCA9685_ADDRESS: u16      =  0x40;

pub const PCA9685_MODE1: u8         =  0x00;

pub const PCA9685_SUBADR1: u8       =  0x02;
pub const PCA9685_SUBADR2: u8       =  0x03;
pub const PCA9685_SUBADR3: u8       =  0x04;

pub const PCA9685_LED0_ON_L: u8     =  0x06;
pub const PCA9685_LED0_ON_H: u8     =  0x07;
pub const PCA9685_LED0_OFF_L: u8    =  0x08;
pub const PCA9685_LED0_OFF_H: u8    =  0x09;

pub const PCA9685_ALLLED_ON_L: u8   =  0xFA;
pub const PCA9685_ALLLED_ON_H: u8   =  0xFB;
pub const PCA9685_ALLLED_OFF_L: u8  =  0xFC;
pub const PCA9685_ALLLED_OFF_H: u8  =  0xFD;

pub const PCA9685_PRESCALE: u8      =  0xFE;

/// MODE1 bits touched by the frequency sequence
pub const MODE1_RESTART: u8         =  0x80;
pub const MODE1_SLEEP: u8           =  0x10;

pub const CHANNEL_COUNT: u8         =  16;
/// Register stride between two consecutive channels
pub const CHANNEL_STRIDE: u8        =  4;
/// Number of ticks in one PWM period (12 bit counter)
pub const TICKS_PER_PERIOD: u16     =  4096;
pub const MAX_TICK: u16             =  TICKS_PER_PERIOD - 1;

pub const OSCILLATOR_HZ: f64        =  25_000_000.0;

/// The four timing registers of a channel in write order: ON_L, ON_H, OFF_L, OFF_H
///
/// Wraps like the chip's 8 bit address space, channels above 15 land outside the LED block
pub const fn channel_registers(channel: u8) -> [u8; 4] {
    let offset = channel.wrapping_mul(CHANNEL_STRIDE);

    [
        PCA9685_LED0_ON_L.wrapping_add(offset),
        PCA9685_LED0_ON_H.wrapping_add(offset),
        PCA9685_LED0_OFF_L.wrapping_add(offset),
        PCA9685_LED0_OFF_H.wrapping_add(offset),
    ]
}

/// Splits a tick count into the (low, high) register bytes
///
/// The high byte is not masked to the 4 valid bits, 4096 becomes (0x00, 0x10)
pub const fn split_tick(tick: u16) -> (u8, u8) {
    ((tick & 0xFF) as u8, (tick >> 8) as u8)
}
