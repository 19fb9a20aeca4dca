//! PCA9685 register addresses and MODE1/MODE2 bit flags.

/// Mode register 1 (sleep, restart, all-call, auto-increment).
pub const MODE1: u8 = 0x00;

/// Mode register 2 address as written by the PonyBot firmware.
///
/// The datasheet places MODE2 at `0x01`; the kit's firmware has always written
/// [`OUTDRV`] to `0x00`, the same address as [`MODE1`], and boards are known to work
/// that way. Kept as the default until verified on hardware. Use
/// [`MODE2_DATASHEET`] through
/// [`Pca9685Config::mode2_register`](super::Pca9685Config::mode2_register) to opt in.
pub const MODE2: u8 = 0x00;

/// Mode register 2 address from the PCA9685 datasheet.
pub const MODE2_DATASHEET: u8 = 0x01;

/// Clock prescaler; only writable while [`SLEEP`] is set.
pub const PRESCALE: u8 = 0xFE;

/// Channel 0 "on" counter, low byte.
pub const LED0_ON_L: u8 = 0x06;
/// Channel 0 "on" counter, high byte.
pub const LED0_ON_H: u8 = 0x07;
/// Channel 0 "off" counter, low byte.
pub const LED0_OFF_L: u8 = 0x08;
/// Channel 0 "off" counter, high byte.
pub const LED0_OFF_H: u8 = 0x09;

/// Register stride between consecutive channels.
pub const CHANNEL_STRIDE: u8 = 4;

/// Broadcast "on" counter for every channel, low byte.
pub const ALL_LED_ON_L: u8 = 0xFA;
/// Broadcast "on" counter for every channel, high byte.
pub const ALL_LED_ON_H: u8 = 0xFB;
/// Broadcast "off" counter for every channel, low byte.
pub const ALL_LED_OFF_L: u8 = 0xFC;
/// Broadcast "off" counter for every channel, high byte.
pub const ALL_LED_OFF_H: u8 = 0xFD;

/// MODE1: restart PWM channels after leaving sleep.
pub const RESTART: u8 = 0x80;
/// MODE1: oscillator off; required to change the prescale.
pub const SLEEP: u8 = 0x10;
/// MODE1: respond to the all-call address.
pub const ALLCALL: u8 = 0x01;
/// MODE2: totem-pole outputs instead of open drain.
pub const OUTDRV: u8 = 0x04;
/// MODE1 value written to reset the chip.
pub const RESET: u8 = 0x00;

/// Bit 12 of an on/off counter: full-on or full-off override.
pub const FULL: u16 = 0x1000;

/// Internal oscillator frequency in Hz.
pub const OSCILLATOR_HZ: u32 = 25_000_000;

/// Ticks per PWM period.
pub const TICKS_PER_PERIOD: u32 = 4096;

/// Smallest prescale the chip accepts.
pub const PRESCALE_MIN: u8 = 3;
