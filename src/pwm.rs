//! A device abstraction for the PCA9685 16-channel PWM chip on the PonyBot board.
//!
//! See [`Pca9685`] for usage example.

pub mod registers;
mod shared;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::{Error, Result};
use registers::{
    ALL_LED_OFF_H, ALL_LED_OFF_L, ALL_LED_ON_H, ALL_LED_ON_L, ALLCALL, CHANNEL_STRIDE, FULL,
    LED0_OFF_H, LED0_OFF_L, LED0_ON_H, LED0_ON_L, MODE1, MODE2, OSCILLATOR_HZ, OUTDRV, PRESCALE,
    PRESCALE_MIN, RESET, RESTART, SLEEP, TICKS_PER_PERIOD,
};

pub use shared::{SharedPca9685, share};

/// Default bus address of the PonyBot's PCA9685.
pub const PCA9685_ADDRESS_DEFAULT: u8 = 0x40;

/// Largest duty value; drives the output permanently high.
pub const DUTY_MAX: u16 = 4095;

/// Number of PWM outputs on the chip.
pub const CHANNEL_COUNT: u8 = 16;

/// Oscillator settle time after reset and after leaving sleep.
const SETTLE_MS: u32 = 5;

// ============================================================================
// Channel
// ============================================================================

/// One of the chip's 16 PWM outputs (0–15).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// Create a channel, rejecting indices above 15.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelOutOfRange`] if `index > 15`.
    pub const fn new(index: u8) -> Result<Self> {
        if index < CHANNEL_COUNT {
            Ok(Self(index))
        } else {
            Err(Error::ChannelOutOfRange { channel: index })
        }
    }

    /// Build a channel table entry known to be in range at compile time.
    pub(crate) const fn from_const(index: u8) -> Self {
        assert!(index < CHANNEL_COUNT, "channel must be 0..=15");
        Self(index)
    }

    /// Zero-based channel index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Address of this channel's `ON_L` register; `ON_H`, `OFF_L`, `OFF_H` follow it.
    const fn base_register(self) -> u8 {
        // At most 0x06 + 4 * 15 = 0x42.
        LED0_ON_L.wrapping_add(CHANNEL_STRIDE.wrapping_mul(self.0))
    }
}

// ============================================================================
// Duty and prescale math
// ============================================================================

/// Encode a duty value as the chip's `(on, off)` counter pair.
///
/// `0` and `4095` use the chip's full-off and full-on override bit, because
/// `on = 0, off = value` cannot express an output that never or always pulses.
/// Everything in between turns on at the start of the period and off `value` ticks later.
///
/// # Errors
///
/// Returns [`Error::DutyOutOfRange`] if `value > 4095`.
pub const fn duty_to_on_off(value: u16) -> Result<(u16, u16)> {
    match value {
        0 => Ok((0, FULL)),
        DUTY_MAX => Ok((FULL, 0)),
        1..DUTY_MAX => Ok((0, value)),
        _ => Err(Error::DutyOutOfRange { value }),
    }
}

/// Prescale register value for a PWM frequency.
///
/// Computes `floor(25 MHz / 4096 / freq_hz - 1 + 0.5)` exactly, in integers:
/// `(2 * 25 MHz - 4096 * freq_hz) / (2 * 4096 * freq_hz)`.
///
/// # Errors
///
/// Returns [`Error::FrequencyOutOfRange`] for 0 Hz or for a result outside 3..=255
/// (roughly 24–1740 Hz).
pub fn prescale_for(freq_hz: u16) -> Result<u8> {
    let out_of_range = Error::FrequencyOutOfRange { freq_hz };
    let ticks_hz = TICKS_PER_PERIOD
        .checked_mul(u32::from(freq_hz))
        .filter(|&ticks_hz| ticks_hz > 0)
        .ok_or(out_of_range)?;
    let numerator = (2 * OSCILLATOR_HZ)
        .checked_sub(ticks_hz)
        .ok_or(out_of_range)?;
    let prescale = numerator
        .checked_div(ticks_hz.saturating_mul(2))
        .ok_or(out_of_range)?;
    u8::try_from(prescale)
        .ok()
        .filter(|&prescale| prescale >= PRESCALE_MIN)
        .ok_or(out_of_range)
}

// ============================================================================
// SetDuty - what the motor and servo mappers need
// ============================================================================

/// Anything that can set a PWM channel's duty value.
///
/// [`Motors`](crate::motor::Motors) and [`Servos`](crate::servo::Servos) are generic over this,
/// so they can drive a [`Pca9685`] directly (`&mut pca`) or through a [`SharedPca9685`]
/// (`&shared`) when both mappers need the same chip.
pub trait SetDuty {
    /// Set `channel` to `value` (0–4095).
    ///
    /// # Errors
    ///
    /// Returns [`Error::DutyOutOfRange`] if `value > 4095`, or [`Error::Bus`] on a bus fault.
    fn set_duty(&mut self, channel: Channel, value: u16) -> Result<()>;
}

impl<T: SetDuty + ?Sized> SetDuty for &mut T {
    fn set_duty(&mut self, channel: Channel, value: u16) -> Result<()> {
        (**self).set_duty(channel, value)
    }
}

// ============================================================================
// Pca9685
// ============================================================================

/// Bus-level settings for a [`Pca9685`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pca9685Config {
    /// 7-bit bus address (default `0x40`).
    pub address: u8,
    /// Register that receives [`OUTDRV`] during initialization (default [`MODE2`]).
    ///
    /// See [`registers::MODE2`] for why this is configurable.
    pub mode2_register: u8,
}

impl Default for Pca9685Config {
    fn default() -> Self {
        Self {
            address: PCA9685_ADDRESS_DEFAULT,
            mode2_register: MODE2,
        }
    }
}

/// A device abstraction for the PCA9685 PWM chip.
///
/// Construction runs the chip's reset, configure, and wake sequence (about 10 ms of
/// settle delay), so every `Pca9685` is ready for duty writes.
///
/// # Example
///
/// ```rust,no_run
/// use embedded_hal::{delay::DelayNs, i2c::I2c};
/// use ponybot_envoy::Result;
/// use ponybot_envoy::pwm::{Channel, Pca9685, Pca9685Config};
///
/// fn example(i2c: impl I2c, delay: impl DelayNs) -> Result<()> {
///     let mut pca = Pca9685::new(i2c, delay, Pca9685Config::default())?;
///     pca.set_frequency(1_000)?; // motor PWM
///
///     let channel = Channel::new(7)?;
///     pca.set_duty(channel, 2_048)?; // about half on
///     pca.set_duty(channel, 0)?; // fully off
///     Ok(())
/// }
/// ```
pub struct Pca9685<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Pca9685Config,
}

impl<I2C: I2c, D: DelayNs> Pca9685<I2C, D> {
    /// Take ownership of the bus and a delay, then initialize the chip.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if any initialization write fails.
    pub fn new(i2c: I2C, delay: D, config: Pca9685Config) -> Result<Self> {
        let mut pca = Self { i2c, delay, config };
        pca.initialize()?;
        Ok(pca)
    }

    /// Reset every channel to off, enable totem-pole outputs and all-call, then wake.
    fn initialize(&mut self) -> Result<()> {
        info!(
            "pca9685 init addr={=u8:#x} mode2_reg={=u8:#x}",
            self.config.address,
            self.config.mode2_register
        );
        self.write_register(MODE1, RESET)?;
        self.set_all(0, 0)?;
        self.write_register(self.config.mode2_register, OUTDRV)?;
        self.write_register(MODE1, ALLCALL)?;
        self.delay.delay_ms(SETTLE_MS);

        let mode1 = self.read_register(MODE1)?;
        self.write_register(MODE1, mode1 & !SLEEP)?;
        self.delay.delay_ms(SETTLE_MS);
        Ok(())
    }

    /// Set the PWM frequency for all channels.
    ///
    /// The chip sleeps while the prescale changes, then restarts; duty values set
    /// before the change keep running afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrequencyOutOfRange`] (before any bus traffic) if the frequency
    /// does not fit the prescale register, or [`Error::Bus`] on a bus fault.
    pub fn set_frequency(&mut self, freq_hz: u16) -> Result<()> {
        let prescale = prescale_for(freq_hz)?;
        let old_mode = self.read_register(MODE1)?;
        let sleep_mode = (old_mode & !RESTART) | SLEEP;
        self.write_register(MODE1, sleep_mode)?;
        self.write_register(PRESCALE, prescale)?;
        self.write_register(MODE1, old_mode)?;
        self.delay.delay_ms(SETTLE_MS);
        self.write_register(MODE1, old_mode | RESTART)?;
        info!("pca9685 frequency={}Hz prescale={}", freq_hz, prescale);
        Ok(())
    }

    /// Set a channel's duty value (0 = always off, 4095 = always on).
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DutyOutOfRange`] (before any bus traffic) if `value > 4095`,
    /// or [`Error::Bus`] on a bus fault.
    pub fn set_duty(&mut self, channel: Channel, value: u16) -> Result<()> {
        let (on, off) = duty_to_on_off(value)?;
        trace!("pca9685 ch{} duty={}", channel.index(), value);
        self.set_pwm(channel, on, off)
    }

    /// Write a channel's raw on/off counters.
    ///
    /// Four single-register writes; a bus fault partway leaves the channel with a mix
    /// of old and new counters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn set_pwm(&mut self, channel: Channel, on: u16, off: u16) -> Result<()> {
        let base = channel.base_register();
        let [on_low, on_high] = on.to_le_bytes();
        let [off_low, off_high] = off.to_le_bytes();
        self.write_register(base, on_low)?;
        self.write_register(base.wrapping_add(LED0_ON_H - LED0_ON_L), on_high)?;
        self.write_register(base.wrapping_add(LED0_OFF_L - LED0_ON_L), off_low)?;
        self.write_register(base.wrapping_add(LED0_OFF_H - LED0_ON_L), off_high)
    }

    /// Write the broadcast on/off counters, setting every channel at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn set_all(&mut self, on: u16, off: u16) -> Result<()> {
        let [on_low, on_high] = on.to_le_bytes();
        let [off_low, off_high] = off.to_le_bytes();
        self.write_register(ALL_LED_ON_L, on_low)?;
        self.write_register(ALL_LED_ON_H, on_high)?;
        self.write_register(ALL_LED_OFF_L, off_low)?;
        self.write_register(ALL_LED_OFF_H, off_high)
    }

    /// Settings this chip was initialized with.
    #[must_use]
    pub const fn config(&self) -> Pca9685Config {
        self.config
    }

    /// Give back the bus and delay. Channels keep their last duty values.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
        self.i2c
            .write(self.config.address, &[register, value])
            .map_err(Error::bus)
    }

    fn read_register(&mut self, register: u8) -> Result<u8> {
        let mut value = [0_u8];
        self.i2c
            .write_read(self.config.address, &[register], &mut value)
            .map_err(Error::bus)?;
        let [value] = value;
        Ok(value)
    }
}

impl<I2C: I2c, D: DelayNs> SetDuty for Pca9685<I2C, D> {
    fn set_duty(&mut self, channel: Channel, value: u16) -> Result<()> {
        Self::set_duty(self, channel, value)
    }
}
