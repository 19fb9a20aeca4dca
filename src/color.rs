//! A device abstraction for the PonyBot's RGB color sensor (TCS34725 compatible).
//!
//! See [`ColorSensor`] for usage example.

use core::ops::RangeInclusive;

use embedded_hal::i2c::I2c;

use crate::{Error, Result};

/// Default bus address of the color sensor.
pub const COLOR_ADDRESS_DEFAULT: u8 = 0x29;

/// Default sensitivity for [`ColorSensor::is_color`].
pub const COLOR_THRESHOLD_DEFAULT: u8 = 40;

/// Below this clear-channel reading there is too little light to classify.
pub const CLEAR_MIN: u16 = 100;

const COMMAND: u8 = 0x80;
const ENABLE: u8 = 0x00;
const ATIME: u8 = 0x01;
const CDATA: u8 = 0x14;
const CHANNEL_REGISTERS: [u8; 4] = [CDATA, 0x16, 0x18, 0x1A];

const POWER_ON: u8 = 0x01;
const RGBC_ENABLE: u8 = 0x02;
// 103 ms integration.
const ATIME_DEFAULT: u8 = 0xD5;

/// A color [`ColorSensor::is_color`] can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    /// Red dominates green and blue.
    Red,
    /// Green dominates red and blue.
    Green,
    /// Blue dominates red and green.
    Blue,
    /// Red and green together dominate blue.
    Yellow,
}

impl Color {
    /// Classify a normalized reading (see [`ColorSensor::rgb`]).
    ///
    /// `threshold` (0–255) is how far the dominant channel's share must lead the others;
    /// larger is stricter. Returns `false` when `clear` is below [`CLEAR_MIN`] or the
    /// reading is black.
    #[must_use]
    pub fn matches(self, rgb: [u16; 3], clear: u16, threshold: u8) -> bool {
        if clear < CLEAR_MIN {
            return false;
        }
        let [red, green, blue] = rgb.map(f32::from);
        let total = red + green + blue;
        if total <= 0.0 {
            return false;
        }
        let (red, green, blue) = (red / total, green / total, blue / total);
        let margin = f32::from(threshold) / 255.0;

        match self {
            Self::Red => red > green + margin && red > blue + margin && red > 0.4,
            Self::Green => green > red + margin && green > blue + margin && green > 0.4,
            Self::Blue => blue > red + margin && blue > green + margin * 0.8 && blue > 0.35,
            Self::Yellow => {
                let gap = if red > green { red - green } else { green - red };
                red > blue + margin && green > blue + margin && gap < 0.1 && red + green > 0.6
            }
        }
    }
}

/// Scale red, green, and blue to 0–255 against the clear channel.
///
/// A zero clear reading gives `[0, 0, 0]`.
#[must_use]
pub fn normalize(raw: [u16; 4]) -> [u16; 3] {
    let [clear, red, green, blue] = raw;
    [red, green, blue].map(|channel| {
        u32::from(channel)
            .saturating_mul(255)
            .checked_div(u32::from(clear))
            .map_or(0, |scaled| u16::try_from(scaled).unwrap_or(u16::MAX))
    })
}

/// ATIME register value for an integration time: `255 - ms / 2.4`, saturated to 0..=255.
///
/// NaN maps to the power-up ATIME (0xD5, about 103 ms) rather than the longest setting.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "float-to-int `as` truncates and saturates, which is the register's range"
)]
pub fn integration_time_to_atime(ms: f32) -> u8 {
    if ms.is_nan() {
        return ATIME_DEFAULT;
    }
    (255.0 - ms / 2.4) as u8
}

/// A device abstraction for a TCS34725 RGB color sensor.
///
/// The sensor is powered up on the first call that touches it.
///
/// # Example
///
/// ```rust,no_run
/// use embedded_hal::i2c::I2c;
/// use ponybot_envoy::Result;
/// use ponybot_envoy::color::{COLOR_THRESHOLD_DEFAULT, Color, ColorSensor};
///
/// fn example(i2c: impl I2c) -> Result<()> {
///     let mut color = ColorSensor::new(i2c);
///     color.set_integration_time(50.0)?;
///     let [red, green, blue] = color.rgb()?;
///     if color.is_color(Color::Red, COLOR_THRESHOLD_DEFAULT)? {
///         // stop at the red line
///     }
///     let skin_tone = color.is_in_range(120..=255, 60..=180, 40..=160)?;
///     Ok(())
/// }
/// ```
pub struct ColorSensor<I2C> {
    i2c: I2C,
    address: u8,
    is_setup: bool,
}

impl<I2C: I2c> ColorSensor<I2C> {
    /// Sensor at the default address.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub const fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, COLOR_ADDRESS_DEFAULT)
    }

    /// Sensor at a custom address.
    #[must_use]
    pub const fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            is_setup: false,
        }
    }

    /// Power the sensor and start RGBC conversions, once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault; setup is retried on the next call.
    pub fn setup(&mut self) -> Result<()> {
        if self.is_setup {
            return Ok(());
        }
        self.write_register(ENABLE, POWER_ON | RGBC_ENABLE)?;
        self.write_register(ATIME, ATIME_DEFAULT)?;
        self.is_setup = true;
        debug!("color sensor ready at {=u8:#x}", self.address);
        Ok(())
    }

    /// Set the integration time in milliseconds (2.4–612 ms; longer is more sensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn set_integration_time(&mut self, ms: f32) -> Result<()> {
        self.setup()?;
        self.write_register(ATIME, integration_time_to_atime(ms))
    }

    /// One reading of `[clear, red, green, blue]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn raw(&mut self) -> Result<[u16; 4]> {
        self.setup()?;
        let mut reading = [0; 4];
        for (value, register) in reading.iter_mut().zip(CHANNEL_REGISTERS) {
            let mut bytes = [0; 2];
            self.i2c
                .write_read(self.address, &[COMMAND | register], &mut bytes)
                .map_err(Error::bus)?;
            *value = u16::from_le_bytes(bytes);
        }
        trace!("color raw={}", reading);
        Ok(reading)
    }

    /// Clear-channel brightness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn light(&mut self) -> Result<u16> {
        let [clear, ..] = self.raw()?;
        Ok(clear)
    }

    /// Red, green, and blue scaled to 0–255 against the clear channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn rgb(&mut self) -> Result<[u16; 3]> {
        Ok(normalize(self.raw()?))
    }

    /// Whether the sensor currently sees `color`; see [`Color::matches`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn is_color(&mut self, color: Color, threshold: u8) -> Result<bool> {
        let raw = self.raw()?;
        let [clear, ..] = raw;
        Ok(color.matches(normalize(raw), clear, threshold))
    }

    /// Whether each normalized channel falls inside its range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn is_in_range(
        &mut self,
        red: RangeInclusive<u16>,
        green: RangeInclusive<u16>,
        blue: RangeInclusive<u16>,
    ) -> Result<bool> {
        let [red_level, green_level, blue_level] = self.rgb()?;
        Ok(red.contains(&red_level) && green.contains(&green_level) && blue.contains(&blue_level))
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[COMMAND | register, value])
            .map_err(Error::bus)
    }
}
