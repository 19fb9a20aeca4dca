//! Error and result types shared by every device in the crate.

use derive_more::{Display, Error};
use embedded_hal::{digital, i2c};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by PonyBot devices.
///
/// Argument checks (duty, channel, motor, direction, servo) fail before any bus traffic,
/// so a rejected call leaves the chip untouched. Bus and pin faults are passed through
/// as they happen; a multi-register write that fails partway is not rolled back.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Duty value above 4095.
    #[display("duty value {value} is outside 0..=4095")]
    DutyOutOfRange {
        /// The rejected duty value.
        value: u16,
    },

    /// PWM channel above 15.
    #[display("PWM channel {channel} is outside 0..=15")]
    ChannelOutOfRange {
        /// The rejected channel index.
        channel: u8,
    },

    /// Frequency whose prescale does not fit the chip's 3..=255 register.
    #[display("PWM frequency {freq_hz} Hz is outside the chip's prescale range")]
    FrequencyOutOfRange {
        /// The rejected frequency.
        freq_hz: u16,
    },

    /// Motor index with no channel pair.
    #[display("motor {motor} has no channel mapping (expected 1..=4)")]
    UnknownMotor {
        /// The rejected motor index.
        motor: u8,
    },

    /// Direction name other than forward, backward, left, right, or stop.
    #[display("direction must be one of: forward, backward, left, right, stop")]
    InvalidDirection,

    /// Mecanum keypad code outside 1..=9.
    #[display("mecanum direction code {code} is outside 1..=9")]
    InvalidDirectionCode {
        /// The rejected keypad code.
        code: u8,
    },

    /// Servo index outside 1..=8.
    #[display("servo {servo} is outside 1..=8")]
    ServoIndexOutOfRange {
        /// The rejected servo index.
        servo: u8,
    },

    /// Two-wire bus fault.
    #[display("two-wire bus fault: {kind}")]
    Bus {
        /// What the bus driver reported.
        kind: i2c::ErrorKind,
    },

    /// Digital output pin fault.
    #[display("output pin fault: {kind:?}")]
    Pin {
        /// What the pin driver reported.
        kind: digital::ErrorKind,
    },
}

impl Error {
    /// Map any I²C driver error onto [`Error::Bus`].
    pub(crate) fn bus(error: impl i2c::Error) -> Self {
        Self::Bus { kind: error.kind() }
    }

    /// Map any digital pin error onto [`Error::Pin`].
    pub(crate) fn pin(error: impl digital::Error) -> Self {
        Self::Pin { kind: error.kind() }
    }
}
