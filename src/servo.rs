//! A device abstraction for the eight hobby servos on the PonyBot board (S1–S8).
//!
//! Servos S1–S8 sit on PCA9685 channels 8–15. See [`Servos`] for usage examples.
//!
//! Use the [`servos!`] macro for a keyword-driven constructor with defaults.

use crate::pwm::{Channel, DUTY_MAX, SetDuty};
use crate::{Error, Result};

const SERVO_PERIOD_US: u32 = 20_000; // 20 ms

/// PWM frequency the servo calibration assumes.
pub const SERVO_FREQ_HZ: u16 = 50;

/// Default minimum pulse width for the kit's servos (microseconds).
pub const SERVO_MIN_US_DEFAULT: u16 = 600;

/// Default maximum pulse width for the kit's servos (microseconds).
pub const SERVO_MAX_US_DEFAULT: u16 = 2_400;

/// Default angle range (degrees).
pub const SERVO_DEGREES_DEFAULT: u16 = 180;

/// Number of servo sockets.
pub const SERVO_COUNT: u8 = 8;

// S1 is channel 8.
const SERVO_CHANNEL_OFFSET: u8 = 7;

/// Create [`Servos`] with keyword arguments and default calibration.
///
/// Required field: `pwm`.
///
/// Optional fields: `min_us`, `max_us`, `degrees` (defaults to [`SERVO_MIN_US_DEFAULT`],
/// [`SERVO_MAX_US_DEFAULT`], [`SERVO_DEGREES_DEFAULT`]).
///
/// See [`Servos`] for details and examples.
#[macro_export]
macro_rules! servos {
    ($($tt:tt)*) => { $crate::__servos_impl! { $($tt)* } };
}
#[doc(inline)]
pub use servos;

// Public for macro expansion in downstream crates.
#[doc(hidden)]
#[macro_export]
macro_rules! __servos_impl {
    (@__fill_defaults
        pwm: $pwm:tt,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr,
        fields: [ ]
    ) => {
        $crate::__servos_impl! {
            @__build
            pwm: $pwm,
            min_us: $min_us,
            max_us: $max_us,
            degrees: $degrees
        }
    };

    (@__fill_defaults
        pwm: $pwm:tt,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr,
        fields: [ pwm: $pwm_value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servos_impl! {
            @__fill_defaults
            pwm: $pwm_value,
            min_us: $min_us,
            max_us: $max_us,
            degrees: $degrees,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        pwm: $pwm:tt,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr,
        fields: [ min_us: $min_us_value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servos_impl! {
            @__fill_defaults
            pwm: $pwm,
            min_us: $min_us_value,
            max_us: $max_us,
            degrees: $degrees,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        pwm: $pwm:tt,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr,
        fields: [ max_us: $max_us_value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servos_impl! {
            @__fill_defaults
            pwm: $pwm,
            min_us: $min_us,
            max_us: $max_us_value,
            degrees: $degrees,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__fill_defaults
        pwm: $pwm:tt,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr,
        fields: [ degrees: $degrees_value:expr $(, $($rest:tt)*)? ]
    ) => {
        $crate::__servos_impl! {
            @__fill_defaults
            pwm: $pwm,
            min_us: $min_us,
            max_us: $max_us,
            degrees: $degrees_value,
            fields: [ $($($rest)*)? ]
        }
    };

    (@__build
        pwm: _UNSET_,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr
    ) => {
        compile_error!("servos! requires `pwm: ...`");
    };

    (@__build
        pwm: $pwm:tt,
        min_us: $min_us:expr,
        max_us: $max_us:expr,
        degrees: $degrees:expr
    ) => {
        $crate::servo::Servos::new(
            $pwm,
            $crate::servo::ServoCalibration::new($min_us, $max_us, $degrees),
        )
    };

    (
        $($fields:tt)*
    ) => {
        $crate::__servos_impl! {
            @__fill_defaults
            pwm: _UNSET_,
            min_us: $crate::servo::SERVO_MIN_US_DEFAULT,
            max_us: $crate::servo::SERVO_MAX_US_DEFAULT,
            degrees: $crate::servo::SERVO_DEGREES_DEFAULT,
            fields: [ $($fields)* ]
        }
    };
}

/// Convert a pulse width to a duty value at 50 Hz: `round(4095 * us / 20000)`, capped at 4095.
#[must_use]
#[expect(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    reason = "const fn; duty is capped at 4095 before narrowing"
)]
pub const fn pulse_us_to_duty(us: u16) -> u16 {
    let duty = (us as u32)
        .saturating_mul(DUTY_MAX as u32)
        .saturating_add(SERVO_PERIOD_US / 2)
        / SERVO_PERIOD_US;
    if duty > DUTY_MAX as u32 {
        DUTY_MAX
    } else {
        duty as u16
    }
}

/// Pulse-width calibration shared by all eight servos.
///
/// Duty values are precomputed for a 50 Hz (20 ms) period. If the shared PCA9685 runs at
/// another frequency (the motors use 1000 Hz), the angles will be wrong; nothing checks this
/// at call time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoCalibration {
    min_duty: u16,
    max_duty: u16,
    degrees: u16,
}

impl ServoCalibration {
    /// Calibration for pulses from `min_us` (0°) to `max_us` (`degrees`).
    ///
    /// `min_us > max_us` runs the servo in reverse; equal widths hold one pulse at every angle.
    ///
    /// # Panics
    ///
    /// Panics if `degrees == 0`.
    #[must_use]
    pub const fn new(min_us: u16, max_us: u16, degrees: u16) -> Self {
        assert!(degrees > 0, "degrees must be positive");
        Self {
            min_duty: pulse_us_to_duty(min_us),
            max_duty: pulse_us_to_duty(max_us),
            degrees,
        }
    }

    /// Duty value at 0°.
    #[must_use]
    pub const fn min_duty(&self) -> u16 {
        self.min_duty
    }

    /// Duty value at the full angle range.
    #[must_use]
    pub const fn max_duty(&self) -> u16 {
        self.max_duty
    }

    /// Angle range in degrees.
    #[must_use]
    pub const fn degrees(&self) -> u16 {
        self.degrees
    }

    /// Duty value for an angle, clamped to `0..=degrees`.
    ///
    /// The offset from `min_duty` truncates toward zero, so reversed ranges mirror forward ones.
    #[must_use]
    pub fn angle_to_duty(&self, angle: i16) -> u16 {
        let max_angle = i16::try_from(self.degrees).unwrap_or(i16::MAX);
        let angle = i32::from(angle.clamp(0, max_angle));
        let min_duty = i32::from(self.min_duty);
        let span = i32::from(self.max_duty).saturating_sub(min_duty);
        let offset = span
            .saturating_mul(angle)
            .checked_div(i32::from(self.degrees))
            .unwrap_or(0);
        // |offset| <= |span|, so the result stays between min_duty and max_duty.
        u16::try_from(min_duty.saturating_add(offset)).unwrap_or(0)
    }
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self::new(
            SERVO_MIN_US_DEFAULT,
            SERVO_MAX_US_DEFAULT,
            SERVO_DEGREES_DEFAULT,
        )
    }
}

/// Channel for servo S1–S8.
///
/// # Errors
///
/// Returns [`Error::ServoIndexOutOfRange`] unless `servo` is 1..=8.
pub fn servo_channel(servo: u8) -> Result<Channel> {
    if (1..=SERVO_COUNT).contains(&servo) {
        Channel::new(servo.wrapping_add(SERVO_CHANNEL_OFFSET))
    } else {
        Err(Error::ServoIndexOutOfRange { servo })
    }
}

/// A device abstraction for the eight servos on the PonyBot board.
///
/// The PCA9685 must be running at [`SERVO_FREQ_HZ`] for the angles to be right.
///
/// # Examples
///
/// ```rust,no_run
/// use embedded_hal::{delay::DelayNs, i2c::I2c};
/// use ponybot_envoy::Result;
/// use ponybot_envoy::pwm::{Pca9685, Pca9685Config};
/// use ponybot_envoy::servo::{SERVO_FREQ_HZ, servos};
///
/// fn example(i2c: impl I2c, delay: impl DelayNs) -> Result<()> {
///     let mut pca = Pca9685::new(i2c, delay, Pca9685Config::default())?;
///     pca.set_frequency(SERVO_FREQ_HZ)?;
///
///     // 270° servos with a wider pulse range; any field left out takes its default.
///     let mut servos = servos! {
///         pwm: &mut pca,
///         min_us: 500,
///         max_us: 2_500,
///         degrees: 270,
///     };
///
///     servos.set_angle(1, 45)?; // S1 (channel 8) to 45°
///     servos.center(2)?; // S2 to 135°
///     servos.release(1)?; // S1 goes limp
///     Ok(())
/// }
/// ```
pub struct Servos<P> {
    pwm: P,
    calibration: ServoCalibration,
}

impl<P: SetDuty> Servos<P> {
    /// Servos sharing one calibration.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub const fn new(pwm: P, calibration: ServoCalibration) -> Self {
        Self { pwm, calibration }
    }

    /// The calibration in use.
    #[must_use]
    pub const fn calibration(&self) -> ServoCalibration {
        self.calibration
    }

    /// Move a servo (1–8) to an angle, clamped to `0..=degrees`.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServoIndexOutOfRange`] (before any bus traffic) unless `servo` is
    /// 1..=8, or any error from the PWM chip.
    pub fn set_angle(&mut self, servo: u8, angle: i16) -> Result<()> {
        let channel = servo_channel(servo)?;
        let duty = self.calibration.angle_to_duty(angle);
        debug!("servo S{} angle={} duty={}", servo, angle, duty);
        self.pwm.set_duty(channel, duty)
    }

    /// Move a servo to the middle of its range.
    ///
    /// # Errors
    ///
    /// Same as [`set_angle`](Self::set_angle).
    pub fn center(&mut self, servo: u8) -> Result<()> {
        let half = i16::try_from(self.calibration.degrees / 2).unwrap_or(i16::MAX);
        self.set_angle(servo, half)
    }

    /// Send a raw pulse width in microseconds (at 50 Hz).
    ///
    /// # Errors
    ///
    /// Same as [`set_angle`](Self::set_angle).
    pub fn set_pulse_us(&mut self, servo: u8, us: u16) -> Result<()> {
        let channel = servo_channel(servo)?;
        self.pwm.set_duty(channel, pulse_us_to_duty(us))
    }

    /// Stop the servo's pulse, holding its output low so it relaxes.
    ///
    /// # Errors
    ///
    /// Same as [`set_angle`](Self::set_angle).
    pub fn release(&mut self, servo: u8) -> Result<()> {
        let channel = servo_channel(servo)?;
        debug!("servo S{} released", servo);
        self.pwm.set_duty(channel, 0)
    }

    /// Give back the PWM handle.
    pub fn into_inner(self) -> P {
        self.pwm
    }
}
