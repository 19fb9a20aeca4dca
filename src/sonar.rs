//! A device abstraction for the PonyBot's ultrasonic distance sensor (HC-SR04 style).
//!
//! See [`Sonar`] for usage example.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::{Error, Result};

/// How long to wait for an echo before giving up (microseconds).
pub const SONAR_TIMEOUT_US_DEFAULT: u32 = 30_000;

/// Closest distance the sensor reports reliably (cm).
pub const DISTANCE_MIN_CM: u16 = 2;

/// Farthest distance the sensor reports reliably (cm).
pub const DISTANCE_MAX_CM: u16 = 400;

/// Times the echo pin's next high pulse.
///
/// Implemented for `embassy_rp::gpio::Input` on board builds.
pub trait EchoPulse {
    /// Wait for the pin to go high, then time how long it stays high.
    ///
    /// Returns `None` if either wait exceeds `timeout_us`.
    fn time_high_pulse_us(&mut self, timeout_us: u32) -> Option<u32>;
}

#[cfg(any(feature = "pico1", feature = "pico2"))]
impl EchoPulse for embassy_rp::gpio::Input<'_> {
    fn time_high_pulse_us(&mut self, timeout_us: u32) -> Option<u32> {
        use embassy_time::{Duration, Instant};

        let timeout = Duration::from_micros(u64::from(timeout_us));
        let waiting_since = Instant::now();
        while self.is_low() {
            if waiting_since.elapsed() > timeout {
                return None;
            }
        }
        let rose_at = Instant::now();
        while self.is_high() {
            if rose_at.elapsed() > timeout {
                return None;
            }
        }
        u32::try_from(rose_at.elapsed().as_micros()).ok()
    }
}

/// Distance for an echo round trip: `duration_us * 0.017`, truncated, or `None`
/// outside 2–400 cm.
#[must_use]
pub fn echo_to_cm(duration_us: u32) -> Option<u16> {
    let cm = u64::from(duration_us).saturating_mul(17) / 1_000;
    u16::try_from(cm)
        .ok()
        .filter(|cm| (DISTANCE_MIN_CM..=DISTANCE_MAX_CM).contains(cm))
}

/// A device abstraction for an ultrasonic distance sensor.
///
/// # Example
///
/// ```rust,no_run
/// use embedded_hal::{delay::DelayNs, digital::OutputPin};
/// use ponybot_envoy::Result;
/// use ponybot_envoy::sonar::{EchoPulse, Sonar};
///
/// fn example(trigger: impl OutputPin, echo: impl EchoPulse, delay: impl DelayNs) -> Result<()> {
///     let mut sonar = Sonar::new(trigger, echo, delay);
///     match sonar.measure_cm()? {
///         Some(cm) if cm < 15 => { /* obstacle ahead */ }
///         Some(_) => { /* clear */ }
///         None => { /* no echo, or out of range */ }
///     }
///     Ok(())
/// }
/// ```
pub struct Sonar<T, E, D> {
    trigger: T,
    echo: E,
    delay: D,
    timeout_us: u32,
}

impl<T: OutputPin, E: EchoPulse, D: DelayNs> Sonar<T, E, D> {
    /// Sonar with the default 30 ms echo timeout.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub const fn new(trigger: T, echo: E, delay: D) -> Self {
        Self::with_timeout_us(trigger, echo, delay, SONAR_TIMEOUT_US_DEFAULT)
    }

    /// Sonar with a custom echo timeout.
    #[must_use]
    pub const fn with_timeout_us(trigger: T, echo: E, delay: D, timeout_us: u32) -> Self {
        Self {
            trigger,
            echo,
            delay,
            timeout_us,
        }
    }

    /// Fire one ping and return the distance in whole centimeters.
    ///
    /// Returns `Ok(None)` when no echo arrives in time or the distance falls outside
    /// 2–400 cm.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pin`] if the trigger pin fails.
    pub fn measure_cm(&mut self) -> Result<Option<u16>> {
        self.trigger.set_low().map_err(Error::pin)?;
        self.delay.delay_us(2);
        self.trigger.set_high().map_err(Error::pin)?;
        self.delay.delay_us(10);
        self.trigger.set_low().map_err(Error::pin)?;

        let Some(duration_us) = self.echo.time_high_pulse_us(self.timeout_us) else {
            debug!("sonar: echo timeout");
            return Ok(None);
        };
        let distance = echo_to_cm(duration_us);
        trace!("sonar: echo={}us distance={}", duration_us, distance);
        Ok(distance)
    }

    /// Give back the pins and delay.
    pub fn release(self) -> (T, E, D) {
        (self.trigger, self.echo, self.delay)
    }
}
