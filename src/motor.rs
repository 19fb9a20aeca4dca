//! A device abstraction for the PonyBot's four DC motors, driven through the PCA9685.
//!
//! Each motor's H-bridge takes two PWM channels, one per rotation direction, so a signed
//! speed picks the channel and its magnitude picks the duty. There is no separate
//! direction pin.
//!
//! See [`Motors`] for usage example.

use core::str::FromStr;

use crate::pwm::{Channel, DUTY_MAX, SetDuty};
use crate::{Error, Result};

/// PWM frequency the PonyBot firmware uses for its motors.
pub const MOTOR_FREQ_HZ_DEFAULT: u16 = 1_000;

/// Number of motors on the board.
pub const MOTOR_COUNT: usize = 4;

/// Largest speed magnitude, in percent.
pub const SPEED_MAX: i16 = 100;

// ============================================================================
// MotorChannelMap - which channels drive which motor
// ============================================================================

/// Forward and reverse channel for each of motors 1–4.
///
/// The default matches the PonyBot board wiring:
/// motor 1 → (7, 6), motor 2 → (5, 4), motor 3 → (2, 3), motor 4 → (0, 1).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorChannelMap([(Channel, Channel); MOTOR_COUNT]);

impl MotorChannelMap {
    /// Channel pairs `(forward, reverse)` for motors 1, 2, 3, 4 in that order.
    #[must_use]
    pub const fn new(pairs: [(Channel, Channel); MOTOR_COUNT]) -> Self {
        Self(pairs)
    }

    /// `(forward, reverse)` channels for a motor, or `None` outside 1..=4.
    #[must_use]
    pub fn channels(&self, motor: u8) -> Option<(Channel, Channel)> {
        usize::from(motor)
            .checked_sub(1)
            .and_then(|slot| self.0.get(slot))
            .copied()
    }
}

impl Default for MotorChannelMap {
    fn default() -> Self {
        Self([
            (Channel::from_const(7), Channel::from_const(6)),
            (Channel::from_const(5), Channel::from_const(4)),
            (Channel::from_const(2), Channel::from_const(3)),
            (Channel::from_const(0), Channel::from_const(1)),
        ])
    }
}

// ============================================================================
// Direction - skid-steer directions
// ============================================================================

/// Named four-wheel (skid-steer) direction for [`Motors::drive`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// All wheels forward.
    Forward,
    /// All wheels backward.
    Backward,
    /// Motors 1 and 2 forward, 3 and 4 backward.
    Left,
    /// Motors 1 and 2 backward, 3 and 4 forward.
    Right,
    /// All wheels off.
    Stop,
}

impl Direction {
    /// Per-motor sign (motors 1–4) for this direction.
    #[must_use]
    pub const fn signs(self) -> [i8; MOTOR_COUNT] {
        match self {
            Self::Forward => [1, 1, 1, 1],
            Self::Backward => [-1, -1, -1, -1],
            Self::Left => [1, 1, -1, -1],
            Self::Right => [-1, -1, 1, 1],
            Self::Stop => [0, 0, 0, 0],
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "stop" => Ok(Self::Stop),
            _ => Err(Error::InvalidDirection),
        }
    }
}

// ============================================================================
// Mecanum keypad table
// ============================================================================

// Keypad layout, codes 1..=9 at index code - 1:
//   7 ↖  8 ↑  9 ↗
//   4 ←  5 ■  6 →
//   1 ↙  2 ↓  3 ↘
const MECANUM_SIGNS: [[i8; MOTOR_COUNT]; 9] = [
    [0, -1, 0, -1], // 1: backward-left
    [-1, -1, -1, -1], // 2: backward
    [-1, 0, -1, 0], // 3: backward-right
    [1, -1, 1, -1], // 4: strafe left
    [0, 0, 0, 0],   // 5: stop
    [-1, 1, -1, 1], // 6: strafe right
    [1, 0, 1, 0],   // 7: forward-left
    [1, 1, 1, 1],   // 8: forward
    [0, 1, 0, 1],   // 9: forward-right
];

/// Per-motor sign (motors 1–4) for a mecanum keypad code.
///
/// # Errors
///
/// Returns [`Error::InvalidDirectionCode`] unless `code` is 1..=9.
pub fn mecanum_signs(code: u8) -> Result<[i8; MOTOR_COUNT]> {
    usize::from(code)
        .checked_sub(1)
        .and_then(|slot| MECANUM_SIGNS.get(slot))
        .copied()
        .ok_or(Error::InvalidDirectionCode { code })
}

/// Signed per-motor speeds for a sign vector at a (clamped) speed.
#[must_use]
pub fn scale_signs(signs: [i8; MOTOR_COUNT], speed: i16) -> [i16; MOTOR_COUNT] {
    let speed = speed.clamp(0, SPEED_MAX);
    signs.map(|sign| i16::from(sign).saturating_mul(speed))
}

/// Signed per-motor speeds `drive` would apply.
///
/// ```rust
/// use ponybot_envoy::motor::{Direction, speeds_for};
///
/// assert_eq!(speeds_for(Direction::Left, 60), [60, 60, -60, -60]);
/// assert_eq!(speeds_for(Direction::Right, 150), [-100, -100, 100, 100]);
/// ```
#[must_use]
pub fn speeds_for(direction: Direction, speed: i16) -> [i16; MOTOR_COUNT] {
    scale_signs(direction.signs(), speed)
}

/// Signed per-motor speeds `mecanum` would apply.
///
/// # Errors
///
/// Returns [`Error::InvalidDirectionCode`] unless `code` is 1..=9.
pub fn mecanum_speeds(code: u8, speed: i16) -> Result<[i16; MOTOR_COUNT]> {
    Ok(scale_signs(mecanum_signs(code)?, speed))
}

/// Duty value for a speed percentage: `round(|speed| * 40.95)`, so 100% → 4095.
#[must_use]
pub fn speed_to_duty(speed_percent: i16) -> u16 {
    let magnitude = speed_percent.clamp(-SPEED_MAX, SPEED_MAX).unsigned_abs();
    // magnitude <= 100, so this stays well inside u32 and the result inside 0..=4095.
    let duty = u32::from(magnitude)
        .saturating_mul(u32::from(DUTY_MAX))
        .saturating_add(50)
        / 100;
    u16::try_from(duty).unwrap_or(DUTY_MAX)
}

// ============================================================================
// Motors
// ============================================================================

/// A device abstraction for the PonyBot's four DC motors.
///
/// Speeds are open-loop percentages: positive runs the forward channel, negative the
/// reverse channel, zero turns both off.
///
/// # Example
///
/// ```rust,no_run
/// use embedded_hal::{delay::DelayNs, i2c::I2c};
/// use ponybot_envoy::Result;
/// use ponybot_envoy::motor::{Direction, MOTOR_FREQ_HZ_DEFAULT, Motors};
/// use ponybot_envoy::pwm::{Pca9685, Pca9685Config};
///
/// fn example(i2c: impl I2c, delay: impl DelayNs) -> Result<()> {
///     let mut pca = Pca9685::new(i2c, delay, Pca9685Config::default())?;
///     pca.set_frequency(MOTOR_FREQ_HZ_DEFAULT)?;
///
///     let mut motors = Motors::new(&mut pca);
///     motors.set_speed(1, -30)?; // motor 1 in reverse at 30%
///     motors.drive(Direction::Left, 60)?; // skid-steer left turn
///     motors.drive("forward".parse()?, 50)?;
///     motors.mecanum(6, 40)?; // strafe right
///     motors.stop()?;
///     Ok(())
/// }
/// ```
pub struct Motors<P> {
    pwm: P,
    channels: MotorChannelMap,
}

impl<P: SetDuty> Motors<P> {
    /// Motors on the board's default channel wiring.
    ///
    /// See the [struct-level example](Self) for usage.
    #[must_use]
    pub fn new(pwm: P) -> Self {
        Self::with_channels(pwm, MotorChannelMap::default())
    }

    /// Motors on custom channel wiring.
    #[must_use]
    pub const fn with_channels(pwm: P, channels: MotorChannelMap) -> Self {
        Self { pwm, channels }
    }

    /// The channel wiring in use.
    #[must_use]
    pub const fn channels(&self) -> &MotorChannelMap {
        &self.channels
    }

    /// Run one motor (1–4) at a signed speed percentage, clamped to -100..=100.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMotor`] (before any bus traffic) for a motor outside 1..=4,
    /// or any error from the PWM chip.
    pub fn set_speed(&mut self, motor: u8, speed_percent: i16) -> Result<()> {
        let (forward, reverse) = self
            .channels
            .channels(motor)
            .ok_or(Error::UnknownMotor { motor })?;
        let duty = speed_to_duty(speed_percent);
        let (forward_duty, reverse_duty) = match speed_percent.signum() {
            1 => (duty, 0),
            -1 => (0, duty),
            _ => (0, 0),
        };
        debug!("motor {} speed={} duty={}", motor, speed_percent, duty);
        self.pwm.set_duty(forward, forward_duty)?;
        self.pwm.set_duty(reverse, reverse_duty)
    }

    /// Drive all four motors in a skid-steer direction at `speed` (clamped to 0..=100).
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns any error from the PWM chip.
    pub fn drive(&mut self, direction: Direction, speed: i16) -> Result<()> {
        debug!("drive {} speed={}", direction, speed);
        self.apply(speeds_for(direction, speed))
    }

    /// Drive mecanum wheels by keypad code (1–9) at `speed` (clamped to 0..=100).
    ///
    /// Codes follow a phone keypad: 8/2 forward/backward, 4/6 strafe left/right,
    /// 7/9/1/3 diagonals, 5 stop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirectionCode`] (before any bus traffic) unless `code`
    /// is 1..=9, or any error from the PWM chip.
    pub fn mecanum(&mut self, code: u8, speed: i16) -> Result<()> {
        let speeds = mecanum_speeds(code, speed)?;
        debug!("mecanum code={} speed={}", code, speed);
        self.apply(speeds)
    }

    /// Turn every motor off.
    ///
    /// # Errors
    ///
    /// Returns any error from the PWM chip.
    pub fn stop(&mut self) -> Result<()> {
        self.drive(Direction::Stop, 0)
    }

    /// Give back the PWM handle.
    pub fn release(self) -> P {
        self.pwm
    }

    fn apply(&mut self, speeds: [i16; MOTOR_COUNT]) -> Result<()> {
        for (motor, speed) in (1..).zip(speeds) {
            self.set_speed(motor, speed)?;
        }
        Ok(())
    }
}
