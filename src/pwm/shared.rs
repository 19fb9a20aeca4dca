//! One PCA9685 shared by the motor and servo mappers.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{Channel, Pca9685, SetDuty};
use crate::Result;

/// A [`Pca9685`] behind a blocking mutex, so several mappers can hold `&SharedPca9685`.
///
/// Each duty write holds the lock for all four of the channel's register writes, so
/// two writers never interleave a half-written on/off pair. Pick
/// `CriticalSectionRawMutex` when interrupts or other executors also write, or
/// `NoopRawMutex` when everything runs in one context.
///
/// # Example
///
/// ```rust,no_run
/// use embassy_sync::blocking_mutex::raw::NoopRawMutex;
/// use embedded_hal::{delay::DelayNs, i2c::I2c};
/// use ponybot_envoy::Result;
/// use ponybot_envoy::motor::Motors;
/// use ponybot_envoy::pwm::{self, Pca9685, Pca9685Config};
/// use ponybot_envoy::servo::{ServoCalibration, Servos};
///
/// fn example(i2c: impl I2c, delay: impl DelayNs) -> Result<()> {
///     let pca = Pca9685::new(i2c, delay, Pca9685Config::default())?;
///     let shared = pwm::share::<NoopRawMutex, _, _>(pca);
///
///     let mut motors = Motors::new(&shared);
///     let mut servos = Servos::new(&shared, ServoCalibration::default());
///     motors.set_speed(1, 40)?;
///     servos.set_angle(1, 90)?;
///     Ok(())
/// }
/// ```
pub type SharedPca9685<M, I2C, D> = Mutex<M, RefCell<Pca9685<I2C, D>>>;

/// Wrap a [`Pca9685`] for sharing. See [`SharedPca9685`] for usage.
pub const fn share<M: RawMutex, I2C, D>(pca: Pca9685<I2C, D>) -> SharedPca9685<M, I2C, D> {
    Mutex::new(RefCell::new(pca))
}

impl<M: RawMutex, I2C: I2c, D: DelayNs> SetDuty for &SharedPca9685<M, I2C, D> {
    fn set_duty(&mut self, channel: Channel, value: u16) -> Result<()> {
        self.lock(|pca| pca.borrow_mut().set_duty(channel, value))
    }
}
