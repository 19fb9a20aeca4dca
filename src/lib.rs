//! Device abstractions for the PonyBot robotics kit on Pico 1 and 2.
//!
//! The kit's motor and servo outputs hang off a PCA9685 PWM chip on the two-wire (I²C) bus.
//! [`pwm::Pca9685`] owns that chip; [`motor::Motors`] and [`servo::Servos`] drive it.
//! The sonar, OLED, and color sensor are independent shims.
//!
//! # Glossary
//!
//! - **Duty value:** how many of the chip's 4096 ticks per period an output is driven high (0–4095).
//! - **Prescale:** clock divider that sets the chip's PWM frequency.
//! - **All-call:** chip feature letting one bus write address every PCA9685 on the bus.
//! - **Mecanum wheel:** wheel with angled rollers, letting a four-wheel robot strafe and move diagonally.
//! - **Skid-steer:** steering by driving the left and right wheels at different speeds.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Compile-time checks: exactly one architecture must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "arm", feature = "riscv")), not(feature = "host")))]
compile_error!("Must enable exactly one architecture feature: 'arm' or 'riscv'");

#[cfg(all(feature = "arm", feature = "riscv"))]
compile_error!("Cannot enable both 'arm' and 'riscv' features simultaneously");

// Compile-time check: pico1 only supports ARM
#[cfg(all(feature = "pico1", feature = "riscv"))]
compile_error!("Pico 1 (RP2040) only supports ARM architecture, not RISC-V");

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

pub mod color;
mod error;
pub mod motor;
pub mod oled;
pub mod pwm;
pub mod servo;
pub mod sonar;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
