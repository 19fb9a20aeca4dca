#![allow(missing_docs)]
#![allow(clippy::indexing_slicing, reason = "fixed-size frame buffers")]
//! Host-level tests for the sonar, OLED, and color sensor shims.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{Point, Primitive};
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::Drawable;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use ponybot_envoy::color::{Color, ColorSensor};
use ponybot_envoy::oled::Oled;
use ponybot_envoy::oled::font::FONT_5X7;
use ponybot_envoy::sonar::{EchoPulse, SONAR_TIMEOUT_US_DEFAULT, Sonar};
use ponybot_envoy::{Error, Result};

// ============================================================================
// Sonar
// ============================================================================

/// Replays one echo and remembers the timeout it was asked to honor.
struct FakeEcho {
    pulse_us: Option<u32>,
    timeouts: Vec<u32>,
}

impl FakeEcho {
    fn new(pulse_us: Option<u32>) -> Self {
        Self {
            pulse_us,
            timeouts: Vec::new(),
        }
    }
}

impl EchoPulse for FakeEcho {
    fn time_high_pulse_us(&mut self, timeout_us: u32) -> Option<u32> {
        self.timeouts.push(timeout_us);
        self.pulse_us
    }
}

/// Records each delay in nanoseconds.
#[derive(Default)]
struct RecordingDelay {
    delays_ns: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(ns);
    }
}

fn trigger_pulse() -> [PinTransaction; 3] {
    [
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]
}

#[test]
fn sonar_pulses_trigger_and_converts_echo() -> Result<()> {
    let mut trigger = PinMock::new(&trigger_pulse());
    let mut sonar = Sonar::new(
        trigger.clone(),
        FakeEcho::new(Some(1_176)),
        RecordingDelay::default(),
    );

    assert_eq!(sonar.measure_cm()?, Some(19));

    let (_, echo, delay) = sonar.release();
    assert_eq!(echo.timeouts, [SONAR_TIMEOUT_US_DEFAULT]);
    assert_eq!(delay.delays_ns, [2_000, 10_000]);
    trigger.done();
    Ok(())
}

#[test]
fn sonar_reports_none_on_timeout_or_out_of_range() -> Result<()> {
    let mut expectations = trigger_pulse().to_vec();
    expectations.extend(trigger_pulse());
    let mut trigger = PinMock::new(&expectations);

    let mut timed_out = Sonar::with_timeout_us(
        trigger.clone(),
        FakeEcho::new(None),
        RecordingDelay::default(),
        5_000,
    );
    assert_eq!(timed_out.measure_cm()?, None);
    let (_, echo, _) = timed_out.release();
    assert_eq!(echo.timeouts, [5_000]);

    let mut too_close = Sonar::new(
        trigger.clone(),
        FakeEcho::new(Some(50)),
        RecordingDelay::default(),
    );
    assert_eq!(too_close.measure_cm()?, None);
    drop(too_close);

    trigger.done();
    Ok(())
}

// ============================================================================
// OLED
// ============================================================================

const OLED_ADDRESS: u8 = 0x3C;

const INIT_COMMANDS: [u8; 33] = [
    0xAE, 0xA4, 0xD5, 0xF0, 0xA8, 0x3F, 0xD3, 0x00, 0x40, 0x8D, 0x14, 0x20, 0x00, 0x21, 0x00,
    0x7F, 0x22, 0x00, 0x07, 0xA1, 0xC8, 0xDA, 0x12, 0x81, 0xCF, 0xD9, 0xF1, 0xDB, 0x40, 0xA6,
    0xD6, 0x00, 0xAF,
];

fn command(byte: u8) -> I2cTransaction {
    I2cTransaction::write(OLED_ADDRESS, vec![0x00, byte])
}

fn flush(pixels: &[u8]) -> I2cTransaction {
    let mut bytes = vec![0x40];
    bytes.extend_from_slice(pixels);
    I2cTransaction::write(OLED_ADDRESS, bytes)
}

fn oled_init() -> Vec<I2cTransaction> {
    let mut expectations: Vec<_> = INIT_COMMANDS.into_iter().map(command).collect();
    expectations.push(flush(&[0; 1024]));
    expectations
}

fn glyph(character: char) -> [u8; 5] {
    FONT_5X7[usize::from(u8::try_from(character).unwrap_or(b'?') - b' ')]
}

#[test]
fn oled_init_sends_commands_then_blank_frame() -> Result<()> {
    let mut i2c = I2cMock::new(&oled_init());

    let oled = Oled::new(i2c.clone())?;
    assert!(oled.pixels().iter().all(|&byte| byte == 0));
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_pixels_pack_by_page() -> Result<()> {
    let mut frame = [0_u8; 1024];
    frame[0] = 0b0000_0001; // (0, 0)
    frame[128 + 5] = 0b0000_0010; // (5, 9)
    frame[1023] = 0b1000_0000; // (127, 63)
    let mut expectations = oled_init();
    expectations.push(flush(&frame));
    let mut i2c = I2cMock::new(&expectations);

    let mut oled = Oled::new(i2c.clone())?;
    oled.draw_pixel(0, 0, true);
    oled.draw_pixel(5, 9, true);
    oled.draw_pixel(127, 63, true);
    oled.draw_pixel(128, 0, true);
    oled.draw_pixel(-1, 5, true);
    oled.draw_pixel(3, 3, true);
    oled.draw_pixel(3, 3, false);
    oled.show()?;
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_text_advances_six_pixels_per_character() -> Result<()> {
    let mut i2c = I2cMock::new(&oled_init());
    let mut oled = Oled::new(i2c.clone())?;

    oled.write_line(1, "AB");

    let page = &oled.pixels()[128..256];
    assert_eq!(page[0..5], glyph('A'));
    assert_eq!(page[5], 0);
    assert_eq!(page[6..11], glyph('B'));
    assert_eq!(page[11], 0);
    assert!(page[12..].iter().all(|&byte| byte == 0));
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_dark_text_inverts_the_cell() -> Result<()> {
    let mut i2c = I2cMock::new(&oled_init());
    let mut oled = Oled::new(i2c.clone())?;

    oled.write_line_colored(0, "A", false);

    let expected = glyph('A').map(|column| !column);
    assert_eq!(oled.pixels()[0..5], expected);
    assert_eq!(oled.pixels()[5], 0xFF);
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_unprintable_and_off_screen_lines() -> Result<()> {
    let mut i2c = I2cMock::new(&oled_init());
    let mut oled = Oled::new(i2c.clone())?;

    oled.write_line(8, "ignored");
    assert!(oled.pixels().iter().all(|&byte| byte == 0));

    oled.write_line(7, "\u{7}");
    assert_eq!(oled.pixels()[7 * 128..7 * 128 + 5], glyph('?'));
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_formatted_line_matches_plain_line() -> Result<()> {
    let mut expectations = oled_init();
    expectations.extend(oled_init());
    let mut i2c = I2cMock::new(&expectations);

    let mut formatted = Oled::new(i2c.clone())?;
    formatted.write_line_fmt(2, format_args!("dist {} cm", 42));
    let mut plain = Oled::new(i2c.clone())?;
    plain.write_line(2, "dist 42 cm");

    assert_eq!(formatted.pixels(), plain.pixels());
    drop((formatted, plain));

    i2c.done();
    Ok(())
}

#[test]
fn oled_long_formatted_line_keeps_first_21_characters() -> Result<()> {
    let mut expectations = oled_init();
    expectations.extend(oled_init());
    let mut i2c = I2cMock::new(&expectations);
    let long = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut formatted = Oled::new(i2c.clone())?;
    formatted.write_line_fmt(0, format_args!("{long}"));
    let mut plain = Oled::new(i2c.clone())?;
    plain.write_line(0, &long[..21]);

    assert!(formatted.pixels().iter().any(|&byte| byte != 0));
    assert_eq!(formatted.pixels(), plain.pixels());
    assert_eq!(formatted.pixels()[20 * 6..20 * 6 + 5], glyph('U'));
    drop((formatted, plain));

    i2c.done();
    Ok(())
}

#[test]
fn oled_rect_draws_outline_only() -> Result<()> {
    let mut i2c = I2cMock::new(&oled_init());
    let mut oled = Oled::new(i2c.clone())?;

    oled.draw_rect(0, 0, 127, 63, true);

    for (x, y) in [(0, 0), (127, 0), (0, 63), (127, 63), (64, 0), (0, 32)] {
        assert!(oled.pixel(x, y), "({x}, {y})");
    }
    assert!(!oled.pixel(64, 32));
    assert!(!oled.pixel(1, 1));
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_invert_and_power_send_single_commands() -> Result<()> {
    let mut expectations = oled_init();
    expectations.extend([command(0xA7), command(0xA6), command(0xAE), command(0xAF)]);
    let mut i2c = I2cMock::new(&expectations);

    let mut oled = Oled::new(i2c.clone())?;
    oled.invert(true)?;
    oled.invert(false)?;
    oled.power(false)?;
    oled.power(true)?;
    drop(oled);

    i2c.done();
    Ok(())
}

#[test]
fn oled_is_an_embedded_graphics_target() -> Result<()> {
    let mut i2c = I2cMock::new(&oled_init());
    let mut oled = Oled::new(i2c.clone())?;

    let Ok(()) = Line::new(Point::new(0, 10), Point::new(9, 10))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(&mut oled);

    assert!(oled.pixel(0, 10));
    assert!(oled.pixel(9, 10));
    assert!(!oled.pixel(10, 10));
    drop(oled);

    i2c.done();
    Ok(())
}

// ============================================================================
// Color sensor
// ============================================================================

const COLOR_ADDRESS: u8 = 0x29;

fn color_setup() -> [I2cTransaction; 2] {
    [
        I2cTransaction::write(COLOR_ADDRESS, vec![0x80, 0x03]),
        I2cTransaction::write(COLOR_ADDRESS, vec![0x81, 0xD5]),
    ]
}

fn color_reading(clear: u16, red: u16, green: u16, blue: u16) -> [I2cTransaction; 4] {
    let read = |register: u8, value: u16| {
        I2cTransaction::write_read(COLOR_ADDRESS, vec![register], value.to_le_bytes().to_vec())
    };
    [
        read(0x94, clear),
        read(0x96, red),
        read(0x98, green),
        read(0x9A, blue),
    ]
}

#[test]
fn color_sets_up_once_and_normalizes() -> Result<()> {
    let mut expectations = color_setup().to_vec();
    expectations.extend(color_reading(1_000, 500, 250, 100));
    expectations.extend(color_reading(0, 500, 250, 100));
    let mut i2c = I2cMock::new(&expectations);

    let mut color = ColorSensor::new(i2c.clone());
    assert_eq!(color.rgb()?, [127, 63, 25]);
    assert_eq!(color.rgb()?, [0, 0, 0]);
    drop(color);

    i2c.done();
    Ok(())
}

#[test]
fn color_integration_time_follows_setup() -> Result<()> {
    let mut expectations = color_setup().to_vec();
    expectations.push(I2cTransaction::write(COLOR_ADDRESS, vec![0x81, 212]));
    expectations.extend(color_reading(300, 10, 20, 30));
    let mut i2c = I2cMock::new(&expectations);

    let mut color = ColorSensor::new(i2c.clone());
    color.set_integration_time(103.0)?;
    assert_eq!(color.raw()?, [300, 10, 20, 30]);
    drop(color);

    i2c.done();
    Ok(())
}

#[test]
fn color_classifies_from_one_reading() -> Result<()> {
    let mut expectations = color_setup().to_vec();
    expectations.extend(color_reading(1_000, 800, 150, 100)); // red
    expectations.extend(color_reading(50, 800, 150, 100)); // too dim
    expectations.extend(color_reading(1_000, 600, 560, 100)); // yellow
    let mut i2c = I2cMock::new(&expectations);

    let mut color = ColorSensor::new(i2c.clone());
    assert!(color.is_color(Color::Red, 40)?);
    assert!(!color.is_color(Color::Red, 40)?);
    assert!(color.is_color(Color::Yellow, 40)?);
    drop(color);

    i2c.done();
    Ok(())
}

#[test]
fn color_range_check_uses_normalized_values() -> Result<()> {
    let mut expectations = color_setup().to_vec();
    expectations.extend(color_reading(1_000, 500, 250, 100)); // [127, 63, 25]
    expectations.extend(color_reading(1_000, 500, 250, 100));
    let mut i2c = I2cMock::new(&expectations);

    let mut color = ColorSensor::new(i2c.clone());
    assert!(color.is_in_range(100..=150, 50..=80, 0..=30)?);
    assert!(!color.is_in_range(0..=100, 50..=80, 0..=30)?);
    drop(color);

    i2c.done();
    Ok(())
}

#[test]
fn color_setup_is_retried_after_a_bus_fault() -> Result<()> {
    let mut expectations =
        vec![I2cTransaction::write(COLOR_ADDRESS, vec![0x80, 0x03]).with_error(ErrorKind::Other)];
    expectations.extend(color_setup());
    expectations.extend(color_reading(400, 0, 0, 0));
    let mut i2c = I2cMock::new(&expectations);

    let mut color = ColorSensor::new(i2c.clone());
    assert_eq!(
        color.light(),
        Err(Error::Bus {
            kind: ErrorKind::Other
        })
    );
    assert_eq!(color.light()?, 400);
    drop(color);

    i2c.done();
    Ok(())
}
