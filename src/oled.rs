//! A device abstraction for the PonyBot's 128×64 monochrome OLED (SSD1306 over I²C).
//!
//! Drawing calls only change an in-memory framebuffer; [`Oled::show`] sends it to the
//! display. The display also implements `embedded_graphics`'s `DrawTarget`, so shapes and
//! fonts from that crate work too.
//!
//! See [`Oled`] for usage example.

pub mod font;

use core::convert::Infallible;
use core::fmt::Write as _;

use embedded_graphics::Pixel;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_hal::i2c::I2c;
use heapless::String;

use crate::{Error, Result};
use font::{FIRST_CHAR, FONT_5X7, GLYPH_WIDTH};

/// Default bus address of the OLED.
pub const OLED_ADDRESS_DEFAULT: u8 = 0x3C;

/// Display width in pixels.
pub const WIDTH: usize = 128;

/// Display height in pixels.
pub const HEIGHT: usize = 64;

/// Text lines available to [`Oled::write_line`] (8 pixels each).
pub const LINE_COUNT: u8 = 8;

const CELL_WIDTH: usize = 6;

/// Horizontal advance per character, glyph plus one blank column.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "cell width is 6"
)]
pub const CHAR_ADVANCE: i32 = CELL_WIDTH as i32;

/// Characters that fit on one text line.
pub const CHARS_PER_LINE: usize = WIDTH / CELL_WIDTH;

const PAGES: usize = HEIGHT / 8;
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "glyph width is 5"
)]
const GLYPH_COLUMNS: i32 = GLYPH_WIDTH as i32;
const COMMAND_PREFIX: u8 = 0x00;
const DATA_PREFIX: u8 = 0x40;
// The data prefix rides in front of the pixels so a flush is one bus write.
const BUFFER_LEN: usize = 1 + WIDTH * PAGES;

const DISPLAY_OFF: u8 = 0xAE;
const DISPLAY_ON: u8 = 0xAF;
const NORMAL: u8 = 0xA6;
const INVERTED: u8 = 0xA7;

const INIT_COMMANDS: [u8; 33] = [
    DISPLAY_OFF,
    0xA4, // resume to RAM content
    0xD5, 0xF0, // clock divide ratio
    0xA8, 0x3F, // multiplex ratio
    0xD3, 0x00, // display offset
    0x40, // start line
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0x21, 0, 127, // column range
    0x22, 0, 7, // page range
    0xA1, // segment remap
    0xC8, // COM scan direction
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // precharge
    0xDB, 0x40, // VCOMH deselect
    NORMAL,
    0xD6, 0x00, // zoom off
    DISPLAY_ON,
];

/// A device abstraction for a 128×64 SSD1306 OLED.
///
/// # Example
///
/// ```rust,no_run
/// use embedded_hal::i2c::I2c;
/// use ponybot_envoy::Result;
/// use ponybot_envoy::oled::Oled;
///
/// fn example(i2c: impl I2c, distance_cm: u16) -> Result<()> {
///     let mut oled = Oled::new(i2c)?; // initialized and cleared
///     oled.write_line(0, "PonyBot");
///     oled.write_line_fmt(2, format_args!("dist {distance_cm} cm"));
///     oled.draw_rect(0, 0, 127, 63, true);
///     oled.show()?;
///     Ok(())
/// }
/// ```
pub struct Oled<I2C> {
    i2c: I2C,
    address: u8,
    buffer: [u8; BUFFER_LEN],
}

impl<I2C: I2c> Oled<I2C> {
    /// Initialize the display at the default address and clear it.
    ///
    /// See the [struct-level example](Self) for usage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn new(i2c: I2C) -> Result<Self> {
        Self::with_address(i2c, OLED_ADDRESS_DEFAULT)
    }

    /// Initialize the display at `address` and clear it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn with_address(i2c: I2C, address: u8) -> Result<Self> {
        let mut buffer = [0; BUFFER_LEN];
        if let Some(prefix) = buffer.first_mut() {
            *prefix = DATA_PREFIX;
        }
        let mut oled = Self {
            i2c,
            address,
            buffer,
        };
        for command in INIT_COMMANDS {
            oled.send_command(command)?;
        }
        oled.clear()?;
        info!("oled ready at {=u8:#x}", address);
        Ok(oled)
    }

    /// Blank the framebuffer and send it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn clear(&mut self) -> Result<()> {
        self.pixels_mut().fill(0);
        self.show()
    }

    /// Send the framebuffer to the display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn show(&mut self) -> Result<()> {
        self.i2c
            .write(self.address, &self.buffer)
            .map_err(Error::bus)
    }

    /// Swap lit and dark pixels on the display (the framebuffer is unchanged).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn invert(&mut self, invert: bool) -> Result<()> {
        self.send_command(if invert { INVERTED } else { NORMAL })
    }

    /// Turn the panel on or off; the framebuffer is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] on a bus fault.
    pub fn power(&mut self, on: bool) -> Result<()> {
        self.send_command(if on { DISPLAY_ON } else { DISPLAY_OFF })
    }

    /// The framebuffer: 8 pages of 128 column bytes, bit 0 at the top of each page.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.buffer.get(1..).unwrap_or_default()
    }

    /// Whether a pixel is lit in the framebuffer. Off-screen pixels read as dark.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        pixel_position(x, y)
            .and_then(|(index, mask)| self.pixels().get(index).map(|byte| byte & mask != 0))
            .unwrap_or(false)
    }

    /// Set or clear one pixel. Off-screen coordinates are ignored.
    pub fn draw_pixel(&mut self, x: i32, y: i32, on: bool) {
        let Some((index, mask)) = pixel_position(x, y) else {
            return;
        };
        if let Some(byte) = self.pixels_mut().get_mut(index) {
            if on {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    /// Draw `length` pixels rightward from `(x, y)`.
    pub fn draw_hline(&mut self, x: i32, y: i32, length: i32, on: bool) {
        for offset in 0..length {
            self.draw_pixel(x.saturating_add(offset), y, on);
        }
    }

    /// Draw `length` pixels downward from `(x, y)`.
    pub fn draw_vline(&mut self, x: i32, y: i32, length: i32, on: bool) {
        for offset in 0..length {
            self.draw_pixel(x, y.saturating_add(offset), on);
        }
    }

    /// Draw the outline of the rectangle with corners `(x1, y1)` and `(x2, y2)`, inclusive.
    pub fn draw_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, on: bool) {
        let width = x2.saturating_sub(x1).saturating_add(1);
        let height = y2.saturating_sub(y1).saturating_add(1);
        self.draw_hline(x1, y1, width, on);
        self.draw_hline(x1, y2, width, on);
        self.draw_vline(x1, y1, height, on);
        self.draw_vline(x2, y1, height, on);
    }

    /// Draw one character with its top-left at `(x, y)`.
    ///
    /// Characters outside printable ASCII draw as `?`. The glyph's 6×8 cell is fully
    /// overwritten, so `on = false` draws dark text on a lit background.
    pub fn draw_char(&mut self, x: i32, y: i32, character: char, on: bool) {
        let glyph = glyph(character);
        for (column_x, column) in (x..).zip(glyph) {
            for row in 0..8_u8 {
                let lit = column.rotate_right(u32::from(row)) & 1 == 1;
                self.draw_pixel(column_x, y.saturating_add(i32::from(row)), lit == on);
            }
        }
        let spacer_x = x.saturating_add(GLYPH_COLUMNS);
        for row in 0..8 {
            self.draw_pixel(spacer_x, y.saturating_add(row), !on);
        }
    }

    /// Draw text starting at `(x, y)`, 6 pixels per character, no wrapping.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, on: bool) {
        let mut char_x = x;
        for character in text.chars() {
            self.draw_char(char_x, y, character, on);
            char_x = char_x.saturating_add(CHAR_ADVANCE);
        }
    }

    /// Draw text on one of the eight 8-pixel lines (0–7). Other lines are ignored.
    pub fn write_line(&mut self, line: u8, text: &str) {
        self.write_line_colored(line, text, true);
    }

    /// [`write_line`](Self::write_line) with a choice of lit or dark text.
    pub fn write_line_colored(&mut self, line: u8, text: &str, on: bool) {
        if line < LINE_COUNT {
            self.draw_text(0, i32::from(line).saturating_mul(8), text, on);
        }
    }

    /// Format and draw a line, keeping the first [`CHARS_PER_LINE`] characters.
    pub fn write_line_fmt(&mut self, line: u8, args: core::fmt::Arguments<'_>) {
        let mut text = LineText::default();
        // LineText never reports an error.
        let _ = text.write_fmt(args);
        self.write_line(line, &text.0);
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn send_command(&mut self, command: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[COMMAND_PREFIX, command])
            .map_err(Error::bus)
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        self.buffer.get_mut(1..).unwrap_or_default()
    }
}

/// Framebuffer byte index and bit mask for an on-screen pixel.
fn pixel_position(x: i32, y: i32) -> Option<(usize, u8)> {
    let x = usize::try_from(x).ok().filter(|&x| x < WIDTH)?;
    let y = usize::try_from(y).ok().filter(|&y| y < HEIGHT)?;
    let mask = 1_u8.rotate_left(u32::try_from(y % 8).ok()?);
    Some(((y / 8).saturating_mul(WIDTH).saturating_add(x), mask))
}

/// Formatting sink that keeps characters until the line is full and drops the rest.
#[derive(Default)]
struct LineText(String<CHARS_PER_LINE>);

impl core::fmt::Write for LineText {
    fn write_str(&mut self, text: &str) -> core::fmt::Result {
        for character in text.chars() {
            if self.0.push(character).is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn glyph(character: char) -> [u8; GLYPH_WIDTH] {
    let code = u8::try_from(character)
        .ok()
        .filter(|code| (FIRST_CHAR..0x7F).contains(code))
        .unwrap_or(b'?');
    code.checked_sub(FIRST_CHAR)
        .and_then(|index| FONT_5X7.get(usize::from(index)))
        .copied()
        .unwrap_or_default()
}

impl<I2C: I2c> OriginDimensions for Oled<I2C> {
    fn size(&self) -> Size {
        Size::new(128, 64)
    }
}

impl<I2C: I2c> DrawTarget for Oled<I2C> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.draw_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}
