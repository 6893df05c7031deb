//! Two-LED (red/green) colour model.
//!
//! The velocity byte packs both brightnesses and the buffer flags:
//! bits 0-1 red, bit 2 clear, bit 3 copy, bits 4-5 green.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CLEAR: u8 = 0x04;
const COPY: u8 = 0x08;

/// How a colour write interacts with the two LED buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Write both buffers; what you set is what you see.
    #[default]
    Normal,
    /// Write only the update buffer. Combined with automatic flashing this
    /// makes the LED blink.
    Flash,
    /// Write only the update buffer, leaving the other untouched.
    Buffered,
}

impl BufferMode {
    #[inline]
    const fn flags(self) -> u8 {
        match self {
            BufferMode::Normal => COPY | CLEAR,
            BufferMode::Flash => COPY,
            BufferMode::Buffered => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawColor")]
pub struct Color {
    red: u8,
    green: u8,
    #[serde(default)]
    mode: BufferMode,
}

/// Unchecked wire form; deserialization goes through [`Color::new`].
#[derive(Deserialize)]
struct RawColor {
    red: u8,
    green: u8,
    #[serde(default)]
    mode: BufferMode,
}

impl TryFrom<RawColor> for Color {
    type Error = Error;

    fn try_from(raw: RawColor) -> Result<Self> {
        Ok(Color::new(raw.red, raw.green)?.with_mode(raw.mode))
    }
}

impl Color {
    pub const OFF: Color = Color::preset(0, 0);
    pub const RED_LOW: Color = Color::preset(1, 0);
    pub const RED: Color = Color::preset(3, 0);
    pub const GREEN_LOW: Color = Color::preset(0, 1);
    pub const GREEN: Color = Color::preset(0, 3);
    pub const AMBER_LOW: Color = Color::preset(1, 1);
    pub const AMBER: Color = Color::preset(3, 3);
    pub const ORANGE: Color = Color::preset(3, 2);
    pub const YELLOW: Color = Color::preset(2, 3);

    const fn preset(red: u8, green: u8) -> Self {
        Self {
            red,
            green,
            mode: BufferMode::Normal,
        }
    }

    /// Brightness per LED, 0 (off) to 3 (full).
    pub fn new(red: u8, green: u8) -> Result<Self> {
        if red > 3 {
            return Err(Error::ColorOutOfRange {
                component: "red",
                value: red,
            });
        }
        if green > 3 {
            return Err(Error::ColorOutOfRange {
                component: "green",
                value: green,
            });
        }
        Ok(Self::preset(red, green))
    }

    /// Decodes a velocity byte. Flag combinations other than the three
    /// [`BufferMode`]s read as the nearest one (copy wins).
    pub fn from_velocity(velocity: u8) -> Self {
        let mode = if velocity & COPY == 0 {
            BufferMode::Buffered
        } else if velocity & CLEAR == 0 {
            BufferMode::Flash
        } else {
            BufferMode::Normal
        };
        Self {
            red: velocity & 0x03,
            green: (velocity >> 4) & 0x03,
            mode,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: BufferMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn red(self) -> u8 {
        self.red
    }

    #[inline]
    pub fn green(self) -> u8 {
        self.green
    }

    #[inline]
    pub fn mode(self) -> BufferMode {
        self.mode
    }

    #[inline]
    pub fn is_off(self) -> bool {
        self.red == 0 && self.green == 0
    }

    /// `16 * green + red + flags`.
    #[inline]
    pub fn velocity(self) -> u8 {
        (self.green << 4) | self.red | self.mode.flags()
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::OFF
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> u8 {
        color.velocity()
    }
}
