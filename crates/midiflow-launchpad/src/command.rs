//! Message builders for LEDs, layout and buffer control.
//!
//! Every builder returns wire bytes ready for an output port. Grid and side
//! buttons are addressed with Note On, the top row with Control Change, and
//! device configuration with Control Change 0 on channel 1.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};

/// One three-byte MIDI message.
pub type Message = [u8; 3];

const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
/// Note On, channel 3: two LEDs per message in rapid update order.
const RAPID_UPDATE: u8 = 0x92;

const TOP_ROW_BASE: u8 = 0x68;
const DUTY_CYCLE_LOW: u8 = 0x1E;
const DUTY_CYCLE_HIGH: u8 = 0x1F;

/// LEDs covered by one rapid update sweep: 64 grid, 8 side, 8 top.
pub const RAPID_UPDATE_LEDS: usize = 80;

/// Key mapping used for grid and side button notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `key = 16 * row + column`; side buttons are column 8.
    #[default]
    Xy,
    /// Notes 36..=99 in two 4x4-column halves, side buttons 100..=107.
    DrumRack,
}

impl Layout {
    #[inline]
    const fn mode_byte(self) -> u8 {
        match self {
            Layout::Xy => 0x01,
            Layout::DrumRack => 0x02,
        }
    }
}

/// Any addressable button. `x` runs left to right and `y` top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Grid { x: u8, y: u8 },
    /// Round buttons to the right of the grid, top to bottom.
    Side(u8),
    /// Round buttons above the grid, left to right.
    Top(u8),
}

impl Button {
    pub fn grid(x: u8, y: u8) -> Result<Self> {
        if x > 7 || y > 7 {
            return Err(Error::CellOutOfRange { x, y });
        }
        Ok(Button::Grid { x, y })
    }

    pub fn side(row: u8) -> Result<Self> {
        check_button(row)?;
        Ok(Button::Side(row))
    }

    pub fn top(index: u8) -> Result<Self> {
        check_button(index)?;
        Ok(Button::Top(index))
    }

    /// Note (grid, side) or controller (top) number for this button.
    ///
    /// Coordinates are taken modulo 8, so the result is always a data byte.
    pub fn key(self, layout: Layout) -> u8 {
        match (self, layout) {
            (Button::Grid { x, y }, Layout::Xy) => 16 * (y & 7) + (x & 7),
            (Button::Side(row), Layout::Xy) => 16 * (row & 7) + 8,
            (Button::Grid { x, y }, Layout::DrumRack) => {
                let (x, y) = (x & 7, y & 7);
                let base = if x < 4 { 36 } else { 68 };
                base + 4 * (7 - y) + (x % 4)
            }
            (Button::Side(row), Layout::DrumRack) => 100 + (7 - (row & 7)),
            (Button::Top(index), _) => TOP_ROW_BASE + (index & 7),
        }
    }

    /// Message that sets this button's LED.
    pub fn light(self, layout: Layout, color: Color) -> Message {
        match self {
            Button::Top(_) => [CONTROL_CHANGE, self.key(layout), color.velocity()],
            _ => [NOTE_ON, self.key(layout), color.velocity()],
        }
    }
}

fn check_button(index: u8) -> Result<()> {
    if index > 7 {
        return Err(Error::ButtonOutOfRange(index));
    }
    Ok(())
}

/// A decoded press or release coming back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: Button,
    pub pressed: bool,
}

/// Maps an incoming message back to the button that sent it.
///
/// Returns `None` for anything that is not a button message in `layout`.
pub fn decode(layout: Layout, bytes: &[u8]) -> Option<ButtonEvent> {
    let (&status, rest) = bytes.split_first()?;
    let (&key, rest) = rest.split_first()?;
    // Note Off and zero velocity are both releases.
    let pressed = status != 0x80 && rest.first().is_some_and(|&v| v > 0);

    let button = match status {
        CONTROL_CHANGE if (TOP_ROW_BASE..TOP_ROW_BASE + 8).contains(&key) => {
            Button::Top(key - TOP_ROW_BASE)
        }
        NOTE_ON | 0x80 => match layout {
            Layout::Xy => {
                let (row, column) = (key / 16, key % 16);
                match column {
                    0..=7 if row < 8 => Button::Grid { x: column, y: row },
                    8 if row < 8 => Button::Side(row),
                    _ => return None,
                }
            }
            Layout::DrumRack => match key {
                36..=67 => Button::Grid {
                    x: (key - 36) % 4,
                    y: 7 - (key - 36) / 4,
                },
                68..=99 => Button::Grid {
                    x: 4 + (key - 68) % 4,
                    y: 7 - (key - 68) / 4,
                },
                100..=107 => Button::Side(7 - (key - 100)),
                _ => return None,
            },
        },
        _ => return None,
    };

    Some(ButtonEvent { button, pressed })
}

/// LED test brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestBrightness {
    Low,
    Medium,
    Full,
}

/// Double-buffer control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DoubleBuffer {
    /// Buffer shown on the LEDs (0 or 1).
    pub display: u8,
    /// Buffer that colour writes go to (0 or 1).
    pub update: u8,
    /// Copy the new display buffer into the update buffer.
    pub copy: bool,
    /// Alternate the displayed buffer automatically.
    pub flash: bool,
}

impl DoubleBuffer {
    /// Automatic flashing as used with [`BufferMode::Flash`](crate::BufferMode::Flash) colours.
    pub const FLASHING: DoubleBuffer = DoubleBuffer {
        display: 0,
        update: 0,
        copy: false,
        flash: true,
    };

    fn data(self) -> u8 {
        0x20 | (u8::from(self.copy) << 4)
            | (u8::from(self.flash) << 3)
            | ((self.update & 1) << 2)
            | (self.display & 1)
    }
}

/// Stateless encoder bound to one key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Launchpad {
    layout: Layout,
}

impl Launchpad {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// All LEDs off, layout back to XY, buffers and duty cycle reset.
    pub fn reset() -> Message {
        [CONTROL_CHANGE, 0x00, 0x00]
    }

    /// Switches the device to this encoder's layout.
    pub fn select_layout(&self) -> Message {
        [CONTROL_CHANGE, 0x00, self.layout.mode_byte()]
    }

    /// Lights every LED. Any other message ends the test.
    pub fn led_test(brightness: TestBrightness) -> Message {
        let data = match brightness {
            TestBrightness::Low => 0x7D,
            TestBrightness::Medium => 0x7E,
            TestBrightness::Full => 0x7F,
        };
        [CONTROL_CHANGE, 0x00, data]
    }

    pub fn double_buffer(control: DoubleBuffer) -> Message {
        [CONTROL_CHANGE, 0x00, control.data()]
    }

    /// LED duty cycle `numerator / denominator`, numerator 1..=16,
    /// denominator 3..=18.
    pub fn duty_cycle(numerator: u8, denominator: u8) -> Result<Message> {
        if !(1..=16).contains(&numerator) || !(3..=18).contains(&denominator) {
            return Err(Error::InvalidDutyCycle {
                numerator,
                denominator,
            });
        }
        let (controller, base) = if numerator < 9 {
            (DUTY_CYCLE_LOW, numerator - 1)
        } else {
            (DUTY_CYCLE_HIGH, numerator - 9)
        };
        Ok([CONTROL_CHANGE, controller, 16 * base + (denominator - 3)])
    }

    pub fn light(&self, button: Button, color: Color) -> Message {
        button.light(self.layout, color)
    }

    pub fn grid(&self, x: u8, y: u8, color: Color) -> Result<Message> {
        Ok(self.light(Button::grid(x, y)?, color))
    }

    pub fn side(&self, row: u8, color: Color) -> Result<Message> {
        Ok(self.light(Button::side(row)?, color))
    }

    pub fn top(&self, index: u8, color: Color) -> Result<Message> {
        Ok(self.light(Button::top(index)?, color))
    }

    /// Sets a full 8x8 frame, row by row, one message per cell.
    pub fn frame(&self, cells: &[[Color; 8]; 8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(64 * 3);
        for (y, row) in (0u8..).zip(cells) {
            for (x, &color) in (0u8..).zip(row) {
                bytes.extend_from_slice(&self.light(Button::Grid { x, y }, color));
            }
        }
        bytes
    }

    /// Rapid update: two LEDs per message, starting at the top-left cell and
    /// running row by row through the grid, then the side buttons top to
    /// bottom, then the top row left to right.
    ///
    /// At most [`RAPID_UPDATE_LEDS`] colours are used. An odd trailing colour
    /// is paired with [`Color::OFF`]. Sending any other message first resets
    /// the device's cursor to the top-left cell.
    pub fn rapid_update(colors: &[Color]) -> Vec<u8> {
        let colors = &colors[..colors.len().min(RAPID_UPDATE_LEDS)];
        let mut bytes = Vec::with_capacity(colors.len().div_ceil(2) * 3);
        for pair in colors.chunks(2) {
            let second = pair.get(1).copied().unwrap_or(Color::OFF);
            bytes.extend_from_slice(&[RAPID_UPDATE, pair[0].velocity(), second.velocity()]);
        }
        bytes
    }

    /// Every LED set to one colour with a single rapid update sweep.
    pub fn fill(color: Color) -> Vec<u8> {
        Self::rapid_update(&[color; RAPID_UPDATE_LEDS])
    }

    pub fn decode(&self, bytes: &[u8]) -> Option<ButtonEvent> {
        decode(self.layout, bytes)
    }
}
