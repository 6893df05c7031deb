//! Byte encoder for the Novation Launchpad (original, S and Mini) protocol.
//!
//! Pure and stateless: every function returns raw wire bytes that a host
//! writes to an output port as-is, outside any classification pipeline.
//!
//! ```
//! use midiflow_launchpad::{Color, Launchpad, Layout};
//!
//! let lp = Launchpad::new(Layout::Xy);
//! let mut bytes = Launchpad::reset().to_vec();
//! bytes.extend_from_slice(&lp.grid(0, 0, Color::AMBER).unwrap());
//! assert_eq!(bytes, vec![0xB0, 0x00, 0x00, 0x90, 0x00, 63]);
//! ```

pub mod error;
pub use error::{Error, Result};

mod color;
pub use color::{BufferMode, Color};

mod command;
pub use command::{
    decode, Button, ButtonEvent, DoubleBuffer, Launchpad, Layout, Message, TestBrightness,
    RAPID_UPDATE_LEDS,
};
