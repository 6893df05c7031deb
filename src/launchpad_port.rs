//! Launchpad attached to an output port.
//!
//! Encoded bytes go straight to the port with `MidiSystem::send_raw`; they
//! never pass through a pipeline.

use midiflow_io::MidiSystem;
use midiflow_launchpad::{Button, Color, DoubleBuffer, Launchpad, Layout, TestBrightness};

use crate::Result;

/// Encoder bound to an output port of a [`MidiSystem`].
#[derive(Debug, Clone)]
pub struct LaunchpadPort {
    midi: MidiSystem,
    port: usize,
    encoder: Launchpad,
}

impl LaunchpadPort {
    /// Binds to an existing output port. Sends nothing.
    pub fn new(midi: &MidiSystem, port: usize, layout: Layout) -> Result<Self> {
        midi.output_handle(port)?;
        Ok(Self {
            midi: midi.clone(),
            port,
            encoder: Launchpad::new(layout),
        })
    }

    /// Connects the first output device whose name contains "Launchpad",
    /// resets it and selects `layout`.
    #[cfg(feature = "hardware")]
    pub fn connect(midi: &MidiSystem, layout: Layout) -> Result<Self> {
        let port = midi.connect_output_device_by_name("Launchpad")?;
        let launchpad = Self::new(midi, port, layout)?;
        launchpad.reset()?;
        launchpad.select_layout()?;
        Ok(launchpad)
    }

    #[inline]
    pub fn port(&self) -> usize {
        self.port
    }

    #[inline]
    pub fn encoder(&self) -> &Launchpad {
        &self.encoder
    }

    /// Sends encoded bytes as consecutive three-byte messages.
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        for message in bytes.chunks(3) {
            self.midi.send_raw(self.port, message)?;
        }
        Ok(())
    }

    pub fn reset(&self) -> Result<()> {
        tracing::debug!("Launchpad on port {} reset", self.port);
        self.send(&Launchpad::reset())
    }

    pub fn select_layout(&self) -> Result<()> {
        self.send(&self.encoder.select_layout())
    }

    pub fn light(&self, button: Button, color: Color) -> Result<()> {
        self.send(&self.encoder.light(button, color))
    }

    pub fn grid(&self, x: u8, y: u8, color: Color) -> Result<()> {
        let message = self.encoder.grid(x, y, color)?;
        self.send(&message)
    }

    pub fn side(&self, row: u8, color: Color) -> Result<()> {
        let message = self.encoder.side(row, color)?;
        self.send(&message)
    }

    pub fn top(&self, index: u8, color: Color) -> Result<()> {
        let message = self.encoder.top(index, color)?;
        self.send(&message)
    }

    pub fn frame(&self, cells: &[[Color; 8]; 8]) -> Result<()> {
        self.send(&self.encoder.frame(cells))
    }

    pub fn fill(&self, color: Color) -> Result<()> {
        self.send(&Launchpad::fill(color))
    }

    pub fn led_test(&self, brightness: TestBrightness) -> Result<()> {
        self.send(&Launchpad::led_test(brightness))
    }

    pub fn double_buffer(&self, control: DoubleBuffer) -> Result<()> {
        self.send(&Launchpad::double_buffer(control))
    }

    pub fn duty_cycle(&self, numerator: u8, denominator: u8) -> Result<()> {
        let message = Launchpad::duty_cycle(numerator, denominator)?;
        self.send(&message)
    }
}
