//! MidiSystem builder.

use std::sync::Arc;

use crate::error::Result;
use crate::port::MidiPortManager;

#[cfg(feature = "midi-io")]
use crate::io::{MidiInputManager, MidiOutputManager};

use super::{MidiSystem, MidiSystemInner};

const DEFAULT_FIFO_SIZE: usize = 256;
const DEFAULT_CLIENT_NAME: &str = "midiflow";

pub struct MidiSystemBuilder {
    #[cfg(feature = "midi-io")]
    pub(super) enable_io: bool,
    pub(super) fifo_size: usize,
    pub(super) client_name: String,
}

impl Default for MidiSystemBuilder {
    fn default() -> Self {
        Self {
            #[cfg(feature = "midi-io")]
            enable_io: false,
            fifo_size: DEFAULT_FIFO_SIZE,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }
}

impl MidiSystemBuilder {
    /// Starts the hardware input and output threads.
    #[cfg(feature = "midi-io")]
    pub fn io(mut self) -> Self {
        self.enable_io = true;
        self
    }

    /// Capacity of every port queue. Clamped to at least 1.
    pub fn fifo_size(mut self, size: usize) -> Self {
        self.fifo_size = size;
        self
    }

    /// Client name announced to the OS MIDI layer.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn build(self) -> Result<MidiSystem> {
        let port_manager = Arc::new(MidiPortManager::new(self.fifo_size));

        #[cfg(feature = "midi-io")]
        let (input_manager, output_manager) = if self.enable_io {
            let input = MidiInputManager::new(Arc::clone(&port_manager), self.client_name.clone())?;
            let output =
                MidiOutputManager::new(Arc::clone(&port_manager), self.client_name.clone())?;
            (Some(Arc::new(input)), Some(Arc::new(output)))
        } else {
            (None, None)
        };

        tracing::debug!(
            "MidiSystem '{}' built (fifo size {})",
            self.client_name,
            port_manager.fifo_size()
        );

        Ok(MidiSystem {
            inner: Arc::new(MidiSystemInner {
                port_manager,
                client_name: self.client_name,
                #[cfg(feature = "midi-io")]
                input_manager,
                #[cfg(feature = "midi-io")]
                output_manager,
            }),
        })
    }
}
