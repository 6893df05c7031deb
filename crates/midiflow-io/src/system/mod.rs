//! Unified MIDI system: ports, routes and hardware devices.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use midiflow_core::{prelude::*, Pipeline};
//! use midiflow_io::MidiSystem;
//!
//! let midi = MidiSystem::builder().io().build()?;
//!
//! let keys = midi.connect_input_device_by_name("Keyboard")?;
//! let synth = midi.connect_output_device_by_name("Synth")?;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(filter_note())
//!     .stage(transpose(12))
//!     .build()?;
//! let _route = midi.route(keys, Arc::new(pipeline), synth)?;
//! ```

mod builder;

pub use builder::MidiSystemBuilder;

use std::sync::Arc;

use crossbeam_channel::Receiver;
use midiflow_core::{EventSink, MidiEvent, Pipeline, PipelineConfig};

use crate::error::{Error, Result};
use crate::port::{InputHandle, MidiPortManager, OutputHandle, PortInfo, PortType};
use crate::route::Route;

#[cfg(feature = "midi-io")]
use crate::io::{MidiInputDevice, MidiInputManager, MidiOutputDevice, MidiOutputManager};

/// Owns the port table and, when enabled, the hardware I/O threads.
///
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct MidiSystem {
    inner: Arc<MidiSystemInner>,
}

pub(crate) struct MidiSystemInner {
    pub(crate) port_manager: Arc<MidiPortManager>,
    pub(crate) client_name: String,
    #[cfg(feature = "midi-io")]
    pub(crate) input_manager: Option<Arc<MidiInputManager>>,
    #[cfg(feature = "midi-io")]
    pub(crate) output_manager: Option<Arc<MidiOutputManager>>,
}

impl MidiSystem {
    pub fn builder() -> MidiSystemBuilder {
        MidiSystemBuilder::default()
    }

    pub fn client_name(&self) -> &str {
        &self.inner.client_name
    }

    pub fn port_manager(&self) -> &Arc<MidiPortManager> {
        &self.inner.port_manager
    }

    // ==================== Port Management ====================

    /// Returns the port index for later reference.
    pub fn create_input_port(&self, name: impl Into<String>) -> usize {
        self.inner.port_manager.create_input_port(name)
    }

    /// Returns the port index for later reference.
    pub fn create_output_port(&self, name: impl Into<String>) -> usize {
        self.inner.port_manager.create_output_port(name)
    }

    pub fn port_info(&self, port_type: PortType, port_index: usize) -> Option<PortInfo> {
        self.inner.port_manager.get_port_info(port_type, port_index)
    }

    pub fn find_port(&self, port_type: PortType, name: &str) -> Option<PortInfo> {
        self.inner.port_manager.find_port(port_type, name)
    }

    /// Input ports first, then output ports.
    pub fn list_ports(&self) -> Vec<PortInfo> {
        let mut ports = self.inner.port_manager.list_input_ports();
        ports.extend(self.inner.port_manager.list_output_ports());
        ports
    }

    pub fn list_input_ports(&self) -> Vec<PortInfo> {
        self.inner.port_manager.list_input_ports()
    }

    pub fn list_output_ports(&self) -> Vec<PortInfo> {
        self.inner.port_manager.list_output_ports()
    }

    pub fn set_port_active(&self, port_type: PortType, port_index: usize, active: bool) -> Result<()> {
        if self
            .inner
            .port_manager
            .set_port_active(port_type, port_index, active)
        {
            Ok(())
        } else {
            Err(Error::PortNotFound(port_type, port_index))
        }
    }

    pub fn input_handle(&self, port_index: usize) -> Result<InputHandle> {
        self.inner
            .port_manager
            .input_handle(port_index)
            .ok_or(Error::PortNotFound(PortType::Input, port_index))
    }

    pub fn output_handle(&self, port_index: usize) -> Result<OutputHandle> {
        self.inner
            .port_manager
            .output_handle(port_index)
            .ok_or(Error::PortNotFound(PortType::Output, port_index))
    }

    /// Consumer end of an output port, for hosts that drain ports themselves.
    pub fn output_receiver(&self, port_index: usize) -> Result<Receiver<MidiEvent>> {
        self.inner
            .port_manager
            .output_receiver(port_index)
            .ok_or(Error::PortNotFound(PortType::Output, port_index))
    }

    // ==================== Sending ====================

    /// Writes an event straight to an output port, bypassing any pipeline.
    pub fn send_event(&self, port_index: usize, event: MidiEvent) -> Result<()> {
        let handle = self.output_handle(port_index)?;
        if !self
            .inner
            .port_manager
            .is_port_active(PortType::Output, port_index)
        {
            return Err(Error::PortInactive(PortType::Output, port_index));
        }
        if handle.push(event) {
            Ok(())
        } else {
            let name = self
                .port_info(PortType::Output, port_index)
                .map(|info| info.name)
                .unwrap_or_else(|| format!("Output {}", port_index));
            Err(Error::QueueFull(name))
        }
    }

    /// Writes raw wire bytes to an output port. Used for device-specific
    /// messages such as controller LED updates.
    pub fn send_raw(&self, port_index: usize, bytes: &[u8]) -> Result<()> {
        self.send_event(port_index, MidiEvent::from_bytes(bytes))
    }

    // ==================== Routing ====================

    /// Runs everything arriving on an input port through `pipeline` into an
    /// output port. The route owns the input port's queue while it runs.
    pub fn route(
        &self,
        input_port: usize,
        pipeline: Arc<Pipeline>,
        output_port: usize,
    ) -> Result<Route> {
        let sink = self.output_handle(output_port)?;
        self.route_to(input_port, pipeline, sink)
    }

    /// Builds the pipeline from a declarative config, then routes through it.
    ///
    /// An invalid config fails before any thread starts.
    pub fn route_config(
        &self,
        input_port: usize,
        config: &PipelineConfig,
        output_port: usize,
    ) -> Result<Route> {
        let pipeline = config.build()?;
        self.route(input_port, Arc::new(pipeline), output_port)
    }

    /// Like [`route`](Self::route) but delivers into any [`EventSink`].
    pub fn route_to<S>(&self, input_port: usize, pipeline: Arc<Pipeline>, sink: S) -> Result<Route>
    where
        S: EventSink + Send + 'static,
    {
        let source = self
            .inner
            .port_manager
            .input_receiver(input_port)
            .ok_or(Error::PortNotFound(PortType::Input, input_port))?;
        let name = self
            .port_info(PortType::Input, input_port)
            .map(|info| info.name)
            .unwrap_or_else(|| format!("input-{}", input_port));
        Route::spawn(name, source, pipeline, sink)
    }

    // ==================== Hardware Devices ====================

    #[cfg(feature = "midi-io")]
    pub fn is_io_enabled(&self) -> bool {
        self.inner.input_manager.is_some()
    }

    #[cfg(feature = "midi-io")]
    fn input_manager(&self) -> Result<&Arc<MidiInputManager>> {
        self.inner.input_manager.as_ref().ok_or(Error::IoDisabled)
    }

    #[cfg(feature = "midi-io")]
    fn output_manager(&self) -> Result<&Arc<MidiOutputManager>> {
        self.inner.output_manager.as_ref().ok_or(Error::IoDisabled)
    }

    #[cfg(feature = "midi-io")]
    pub fn list_input_devices(&self) -> Vec<MidiInputDevice> {
        MidiInputManager::list_devices()
    }

    #[cfg(feature = "midi-io")]
    pub fn list_output_devices(&self) -> Vec<MidiOutputDevice> {
        MidiOutputManager::list_devices()
    }

    /// Creates an input port fed by the device. Returns the port index.
    #[cfg(feature = "midi-io")]
    pub fn connect_input_device(&self, device_index: usize) -> Result<usize> {
        self.input_manager()?.connect(device_index)
    }

    /// Partial, case-insensitive name match.
    #[cfg(feature = "midi-io")]
    pub fn connect_input_device_by_name(&self, name: &str) -> Result<usize> {
        self.input_manager()?.connect_by_name(name)
    }

    #[cfg(feature = "midi-io")]
    pub fn disconnect_input_device(&self, port_index: usize) -> Result<()> {
        self.input_manager()?.disconnect(port_index);
        Ok(())
    }

    #[cfg(feature = "midi-io")]
    pub fn connected_input_devices(&self) -> Vec<(usize, String)> {
        self.inner
            .input_manager
            .as_ref()
            .map(|m| m.connected_devices())
            .unwrap_or_default()
    }

    /// Creates an output port forwarded to the device. Returns the port index.
    #[cfg(feature = "midi-io")]
    pub fn connect_output_device(&self, device_index: usize) -> Result<usize> {
        self.output_manager()?.connect(device_index)
    }

    #[cfg(feature = "midi-io")]
    pub fn connect_output_device_by_name(&self, name: &str) -> Result<usize> {
        self.output_manager()?.connect_by_name(name)
    }

    #[cfg(feature = "midi-io")]
    pub fn disconnect_output_device(&self, port_index: usize) -> Result<()> {
        self.output_manager()?.disconnect(port_index);
        Ok(())
    }

    #[cfg(feature = "midi-io")]
    pub fn connected_output_devices(&self) -> Vec<(usize, String)> {
        self.inner
            .output_manager
            .as_ref()
            .map(|m| m.connected_devices())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for MidiSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiSystem")
            .field("client_name", &self.inner.client_name)
            .field("ports", &self.list_ports().len())
            .finish()
    }
}
