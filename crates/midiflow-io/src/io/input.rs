//! MIDI input: device enumeration and connection on a dedicated thread.
//!
//! Each connection feeds one input port of the shared [`MidiPortManager`];
//! the midir callback stamps raw bytes and pushes them into the port queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{Ignore, MidiInput, MidiInputConnection};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::name_matches;
use crate::error::{Error, Result};
use crate::port::{InputHandle, MidiPortManager};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiInputDevice {
    pub index: usize,
    pub name: String,
}

enum InputCommand {
    Connect {
        device_index: usize,
        handle: InputHandle,
        reply: Sender<Result<String>>,
    },
    Disconnect(usize),
    DisconnectAll,
    Shutdown,
}

/// Connected devices keyed by input port index.
type ConnectionTable = Arc<RwLock<HashMap<usize, String>>>;

pub struct MidiInputManager {
    port_manager: Arc<MidiPortManager>,
    command_sender: Sender<InputCommand>,
    connections: ConnectionTable,
    client_name: String,
}

impl MidiInputManager {
    pub fn new(port_manager: Arc<MidiPortManager>, client_name: impl Into<String>) -> Result<Self> {
        let client_name = client_name.into();
        let (command_sender, command_receiver) = bounded(16);
        let connections: ConnectionTable = Arc::new(RwLock::new(HashMap::new()));

        let thread_connections = Arc::clone(&connections);
        let thread_client = client_name.clone();
        thread::Builder::new()
            .name("midiflow-input".to_string())
            .spawn(move || Self::input_thread(command_receiver, thread_connections, thread_client))?;

        Ok(Self {
            port_manager,
            command_sender,
            connections,
            client_name,
        })
    }

    fn input_thread(
        command_receiver: Receiver<InputCommand>,
        connections: ConnectionTable,
        client_name: String,
    ) {
        let mut live: HashMap<usize, MidiInputConnection<()>> = HashMap::new();

        loop {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(InputCommand::Connect {
                    device_index,
                    handle,
                    reply,
                }) => {
                    let port_index = handle.port_index();
                    if let Some(old) = live.remove(&port_index) {
                        old.close();
                    }
                    let result = Self::connect_to_device(&client_name, device_index, handle);
                    let reply_value = match result {
                        Ok((conn, name)) => {
                            live.insert(port_index, conn);
                            connections.write().insert(port_index, name.clone());
                            debug!("MIDI input '{}' connected to port {}", name, port_index);
                            Ok(name)
                        }
                        Err(e) => {
                            warn!("MIDI input device {} connect failed: {}", device_index, e);
                            Err(e)
                        }
                    };
                    let _ = reply.send(reply_value);
                }
                Ok(InputCommand::Disconnect(port_index)) => {
                    if let Some(conn) = live.remove(&port_index) {
                        conn.close();
                        connections.write().remove(&port_index);
                        debug!("MIDI input port {} disconnected", port_index);
                    }
                }
                Ok(InputCommand::DisconnectAll) => {
                    for (_, conn) in live.drain() {
                        conn.close();
                    }
                    connections.write().clear();
                }
                Ok(InputCommand::Shutdown) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }

        for (_, conn) in live.drain() {
            conn.close();
        }
        connections.write().clear();
    }

    fn connect_to_device(
        client_name: &str,
        device_index: usize,
        handle: InputHandle,
    ) -> Result<(MidiInputConnection<()>, String)> {
        let mut midi_input = MidiInput::new(client_name)?;
        // SysEx, clock and active sensing are delivered too.
        midi_input.ignore(Ignore::None);

        let ports = midi_input.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI input device {} not found", device_index))
        })?;

        let port_name = midi_input
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_input.connect(
            port,
            &format!("{}-in-{}", client_name, handle.port_index()),
            move |_timestamp_us, message, _| {
                if !handle.push_bytes(message) {
                    debug!("MIDI input port {} dropped {:02X?}", handle.port_index(), message);
                }
            },
            (),
        )?;

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<MidiInputDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new("midiflow-device-list") {
            for (index, port) in midi_input.ports().iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiInputDevice { index, name });
            }
        }
        devices
    }

    /// Opens a device and feeds it into a new input port named after it.
    ///
    /// Returns the input port index.
    pub fn connect(&self, device_index: usize) -> Result<usize> {
        let device_name = Self::list_devices()
            .into_iter()
            .find(|d| d.index == device_index)
            .map(|d| d.name)
            .ok_or_else(|| {
                Error::MidiDevice(format!("MIDI input device {} not found", device_index))
            })?;

        self.connect_as(device_index, device_name)
    }

    /// Creates the port, then connects it. A failed connection retires the
    /// port again so it never shows up unfed.
    fn connect_as(&self, device_index: usize, port_name: String) -> Result<usize> {
        let port_index = self.port_manager.create_input_port(port_name);
        if let Err(e) = self.connect_to_port(device_index, port_index) {
            self.port_manager.retire_port(crate::port::PortType::Input, port_index);
            return Err(e);
        }
        Ok(port_index)
    }

    /// Opens a device and feeds it into an existing input port.
    pub fn connect_to_port(&self, device_index: usize, port_index: usize) -> Result<String> {
        let handle = self
            .port_manager
            .input_handle(port_index)
            .ok_or(Error::PortNotFound(crate::port::PortType::Input, port_index))?;

        let (reply, reply_rx) = bounded(1);
        self.command_sender
            .send(InputCommand::Connect {
                device_index,
                handle,
                reply,
            })
            .map_err(|_| Error::ThreadNotRunning("MIDI input"))?;
        reply_rx
            .recv()
            .map_err(|_| Error::ThreadNotRunning("MIDI input"))?
    }

    pub fn connect_by_name(&self, name: &str) -> Result<usize> {
        let device = Self::list_devices()
            .into_iter()
            .find(|d| name_matches(&d.name, name))
            .ok_or_else(|| {
                Error::MidiDevice(format!("No MIDI input device found matching '{}'", name))
            })?;
        self.connect(device.index)
    }

    pub fn disconnect(&self, port_index: usize) {
        let _ = self
            .command_sender
            .send(InputCommand::Disconnect(port_index));
    }

    pub fn disconnect_all(&self) {
        let _ = self.command_sender.send(InputCommand::DisconnectAll);
    }

    pub fn is_connected(&self, port_index: usize) -> bool {
        self.connections.read().contains_key(&port_index)
    }

    /// `(port_index, device_name)` for every open connection.
    pub fn connected_devices(&self) -> Vec<(usize, String)> {
        let mut devices: Vec<_> = self
            .connections
            .read()
            .iter()
            .map(|(&port, name)| (port, name.clone()))
            .collect();
        devices.sort_by_key(|&(port, _)| port);
        devices
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(InputCommand::Shutdown);
    }
}
