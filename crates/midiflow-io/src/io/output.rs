//! MIDI output: device enumeration and forwarding of output ports to devices.
//!
//! A dedicated thread owns every midir connection. Each connection is bound
//! to one output port; the thread selects over the command queue and all
//! bound port queues and writes whatever arrives to the matching device.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvError, Select, Sender};
use midiflow_core::MidiEvent;
use midir::{MidiOutput, MidiOutputConnection};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use super::name_matches;
use crate::error::{Error, Result};
use crate::port::{MidiPortManager, PortType};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiOutputDevice {
    pub index: usize,
    pub name: String,
}

enum OutputCommand {
    Connect {
        device_index: usize,
        port_index: usize,
        receiver: Receiver<MidiEvent>,
        reply: Sender<Result<String>>,
    },
    Disconnect(usize),
    DisconnectAll,
    Shutdown,
}

struct Binding {
    port_index: usize,
    receiver: Receiver<MidiEvent>,
    connection: MidiOutputConnection,
}

/// What woke the output thread up.
enum Wake {
    Command(std::result::Result<OutputCommand, RecvError>),
    Event(usize, std::result::Result<MidiEvent, RecvError>),
    Idle,
}

type ConnectionTable = Arc<RwLock<HashMap<usize, String>>>;

pub struct MidiOutputManager {
    port_manager: Arc<MidiPortManager>,
    command_sender: Sender<OutputCommand>,
    connections: ConnectionTable,
    client_name: String,
}

impl MidiOutputManager {
    pub fn new(port_manager: Arc<MidiPortManager>, client_name: impl Into<String>) -> Result<Self> {
        let client_name = client_name.into();
        let (command_sender, command_receiver) = bounded(64);
        let connections: ConnectionTable = Arc::new(RwLock::new(HashMap::new()));

        let thread_connections = Arc::clone(&connections);
        let thread_client = client_name.clone();
        thread::Builder::new()
            .name("midiflow-output".to_string())
            .spawn(move || {
                Self::output_thread(command_receiver, thread_connections, thread_client)
            })?;

        Ok(Self {
            port_manager,
            command_sender,
            connections,
            client_name,
        })
    }

    fn wait(command_receiver: &Receiver<OutputCommand>, bindings: &[Binding]) -> Wake {
        let mut select = Select::new();
        let command_slot = select.recv(command_receiver);
        for binding in bindings {
            select.recv(&binding.receiver);
        }

        match select.select_timeout(POLL_INTERVAL) {
            Ok(oper) if oper.index() == command_slot => {
                Wake::Command(oper.recv(command_receiver))
            }
            Ok(oper) => {
                let slot = oper.index() - 1;
                let event = oper.recv(&bindings[slot].receiver);
                Wake::Event(slot, event)
            }
            Err(_) => Wake::Idle,
        }
    }

    fn output_thread(
        command_receiver: Receiver<OutputCommand>,
        connections: ConnectionTable,
        client_name: String,
    ) {
        let mut bindings: Vec<Binding> = Vec::new();

        loop {
            match Self::wait(&command_receiver, &bindings) {
                Wake::Event(slot, Ok(event)) => {
                    let binding = &mut bindings[slot];
                    trace!("MIDI out {} -> {:02X?}", binding.port_index, event.as_bytes());
                    if let Err(e) = binding.connection.send(event.as_bytes()) {
                        warn!("MIDI output port {} send failed: {}", binding.port_index, e);
                    }
                }
                Wake::Event(slot, Err(_)) => {
                    let binding = bindings.remove(slot);
                    connections.write().remove(&binding.port_index);
                    binding.connection.close();
                }
                Wake::Command(Ok(OutputCommand::Connect {
                    device_index,
                    port_index,
                    receiver,
                    reply,
                })) => {
                    if let Some(pos) = bindings.iter().position(|b| b.port_index == port_index) {
                        bindings.remove(pos).connection.close();
                    }
                    let reply_value = match Self::connect_to_device(&client_name, device_index) {
                        Ok((connection, name)) => {
                            bindings.push(Binding {
                                port_index,
                                receiver,
                                connection,
                            });
                            connections.write().insert(port_index, name.clone());
                            debug!("MIDI output port {} connected to '{}'", port_index, name);
                            Ok(name)
                        }
                        Err(e) => {
                            warn!("MIDI output device {} connect failed: {}", device_index, e);
                            Err(e)
                        }
                    };
                    let _ = reply.send(reply_value);
                }
                Wake::Command(Ok(OutputCommand::Disconnect(port_index))) => {
                    if let Some(pos) = bindings.iter().position(|b| b.port_index == port_index) {
                        bindings.remove(pos).connection.close();
                        connections.write().remove(&port_index);
                        debug!("MIDI output port {} disconnected", port_index);
                    }
                }
                Wake::Command(Ok(OutputCommand::DisconnectAll)) => {
                    for binding in bindings.drain(..) {
                        binding.connection.close();
                    }
                    connections.write().clear();
                }
                Wake::Command(Ok(OutputCommand::Shutdown)) | Wake::Command(Err(_)) => break,
                Wake::Idle => {}
            }
        }

        for binding in bindings.drain(..) {
            binding.connection.close();
        }
        connections.write().clear();
    }

    fn connect_to_device(
        client_name: &str,
        device_index: usize,
    ) -> Result<(MidiOutputConnection, String)> {
        let midi_output = MidiOutput::new(client_name)?;

        let ports = midi_output.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output device {} not found", device_index))
        })?;

        let port_name = midi_output
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_output.connect(port, &format!("{}-out", client_name))?;

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<MidiOutputDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_output) = MidiOutput::new("midiflow-device-list") {
            for (index, port) in midi_output.ports().iter().enumerate() {
                let name = midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiOutputDevice { index, name });
            }
        }
        devices
    }

    /// Opens a device and creates an output port that forwards to it.
    ///
    /// Returns the output port index.
    pub fn connect(&self, device_index: usize) -> Result<usize> {
        let device_name = Self::list_devices()
            .into_iter()
            .find(|d| d.index == device_index)
            .map(|d| d.name)
            .ok_or_else(|| {
                Error::MidiDevice(format!("MIDI output device {} not found", device_index))
            })?;

        self.connect_as(device_index, device_name)
    }

    /// Creates the port, then connects it. A failed connection retires the
    /// port again so it never shows up unfed.
    fn connect_as(&self, device_index: usize, port_name: String) -> Result<usize> {
        let port_index = self.port_manager.create_output_port(port_name);
        if let Err(e) = self.connect_port(device_index, port_index) {
            self.port_manager.retire_port(PortType::Output, port_index);
            return Err(e);
        }
        Ok(port_index)
    }

    /// Forwards an existing output port to a device.
    ///
    /// The device thread becomes the consumer of that port's queue.
    pub fn connect_port(&self, device_index: usize, port_index: usize) -> Result<String> {
        let receiver = self
            .port_manager
            .output_receiver(port_index)
            .ok_or(Error::PortNotFound(PortType::Output, port_index))?;

        let (reply, reply_rx) = bounded(1);
        self.command_sender
            .send(OutputCommand::Connect {
                device_index,
                port_index,
                receiver,
                reply,
            })
            .map_err(|_| Error::ThreadNotRunning("MIDI output"))?;
        reply_rx
            .recv()
            .map_err(|_| Error::ThreadNotRunning("MIDI output"))?
    }

    pub fn connect_by_name(&self, name: &str) -> Result<usize> {
        let device = Self::list_devices()
            .into_iter()
            .find(|d| name_matches(&d.name, name))
            .ok_or_else(|| {
                Error::MidiDevice(format!("No MIDI output device found matching '{}'", name))
            })?;
        self.connect(device.index)
    }

    pub fn disconnect(&self, port_index: usize) {
        let _ = self
            .command_sender
            .send(OutputCommand::Disconnect(port_index));
    }

    pub fn disconnect_all(&self) {
        let _ = self.command_sender.send(OutputCommand::DisconnectAll);
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

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(OutputCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        let devices = MidiOutputManager::list_devices();
        for (i, device) in devices.iter().enumerate() {
            assert_eq!(device.index, i);
        }
    }

    #[test]
    fn test_manager_creation() {
        let port_manager = Arc::new(MidiPortManager::default());
        let manager = MidiOutputManager::new(port_manager, "midiflow-test").unwrap();
        assert!(manager.connected_devices().is_empty());
        assert!(!manager.is_connected(0));
    }

    #[test]
    fn test_connect_unknown_port_fails() {
        let port_manager = Arc::new(MidiPortManager::default());
        let manager = MidiOutputManager::new(port_manager, "midiflow-test").unwrap();
        assert!(matches!(
            manager.connect_port(0, 2),
            Err(Error::PortNotFound(PortType::Output, 2))
        ));
    }

    #[test]
    fn test_connect_missing_device_fails() {
        let port_manager = Arc::new(MidiPortManager::default());
        let port = port_manager.create_output_port("Out");
        let manager = MidiOutputManager::new(Arc::clone(&port_manager), "midiflow-test").unwrap();
        assert!(manager.connect_port(usize::MAX, port).is_err());
        assert!(!manager.is_connected(port));
    }

    #[test]
    #[ignore = "requires a MIDI output device"]
    fn test_forward_to_first_device() {
        let port_manager = Arc::new(MidiPortManager::default());
        let manager = MidiOutputManager::new(Arc::clone(&port_manager), "midiflow-test").unwrap();
        let port = manager.connect(0).unwrap();
        assert!(manager.is_connected(port));
        assert!(port_manager.write_output_event(port, MidiEvent::note_on(0, 60, 100)));
        thread::sleep(Duration::from_millis(50));
        assert!(port_manager.write_output_event(port, MidiEvent::note_off(0, 60, 0)));
        manager.disconnect(port);
    }

    #[test]
    fn test_failed_connect_leaves_no_port() {
        let port_manager = Arc::new(MidiPortManager::default());
        let manager = MidiOutputManager::new(Arc::clone(&port_manager), "midiflow-test").unwrap();
        assert!(manager.connect_as(usize::MAX, "Ghost".to_string()).is_err());
        assert!(port_manager.find_port(PortType::Output, "Ghost").is_none());
        assert_eq!(port_manager.port_count(PortType::Output), 0);
        assert!(!manager.is_connected(0));
    }
}
