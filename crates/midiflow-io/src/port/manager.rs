//! Multi-port MIDI manager.
//!
//! Index-based port tables behind `ArcSwap` so producers and routes never
//! contend with port creation; port metadata lives behind an `RwLock`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender};
use midiflow_core::MidiEvent;
use parking_lot::RwLock;

use super::handle::{InputHandle, OutputHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    Input,
    Output,
}

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
    pub port_type: PortType,
    pub active: Arc<AtomicBool>,
}

impl PortInfo {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

struct Port {
    sender: Sender<MidiEvent>,
    receiver: Receiver<MidiEvent>,
    active: Arc<AtomicBool>,
    retired: AtomicBool,
}

impl Port {
    fn new(fifo_size: usize) -> Self {
        let (sender, receiver) = bounded(fifo_size);
        Self {
            sender,
            receiver,
            active: Arc::new(AtomicBool::new(true)),
            retired: AtomicBool::new(false),
        }
    }

    #[inline]
    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

pub struct MidiPortManager {
    input_ports: ArcSwap<Vec<Arc<Port>>>,
    output_ports: ArcSwap<Vec<Arc<Port>>>,
    port_info: RwLock<Vec<PortInfo>>,
    fifo_size: usize,
    epoch: Instant,
}

impl MidiPortManager {
    pub fn new(fifo_size: usize) -> Self {
        Self {
            input_ports: ArcSwap::from_pointee(Vec::new()),
            output_ports: ArcSwap::from_pointee(Vec::new()),
            port_info: RwLock::new(Vec::new()),
            fifo_size: fifo_size.max(1),
            epoch: Instant::now(),
        }
    }

    #[inline]
    pub fn fifo_size(&self) -> usize {
        self.fifo_size
    }

    /// Reference instant for event timestamps.
    #[inline]
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Milliseconds since [`epoch`](Self::epoch).
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn ports(&self, port_type: PortType) -> &ArcSwap<Vec<Arc<Port>>> {
        match port_type {
            PortType::Input => &self.input_ports,
            PortType::Output => &self.output_ports,
        }
    }

    /// Live port at `port_index`; retired slots read as missing.
    fn port(&self, port_type: PortType, port_index: usize) -> Option<Arc<Port>> {
        self.ports(port_type)
            .load()
            .get(port_index)
            .filter(|port| !port.is_retired())
            .cloned()
    }

    fn create_port(&self, name: String, port_type: PortType) -> usize {
        let port = Port::new(self.fifo_size);
        let active = Arc::clone(&port.active);

        // Hold the info lock so concurrent creations get distinct indices.
        let mut port_info = self.port_info.write();
        let table = self.ports(port_type);
        let mut new_ports = (**table.load()).clone();
        let port_index = new_ports.len();
        new_ports.push(Arc::new(port));
        table.store(Arc::new(new_ports));

        port_info.push(PortInfo {
            index: port_index,
            name: name.clone(),
            port_type,
            active,
        });

        tracing::debug!("Created MIDI {:?} port {}: {}", port_type, port_index, name);
        port_index
    }

    pub fn create_input_port(&self, name: impl Into<String>) -> usize {
        self.create_port(name.into(), PortType::Input)
    }

    pub fn create_output_port(&self, name: impl Into<String>) -> usize {
        self.create_port(name.into(), PortType::Output)
    }

    /// Takes a port out of service for good.
    ///
    /// The port is deactivated, drained and unlisted. Its index is never
    /// reused, so indices held elsewhere cannot alias a later port. Returns
    /// `false` for unknown or already retired ports.
    pub fn retire_port(&self, port_type: PortType, port_index: usize) -> bool {
        let mut port_info = self.port_info.write();
        let Some(port) = self.port(port_type, port_index) else {
            return false;
        };
        port.retired.store(true, Ordering::Release);
        port.active.store(false, Ordering::Release);
        while port.receiver.try_recv().is_ok() {}
        port_info.retain(|info| !(info.port_type == port_type && info.index == port_index));

        tracing::debug!("Retired MIDI {:?} port {}", port_type, port_index);
        true
    }

    pub fn get_port_info(&self, port_type: PortType, port_index: usize) -> Option<PortInfo> {
        let port_info = self.port_info.read();
        port_info
            .iter()
            .find(|info| info.port_type == port_type && info.index == port_index)
            .cloned()
    }

    pub fn find_port(&self, port_type: PortType, name: &str) -> Option<PortInfo> {
        let port_info = self.port_info.read();
        port_info
            .iter()
            .find(|info| info.port_type == port_type && info.name == name)
            .cloned()
    }

    pub fn list_ports(&self) -> Vec<PortInfo> {
        self.port_info.read().clone()
    }

    pub fn list_input_ports(&self) -> Vec<PortInfo> {
        let port_info = self.port_info.read();
        port_info
            .iter()
            .filter(|info| info.port_type == PortType::Input)
            .cloned()
            .collect()
    }

    pub fn list_output_ports(&self) -> Vec<PortInfo> {
        let port_info = self.port_info.read();
        port_info
            .iter()
            .filter(|info| info.port_type == PortType::Output)
            .cloned()
            .collect()
    }

    /// Live ports of one direction.
    pub fn port_count(&self, port_type: PortType) -> usize {
        self.ports(port_type)
            .load()
            .iter()
            .filter(|port| !port.is_retired())
            .count()
    }

    /// Inactive ports refuse writes. Returns `false` for unknown ports.
    pub fn set_port_active(&self, port_type: PortType, port_index: usize, active: bool) -> bool {
        match self.port(port_type, port_index) {
            Some(port) => {
                port.active.store(active, Ordering::Release);
                tracing::debug!(
                    "MIDI {:?} port {} {}",
                    port_type,
                    port_index,
                    if active { "activated" } else { "deactivated" }
                );
                true
            }
            None => false,
        }
    }

    pub fn is_port_active(&self, port_type: PortType, port_index: usize) -> bool {
        self.port(port_type, port_index)
            .is_some_and(|port| port.active.load(Ordering::Acquire))
    }

    pub fn input_handle(&self, port_index: usize) -> Option<InputHandle> {
        self.port(PortType::Input, port_index)
            .map(|port| InputHandle {
                port_index,
                sender: port.sender.clone(),
                active: Arc::clone(&port.active),
                epoch: self.epoch,
            })
    }

    pub fn output_handle(&self, port_index: usize) -> Option<OutputHandle> {
        self.port(PortType::Output, port_index)
            .map(|port| OutputHandle {
                port_index,
                sender: port.sender.clone(),
                active: Arc::clone(&port.active),
            })
    }

    /// Consumer end of an input port's queue.
    ///
    /// Receivers share one queue: with several consumers each event goes to
    /// exactly one of them.
    pub fn input_receiver(&self, port_index: usize) -> Option<Receiver<MidiEvent>> {
        self.port(PortType::Input, port_index)
            .map(|port| port.receiver.clone())
    }

    /// Consumer end of an output port's queue.
    pub fn output_receiver(&self, port_index: usize) -> Option<Receiver<MidiEvent>> {
        self.port(PortType::Output, port_index)
            .map(|port| port.receiver.clone())
    }

    /// Returns `false` if the port is unknown, inactive or full.
    pub fn write_output_event(&self, port_index: usize, event: MidiEvent) -> bool {
        self.output_handle(port_index)
            .is_some_and(|handle| handle.push(event))
    }

    /// Drains everything currently queued on an input port.
    pub fn drain_input(&self, port_index: usize) -> Vec<MidiEvent> {
        self.input_receiver(port_index)
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }

    /// Drains everything currently queued on an output port.
    pub fn drain_output(&self, port_index: usize) -> Vec<MidiEvent> {
        self.output_receiver(port_index)
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }
}

impl Default for MidiPortManager {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ports() {
        let pm = MidiPortManager::new(16);
        let a = pm.create_input_port("Keys");
        let b = pm.create_input_port("Pads");
        let out = pm.create_output_port("Synth");
        assert_eq!((a, b, out), (0, 1, 0));
        assert_eq!(pm.list_input_ports().len(), 2);
        assert_eq!(pm.list_output_ports().len(), 1);
        assert_eq!(pm.port_count(PortType::Input), 2);
        assert_eq!(
            pm.get_port_info(PortType::Input, 1).map(|p| p.name),
            Some("Pads".to_string())
        );
        assert_eq!(pm.find_port(PortType::Output, "Synth").map(|p| p.index), Some(0));
        assert!(pm.get_port_info(PortType::Output, 3).is_none());
    }

    #[test]
    fn test_input_handle_stamps_events() {
        let pm = MidiPortManager::new(16);
        let port = pm.create_input_port("Keys");
        let handle = pm.input_handle(port).unwrap();

        assert!(handle.push_bytes(&[0x90, 60, 100]));
        assert!(handle.push(MidiEvent::sequenced(96, &[0x80, 60, 0])));

        let events = pm.drain_input(port);
        assert_eq!(events.len(), 2);
        assert!(events[0].time_stamp.is_some());
        assert_eq!(events[0].as_bytes(), &[0x90, 60, 100]);
        // Sequenced events keep their delta time and get no timestamp.
        assert_eq!(events[1].delta_time, Some(96));
        assert!(events[1].time_stamp.is_none());
    }

    #[test]
    fn test_queue_full_drops() {
        let pm = MidiPortManager::new(2);
        let port = pm.create_input_port("Tiny");
        let handle = pm.input_handle(port).unwrap();
        assert!(handle.push_bytes(&[0xF8]));
        assert!(handle.push_bytes(&[0xF8]));
        assert!(!handle.push_bytes(&[0xF8]));
        assert_eq!(pm.drain_input(port).len(), 2);
    }

    #[test]
    fn test_inactive_port_refuses_writes() {
        let pm = MidiPortManager::default();
        let port = pm.create_output_port("Out");
        assert!(pm.set_port_active(PortType::Output, port, false));
        assert!(!pm.is_port_active(PortType::Output, port));
        assert!(!pm.write_output_event(port, MidiEvent::note_on(0, 60, 1)));
        assert!(pm.drain_output(port).is_empty());

        pm.set_port_active(PortType::Output, port, true);
        assert!(pm.write_output_event(port, MidiEvent::note_on(0, 60, 1)));
        assert_eq!(pm.drain_output(port).len(), 1);

        assert!(!pm.set_port_active(PortType::Input, 7, false));
    }

    #[test]
    fn test_unknown_ports() {
        let pm = MidiPortManager::default();
        assert!(pm.input_handle(0).is_none());
        assert!(pm.output_receiver(0).is_none());
        assert!(!pm.write_output_event(0, MidiEvent::note_on(0, 60, 1)));
        assert!(pm.drain_input(3).is_empty());
    }

    #[test]
    fn test_retired_port_is_gone() {
        let pm = MidiPortManager::default();
        let keys = pm.create_input_port("Keys");
        let ghost = pm.create_input_port("Ghost");
        let handle = pm.input_handle(ghost).unwrap();
        assert!(handle.push_bytes(&[0xF8]));

        assert!(pm.retire_port(PortType::Input, ghost));
        assert!(!pm.retire_port(PortType::Input, ghost));
        assert!(pm.find_port(PortType::Input, "Ghost").is_none());
        assert_eq!(pm.list_input_ports().len(), 1);
        assert_eq!(pm.port_count(PortType::Input), 1);
        assert!(pm.input_handle(ghost).is_none());
        assert!(!pm.set_port_active(PortType::Input, ghost, true));
        // Stale handles can no longer feed it.
        assert!(!handle.push_bytes(&[0xF8]));

        // Indices are not recycled.
        let next = pm.create_input_port("Pads");
        assert_eq!((keys, ghost, next), (0, 1, 2));
    }

    #[test]
    fn test_port_info_tracks_active_flag() {
        let pm = MidiPortManager::default();
        let port = pm.create_input_port("Keys");
        let info = pm.get_port_info(PortType::Input, port).unwrap();
        assert!(info.is_active());
        pm.set_port_active(PortType::Input, port, false);
        assert!(!info.is_active());
    }
}
