//! Producer handles and sinks for port queues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Sender, TrySendError};
use midiflow_core::{EventSink, MidiEvent};
use tracing::debug;

/// Writes into an input port, stamping events with the arrival time.
///
/// Cheap to clone; one handle per hardware callback or producer thread.
#[derive(Clone)]
pub struct InputHandle {
    pub(super) port_index: usize,
    pub(super) sender: Sender<MidiEvent>,
    pub(super) active: Arc<AtomicBool>,
    pub(super) epoch: Instant,
}

impl InputHandle {
    #[inline]
    pub fn port_index(&self) -> usize {
        self.port_index
    }

    /// Milliseconds since the owning port manager was created.
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Wraps raw wire bytes into a timestamped event and enqueues it.
    ///
    /// Returns `false` if the port is inactive or its queue is full.
    pub fn push_bytes(&self, bytes: &[u8]) -> bool {
        self.push(MidiEvent::realtime(self.now_ms(), bytes))
    }

    /// Enqueues an event as-is. Events without a timestamp get one.
    pub fn push(&self, mut event: MidiEvent) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }
        if event.time_stamp.is_none() && event.delta_time.is_none() {
            event.time_stamp = Some(self.now_ms());
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("MIDI input port {} queue full, dropping event", self.port_index);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Writes into an output port. Implements [`EventSink`] for routes.
#[derive(Clone)]
pub struct OutputHandle {
    pub(super) port_index: usize,
    pub(super) sender: Sender<MidiEvent>,
    pub(super) active: Arc<AtomicBool>,
}

impl OutputHandle {
    #[inline]
    pub fn port_index(&self) -> usize {
        self.port_index
    }

    /// Returns `false` if the port is inactive or its queue is full.
    pub fn push(&self, event: MidiEvent) -> bool {
        if !self.active.load(Ordering::Acquire) {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("MIDI output port {} queue full, dropping event", self.port_index);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl EventSink for OutputHandle {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

/// Forwards events into any crossbeam channel.
#[derive(Clone)]
pub struct ChannelSink(pub Sender<MidiEvent>);

impl EventSink for ChannelSink {
    fn send(&mut self, event: MidiEvent) {
        if let Err(e) = self.0.try_send(event) {
            debug!("MIDI sink channel full or disconnected: {}", e);
        }
    }
}

/// Adapts a closure into an [`EventSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(MidiEvent)> EventSink for FnSink<F> {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        (self.0)(event);
    }
}
