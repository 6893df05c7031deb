//! Live routing of a port's event stream through a pipeline.
//!
//! A [`Route`] owns one thread that drains a source queue in arrival order,
//! runs each event through a shared [`Pipeline`] and hands the results to a
//! sink. The pipeline itself never blocks; only the thread waits on the queue.
//! Dropping the route (or calling [`Route::stop`]) ends the subscription.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use midiflow_core::{EventSink, MidiEvent, Pipeline};
use tracing::{debug, trace};

use crate::error::Result;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-route event counters.
#[derive(Debug, Default)]
pub struct RouteStats {
    received: AtomicU64,
    emitted: AtomicU64,
}

impl RouteStats {
    #[inline]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

pub struct Route {
    name: String,
    running: Arc<AtomicBool>,
    stats: Arc<RouteStats>,
    thread: Option<JoinHandle<()>>,
}

impl Route {
    /// Spawns the routing thread.
    pub fn spawn<S>(
        name: impl Into<String>,
        source: Receiver<MidiEvent>,
        pipeline: Arc<Pipeline>,
        mut sink: S,
    ) -> Result<Self>
    where
        S: EventSink + Send + 'static,
    {
        let name = name.into();
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(RouteStats::default());

        let thread_running = Arc::clone(&running);
        let thread_stats = Arc::clone(&stats);
        let thread_name = name.clone();

        let thread = thread::Builder::new()
            .name(format!("midiflow-route-{}", name))
            .spawn(move || {
                debug!("MIDI route '{}' started: {:?}", thread_name, pipeline);
                while thread_running.load(Ordering::Acquire) {
                    match source.recv_timeout(POLL_INTERVAL) {
                        Ok(event) => {
                            thread_stats.received.fetch_add(1, Ordering::Relaxed);
                            trace!("route '{}' <- {:02X?}", thread_name, event.as_bytes());
                            pipeline.process(event, |out| {
                                thread_stats.emitted.fetch_add(1, Ordering::Relaxed);
                                sink.send(out);
                            });
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("MIDI route '{}' stopped", thread_name);
            })?;

        Ok(Self {
            name,
            running,
            stats,
            thread: Some(thread),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    #[inline]
    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }

    /// Stops the thread and waits for it. Events still queued stay queued.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                debug!("MIDI route '{}' thread panicked", self.name);
            }
        }
    }
}

impl Drop for Route {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ChannelSink;
    use crossbeam_channel::unbounded;
    use midiflow_core::transform::{map_channels, transpose};

    #[test]
    fn test_route_applies_pipeline_in_order() {
        let (in_tx, in_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        let pipeline = Arc::new(
            Pipeline::builder()
                .stage(transpose(12))
                .stage(map_channels([0], [0, 1]))
                .build()
                .unwrap(),
        );

        let route = Route::spawn("test", in_rx, pipeline, ChannelSink(out_tx)).unwrap();
        for note in [60, 62, 64] {
            in_tx.send(MidiEvent::note_on(0, note, 100)).unwrap();
        }

        let out: Vec<MidiEvent> = (0..6)
            .map(|_| out_rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        let notes: Vec<u8> = out.iter().filter_map(|e| e.note()).collect();
        assert_eq!(notes, vec![72, 72, 74, 74, 76, 76]);
        assert_eq!(route.stats().received(), 3);
        assert_eq!(route.stats().emitted(), 6);
        route.stop();
    }

    #[test]
    fn test_route_ends_when_source_disconnects() {
        let (in_tx, in_rx) = unbounded::<MidiEvent>();
        let (out_tx, _out_rx) = unbounded();
        let route = Route::spawn(
            "closing",
            in_rx,
            Arc::new(Pipeline::identity()),
            ChannelSink(out_tx),
        )
        .unwrap();
        drop(in_tx);

        for _ in 0..50 {
            if !route.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!route.is_running());
    }
}
