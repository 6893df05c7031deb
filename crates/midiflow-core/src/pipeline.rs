//! Stream pipeline composer.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s applied left to right to
//! each event. A stage may emit zero, one or many events; every emitted event
//! continues through the remaining stages before the next one is produced, so
//! a single `process` call runs the whole chain synchronously and in depth
//! first order. Pipelines hold no per-event state and are `Send + Sync`.
//!
//! ```
//! use midiflow_core::{filter, transform, MidiEvent, Pipeline};
//!
//! let pipeline = Pipeline::builder()
//!     .stage(filter::filter_note())
//!     .stage(transform::transpose(12))
//!     .stage(transform::map_channels([0], [1, 2]))
//!     .build()
//!     .unwrap();
//!
//! let out = pipeline.process_to_vec(MidiEvent::note_on(0, 60, 100));
//! assert_eq!(out.len(), 2);
//! assert!(out.iter().all(|e| e.note() == Some(72)));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::warn;

use crate::error::Result;
use crate::event::MidiEvent;
use crate::validate;

/// Output of a single `process` call. Four events stay inline.
pub type Events = SmallVec<[MidiEvent; 4]>;

/// One step of a pipeline: consumes an event and emits 0..n events.
///
/// Implementations must be pure per event: the output may depend only on the
/// input event and the stage's construction-time parameters.
pub trait Stage: Send + Sync {
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent));

    /// Short identifier used in logs and `Debug` output.
    fn name(&self) -> &'static str;

    /// Validates construction parameters. Called by strict pipelines at build time.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    #[inline]
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        (**self).apply(event, emit)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn check(&self) -> Result<()> {
        (**self).check()
    }
}

impl<S: Stage + ?Sized> Stage for Arc<S> {
    #[inline]
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        (**self).apply(event, emit)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn check(&self) -> Result<()> {
        (**self).check()
    }
}

/// Destination for pipeline output.
pub trait EventSink {
    fn send(&mut self, event: MidiEvent);
}

impl EventSink for Vec<MidiEvent> {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

impl EventSink for VecDeque<MidiEvent> {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        self.push_back(event);
    }
}

impl<A: smallvec::Array<Item = MidiEvent>> EventSink for SmallVec<A> {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        (**self).send(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    #[inline]
    fn send(&mut self, event: MidiEvent) {
        (**self).send(event);
    }
}

fn run(stages: &[Box<dyn Stage>], event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
    match stages.split_first() {
        None => emit(event),
        Some((first, rest)) => first.apply(event, &mut |out| run(rest, out, &mut *emit)),
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    strict: bool,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Pipeline with no stages: every event passes through unchanged.
    pub fn identity() -> Self {
        Self {
            stages: Vec::new(),
            strict: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs one event through every stage, handing each result to `sink`.
    ///
    /// In strict mode, results that fail [`validate::check_event`] are dropped
    /// with a warning.
    pub fn process<F>(&self, event: MidiEvent, mut sink: F)
    where
        F: FnMut(MidiEvent),
    {
        if self.strict {
            run(&self.stages, event, &mut |out| {
                match validate::check_event(&out) {
                    Ok(()) => sink(out),
                    Err(e) => warn!("Dropping invalid MIDI event {:02X?}: {}", out.as_bytes(), e),
                }
            });
        } else {
            run(&self.stages, event, &mut sink);
        }
    }

    #[inline]
    pub fn process_into<S: EventSink + ?Sized>(&self, event: MidiEvent, sink: &mut S) {
        self.process(event, |out| sink.send(out));
    }

    pub fn process_to_vec(&self, event: MidiEvent) -> Events {
        let mut out = Events::new();
        self.process_into(event, &mut out);
        out
    }

    /// Runs one event and validates every result, regardless of strictness.
    ///
    /// Returns the first validation error instead of dropping.
    pub fn try_process(&self, event: MidiEvent) -> Result<Events> {
        let mut out = Events::new();
        run(&self.stages, event, &mut |e| out.push(e));
        for event in &out {
            validate::check_event(event)?;
        }
        Ok(out)
    }

    /// Processes a finite batch in order and collects every result.
    pub fn run_all<I>(&self, events: I) -> Vec<MidiEvent>
    where
        I: IntoIterator<Item = MidiEvent>,
    {
        let mut out = Vec::new();
        for event in events {
            self.process_into(event, &mut out);
        }
        out
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("strict", &self.strict)
            .finish()
    }
}

/// Pipelines nest: a pipeline can be a stage of another.
impl Stage for Pipeline {
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        self.process(event, emit);
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }

    fn check(&self) -> Result<()> {
        self.stages.iter().try_for_each(|s| s.check())
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    strict: bool,
}

impl PipelineBuilder {
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Rejects out-of-range stage parameters at build time and drops
    /// protocol-invalid results at runtime.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn strict_if(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        if self.strict {
            for stage in &self.stages {
                stage.check()?;
            }
        }
        Ok(Pipeline {
            stages: self.stages,
            strict: self.strict,
        })
    }
}

/// Iterator adaptor returned by [`PipelineIteratorExt::through`].
pub struct Through<'p, I> {
    pipeline: &'p Pipeline,
    inner: I,
    pending: VecDeque<MidiEvent>,
}

impl<I> Iterator for Through<'_, I>
where
    I: Iterator<Item = MidiEvent>,
{
    type Item = MidiEvent;

    fn next(&mut self) -> Option<MidiEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let next = self.inner.next()?;
            let pending = &mut self.pending;
            self.pipeline.process(next, |out| pending.push_back(out));
        }
    }
}

pub trait PipelineIteratorExt: Iterator<Item = MidiEvent> + Sized {
    /// Lazily flat-maps every event through `pipeline`.
    fn through(self, pipeline: &Pipeline) -> Through<'_, Self> {
        Through {
            pipeline,
            inner: self,
            pending: VecDeque::new(),
        }
    }
}

impl<I: Iterator<Item = MidiEvent>> PipelineIteratorExt for I {}
