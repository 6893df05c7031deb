//! Gating and generic stages.
//!
//! The `filter_*` family drops every event that fails its predicate, which is
//! different from the combinators in [`crate::transform`]: those pass
//! non-matching events through unchanged. Use [`when`] to gate an arbitrary
//! stage with identity-if-no-match semantics.

use crate::classify;
use crate::error::Result;
use crate::event::MidiEvent;
use crate::pipeline::Stage;

/// Drop filter: emits the event only if `predicate` holds.
#[derive(Clone, Copy)]
pub struct Filter<P> {
    name: &'static str,
    predicate: P,
}

impl<P> Stage for Filter<P>
where
    P: Fn(&MidiEvent) -> bool + Send + Sync,
{
    #[inline]
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if (self.predicate)(&event) {
            emit(event);
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub fn filter<P>(predicate: P) -> Filter<P>
where
    P: Fn(&MidiEvent) -> bool + Send + Sync,
{
    Filter {
        name: "filter",
        predicate,
    }
}

/// Function-pointer predicate used by the named filters.
pub type Predicate = fn(&MidiEvent) -> bool;

macro_rules! named_filters {
    ($($(#[$meta:meta])* $name:ident => $predicate:path;)*) => {
        $(
            $(#[$meta])*
            pub fn $name() -> Filter<Predicate> {
                Filter {
                    name: stringify!($name),
                    predicate: $predicate,
                }
            }
        )*
    };
}

named_filters! {
    filter_note_on => classify::is_note_on;
    filter_note_off => classify::is_note_off;
    filter_note => classify::is_note;
    filter_poly_pressure => classify::is_poly_pressure;
    /// Note On/Off and Poly Pressure.
    filter_has_note => classify::has_note;
    filter_control_change => classify::is_control_change;
    filter_program_change => classify::is_program_change;
    filter_channel_pressure => classify::is_channel_pressure;
    filter_pitch_bend => classify::is_pitch_bend;
    filter_channel_mode => classify::is_channel_mode;
    filter_channel_voice => classify::is_channel_voice;
    filter_channel_message => classify::is_channel_message;
}

/// Keeps only channel messages on `channel`.
pub fn filter_channel(channel: u8) -> Filter<impl Fn(&MidiEvent) -> bool + Send + Sync + Clone> {
    Filter {
        name: "filter_channel",
        predicate: move |event: &MidiEvent| {
            classify::is_channel_message(event) && event.channel() == Some(channel)
        },
    }
}

/// One-to-one rewrite.
#[derive(Clone, Copy)]
pub struct Map<F> {
    f: F,
}

pub fn map<F>(f: F) -> Map<F>
where
    F: Fn(MidiEvent) -> MidiEvent + Send + Sync,
{
    Map { f }
}

impl<F> Stage for Map<F>
where
    F: Fn(MidiEvent) -> MidiEvent + Send + Sync,
{
    #[inline]
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        emit((self.f)(event));
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

/// One-to-many rewrite.
#[derive(Clone, Copy)]
pub struct FlatMap<F> {
    f: F,
}

pub fn flat_map<F, I>(f: F) -> FlatMap<F>
where
    F: Fn(MidiEvent) -> I + Send + Sync,
    I: IntoIterator<Item = MidiEvent>,
{
    FlatMap { f }
}

impl<F, I> Stage for FlatMap<F>
where
    F: Fn(MidiEvent) -> I + Send + Sync,
    I: IntoIterator<Item = MidiEvent>,
{
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        for out in (self.f)(event) {
            emit(out);
        }
    }

    fn name(&self) -> &'static str {
        "flat_map"
    }
}

/// Applies `stage` to events matching `predicate`; passes the rest unchanged.
#[derive(Clone, Copy)]
pub struct When<P, S> {
    predicate: P,
    stage: S,
}

pub fn when<P, S>(predicate: P, stage: S) -> When<P, S>
where
    P: Fn(&MidiEvent) -> bool + Send + Sync,
    S: Stage,
{
    When { predicate, stage }
}

impl<P, S> Stage for When<P, S>
where
    P: Fn(&MidiEvent) -> bool + Send + Sync,
    S: Stage,
{
    #[inline]
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        if (self.predicate)(&event) {
            self.stage.apply(event, emit);
        } else {
            emit(event);
        }
    }

    fn name(&self) -> &'static str {
        self.stage.name()
    }

    fn check(&self) -> Result<()> {
        self.stage.check()
    }
}

/// Observes events without changing them. Useful for logging taps.
#[derive(Clone, Copy)]
pub struct Inspect<F> {
    f: F,
}

pub fn inspect<F>(f: F) -> Inspect<F>
where
    F: Fn(&MidiEvent) + Send + Sync,
{
    Inspect { f }
}

impl<F> Stage for Inspect<F>
where
    F: Fn(&MidiEvent) + Send + Sync,
{
    #[inline]
    fn apply(&self, event: MidiEvent, emit: &mut dyn FnMut(MidiEvent)) {
        (self.f)(&event);
        emit(event);
    }

    fn name(&self) -> &'static str {
        "inspect"
    }
}
