use anyhow::{Result, ensure};
use morsescope_messages::DecodedEvent;

use crate::transform::Viewport;

/// Spans narrower than this (in pixels) are drawn without their character label.
const MIN_LABEL_WIDTH: f64 = 20.0;

/// Sorted, non-overlapping decoded character intervals.
#[derive(Debug, Default, Clone)]
pub struct RegionIndex {
    events: Vec<DecodedEvent>,
}

/// A region as laid out on the visible part of the time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpan {
    pub x_start: f64,
    pub x_end: f64,
    pub ch: char,
    pub show_label: bool,
}

impl RegionIndex {
    pub fn new(events: Vec<DecodedEvent>) -> Result<Self> {
        validate(&events)?;
        Ok(Self { events })
    }

    /// Replace the held events. On error the previous events are kept.
    pub fn set_events(&mut self, events: Vec<DecodedEvent>) -> Result<()> {
        validate(&events)?;
        self.events = events;
        Ok(())
    }

    pub fn events(&self) -> &[DecodedEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event keyed at time `t`, if any.
    pub fn active_at(&self, t: f64) -> Option<&DecodedEvent> {
        // first event starting after t; the candidate is the one before it
        let idx = self.events.partition_point(|ev| ev.start <= t);
        let candidate = self.events.get(idx.checked_sub(1)?)?;
        candidate.contains(t).then_some(candidate)
    }

    /// Events at least partially inside `[t0, t1)`, in time order.
    pub fn visible_between(&self, t0: f64, t1: f64) -> &[DecodedEvent] {
        // ends are sorted too because intervals never overlap
        let lo = self.events.partition_point(|ev| ev.end <= t0);
        let hi = self.events.partition_point(|ev| ev.start < t1);
        if hi <= lo {
            return &[];
        }
        &self.events[lo..hi]
    }

    /// Lay out the visible regions in viewport pixels.
    pub fn overlay(&self, viewport: &Viewport) -> Vec<RegionSpan> {
        let Some((t0, t1)) = viewport.visible_time_range() else {
            return Vec::new();
        };
        self.visible_between(t0, t1)
            .iter()
            .filter_map(|ev| {
                let x_start = viewport.x_at(ev.start)?;
                let x_end = viewport.x_at(ev.end)?;
                Some(RegionSpan {
                    x_start,
                    x_end,
                    ch: ev.ch,
                    show_label: x_end - x_start > MIN_LABEL_WIDTH,
                })
            })
            .collect()
    }
}

fn validate(events: &[DecodedEvent]) -> Result<()> {
    for (i, ev) in events.iter().enumerate() {
        ensure!(
            ev.start.is_finite() && ev.end.is_finite() && ev.start >= 0.0,
            "event {i} ({:?}) has an invalid start/end",
            ev.ch
        );
        ensure!(ev.end > ev.start, "event {i} ({:?}) ends before it starts", ev.ch);
    }
    for (i, pair) in events.windows(2).enumerate() {
        ensure!(
            pair[0].end <= pair[1].start,
            "events {i} and {} overlap or are out of order",
            i + 1
        );
    }
    Ok(())
}
