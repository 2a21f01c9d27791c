use crate::common::geometry::{obb::OrientedBox, shape::Axis};
use crate::engine::event::EventRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxChannel {
    Changed,
    IntervalChanged,
    Created,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxEvent {
    /// Fired after every model mutation with the recomposed box.
    Changed(OrientedBox),
    IntervalChanged { axis: Axis, min: f64, max: f64 },
    /// Fired once when the creation sequence completes.
    Created(OrientedBox),
}

impl BoxEvent {
    pub fn channel(&self) -> BoxChannel {
        match self {
            BoxEvent::Changed(_) => BoxChannel::Changed,
            BoxEvent::IntervalChanged { .. } => BoxChannel::IntervalChanged,
            BoxEvent::Created(_) => BoxChannel::Created,
        }
    }

    pub fn oriented_box(&self) -> Option<&OrientedBox> {
        match self {
            BoxEvent::Changed(obb) | BoxEvent::Created(obb) => Some(obb),
            BoxEvent::IntervalChanged { .. } => None,
        }
    }
}

pub type BoxEvents = EventRegistry<BoxChannel, BoxEvent>;

pub(crate) fn emit(events: &BoxEvents, event: BoxEvent) {
    events.emit(event.channel(), &event);
}
