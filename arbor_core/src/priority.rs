// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event priorities and their mapping to lanes and scheduler priorities.
//!
//! Input arrives in one of three [`InputCategory`] classes. Each maps to an
//! [`EventPriority`], which in turn names the lane an update dispatched
//! while handling the event lands in, and the [`PriorityLevel`] a render of
//! those lanes is scheduled at.

use crate::lane::Lanes;
use crate::scheduler::PriorityLevel;

/// Urgency of the event an update originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventPriority {
    /// Discrete user input, such as a click or a key press.
    Discrete,
    /// Continuous input, such as pointer movement or scrolling.
    Continuous,
    /// Everything not tied to an input event.
    Default,
    /// Work that can wait indefinitely.
    Idle,
}

impl EventPriority {
    /// The lane updates at this priority are assigned.
    #[must_use]
    pub const fn lane(self) -> Lanes {
        match self {
            Self::Discrete => Lanes::SYNC,
            Self::Continuous => Lanes::INPUT_CONTINUOUS,
            Self::Default => Lanes::DEFAULT,
            Self::Idle => Lanes::IDLE,
        }
    }

    /// The scheduler priority renders at this priority run with.
    #[must_use]
    pub const fn scheduler_priority(self) -> PriorityLevel {
        match self {
            Self::Discrete => PriorityLevel::Immediate,
            Self::Continuous => PriorityLevel::UserBlocking,
            Self::Default => PriorityLevel::Normal,
            Self::Idle => PriorityLevel::Idle,
        }
    }

    /// Returns `true` if `self` is strictly more urgent than `other`.
    #[must_use]
    pub const fn is_higher_than(self, other: Self) -> bool {
        self.lane().bits() < other.lane().bits()
    }
}

/// Maps a lane set to the event priority of its most urgent lane.
#[must_use]
pub const fn lanes_to_event_priority(lanes: Lanes) -> EventPriority {
    let lane = lanes.highest_priority_lane();
    if lane.is_empty() {
        return EventPriority::Idle;
    }
    if lane.bits() <= Lanes::SYNC.bits() {
        EventPriority::Discrete
    } else if lane.bits() <= Lanes::INPUT_CONTINUOUS.bits() {
        EventPriority::Continuous
    } else if lane.includes_non_idle_work() {
        EventPriority::Default
    } else {
        EventPriority::Idle
    }
}

/// Coarse class of an input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputCategory {
    /// One-off intentional input.
    Discrete,
    /// High-frequency input where only the latest value matters.
    Continuous,
    /// Not user input.
    Background,
}

impl InputCategory {
    /// Classifies an event by its DOM-style name.
    #[must_use]
    pub fn from_event_name(name: &str) -> Self {
        match name {
            "click" | "auxclick" | "dblclick" | "contextmenu" | "keydown" | "keyup"
            | "keypress" | "input" | "change" | "submit" | "reset" | "focusin" | "focusout"
            | "mousedown" | "mouseup" | "pointerdown" | "pointerup" | "pointercancel"
            | "touchstart" | "touchend" | "touchcancel" | "beforeinput" | "paste" | "copy"
            | "cut" | "select" | "compositionstart" | "compositionend" => Self::Discrete,
            "drag" | "dragenter" | "dragexit" | "dragleave" | "dragover" | "mousemove"
            | "mouseout" | "mouseover" | "pointermove" | "pointerout" | "pointerover"
            | "scroll" | "toggle" | "touchmove" | "wheel" | "mouseenter" | "mouseleave"
            | "pointerenter" | "pointerleave" => Self::Continuous,
            _ => Self::Background,
        }
    }

    /// The event priority updates dispatched while handling this input get.
    #[must_use]
    pub const fn event_priority(self) -> EventPriority {
        match self {
            Self::Discrete => EventPriority::Discrete,
            Self::Continuous => EventPriority::Continuous,
            Self::Background => EventPriority::Default,
        }
    }
}

/// The scheduler priority a render of `lanes` is scheduled with.
#[must_use]
pub const fn scheduler_priority_for_lanes(lanes: Lanes) -> PriorityLevel {
    lanes_to_event_priority(lanes).scheduler_priority()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_priorities_map_to_lanes_and_back() {
        for p in [
            EventPriority::Discrete,
            EventPriority::Continuous,
            EventPriority::Default,
            EventPriority::Idle,
        ] {
            assert_eq!(lanes_to_event_priority(p.lane()), p);
        }
    }

    #[test]
    fn transitions_render_at_default_event_priority() {
        assert_eq!(
            lanes_to_event_priority(Lanes::TRANSITION_1),
            EventPriority::Default
        );
        assert_eq!(
            scheduler_priority_for_lanes(Lanes::TRANSITION_1),
            PriorityLevel::Normal
        );
        assert_eq!(
            lanes_to_event_priority(Lanes::SYNC_HYDRATION),
            EventPriority::Discrete
        );
    }

    #[test]
    fn categories_follow_event_names() {
        assert_eq!(InputCategory::from_event_name("click"), InputCategory::Discrete);
        assert_eq!(InputCategory::from_event_name("wheel"), InputCategory::Continuous);
        assert_eq!(InputCategory::from_event_name("load"), InputCategory::Background);
        assert_eq!(
            InputCategory::Continuous.event_priority().scheduler_priority(),
            PriorityLevel::UserBlocking
        );
    }

    #[test]
    fn ordering_between_event_priorities() {
        assert!(EventPriority::Discrete.is_higher_than(EventPriority::Default));
        assert!(!EventPriority::Idle.is_higher_than(EventPriority::Default));
    }
}
