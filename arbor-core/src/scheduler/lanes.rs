//! Priority Lanes
//!
//! A lane is one bit of a small bitset; each bit is a priority class of
//! pending work. Lower bits are more significant, so the highest priority
//! lane of a set is its lowest set bit.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::SchedulerPriority;

/// A set of priority lanes. A single-bit set is a lane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Lanes(u32);

impl Lanes {
    /// The empty set.
    pub const NONE: Lanes = Lanes(0);
    /// Discrete, must-not-be-interrupted work (root renders, immediate updates).
    pub const SYNC: Lanes = Lanes(0b0_0001);
    /// Continuous user input such as drags and scrolls.
    pub const INPUT_CONTINUOUS: Lanes = Lanes(0b0_0010);
    /// Ordinary updates.
    pub const DEFAULT: Lanes = Lanes(0b0_0100);
    /// Updates started inside a transition.
    pub const TRANSITION: Lanes = Lanes(0b0_1000);
    /// Work that only runs when nothing else is pending.
    pub const IDLE: Lanes = Lanes(0b1_0000);

    const NAMES: [(Lanes, &'static str); 5] = [
        (Lanes::SYNC, "SYNC"),
        (Lanes::INPUT_CONTINUOUS, "INPUT_CONTINUOUS"),
        (Lanes::DEFAULT, "DEFAULT"),
        (Lanes::TRANSITION, "TRANSITION"),
        (Lanes::IDLE, "IDLE"),
    ];

    /// Get the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two sets.
    pub const fn merge(self, other: Lanes) -> Lanes {
        Lanes(self.0 | other.0)
    }

    /// `self` without any lane in `other`.
    pub const fn remove(self, other: Lanes) -> Lanes {
        Lanes(self.0 & !other.0)
    }

    pub const fn intersects(self, other: Lanes) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every lane of `subset` is in `self`. The empty set is a subset
    /// of every set, so updates re-queued with no lane always apply.
    pub const fn includes(self, subset: Lanes) -> bool {
        self.0 & subset.0 == subset.0
    }

    /// The most significant lane in the set, or `NONE`.
    pub const fn highest_priority(self) -> Lanes {
        Lanes(self.0 & self.0.wrapping_neg())
    }

    /// Scheduler priority at which work for this set's highest lane runs.
    pub fn to_scheduler_priority(self) -> SchedulerPriority {
        let lane = self.highest_priority();
        if lane == Lanes::SYNC {
            SchedulerPriority::Immediate
        } else if lane == Lanes::INPUT_CONTINUOUS {
            SchedulerPriority::UserBlocking
        } else if lane == Lanes::DEFAULT {
            SchedulerPriority::Normal
        } else {
            SchedulerPriority::Idle
        }
    }

    /// Lane assigned to an update triggered under the given ambient priority.
    pub fn from_scheduler_priority(priority: SchedulerPriority) -> Lanes {
        match priority {
            SchedulerPriority::Immediate => Lanes::SYNC,
            SchedulerPriority::UserBlocking => Lanes::INPUT_CONTINUOUS,
            SchedulerPriority::Normal => Lanes::DEFAULT,
            SchedulerPriority::Low | SchedulerPriority::Idle => Lanes::IDLE,
        }
    }
}

impl BitOr for Lanes {
    type Output = Lanes;

    fn bitor(self, rhs: Lanes) -> Lanes {
        self.merge(rhs)
    }
}

impl BitOrAssign for Lanes {
    fn bitor_assign(&mut self, rhs: Lanes) {
        *self = self.merge(rhs);
    }
}

impl fmt::Debug for Lanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (lane, name) in Self::NAMES {
            if self.intersects(lane) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
