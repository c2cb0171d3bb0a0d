//! Effect Flags
//!
//! Bits recorded on a work node during the render phase that tell the commit
//! phase what to do with it. `subtree_flags` holds the union of these bits
//! over a node's descendants so the commit sweep can skip clean subtrees.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of effect bits on a work node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u16);

impl Flags {
    /// No work.
    pub const NONE: Flags = Flags(0);
    /// Insert or move the node's host output.
    pub const PLACEMENT: Flags = Flags(1 << 0);
    /// Apply a prop or text change to the node's host object.
    pub const UPDATE: Flags = Flags(1 << 1);
    /// The node lost children; see its `deletions` list.
    pub const CHILD_DELETION: Flags = Flags(1 << 2);
    /// The node has passive effects to run after commit.
    pub const PASSIVE_EFFECT: Flags = Flags(1 << 3);

    /// Bits handled by the mutation sweep.
    pub const MUTATION_MASK: Flags =
        Flags(Self::PLACEMENT.0 | Self::UPDATE.0 | Self::CHILD_DELETION.0);

    /// Bits that may leave passive work behind.
    pub const PASSIVE_MASK: Flags = Flags(Self::PASSIVE_EFFECT.0 | Self::CHILD_DELETION.0);

    const NAMES: [(Flags, &'static str); 4] = [
        (Flags::PLACEMENT, "PLACEMENT"),
        (Flags::UPDATE, "UPDATE"),
        (Flags::CHILD_DELETION, "CHILD_DELETION"),
        (Flags::PASSIVE_EFFECT, "PASSIVE_EFFECT"),
    ];

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.insert(rhs);
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}
