//! Event bitmasks.
//!
//! Events are single bits in a 32-bit word. Bits 0..30 are free for the
//! application; bit 30 ([`EventMask::TIMEOUT`]) and bit 31
//! ([`EventMask::TRANSITION`]) are reserved by the state machine and are
//! implicitly part of every wait.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// A set of events, one bit per event.
///
/// # Example
///
/// ```rust
/// use evented_sm::core::EventMask;
///
/// const PACKET_RECEIVED: EventMask = EventMask::event(0);
/// const SYNC_MISSED: EventMask = EventMask::event(1);
///
/// let both = PACKET_RECEIVED | SYNC_MISSED;
/// assert!(both.contains(SYNC_MISSED));
/// assert!(!both.intersects(EventMask::RESERVED));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventMask(u32);

impl EventMask {
    /// Number of bits available to the application.
    pub const APP_EVENT_COUNT: u8 = 30;

    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Synthesized by a non-blocking wait that found nothing, or posted by
    /// an external timer.
    pub const TIMEOUT: Self = Self(1 << 30);

    /// Posted whenever a state transition is requested.
    pub const TRANSITION: Self = Self(1 << 31);

    /// Both reserved bits.
    pub const RESERVED: Self = Self(Self::TIMEOUT.0 | Self::TRANSITION.0);

    /// Every application bit.
    pub const ALL_APP: Self = Self(!Self::RESERVED.0);

    /// Application event number `index`.
    ///
    /// Panics if `index` is 30 or above; in a `const` item that is a
    /// compile error.
    pub const fn event(index: u8) -> Self {
        assert!(index < Self::APP_EVENT_COUNT, "application event index out of range");
        Self(1 << index)
    }

    /// Build a mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Bits of `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// `self` with the reserved bits removed.
    pub const fn without_reserved(self) -> Self {
        self.difference(Self::RESERVED)
    }
}

impl BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl BitAndAssign for EventMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for EventMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl From<u32> for EventMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventMask({:#010x})", self.0)
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        let mut first = true;
        f.write_str("{")?;
        for bit in 0..32u32 {
            if self.0 & (1 << bit) == 0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match bit {
                30 => f.write_str("TIMEOUT")?,
                31 => f.write_str("TRANSITION")?,
                n => write!(f, "E{n}")?,
            }
        }
        f.write_str("}")
    }
}
