//! Type definitions for the SOCD resolution pipeline.

use std::fmt;

use smallvec::SmallVec;

/// Marker value attached to every synthetic keyboard event.
///
/// Raw Input reports it back in `RAWKEYBOARD::ExtraInformation`, which is how
/// the capture path recognises its own echoes.
pub const SIMULATED_EVENT_MARKER: u32 = 0xFF51_5700;

/// Virtual key code of the key bound to the left direction (`A`).
pub const VK_LEFT_KEY: u16 = 0x41;
/// Virtual key code of the key bound to the right direction (`D`).
pub const VK_RIGHT_KEY: u16 = 0x44;

/// One of the two physical keys the filter tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedKey {
    Left,
    Right,
}

impl TrackedKey {
    /// Maps a virtual key code to a tracked key, if it is one.
    #[inline(always)]
    pub const fn from_vk(vk: u16) -> Option<Self> {
        match vk {
            VK_LEFT_KEY => Some(TrackedKey::Left),
            VK_RIGHT_KEY => Some(TrackedKey::Right),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn vk(self) -> u16 {
        match self {
            TrackedKey::Left => VK_LEFT_KEY,
            TrackedKey::Right => VK_RIGHT_KEY,
        }
    }

    #[inline(always)]
    pub const fn direction(self) -> Direction {
        match self {
            TrackedKey::Left => Direction::Left,
            TrackedKey::Right => Direction::Right,
        }
    }
}

impl fmt::Display for TrackedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackedKey::Left => write!(f, "A"),
            TrackedKey::Right => write!(f, "D"),
        }
    }
}

/// Logical direction exposed downstream after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Neutral,
    Left,
    Right,
}

impl Direction {
    /// The key whose press expresses this direction. `None` for neutral.
    #[inline(always)]
    pub const fn key(self) -> Option<TrackedKey> {
        match self {
            Direction::Neutral => None,
            Direction::Left => Some(TrackedKey::Left),
            Direction::Right => Some(TrackedKey::Right),
        }
    }

    #[inline(always)]
    pub const fn is_neutral(self) -> bool {
        matches!(self, Direction::Neutral)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Neutral => "NEUTRAL",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        };
        write!(f, "{}", name)
    }
}

/// Where a captured keyboard event came from.
///
/// Hides the marker comparison so the capture path only ever asks
/// "is this ours?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// Produced by a real keyboard (or by other software).
    Physical,
    /// Echo of an event this process injected.
    Injected,
}

impl EventOrigin {
    #[inline(always)]
    pub const fn from_extra_info(extra_info: u32) -> Self {
        if extra_info == SIMULATED_EVENT_MARKER {
            EventOrigin::Injected
        } else {
            EventOrigin::Physical
        }
    }
}

/// A single synthetic key press or release for a logical direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub key: TrackedKey,
    pub pressed: bool,
}

impl SyntheticEvent {
    #[inline(always)]
    pub const fn press(key: TrackedKey) -> Self {
        Self { key, pressed: true }
    }

    #[inline(always)]
    pub const fn release(key: TrackedKey) -> Self {
        Self {
            key,
            pressed: false,
        }
    }

    #[inline(always)]
    pub const fn direction(&self) -> Direction {
        self.key.direction()
    }
}

impl fmt::Display for SyntheticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.pressed { "press" } else { "release" };
        write!(f, "{}({})", action, self.key)
    }
}

/// Synthetic events required by one transition, in submission order.
///
/// At most one release followed by at most one press, so it never spills
/// to the heap.
pub type Decision = SmallVec<[SyntheticEvent; 2]>;

/// Sink for synthetic key events.
///
/// Submission is best-effort: implementations absorb their own failures.
pub trait KeyInjector {
    fn inject(&mut self, event: SyntheticEvent);
}

impl<T: KeyInjector + ?Sized> KeyInjector for &mut T {
    #[inline(always)]
    fn inject(&mut self, event: SyntheticEvent) {
        (**self).inject(event)
    }
}
