//! SOCD resolution state machine.
//!
//! Tracks the physical state of the two opposing keys and decides, per
//! transition, which synthetic events are needed so the OS only ever sees a
//! single logical direction held. Resolution uses last-input priority.

pub mod simulation;
pub mod types;

use crate::util::likely;

pub use simulation::RecordingInjector;
#[cfg(windows)]
pub use simulation::SendInputInjector;
pub use types::*;

/// Complete resolution state, owned by the event loop.
///
/// Mutated serially by one thread; no synchronisation needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocdState {
    left_down: bool,
    right_down: bool,
    last_pressed: TrackedKey,
    resolved: Direction,
    simulating: bool,
}

impl Default for SocdState {
    fn default() -> Self {
        Self::new()
    }
}

impl SocdState {
    /// Creates a neutral state: nothing held, nothing simulated.
    pub const fn new() -> Self {
        Self {
            left_down: false,
            right_down: false,
            last_pressed: TrackedKey::Left,
            resolved: Direction::Neutral,
            simulating: false,
        }
    }

    #[inline(always)]
    pub fn is_held(&self, key: TrackedKey) -> bool {
        match key {
            TrackedKey::Left => self.left_down,
            TrackedKey::Right => self.right_down,
        }
    }

    #[inline(always)]
    pub fn last_pressed(&self) -> TrackedKey {
        self.last_pressed
    }

    #[inline(always)]
    pub fn resolved(&self) -> Direction {
        self.resolved
    }

    /// True while a synthetic press may still be outstanding.
    #[inline(always)]
    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    #[inline(always)]
    fn both_held(&self) -> bool {
        self.left_down && self.right_down
    }

    #[inline(always)]
    fn set_held(&mut self, key: TrackedKey, down: bool) {
        match key {
            TrackedKey::Left => self.left_down = down,
            TrackedKey::Right => self.right_down = down,
        }
    }

    /// Direction implied by the current physical state.
    #[inline(always)]
    pub fn physical_direction(&self) -> Direction {
        match (self.left_down, self.right_down) {
            (false, false) => Direction::Neutral,
            (true, false) => Direction::Left,
            (false, true) => Direction::Right,
            (true, true) => self.last_pressed.direction(),
        }
    }

    /// Applies one physical transition and returns the synthetic events it
    /// requires, release strictly before press.
    ///
    /// A key-down for a key already held (auto-repeat) is a no-op.
    #[inline]
    pub fn on_key_transition(&mut self, key: TrackedKey, is_down: bool) -> Decision {
        let mut decision = Decision::new();

        if is_down {
            if self.is_held(key) {
                return decision;
            }
            self.last_pressed = key;
        }
        self.set_held(key, is_down);

        let old = self.resolved;
        let new = self.physical_direction();

        // Common case: the loser was released, or nothing changed.
        if likely(new == old) {
            return decision;
        }

        if self.both_held() || self.simulating {
            if let Some(old_key) = old.key() {
                decision.push(SyntheticEvent::release(old_key));
            }
            if let Some(new_key) = new.key() {
                decision.push(SyntheticEvent::press(new_key));
            }
            self.simulating = !new.is_neutral();
        } else {
            self.simulating = false;
        }

        self.resolved = new;
        decision
    }

    /// Applies a transition and submits the resulting events in order.
    ///
    /// Returns the number of events handed to the injector.
    #[inline]
    pub fn apply_transition<I: KeyInjector + ?Sized>(
        &mut self,
        key: TrackedKey,
        is_down: bool,
        injector: &mut I,
    ) -> usize {
        let decision = self.on_key_transition(key, is_down);
        for &event in decision.iter() {
            injector.inject(event);
        }
        decision.len()
    }

    /// Forces the state back to neutral for shutdown.
    ///
    /// Returns the single release needed to clear an outstanding synthetic
    /// press, if any.
    pub fn shutdown_release(&mut self) -> Option<SyntheticEvent> {
        let pending = if self.simulating {
            self.resolved.key().map(SyntheticEvent::release)
        } else {
            None
        };
        *self = Self::new();
        pending
    }
}
