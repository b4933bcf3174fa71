//! Capture -> resolve -> inject composition.

use crate::rawinput::{Capture, KeyboardRecord, classify_keyboard};
use crate::state::{Direction, KeyInjector, SocdState, SyntheticEvent, TrackedKey};

/// The resolver state together with the injector it drives.
///
/// Owned by the event loop for its whole lifetime.
#[derive(Debug)]
pub struct Pipeline<I: KeyInjector> {
    state: SocdState,
    injector: I,
}

impl<I: KeyInjector> Pipeline<I> {
    pub fn new(injector: I) -> Self {
        Self {
            state: SocdState::new(),
            injector,
        }
    }

    pub fn state(&self) -> &SocdState {
        &self.state
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    pub fn injector_mut(&mut self) -> &mut I {
        &mut self.injector
    }

    /// Handles one decoded keyboard record.
    ///
    /// Returns the classification so callers can account for it.
    #[inline]
    pub fn handle_record(&mut self, record: &KeyboardRecord) -> Capture {
        let capture = classify_keyboard(record);
        match capture {
            Capture::Echo => log::trace!("ignoring injected echo of vk {:#04x}", record.vkey),
            Capture::Untracked => {}
            Capture::Transition { key, is_down } => self.handle_transition(key, is_down),
        }
        capture
    }

    #[inline]
    fn handle_transition(&mut self, key: TrackedKey, is_down: bool) {
        let before = self.state.resolved();
        let sent = self
            .state
            .apply_transition(key, is_down, &mut self.injector);
        let after = self.state.resolved();

        if before != after {
            log::debug!(
                "{} {} -> {} => {} ({} synthetic)",
                key,
                if is_down { "down" } else { "up" },
                before,
                after,
                sent
            );
        }
    }

    /// Releases any outstanding synthetic press and resets to neutral.
    pub fn shutdown(&mut self) -> Option<SyntheticEvent> {
        let held: Direction = self.state.resolved();
        let release = self.state.shutdown_release();
        if let Some(event) = release {
            log::info!("releasing synthetic {} on shutdown", held);
            self.injector.inject(event);
        }
        release
    }

    pub fn into_injector(self) -> I {
        self.injector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rawinput::KEY_BREAK_FLAG;
    use crate::state::{RecordingInjector, SIMULATED_EVENT_MARKER};

    fn down(vkey: u16) -> KeyboardRecord {
        KeyboardRecord {
            vkey,
            flags: 0,
            extra_info: 0,
        }
    }

    fn up(vkey: u16) -> KeyboardRecord {
        KeyboardRecord {
            vkey,
            flags: KEY_BREAK_FLAG,
            extra_info: 0,
        }
    }

    fn echo(record: KeyboardRecord) -> KeyboardRecord {
        KeyboardRecord {
            extra_info: SIMULATED_EVENT_MARKER,
            ..record
        }
    }

    #[test]
    fn test_echoes_never_reach_state() {
        let mut pipeline = Pipeline::new(RecordingInjector::new());
        pipeline.handle_record(&down(0x41));
        pipeline.handle_record(&down(0x44));
        let snapshot = pipeline.state().clone();

        // Replay what the injector just sent, plus some bogus echoes.
        for record in [echo(up(0x41)), echo(down(0x44)), echo(down(0x41)), echo(up(0x44))] {
            assert_eq!(pipeline.handle_record(&record), Capture::Echo);
        }

        assert_eq!(pipeline.state(), &snapshot);
        assert_eq!(pipeline.injector().events().len(), 2);
    }

    #[test]
    fn test_untracked_keys_pass_through() {
        let mut pipeline = Pipeline::new(RecordingInjector::new());
        assert_eq!(pipeline.handle_record(&down(0x57)), Capture::Untracked);
        assert_eq!(pipeline.state(), &SocdState::new());
        assert!(pipeline.injector().events().is_empty());
    }

    #[test]
    fn test_both_held_then_shutdown_releases_winner() {
        let mut pipeline = Pipeline::new(RecordingInjector::new());
        pipeline.handle_record(&down(0x41));
        pipeline.handle_record(&down(0x44));
        pipeline.injector_mut().take();

        let release = pipeline.shutdown();
        assert_eq!(release, Some(SyntheticEvent::release(TrackedKey::Right)));
        assert_eq!(
            pipeline.injector().events(),
            &[SyntheticEvent::release(TrackedKey::Right)]
        );
        assert_eq!(pipeline.state(), &SocdState::new());
    }

    #[test]
    fn test_shutdown_without_simulation_is_silent() {
        let mut pipeline = Pipeline::new(RecordingInjector::new());
        pipeline.handle_record(&down(0x41));

        assert_eq!(pipeline.shutdown(), None);
        assert!(pipeline.into_injector().events().is_empty());
    }
}
