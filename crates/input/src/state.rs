use crate::Key;
use std::collections::BTreeSet;

/// Keys currently held down.
///
/// Backends update this from their event stream during `poll_inputs`; game
/// code reads a snapshot of it once per frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pressed: BTreeSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns `true` if the key was not already down.
    pub fn press(&mut self, key: Key) -> bool {
        let fresh = self.pressed.insert(key);
        if fresh {
            tracing::trace!(%key, "key down");
        }
        fresh
    }

    /// Record a key release. Returns `true` if the key was down.
    pub fn release(&mut self, key: Key) -> bool {
        let was_down = self.pressed.remove(&key);
        if was_down {
            tracing::trace!(%key, "key up");
        }
        was_down
    }

    /// Apply a press or release.
    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.press(key);
        } else {
            self.release(key);
        }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Keys currently down, in `Key` order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.pressed.iter().copied()
    }

    /// Release everything (used when the window loses focus).
    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}
