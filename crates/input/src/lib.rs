//! Input: backend-independent keys and the pressed-key state.
//!
//! # Invariants
//! - Backends translate their native key codes into [`Key`]; game code never
//!   sees windowing types.
//! - A key is down from its press until its release or a [`InputState::clear`].

pub mod key;
pub mod state;

pub use key::{Key, UnknownKey};
pub use state::InputState;

pub fn crate_info() -> &'static str {
    "woodgas-input v0.1.0"
}
