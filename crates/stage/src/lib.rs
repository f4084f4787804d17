//! Core of the podium presentation: page navigation, modal panels, the
//! particle backdrop, pointer effects and the session gate.
//!
//! Nothing in this crate touches a display. Every timed behaviour is a
//! state machine polled with an explicit `now`, so the host decides when
//! time advances.

pub mod clock;
pub mod content;
pub mod effects;
pub mod gate;
pub mod geometry;
pub mod macros;
pub mod modal;
pub mod navigator;
pub mod particles;
pub mod registry;
pub mod remote;
