//! Lyra front-end: session controller, settings, and terminal rendering.

pub mod controller;
pub mod render;
pub mod settings;

pub use controller::{SessionController, SessionStatus, SubmitError};
