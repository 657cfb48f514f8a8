//! QRGate - Gate Access Controller
//!
//! Continuous visual-code reading for a physical access gate: codes decoded
//! from the camera feed are checked against a shared allow-list and, when
//! authorized, pulse the gate output while the access event is reported to
//! the remote service.
//!
//! ## Components
//!
//! 1. AllowListStore - remote keyed store client (codes namespace)
//! 2. AllowListCache - local snapshot, refreshed on a timer
//! 3. DebounceGate - duplicate admission suppression
//! 4. OutputActuator - exclusive, fixed-duration output pulse
//! 5. NotificationDispatcher - best-effort access event reporting
//! 6. FrameGrabber - single-frame capture from the camera device
//! 7. DecoderClient - external image-decode service adapter
//! 8. GateController - the scan loop tying it all together
//! 9. AccessLog - recent admissions (ring buffer)
//! 10. WebAPI - admin surface for the allow-list

pub mod access_log;
pub mod actuator;
pub mod allow_list;
pub mod capture;
pub mod debounce;
pub mod decoder;
pub mod error;
pub mod gate_controller;
pub mod models;
pub mod notifier;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
