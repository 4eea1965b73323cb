//! Guardia Core — domain models, error taxonomy and repository traits
//! shared by every guardia crate.
//!
//! Nothing in this crate performs I/O. Storage lives behind the traits in
//! [`repository`]; time lives behind [`clock::Clock`].

pub mod audit;
pub mod clock;
pub mod error;
pub mod models;
pub mod repository;

pub use audit::AuditSubject;
pub use clock::{Clock, ManualClock, SystemClock, deadline};
pub use error::{GuardiaError, GuardiaResult};
