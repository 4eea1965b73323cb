//! Guardia Auth — sessions, permission evaluation, password recovery and
//! built-in role provisioning.
//!
//! Every service is generic over the repository traits of
//! `guardia-core`, so this crate never depends on a storage backend.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod password;
pub mod reset;
pub mod roles;
pub mod seeder;
pub mod service;
pub mod session;
pub mod token;

pub use audit::TracingAuditLog;
pub use catalog::PermissionCatalog;
pub use config::AuthConfig;
pub use error::AuthError;
pub use evaluator::PermissionEvaluator;
pub use reset::{PasswordResetService, ResetNotifier};
pub use roles::{NewRole, RoleService};
pub use seeder::{BUILTIN_ROLES, RoleSeeder, SeedReport};
pub use service::{LoginInput, LoginService};
pub use session::SessionManager;
