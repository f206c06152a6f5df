//! # Sealbox Authz
//!
//! The role/permission authorization model.
//!
//! Three entities: [`Module`] (a named functional area), [`Permission`]
//! (a module + action pair), and [`Role`] (a named bundle of permissions).
//! The decision function is [`Role::allows`]: deny unless an active role
//! holds an active permission for the module and action, or carries
//! [`Capability::All`], the typed administrative bypass.
//!
//! Every file operation is gated here before any work happens. Download
//! is the one exception: it is gated by the per-file credential instead.

pub mod error;
pub mod model;

pub use error::AuthzError;
pub use model::{Action, Capability, Module, Permission, Role, RoleId, FILE_MANAGEMENT};
