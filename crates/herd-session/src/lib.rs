//! Session and authentication management for herd clients.
//!
//! [`SessionService`] is the single owner of the client-side session keys.
//! [`RouteGuard`] decides navigations from the stored token alone, and
//! [`AuthManager`] runs the two-branch sign-out protocol.

pub mod error;
pub mod guard;
pub mod manager;
pub mod navigator;
pub mod session;
pub mod sso;
pub mod storage;

pub use error::{Result, SessionError};
pub use guard::{GuardDecision, RouteGuard};
pub use manager::{AuthManager, SignOutOutcome};
pub use navigator::Navigator;
pub use session::{AuthMethod, Session, SessionService};
pub use sso::{AuthJsProvider, SsoConfig, SsoProvider, SsoStatus};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
