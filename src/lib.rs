//! Shopping cart reconciliation for a storefront with anonymous browsing.
//!
//! Guests accumulate a cart in a local JSON blob; signed-in users get a
//! server-side cart keyed by their account. [`CartService`] hides the split
//! behind one API and merges the guest cart into the account cart on
//! sign-in.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{
    AuthenticatedUser, IdentityGateway, LocalCartStore, RemoteCartStore, UserDirectory,
};
pub use application::services::{AddOutcome, CartService, CartView, MergeOutcome, SessionPhase};
pub use domain::entities::{Cart, CartLine, CartLineDraft, StoreUser, UserProfileDraft};
pub use domain::value_objects::{LineId, UserId};
pub use shared::{AppConfig, CartError, Result};
pub use state::AppState;

/// Install the global tracing subscriber. Call once at startup; respects
/// `RUST_LOG` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
