//! Dashboard service models

pub mod filter;
pub mod user;

// Re-export for convenience
pub use filter::{Filter, Limit, Order};
pub use user::{SocialKind, User, UserView};
