//! Session state and channel interest tracking.

pub mod registry;
pub mod store;

pub use registry::{ChannelKind, Subscription, SubscriptionRegistry};
pub use store::{MemorySessionStore, Session, SessionStore, TEAM_KEY, TOKEN_KEY, USER_KEY};
