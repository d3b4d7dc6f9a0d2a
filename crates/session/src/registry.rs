//! Channel interest tracking.

use std::sync::RwLock;

/// Logical channel kinds multiplexed over the single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Notifications,
    Chat,
}

/// A logical channel of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub subject_id: String,
    pub kind: ChannelKind,
}

/// Tracks the user-scoped notification channel and the single
/// team-scoped chat channel.
///
/// The chat subscription is replaced, never accumulated, when the active
/// team changes. The notification subscription is keyed by user identity
/// and persists for the whole session; team switches never touch it.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    user_id: RwLock<Option<String>>,
    active_team: RwLock<Option<String>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&self, user_id: impl Into<String>) {
        *self.user_id.write().unwrap() = Some(user_id.into());
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().unwrap().clone()
    }

    /// Replace the chat subscription. Returns the team it replaced.
    pub fn set_active_team(&self, team_id: impl Into<String>) -> Option<String> {
        self.active_team.write().unwrap().replace(team_id.into())
    }

    pub fn clear_active_team(&self) -> Option<String> {
        self.active_team.write().unwrap().take()
    }

    pub fn active_team(&self) -> Option<String> {
        self.active_team.read().unwrap().clone()
    }

    /// The connection may only be opened once the user identity is
    /// known; callers defer `connect` until this is true.
    pub fn connect_ready(&self) -> bool {
        self.user_id().is_some()
    }

    /// The current interest set.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        let mut subs = Vec::with_capacity(2);
        if let Some(user_id) = self.user_id() {
            subs.push(Subscription {
                subject_id: user_id,
                kind: ChannelKind::Notifications,
            });
        }
        if let Some(team_id) = self.active_team() {
            subs.push(Subscription {
                subject_id: team_id,
                kind: ChannelKind::Chat,
            });
        }
        subs
    }

    /// Forget everything at logout.
    pub fn reset(&self) {
        *self.user_id.write().unwrap() = None;
        *self.active_team.write().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_subscription_is_replaced_not_added() {
        let registry = SubscriptionRegistry::new();
        registry.set_user("1");
        assert!(registry.set_active_team("team-a").is_none());
        assert_eq!(registry.set_active_team("team-b").unwrap(), "team-a");

        let subs = registry.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(
            subs.iter().filter(|s| s.kind == ChannelKind::Chat).count(),
            1
        );
        assert_eq!(subs[1].subject_id, "team-b");
    }

    #[test]
    fn test_team_switch_never_touches_the_notification_subscription() {
        let registry = SubscriptionRegistry::new();
        registry.set_user("7");
        registry.set_active_team("team-a");
        registry.set_active_team("team-b");

        let subs = registry.subscriptions();
        assert_eq!(subs[0].subject_id, "7");
        assert_eq!(subs[0].kind, ChannelKind::Notifications);
    }

    #[test]
    fn test_connect_ready_requires_a_user() {
        let registry = SubscriptionRegistry::new();
        assert!(!registry.connect_ready());
        registry.set_active_team("team-a");
        assert!(!registry.connect_ready());
        registry.set_user("1");
        assert!(registry.connect_ready());
    }

    #[test]
    fn test_reset_forgets_everything() {
        let registry = SubscriptionRegistry::new();
        registry.set_user("1");
        registry.set_active_team("team-a");
        registry.reset();
        assert!(registry.subscriptions().is_empty());
    }
}
