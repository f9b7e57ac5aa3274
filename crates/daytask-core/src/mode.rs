//! Actor mode derived from authentication and connectivity

use std::fmt;

use tokio::sync::watch;

/// How mutations are routed right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorMode {
    /// Not signed in; everything stays local
    Guest,
    /// Signed in but unreachable; mutations are queued
    OfflineUser,
    /// Signed in and reachable; mutations go to the server first
    OnlineUser,
}

impl ActorMode {
    #[must_use]
    pub const fn resolve(is_authenticated: bool, is_online: bool) -> Self {
        match (is_authenticated, is_online) {
            (false, _) => Self::Guest,
            (true, true) => Self::OnlineUser,
            (true, false) => Self::OfflineUser,
        }
    }

    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Guest)
    }
}

impl fmt::Display for ActorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => f.write_str("guest"),
            Self::OfflineUser => f.write_str("offline-user"),
            Self::OnlineUser => f.write_str("online-user"),
        }
    }
}

/// A change (or non-change) of mode caused by one input update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: ActorMode,
    pub to: ActorMode,
}

impl ModeTransition {
    #[must_use]
    pub fn changed(self) -> bool {
        self.from != self.to
    }

    /// Guest became authenticated
    #[must_use]
    pub const fn is_login(self) -> bool {
        matches!(self.from, ActorMode::Guest) && self.to.is_authenticated()
    }

    /// Any other mode became online-user
    #[must_use]
    pub const fn entered_online(self) -> bool {
        !matches!(self.from, ActorMode::OnlineUser) && matches!(self.to, ActorMode::OnlineUser)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Inputs {
    is_authenticated: bool,
    is_online: bool,
}

/// Recomputes the mode on every input change and publishes it.
pub struct ModeResolver {
    inputs: watch::Sender<Inputs>,
    mode: watch::Sender<ActorMode>,
}

impl ModeResolver {
    #[must_use]
    pub fn new(is_authenticated: bool, is_online: bool) -> Self {
        let inputs = Inputs {
            is_authenticated,
            is_online,
        };
        let (inputs, _) = watch::channel(inputs);
        let (mode, _) = watch::channel(ActorMode::resolve(is_authenticated, is_online));
        Self { inputs, mode }
    }

    #[must_use]
    pub fn current(&self) -> ActorMode {
        *self.mode.borrow()
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inputs.borrow().is_online
    }

    /// Watch mode changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActorMode> {
        self.mode.subscribe()
    }

    pub fn set_online(&self, is_online: bool) -> ModeTransition {
        self.update(|inputs| inputs.is_online = is_online)
    }

    pub fn set_authenticated(&self, is_authenticated: bool) -> ModeTransition {
        self.update(|inputs| inputs.is_authenticated = is_authenticated)
    }

    fn update(&self, change: impl FnOnce(&mut Inputs)) -> ModeTransition {
        self.inputs.send_modify(change);
        let inputs = *self.inputs.borrow();
        let to = ActorMode::resolve(inputs.is_authenticated, inputs.is_online);
        let from = self.mode.send_replace(to);
        let transition = ModeTransition { from, to };
        if transition.changed() {
            tracing::info!("Actor mode changed: {} -> {}", from, to);
        }
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_table() {
        assert_eq!(ActorMode::resolve(false, false), ActorMode::Guest);
        assert_eq!(ActorMode::resolve(false, true), ActorMode::Guest);
        assert_eq!(ActorMode::resolve(true, true), ActorMode::OnlineUser);
        assert_eq!(ActorMode::resolve(true, false), ActorMode::OfflineUser);
    }

    #[test]
    fn test_login_while_online() {
        let resolver = ModeResolver::new(false, true);
        let transition = resolver.set_authenticated(true);

        assert!(transition.is_login());
        assert!(transition.entered_online());
        assert_eq!(resolver.current(), ActorMode::OnlineUser);
    }

    #[test]
    fn test_reconnect_is_not_a_login() {
        let resolver = ModeResolver::new(true, false);
        let transition = resolver.set_online(true);

        assert!(!transition.is_login());
        assert!(transition.entered_online());
    }

    #[test]
    fn test_repeated_input_is_not_a_change() {
        let resolver = ModeResolver::new(true, true);
        let transition = resolver.set_online(true);

        assert!(!transition.changed());
        assert!(!transition.entered_online());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let resolver = ModeResolver::new(false, false);
        let mut rx = resolver.subscribe();

        resolver.set_authenticated(true);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ActorMode::OfflineUser);
    }
}
