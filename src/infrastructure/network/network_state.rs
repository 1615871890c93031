use crate::application::ports::Connectivity;
use async_trait::async_trait;
use tokio::sync::watch;

/// Connectivity flag fed by the host's network callbacks.
///
/// Subscribers (the sync coordinator) receive every change through a watch
/// channel and can react to offline→online transitions.
pub struct NetworkState {
    sender: watch::Sender<bool>,
}

impl NetworkState {
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self { sender }
    }

    pub fn set_online(&self, online: bool) {
        self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    pub fn current(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Connectivity for NetworkState {
    async fn is_online(&self) -> bool {
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_transitions_only() {
        let state = NetworkState::new(false);
        let mut rx = state.subscribe();

        state.set_online(false);
        assert!(!rx.has_changed().unwrap());

        state.set_online(true);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(state.is_online().await);
    }
}
