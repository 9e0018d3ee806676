//! Top-level chat engine that ties the subsystems together.

use std::sync::Arc;

use tracing::info;

use kinnect_core::config::realtime::RealtimeConfig;
use kinnect_entity::store::{MessageStore, UserStore};

use crate::delivery::DeliveryTracker;
use crate::presence::registry::PresenceRegistry;
use crate::router::ChatRouter;
use crate::session::gateway::SessionGateway;

/// Central chat engine coordinating presence, routing, delivery tracking,
/// and session handling.
///
/// The stores are injected rather than constructed here, so independent
/// engine instances (one per process, or one per test) never share state.
#[derive(Clone)]
pub struct ChatEngine {
    /// Presence registry.
    pub registry: Arc<PresenceRegistry>,
    /// Conversation channel router.
    pub router: Arc<ChatRouter>,
    /// Delivery state machine.
    pub delivery: Arc<DeliveryTracker>,
    /// Session gateway.
    pub gateway: Arc<SessionGateway>,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine").finish()
    }
}

impl ChatEngine {
    /// Creates a new chat engine over the given stores.
    pub fn new(
        config: RealtimeConfig,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let registry = Arc::new(PresenceRegistry::new());
        let router = Arc::new(ChatRouter::new(
            registry.clone(),
            messages.clone(),
            users.clone(),
        ));
        let delivery = Arc::new(DeliveryTracker::new(registry.clone(), messages));
        let gateway = Arc::new(SessionGateway::new(
            registry.clone(),
            router.clone(),
            delivery.clone(),
            users,
            config,
        ));

        info!("Chat engine initialized");

        Self {
            registry,
            router,
            delivery,
            gateway,
        }
    }
}
