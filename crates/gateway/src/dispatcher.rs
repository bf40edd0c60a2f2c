use std::{collections::HashMap, sync::Arc, time::Duration};

use {
    anyhow::{Result, anyhow, bail},
    async_trait::async_trait,
    tokio::sync::{RwLock, mpsc},
    tracing::{debug, info, warn},
};

use {
    imgate_config::RoutingConfig,
    imgate_naming::{DefaultService, MemoryNaming, ServiceRegistration},
    imgate_protocol::LogicPkt,
};

/// Delivers a packet to channels hosted on one gateway node.
///
/// Implementations may be local calls or cross-node RPCs and are shared by
/// every context, so they must tolerate concurrent calls. Timeouts are theirs
/// to apply.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Push `packet` to every channel in `channels` on `gateway`.
    async fn push(&self, gateway: &str, channels: &[String], packet: &LogicPkt) -> Result<()>;
}

// ── Local channels ──────────────────────────────────────────────────────────

/// Receiving half of an attached channel. The connection's write loop
/// drains it.
pub type ChannelReceiver = mpsc::UnboundedReceiver<Arc<LogicPkt>>;

/// Channels terminated by this gateway node.
pub struct LocalDispatcher {
    gate_id: String,
    /// channel_id → sender feeding that connection's write loop
    channels: RwLock<HashMap<String, mpsc::UnboundedSender<Arc<LogicPkt>>>>,
}

impl LocalDispatcher {
    pub fn new(gate_id: impl Into<String>) -> Self {
        Self {
            gate_id: gate_id.into(),
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn gate_id(&self) -> &str {
        &self.gate_id
    }

    /// Attach a new connection under a generated channel id.
    pub async fn attach(&self) -> (String, ChannelReceiver) {
        let channel_id = uuid::Uuid::new_v4().to_string();
        let rx = self.attach_with_id(&channel_id).await;
        (channel_id, rx)
    }

    /// Attach a connection under `channel_id`, replacing any previous one.
    pub async fn attach_with_id(&self, channel_id: &str) -> ChannelReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels
            .write()
            .await
            .insert(channel_id.to_string(), tx);
        debug!(gateway = %self.gate_id, channel_id, "channel attached");
        rx
    }

    /// Returns false if the channel was not attached.
    pub async fn detach(&self, channel_id: &str) -> bool {
        let removed = self.channels.write().await.remove(channel_id).is_some();
        if removed {
            debug!(gateway = %self.gate_id, channel_id, "channel detached");
        }
        removed
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl Dispatcher for LocalDispatcher {
    async fn push(&self, gateway: &str, channels: &[String], packet: &LogicPkt) -> Result<()> {
        if gateway != self.gate_id {
            bail!("gateway {gateway} is not local to {}", self.gate_id);
        }
        let packet = Arc::new(packet.clone());
        let registry = self.channels.read().await;
        let mut missing = Vec::new();
        for channel_id in channels {
            match registry.get(channel_id) {
                Some(tx) if tx.send(Arc::clone(&packet)).is_ok() => {},
                _ => {
                    warn!(gateway, channel_id = %channel_id, "channel gone, dropping packet");
                    missing.push(channel_id.as_str());
                },
            }
        }
        if !missing.is_empty() {
            bail!(
                "{} of {} channels on gateway {gateway} not delivered: {}",
                missing.len(),
                channels.len(),
                missing.join(", ")
            );
        }
        Ok(())
    }
}

// ── Cluster ─────────────────────────────────────────────────────────────────

/// Routes pushes to this node's channels or to the peer gateway that owns
/// them.
pub struct ClusterDispatcher {
    local: Arc<LocalDispatcher>,
    /// gate_id → dispatcher reaching that gateway
    peers: RwLock<HashMap<String, Arc<dyn Dispatcher>>>,
    push_timeout: Duration,
}

impl ClusterDispatcher {
    pub fn new(local: Arc<LocalDispatcher>, push_timeout: Duration) -> Self {
        Self {
            local,
            peers: RwLock::new(HashMap::new()),
            push_timeout,
        }
    }

    pub fn from_config(local: Arc<LocalDispatcher>, config: &RoutingConfig) -> Self {
        Self::new(local, config.push_timeout())
    }

    pub fn local(&self) -> &Arc<LocalDispatcher> {
        &self.local
    }

    pub async fn add_peer(&self, gate_id: impl Into<String>, peer: Arc<dyn Dispatcher>) {
        let gate_id = gate_id.into();
        info!(gateway = %gate_id, "peer gateway added");
        self.peers.write().await.insert(gate_id, peer);
    }

    pub async fn remove_peer(&self, gate_id: &str) -> bool {
        let removed = self.peers.write().await.remove(gate_id).is_some();
        if removed {
            info!(gateway = gate_id, "peer gateway removed");
        }
        removed
    }

    pub async fn peer_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.peers.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Reconcile peers with the gateways registered under `service_name`:
    /// new registrations are connected with `connect`, vanished ones dropped.
    pub async fn sync_peers<F>(&self, naming: &MemoryNaming, service_name: &str, connect: F)
    where
        F: Fn(&DefaultService) -> Arc<dyn Dispatcher>,
    {
        let services: Vec<_> = naming
            .find(service_name, &[])
            .await
            .into_iter()
            .filter(|s| s.id != self.local.gate_id())
            .collect();

        let mut peers = self.peers.write().await;
        peers.retain(|id, _| {
            let keep = services.iter().any(|s| &s.id == id);
            if !keep {
                info!(gateway = %id, "peer gateway deregistered");
            }
            keep
        });
        for service in &services {
            if !peers.contains_key(&service.id) {
                info!(gateway = %service.id, url = %service.dial_url(), "peer gateway discovered");
                peers.insert(service.id.clone(), connect(service));
            }
        }
    }
}

#[async_trait]
impl Dispatcher for ClusterDispatcher {
    async fn push(&self, gateway: &str, channels: &[String], packet: &LogicPkt) -> Result<()> {
        if gateway == self.local.gate_id() {
            return self.local.push(gateway, channels, packet).await;
        }
        let Some(peer) = self.peers.read().await.get(gateway).cloned() else {
            bail!("unknown gateway {gateway}");
        };
        tokio::time::timeout(self.push_timeout, peer.push(gateway, channels, packet))
            .await
            .map_err(|_| {
                anyhow!(
                    "push to gateway {gateway} timed out after {}ms",
                    self.push_timeout.as_millis()
                )
            })?
    }
}
