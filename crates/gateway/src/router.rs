use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};

use {
    imgate_config::RoutingConfig,
    imgate_protocol::{LogicPkt, Status},
    imgate_sessions::{Session, SessionStorage},
};

use crate::{
    context::{Context, HandlersChain},
    dispatcher::Dispatcher,
    error::Result,
    pool::ContextPool,
};

/// Maps commands to handler chains and runs inbound packets through them.
pub struct Router {
    routes: HashMap<String, HandlersChain>,
    pool: ContextPool,
}

impl Router {
    pub fn new(pool: ContextPool) -> Self {
        Self {
            routes: HashMap::new(),
            pool,
        }
    }

    pub fn from_config(
        dispatcher: Arc<dyn Dispatcher>,
        storage: Arc<dyn SessionStorage>,
        config: &RoutingConfig,
    ) -> Self {
        Self::new(ContextPool::new(
            dispatcher,
            storage,
            config.context_pool_size,
        ))
    }

    /// Route `command` to `handlers`, replacing any previous chain.
    pub fn handle(&mut self, command: impl Into<String>, handlers: HandlersChain) {
        self.routes.insert(command.into(), handlers);
    }

    pub fn commands(&self) -> Vec<String> {
        let mut names: Vec<_> = self.routes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Process one inbound packet.
    ///
    /// `session` is the sender's session when the connection layer knows it;
    /// otherwise it is derived from packet metadata, and a packet whose
    /// session cannot be derived is rejected before any handler runs.
    pub async fn serve(&self, packet: LogicPkt, session: Option<Session>) -> Result<()> {
        let command = packet.header.command.clone();
        let handlers = self.routes.get(&command).cloned();
        let routed = handlers.is_some();

        let mut ctx = self.pool.acquire(packet, handlers.unwrap_or_default());
        if let Some(session) = session {
            ctx.set_session(session);
        }
        let result = run(&mut ctx, &command, routed).await;
        self.pool.release(ctx);
        result
    }
}

async fn run(ctx: &mut Context, command: &str, routed: bool) -> Result<()> {
    if let Err(e) = ctx.session() {
        warn!(command, error = %e, "rejecting packet without a usable session");
        return Err(e);
    }
    if !routed {
        warn!(command, "unknown command");
        return ctx
            .resp_with_error(Status::NOT_IMPLEMENTED, &format!("unknown command: {command}"))
            .await;
    }
    debug!(command, seq = ctx.header().sequence, "--> serving");
    ctx.next().await;
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        futures::future::BoxFuture,
        imgate_protocol::{ErrorResp, META_DEST_SERVER},
        imgate_sessions::MemoryStorage,
    };

    use {
        super::*,
        crate::{context::Handler, dispatcher::LocalDispatcher},
    };

    fn echo(ctx: &mut Context) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let body: String = ctx.read_body().unwrap_or_default();
            let _ = ctx.resp(Status::SUCCESS, &body).await;
        })
    }

    fn router(local: &Arc<LocalDispatcher>) -> Router {
        let mut router = Router::from_config(
            local.clone(),
            Arc::new(MemoryStorage::new()),
            &RoutingConfig::default(),
        );
        router.handle("echo", vec![Arc::new(echo) as Arc<dyn Handler>]);
        router
    }

    fn request(command: &str) -> LogicPkt {
        let mut pkt = LogicPkt::request(command);
        pkt.header.channel_id = "c1".into();
        pkt.header.sequence = 3;
        pkt.header.add_meta(META_DEST_SERVER, "g1");
        pkt
    }

    #[tokio::test]
    async fn serves_registered_command() {
        let local = Arc::new(LocalDispatcher::new("g1"));
        let mut rx = local.attach_with_id("c1").await;
        let router = router(&local);

        let mut pkt = request("echo");
        pkt.write_body("hello").unwrap();
        router.serve(pkt, None).await.unwrap();

        let resp = rx.recv().await.unwrap();
        assert_eq!(resp.sequence(), 3);
        assert_eq!(resp.read_body::<String>().unwrap(), "hello");
        assert_eq!(router.pool().idle_count(), 1);
    }

    #[tokio::test]
    async fn unknown_command_gets_not_implemented() {
        let local = Arc::new(LocalDispatcher::new("g1"));
        let mut rx = local.attach_with_id("c1").await;
        let router = router(&local);

        router.serve(request("nope"), None).await.unwrap();

        let resp = rx.recv().await.unwrap();
        assert_eq!(resp.status(), Status::NOT_IMPLEMENTED);
        let body: ErrorResp = resp.read_body().unwrap();
        assert_eq!(body.message, "unknown command: nope");
    }

    #[tokio::test]
    async fn packet_without_session_is_rejected() {
        let local = Arc::new(LocalDispatcher::new("g1"));
        let mut rx = local.attach_with_id("c1").await;
        let router = router(&local);

        let pkt = LogicPkt::request("echo");
        assert!(router.serve(pkt, None).await.is_err());
        assert!(rx.try_recv().is_err());
        assert_eq!(router.pool().idle_count(), 1);
    }

    #[test]
    fn commands_are_sorted() {
        let local = Arc::new(LocalDispatcher::new("g1"));
        let mut router = router(&local);
        router.handle("chat.talk", Vec::new());
        assert_eq!(router.commands(), vec!["chat.talk", "echo"]);
    }
}
