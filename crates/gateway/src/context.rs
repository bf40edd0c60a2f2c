use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    sync::Arc,
};

use {
    async_trait::async_trait,
    futures::future::BoxFuture,
    serde::{Serialize, de::DeserializeOwned},
    tracing::{debug, warn},
};

use {
    imgate_protocol::{
        ErrorResp, Flag, Header, LogicPkt, META_DEST_SERVER, ProtocolError, Status,
    },
    imgate_sessions::{Location, Session, SessionStorage},
};

use crate::{
    dispatcher::Dispatcher,
    error::{Result, RouteError},
};

// ── Handlers ─────────────────────────────────────────────────────────────────

/// One step of a command's handler chain.
///
/// A handler continues the chain by awaiting [`Context::next`]; not calling
/// it stops propagation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context);
}

#[async_trait]
impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, ()> + Send + Sync,
{
    async fn handle(&self, ctx: &mut Context) {
        (self)(ctx).await
    }
}

pub type HandlersChain = Vec<Arc<dyn Handler>>;

// ── Context ──────────────────────────────────────────────────────────────────

/// Unit of work for one inbound packet.
///
/// Owning a `Context` is what makes it the only one in flight: handlers get
/// `&mut` access, and it goes back to its [`ContextPool`](crate::ContextPool)
/// only after [`Context::reset`].
pub struct Context {
    dispatcher: Arc<dyn Dispatcher>,
    storage: Arc<dyn SessionStorage>,
    handlers: HandlersChain,
    index: usize,
    request: LogicPkt,
    session: Option<Session>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("header", &self.request.header)
            .field("handlers", &self.handlers.len())
            .field("index", &self.index)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            dispatcher,
            storage,
            handlers: Vec::new(),
            index: 0,
            request: LogicPkt::default(),
            session: None,
        }
    }

    /// Bind this context to `request` and the chain that will process it.
    pub fn init(&mut self, request: LogicPkt, handlers: HandlersChain) {
        self.reset();
        self.request = request;
        self.handlers = handlers;
    }

    /// Clear every per-packet field.
    pub fn reset(&mut self) {
        self.request = LogicPkt::default();
        self.handlers.clear();
        self.index = 0;
        self.session = None;
    }

    /// Attach the session supplied by the connection layer.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn header(&self) -> &Header {
        &self.request.header
    }

    pub fn read_body<T: DeserializeOwned>(&self) -> std::result::Result<T, ProtocolError> {
        self.request.read_body()
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Position of the next handler to run.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.handlers.len()
    }

    /// Run the handler at the cursor. A no-op once the chain is exhausted.
    ///
    /// The cursor moves past the handler before it runs, so a handler that
    /// awaits `next()` continues with its successor.
    pub fn next(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let Some(handler) = self.handlers.get(self.index).cloned() else {
                return;
            };
            self.index += 1;
            handler.handle(self).await;
        })
    }

    /// The sender's session.
    ///
    /// Without an attached session one is derived from the request: channel
    /// from the header, gateway from the `dest.server` metadata, tagged as
    /// auto-generated. The result is cached until [`Context::reset`].
    pub fn session(&mut self) -> Result<&Session> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let header = &self.request.header;
                Session::derived(header.meta_str(META_DEST_SERVER)?, header.channel_id.as_str())
            },
        };
        Ok(&*self.session.insert(session))
    }

    /// Answer the sender with `status` and `body`.
    pub async fn resp<T>(&mut self, status: Status, body: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let mut packet = LogicPkt::new_from(&self.request.header);
        packet.set_status(status);
        packet.set_flag(Flag::Response);
        packet.write_body(body)?;

        let to = self.session()?.location();
        debug!(header = %packet.header, to = %to, "<-- resp");

        let channels = [to.channel_id];
        self.dispatcher
            .push(&to.gate_id, &channels, &packet)
            .await
            .map_err(|source| {
                warn!(gateway = %to.gate_id, error = %source, "resp delivery failed");
                RouteError::Delivery {
                    gateway: to.gate_id.clone(),
                    failed: 1,
                    attempted: 1,
                    source,
                }
            })
    }

    /// Answer the sender with an [`ErrorResp`] carrying `err`'s message.
    pub async fn resp_with_error<E>(&mut self, status: Status, err: &E) -> Result<()>
    where
        E: fmt::Display + Sync + ?Sized,
    {
        let body = ErrorResp {
            message: err.to_string(),
        };
        self.resp(status, &body).await
    }

    /// Push `body` to every recipient, one dispatcher call per gateway.
    ///
    /// The sender's own location is skipped. Every gateway group is
    /// attempted even when an earlier one fails; the last failure is
    /// returned.
    pub async fn dispatch<T>(&mut self, body: &T, recipients: &[Location]) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        if recipients.is_empty() {
            return Ok(());
        }

        let mut packet = LogicPkt::new_from(&self.request.header);
        packet.set_flag(Flag::Push);
        packet.write_body(body)?;

        let sender = self.session()?.location();
        let groups = group_by_gateway(&sender, recipients);
        debug!(
            header = %packet.header,
            recipients = recipients.len(),
            gateways = groups.len(),
            "<-- dispatch"
        );

        let attempted = groups.len();
        let mut failed = 0;
        let mut last_error = None;
        for (gateway, channels) in &groups {
            if let Err(e) = self.dispatcher.push(gateway, channels, &packet).await {
                warn!(gateway = %gateway, channels = channels.len(), error = %e, "dispatch to gateway failed");
                failed += 1;
                last_error = Some((gateway.clone(), e));
            }
        }

        match last_error {
            None => Ok(()),
            Some((gateway, source)) => Err(RouteError::Delivery {
                gateway,
                failed,
                attempted,
                source,
            }),
        }
    }
}

/// Partition `recipients` into gateway → channel ids, dropping `sender` and
/// duplicates. Channels keep their first-seen order.
pub fn group_by_gateway(sender: &Location, recipients: &[Location]) -> BTreeMap<String, Vec<String>> {
    let mut seen = HashSet::new();
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for recipient in recipients {
        if recipient == sender || !seen.insert(recipient) {
            continue;
        }
        groups
            .entry(recipient.gate_id.clone())
            .or_default()
            .push(recipient.channel_id.clone());
    }
    groups
}
