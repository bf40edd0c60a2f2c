use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use imgate_protocol::LogicPkt;
use imgate_sessions::SessionStorage;

use crate::{
    context::{Context, HandlersChain},
    dispatcher::Dispatcher,
};

/// Reusable contexts sharing one dispatcher and one session storage.
///
/// [`acquire`](Self::acquire) hands out an owned [`Context`] bound to a
/// packet; [`release`](Self::release) resets it and keeps it for the next
/// packet, up to `max_idle` contexts.
pub struct ContextPool {
    dispatcher: Arc<dyn Dispatcher>,
    storage: Arc<dyn SessionStorage>,
    idle: Mutex<Vec<Context>>,
    max_idle: usize,
}

impl ContextPool {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        storage: Arc<dyn SessionStorage>,
        max_idle: usize,
    ) -> Self {
        Self {
            dispatcher,
            storage,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<Context>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self, request: LogicPkt, handlers: HandlersChain) -> Context {
        let reused = self.idle().pop();
        let mut ctx = reused.unwrap_or_else(|| {
            Context::new(Arc::clone(&self.dispatcher), Arc::clone(&self.storage))
        });
        ctx.init(request, handlers);
        ctx
    }

    pub fn release(&self, mut ctx: Context) {
        ctx.reset();
        let mut idle = self.idle();
        if idle.len() < self.max_idle {
            idle.push(ctx);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }
}
