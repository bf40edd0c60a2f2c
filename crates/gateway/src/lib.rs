//! Gateway routing core: per-packet dispatch context and cross-gateway fan-out.
//!
//! Lifecycle of one inbound packet:
//! 1. The transport decodes a frame into a [`LogicPkt`](imgate_protocol::LogicPkt)
//! 2. [`Router::serve`] takes a [`Context`] from its [`ContextPool`]
//! 3. The command's handler chain runs against the context
//! 4. Handlers answer with [`Context::resp`] or fan out with
//!    [`Context::dispatch`], which groups recipients by gateway and calls the
//!    [`Dispatcher`] once per gateway
//! 5. The context is reset and returned to the pool
//!
//! Where a recipient's connection lives is never visible to handlers; they
//! hand over [`Location`](imgate_sessions::Location)s and the dispatcher
//! resolves them.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod pool;
pub mod router;

pub use {
    context::{Context, Handler, HandlersChain},
    dispatcher::{ClusterDispatcher, Dispatcher, LocalDispatcher},
    error::RouteError,
    pool::ContextPool,
    router::Router,
};
