//! Transactional Decorators
//!
//! Wrap command and event handlers so that every invocation runs inside a
//! fresh unit of work for the handler's module.
//!
//! - A command has exactly one handler and may return a value.
//! - An event may have many handlers. Each one is decorated separately and
//!   runs in its own transaction, so one handler failing never undoes the
//!   work another handler already committed.
//!
//! Decorators take no transaction argument and therefore do not implement
//! [`CommandHandler`]/[`EventHandler`] themselves: a decorated handler cannot
//! be decorated a second time.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::error::{RegistryError, TransactionError};
use super::registry::{ModuleKey, UnitOfWorkFactory, UnitOfWorkRegistry};
use super::storage::StorageContext;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Handles one command type inside an open transaction.
#[trait_variant::make(CommandHandler: Send)]
pub trait LocalCommandHandler<C, Tx> {
    type Output;
    type Error;

    async fn handle(&self, tx: &mut Tx, command: C) -> Result<Self::Output, Self::Error>;
}

/// Handles one event type inside an open transaction.
#[trait_variant::make(EventHandler: Send)]
pub trait LocalEventHandler<E, Tx> {
    type Error;

    async fn handle(&self, tx: &mut Tx, event: E) -> Result<(), Self::Error>;
}

// ============================================================================
// Commands
// ============================================================================

/// Runs a [`CommandHandler`] inside its module's unit of work.
pub struct TransactionalCommandHandler<H, S> {
    module: ModuleKey,
    inner: Arc<H>,
    unit_of_work: UnitOfWorkFactory<S>,
}

impl<H, S> TransactionalCommandHandler<H, S>
where
    S: StorageContext + Sync + 'static,
{
    /// Decorate `inner` for `module`.
    ///
    /// Fails when the module never registered a unit of work; callers are
    /// expected to build their handlers at startup and abort on this error.
    pub fn new(
        module: ModuleKey,
        inner: H,
        registry: &UnitOfWorkRegistry<S>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            module,
            inner: Arc::new(inner),
            unit_of_work: registry.resolve(module)?,
        })
    }

    pub fn module(&self) -> ModuleKey {
        self.module
    }

    pub async fn handle<C>(&self, command: C) -> Result<H::Output, TransactionError<H::Error>>
    where
        H: CommandHandler<C, S::Transaction> + Sync + 'static,
        H::Output: Send + 'static,
        H::Error: Send + 'static,
        C: Send + 'static,
    {
        let unit_of_work = (self.unit_of_work)();
        let inner = Arc::clone(&self.inner);
        unit_of_work
            .execute(move |tx| {
                Box::pin(async move { CommandHandler::handle(&*inner, tx, command).await })
            })
            .await
    }

    pub async fn handle_with_cancellation<C>(
        &self,
        command: C,
        cancellation: &CancellationToken,
    ) -> Result<H::Output, TransactionError<H::Error>>
    where
        H: CommandHandler<C, S::Transaction> + Sync + 'static,
        H::Output: Send + 'static,
        H::Error: Send + 'static,
        C: Send + 'static,
    {
        let unit_of_work = (self.unit_of_work)();
        let inner = Arc::clone(&self.inner);
        unit_of_work
            .execute_with_cancellation(cancellation, move |tx| {
                Box::pin(async move { CommandHandler::handle(&*inner, tx, command).await })
            })
            .await
    }
}

// ============================================================================
// Events
// ============================================================================

/// Runs an [`EventHandler`] inside its module's unit of work.
pub struct TransactionalEventHandler<H, S> {
    module: ModuleKey,
    inner: Arc<H>,
    unit_of_work: UnitOfWorkFactory<S>,
}

impl<H, S> TransactionalEventHandler<H, S>
where
    S: StorageContext + Sync + 'static,
{
    pub fn new(
        module: ModuleKey,
        inner: H,
        registry: &UnitOfWorkRegistry<S>,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            module,
            inner: Arc::new(inner),
            unit_of_work: registry.resolve(module)?,
        })
    }

    pub fn module(&self) -> ModuleKey {
        self.module
    }

    pub async fn handle<E>(&self, event: E) -> Result<(), TransactionError<H::Error>>
    where
        H: EventHandler<E, S::Transaction> + Sync + 'static,
        H::Error: Send + 'static,
        E: Send + 'static,
    {
        let unit_of_work = (self.unit_of_work)();
        let inner = Arc::clone(&self.inner);
        unit_of_work
            .execute(move |tx| {
                Box::pin(async move { EventHandler::handle(&*inner, tx, event).await })
            })
            .await
    }

    pub async fn handle_with_cancellation<E>(
        &self,
        event: E,
        cancellation: &CancellationToken,
    ) -> Result<(), TransactionError<H::Error>>
    where
        H: EventHandler<E, S::Transaction> + Sync + 'static,
        H::Error: Send + 'static,
        E: Send + 'static,
    {
        let unit_of_work = (self.unit_of_work)();
        let inner = Arc::clone(&self.inner);
        unit_of_work
            .execute_with_cancellation(cancellation, move |tx| {
                Box::pin(async move { EventHandler::handle(&*inner, tx, event).await })
            })
            .await
    }
}

/// Object-safe view of a decorated event handler, so handlers from
/// different modules (and storage types) can subscribe to one event.
trait DynEventHandler<E>: Send + Sync {
    fn module(&self) -> ModuleKey;

    fn handle<'a>(
        &'a self,
        event: E,
        cancellation: Option<&'a CancellationToken>,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<E, H, S> DynEventHandler<E> for TransactionalEventHandler<H, S>
where
    E: Send + 'static,
    H: EventHandler<E, S::Transaction> + Sync + 'static,
    H::Error: Error + Send + Sync + 'static,
    S: StorageContext + Sync + 'static,
{
    fn module(&self) -> ModuleKey {
        self.module
    }

    fn handle<'a>(
        &'a self,
        event: E,
        cancellation: Option<&'a CancellationToken>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            let result = match cancellation {
                Some(token) => {
                    TransactionalEventHandler::handle_with_cancellation(self, event, token).await
                }
                None => TransactionalEventHandler::handle(self, event).await,
            };
            result.map_err(|e| Box::new(e) as BoxError)
        })
    }
}

/// All decorated handlers subscribed to one event type.
pub struct EventHandlers<E> {
    handlers: Vec<Box<dyn DynEventHandler<E>>>,
}

impl<E> Default for EventHandlers<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<E> EventHandlers<E>
where
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a decorated handler.
    pub fn subscribe<H, S>(&mut self, handler: TransactionalEventHandler<H, S>) -> &mut Self
    where
        H: EventHandler<E, S::Transaction> + Send + Sync + 'static,
        H::Error: Error + Send + Sync + 'static,
        S: StorageContext + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Deliver `event` to every handler, each in its own transaction.
    ///
    /// Every handler runs even if an earlier one failed. The returned error
    /// lists the handlers that failed; the others have committed.
    pub async fn publish(&self, event: E) -> Result<(), EventDispatchError> {
        self.dispatch(event, None).await
    }

    /// [`publish`](Self::publish), abandoned when `cancellation` fires.
    ///
    /// Handlers that have not started by then report
    /// [`TransactionError::Cancelled`] without opening a transaction.
    pub async fn publish_with_cancellation(
        &self,
        event: E,
        cancellation: &CancellationToken,
    ) -> Result<(), EventDispatchError> {
        self.dispatch(event, Some(cancellation)).await
    }

    async fn dispatch(
        &self,
        event: E,
        cancellation: Option<&CancellationToken>,
    ) -> Result<(), EventDispatchError> {
        let mut failures = Vec::new();

        for handler in &self.handlers {
            if let Err(error) = handler.handle(event.clone(), cancellation).await {
                tracing::warn!(
                    module = %handler.module(),
                    error = %error,
                    "Event handler failed"
                );
                failures.push(HandlerFailure {
                    module: handler.module(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EventDispatchError {
                handled: self.handlers.len(),
                failures,
            })
        }
    }
}

/// One event handler's failure.
#[derive(Debug)]
pub struct HandlerFailure {
    pub module: ModuleKey,
    pub error: BoxError,
}

/// Some event handlers failed; the rest committed.
#[derive(Debug)]
pub struct EventDispatchError {
    handled: usize,
    failures: Vec<HandlerFailure>,
}

impl EventDispatchError {
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    /// Number of handlers the event was delivered to.
    pub fn handled(&self) -> usize {
        self.handled
    }
}

impl fmt::Display for EventDispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} event handlers failed",
            self.failures.len(),
            self.handled
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.module, failure.error)?;
        }
        Ok(())
    }
}

impl Error for EventDispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures
            .first()
            .map(|failure| failure.error.as_ref() as &(dyn Error + 'static))
    }
}
