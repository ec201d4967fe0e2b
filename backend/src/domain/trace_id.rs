//! Request-scoped trace identifier for correlating logs, errors and outbound
//! calls.
//!
//! The identifier lives in task-local storage. Tokio task locals are not
//! inherited by spawned tasks, so wrap spawned work in [`TraceId::scope`] when
//! the correlation must survive the hop.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Response header carrying the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    pub(crate) static TRACE_ID: TraceId;
}

/// Per-request trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use healthsyntra::domain::TraceId;
///
/// async fn handler() {
///     if let Some(id) = TraceId::current() {
///         println!("trace id: {id}");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn generate() -> Self { Self(Uuid::new_v4()) }

    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    #[rustfmt::skip]
    pub fn current() -> Option<Self> { TRACE_ID.try_with(|id| *id).ok() }

    /// Returns the identifier in scope, or a fresh one outside a request.
    #[must_use]
    pub fn current_or_generate() -> Self {
        Self::current().unwrap_or_else(Self::generate)
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Derive a stable idempotency key for one outbound operation.
    ///
    /// Retrying the same request with the same trace identifier yields the
    /// same key, so gateways can collapse duplicate submissions.
    ///
    /// ```
    /// use healthsyntra::domain::TraceId;
    /// use uuid::Uuid;
    ///
    /// let id = TraceId::from_uuid(Uuid::nil());
    /// assert_eq!(
    ///     id.idempotency_key("checkout"),
    ///     "checkout-00000000-0000-0000-0000-000000000000"
    /// );
    /// ```
    #[must_use]
    pub fn idempotency_key(&self, operation: &str) -> String {
        format!("{operation}-{}", self.0)
    }

    /// Execute the provided future with the supplied trace identifier in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
