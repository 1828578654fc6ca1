use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CacheError, FetchError, MutationError};
use crate::notify::Notification;

// =============================================================================
// 1. THE ABSTRACTION (Entity, Source, Writer)
// =============================================================================

/// Trait that any record must implement to be held by a [`CacheActor`].
pub trait Entity: Clone + Send + Sync + Debug + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;
    /// Validated payload handed to the writer for creates and updates.
    type Input: Send + Sync + Debug + 'static;

    /// Get the ID of the entity
    fn id(&self) -> &Self::Id;

    // --- Notification hooks ---

    fn on_created(&self) -> Notification {
        Notification::success("Record created")
    }

    fn on_updated(&self) -> Notification {
        Notification::success("Record updated")
    }

    fn on_deleted(_id: &Self::Id) -> Notification {
        Notification::success("Record removed")
    }

    fn on_failed(kind: MutationKind, error: &MutationError) -> Notification {
        Notification::error(format!("{} failed", kind)).with_description(error.to_string())
    }
}

/// Read side: produces the canonical collection.
#[async_trait]
pub trait Source<T: Entity>: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<T>, FetchError>;
}

/// Write side: computes the record the cache will be patched with.
#[async_trait]
pub trait Writer<T: Entity>: Send + Sync + 'static {
    async fn create(&self, input: T::Input) -> Result<T, MutationError>;
    async fn update(&self, id: T::Id, input: T::Input) -> Result<T, MutationError>;
    async fn delete(&self, id: T::Id) -> Result<T::Id, MutationError>;
}

// =============================================================================
// 2. QUERY & MUTATION STATE
// =============================================================================

pub type Collection<T> = Arc<Vec<T>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<Collection<T>>,
    pub error: Option<FetchError>,
    pub is_fetching: bool,
    /// When the last successful fetch was applied.
    pub updated_at: Option<Instant>,
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            updated_at: None,
        }
    }

    /// First fetch, nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Fetching while earlier data (or an earlier outcome) is on screen.
    pub fn is_refetching(&self) -> bool {
        self.is_fetching && self.status != QueryStatus::Loading
    }

    pub fn is_fresh(&self, stale_time: Duration, now: Instant) -> bool {
        self.status == QueryStatus::Success
            && self
                .updated_at
                .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error(MutationError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationStates {
    pub create: MutationStatus,
    pub update: MutationStatus,
    pub delete: MutationStatus,
}

impl MutationStates {
    pub fn get(&self, kind: MutationKind) -> &MutationStatus {
        match kind {
            MutationKind::Create => &self.create,
            MutationKind::Update => &self.update,
            MutationKind::Delete => &self.delete,
        }
    }

    fn set(&mut self, kind: MutationKind, status: MutationStatus) {
        match kind {
            MutationKind::Create => self.create = status,
            MutationKind::Update => self.update = status,
            MutationKind::Delete => self.delete = status,
        }
    }
}

/// Everything a consumer needs to render, published on every transition.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<T> {
    pub query: QueryState<T>,
    pub mutations: MutationStates,
}

impl<T> CacheSnapshot<T> {
    fn initial() -> Self {
        Self {
            query: QueryState::idle(),
            mutations: MutationStates::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// How long a successful fetch stays fresh.
    pub stale_time: Duration,
    /// Extra attempts after a failed fetch.
    pub fetch_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub buffer_size: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            fetch_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            buffer_size: 32,
        }
    }
}

impl CachePolicy {
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.retry_max_delay)
    }
}

// =============================================================================
// 3. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, CacheError>>;

#[derive(Debug)]
pub enum CacheRequest<T: Entity> {
    List {
        respond_to: Response<Collection<T>>,
    },
    Refetch {
        respond_to: Response<Collection<T>>,
    },
    Create {
        input: T::Input,
        respond_to: Response<T>,
    },
    Update {
        id: T::Id,
        input: T::Input,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<T::Id>,
    },
    ResetMutation {
        kind: MutationKind,
    },
    Shutdown,
    // Posted by the actor's own background tasks.
    FetchSettled {
        seq: u64,
        result: Result<Vec<T>, FetchError>,
    },
    MutationSettled {
        seq: u64,
        settled: Settled<T>,
    },
}

#[derive(Debug)]
pub enum Settled<T: Entity> {
    Created {
        result: Result<T, MutationError>,
        respond_to: Response<T>,
    },
    Updated {
        result: Result<T, MutationError>,
        respond_to: Response<T>,
    },
    Deleted {
        result: Result<T::Id, MutationError>,
        respond_to: Response<T::Id>,
    },
}

/// A confirmed write, applied to the collection as a delta.
#[derive(Debug, Clone)]
enum Patch<T: Entity> {
    Insert(T),
    Replace(T),
    Remove(T::Id),
}

impl<T: Entity> Patch<T> {
    fn apply(&self, items: &[T]) -> Vec<T> {
        match self {
            Patch::Insert(item) => {
                let mut next = items.to_vec();
                if !items.iter().any(|existing| existing.id() == item.id()) {
                    next.push(item.clone());
                }
                next
            }
            Patch::Replace(item) => items
                .iter()
                .map(|existing| {
                    if existing.id() == item.id() {
                        item.clone()
                    } else {
                        existing.clone()
                    }
                })
                .collect(),
            Patch::Remove(id) => items.iter().filter(|item| item.id() != id).cloned().collect(),
        }
    }
}

// =============================================================================
// 4. THE GENERIC CACHE ACTOR
// =============================================================================

/// Sole owner of the cached collection.
///
/// Fetches and writes run as background tasks that post their outcome back to
/// this actor's mailbox, so the collection is only ever replaced here. Writes
/// confirmed while a fetch is in flight are replayed onto the fetched
/// collection, so a late fetch never drops them.
pub struct CacheActor<T: Entity> {
    receiver: mpsc::Receiver<CacheRequest<T>>,
    mailbox: mpsc::WeakSender<CacheRequest<T>>,
    source: Arc<dyn Source<T>>,
    writer: Arc<dyn Writer<T>>,
    policy: CachePolicy,
    state: watch::Sender<CacheSnapshot<T>>,
    notifications: broadcast::Sender<Notification>,
    waiters: Vec<Response<Collection<T>>>,
    in_flight: Option<u64>,
    /// Patches confirmed since the in-flight fetch was issued.
    rebase: Vec<Patch<T>>,
    /// Unsettled calls per mutation kind.
    pending: HashMap<MutationKind, usize>,
    next_seq: u64,
}

impl<T: Entity> CacheActor<T> {
    pub fn new(
        policy: CachePolicy,
        source: Arc<dyn Source<T>>,
        writer: Arc<dyn Writer<T>>,
    ) -> (Self, CacheClient<T>) {
        let (sender, receiver) = mpsc::channel(policy.buffer_size);
        let (state, state_rx) = watch::channel(CacheSnapshot::initial());
        let (notifications, _) = broadcast::channel(policy.buffer_size);
        let actor = Self {
            receiver,
            mailbox: sender.downgrade(),
            source,
            writer,
            policy,
            state,
            notifications: notifications.clone(),
            waiters: Vec::new(),
            in_flight: None,
            rebase: Vec::new(),
            pending: HashMap::new(),
            next_seq: 1,
        };
        let client = CacheClient::new(sender, state_rx, notifications);
        (actor, client)
    }

    #[instrument(name = "cache_actor", skip(self))]
    pub async fn run(mut self) {
        info!("CacheActor starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::List { respond_to } => self.handle_list(respond_to),
                CacheRequest::Refetch { respond_to } => {
                    self.waiters.push(respond_to);
                    self.start_fetch();
                }
                CacheRequest::Create { input, respond_to } => self.handle_create(input, respond_to),
                CacheRequest::Update { id, input, respond_to } => {
                    self.handle_update(id, input, respond_to)
                }
                CacheRequest::Delete { id, respond_to } => self.handle_delete(id, respond_to),
                CacheRequest::ResetMutation { kind } => {
                    debug!(%kind, "Resetting mutation state");
                    self.state.send_if_modified(|s| {
                        if *s.mutations.get(kind) == MutationStatus::Pending {
                            return false;
                        }
                        s.mutations.set(kind, MutationStatus::Idle);
                        true
                    });
                }
                CacheRequest::FetchSettled { seq, result } => self.handle_fetch_settled(seq, result),
                CacheRequest::MutationSettled { seq, settled } => {
                    self.handle_mutation_settled(seq, settled)
                }
                CacheRequest::Shutdown => {
                    info!("CacheActor shutting down");
                    break;
                }
            }
        }

        info!("CacheActor stopped");
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn current_data(&self) -> Collection<T> {
        self.state.borrow().query.data.clone().unwrap_or_default()
    }

    fn contains(&self, id: &T::Id) -> bool {
        self.state
            .borrow()
            .query
            .data
            .as_ref()
            .is_some_and(|items| items.iter().any(|item| item.id() == id))
    }

    #[instrument(skip(self, respond_to))]
    fn handle_list(&mut self, respond_to: Response<Collection<T>>) {
        let fresh = self
            .state
            .borrow()
            .query
            .is_fresh(self.policy.stale_time, Instant::now());
        if fresh {
            debug!("Serving fresh collection from cache");
            let _ = respond_to.send(Ok(self.current_data()));
            return;
        }
        self.waiters.push(respond_to);
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        if let Some(seq) = self.in_flight {
            debug!(seq, "Joining in-flight fetch");
            return;
        }
        let seq = self.take_seq();
        self.in_flight = Some(seq);
        self.rebase.clear();
        self.state.send_modify(|s| {
            s.query.is_fetching = true;
            if s.query.data.is_none() {
                s.query.status = QueryStatus::Loading;
            }
        });
        info!(seq, "Fetching collection");

        let source = Arc::clone(&self.source);
        let mailbox = self.mailbox.clone();
        let policy = self.policy.clone();
        tokio::spawn(async move {
            let result = fetch_with_retry(source.as_ref(), &policy).await;
            report(&mailbox, CacheRequest::FetchSettled { seq, result }).await;
        });
    }

    #[instrument(skip(self, result))]
    fn handle_fetch_settled(&mut self, seq: u64, result: Result<Vec<T>, FetchError>) {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
        let waiters = std::mem::take(&mut self.waiters);
        let rebase = std::mem::take(&mut self.rebase);

        match result {
            Ok(items) => {
                info!(count = items.len(), "Collection fetched");
                if !rebase.is_empty() {
                    debug!(patches = rebase.len(), "Replaying writes confirmed during fetch");
                }
                let items = rebase.iter().fold(items, |items, patch| patch.apply(&items));
                let data = Arc::new(items);
                self.state.send_modify(|s| {
                    s.query.status = QueryStatus::Success;
                    s.query.data = Some(Arc::clone(&data));
                    s.query.error = None;
                    s.query.is_fetching = false;
                    s.query.updated_at = Some(Instant::now());
                });
                for waiter in waiters {
                    let _ = waiter.send(Ok(Arc::clone(&data)));
                }
            }
            Err(e) => {
                error!(error = %e, "Fetch failed");
                self.state.send_modify(|s| {
                    s.query.status = QueryStatus::Error;
                    s.query.error = Some(e.clone());
                    s.query.is_fetching = false;
                });
                for waiter in waiters {
                    let _ = waiter.send(Err(CacheError::Fetch(e.clone())));
                }
            }
        }
    }

    fn begin_mutation(&mut self, kind: MutationKind) -> u64 {
        let seq = self.take_seq();
        *self.pending.entry(kind).or_default() += 1;
        debug!(seq, %kind, "Mutation pending");
        self.state
            .send_modify(|s| s.mutations.set(kind, MutationStatus::Pending));
        seq
    }

    #[instrument(skip(self, input, respond_to))]
    fn handle_create(&mut self, input: T::Input, respond_to: Response<T>) {
        let seq = self.begin_mutation(MutationKind::Create);
        let writer = Arc::clone(&self.writer);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = writer.create(input).await;
            let settled = Settled::Created { result, respond_to };
            report(&mailbox, CacheRequest::MutationSettled { seq, settled }).await;
        });
    }

    #[instrument(skip(self, input, respond_to))]
    fn handle_update(&mut self, id: T::Id, input: T::Input, respond_to: Response<T>) {
        let seq = self.begin_mutation(MutationKind::Update);
        let writer = Arc::clone(&self.writer);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = writer.update(id, input).await;
            let settled = Settled::Updated { result, respond_to };
            report(&mailbox, CacheRequest::MutationSettled { seq, settled }).await;
        });
    }

    #[instrument(skip(self, respond_to))]
    fn handle_delete(&mut self, id: T::Id, respond_to: Response<T::Id>) {
        let seq = self.begin_mutation(MutationKind::Delete);
        let writer = Arc::clone(&self.writer);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = writer.delete(id).await;
            let settled = Settled::Deleted { result, respond_to };
            report(&mailbox, CacheRequest::MutationSettled { seq, settled }).await;
        });
    }

    #[instrument(skip(self, settled))]
    fn handle_mutation_settled(&mut self, seq: u64, settled: Settled<T>) {
        match settled {
            Settled::Created { result, respond_to } => {
                let result = result.and_then(|item| {
                    if self.contains(item.id()) {
                        Err(MutationError::DuplicateId(item.id().to_string()))
                    } else {
                        Ok(item)
                    }
                });
                match result {
                    Ok(item) => {
                        info!(id = %item.id(), "Record created");
                        self.patch(Patch::Insert(item.clone()));
                        self.succeed(MutationKind::Create, item.on_created());
                        let _ = respond_to.send(Ok(item));
                    }
                    Err(e) => self.fail(MutationKind::Create, e, respond_to),
                }
            }
            Settled::Updated { result, respond_to } => match result {
                Ok(item) => {
                    info!(id = %item.id(), "Record updated");
                    self.patch(Patch::Replace(item.clone()));
                    self.succeed(MutationKind::Update, item.on_updated());
                    let _ = respond_to.send(Ok(item));
                }
                Err(e) => self.fail(MutationKind::Update, e, respond_to),
            },
            Settled::Deleted { result, respond_to } => match result {
                Ok(id) => {
                    info!(id = %id, "Record removed");
                    self.patch(Patch::Remove(id.clone()));
                    self.succeed(MutationKind::Delete, T::on_deleted(&id));
                    let _ = respond_to.send(Ok(id));
                }
                Err(e) => self.fail(MutationKind::Delete, e, respond_to),
            },
        }
    }

    /// Replaces the collection wholesale with the patched one.
    fn patch(&mut self, patch: Patch<T>) {
        self.state.send_modify(|s| {
            let current: &[T] = s.query.data.as_deref().map(Vec::as_slice).unwrap_or(&[]);
            s.query.data = Some(Arc::new(patch.apply(current)));
            s.query.status = QueryStatus::Success;
            s.query.error = None;
        });
        if self.in_flight.is_some() {
            self.rebase.push(patch);
        }
    }

    /// Records one call's outcome. The status stays `Pending` while other
    /// calls of the same kind are unsettled.
    fn settle(&mut self, kind: MutationKind, status: MutationStatus) {
        let remaining = self.pending.get_mut(&kind).map_or(0, |count| {
            *count = count.saturating_sub(1);
            *count
        });
        if remaining > 0 {
            debug!(%kind, remaining, "Other calls still pending");
            return;
        }
        self.state.send_modify(|s| s.mutations.set(kind, status));
    }

    fn succeed(&mut self, kind: MutationKind, notification: Notification) {
        self.settle(kind, MutationStatus::Success);
        let _ = self.notifications.send(notification);
    }

    fn fail<R>(&mut self, kind: MutationKind, e: MutationError, respond_to: Response<R>) {
        error!(%kind, error = %e, "Mutation failed");
        self.settle(kind, MutationStatus::Error(e.clone()));
        let _ = self.notifications.send(T::on_failed(kind, &e));
        let _ = respond_to.send(Err(CacheError::Mutation(e)));
    }
}

async fn fetch_with_retry<T: Entity>(
    source: &dyn Source<T>,
    policy: &CachePolicy,
) -> Result<Vec<T>, FetchError> {
    let mut attempt = 0;
    loop {
        match source.fetch().await {
            Ok(items) => return Ok(items),
            Err(e) if attempt < policy.fetch_retries => {
                let delay = policy.retry_delay(attempt);
                warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "Fetch failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn report<T: Entity>(mailbox: &mpsc::WeakSender<CacheRequest<T>>, msg: CacheRequest<T>) {
    let Some(sender) = mailbox.upgrade() else {
        debug!("Cache actor gone, dropping result");
        return;
    };
    if sender.send(msg).await.is_err() {
        debug!("Cache actor stopped, dropping result");
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct CacheClient<T: Entity> {
    sender: mpsc::Sender<CacheRequest<T>>,
    state: watch::Receiver<CacheSnapshot<T>>,
    notifications: broadcast::Sender<Notification>,
}

impl<T: Entity> CacheClient<T> {
    pub fn new(
        sender: mpsc::Sender<CacheRequest<T>>,
        state: watch::Receiver<CacheSnapshot<T>>,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            sender,
            state,
            notifications,
        }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> CacheRequest<T>,
    ) -> Result<R, CacheError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CacheError::ActorCommunication("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| CacheError::ActorCommunication("Actor dropped".to_string()))?
    }

    /// Cached collection if fresh, otherwise the result of a (shared) fetch.
    pub async fn list(&self) -> Result<Collection<T>, CacheError> {
        self.request(|respond_to| CacheRequest::List { respond_to }).await
    }

    pub async fn refetch(&self) -> Result<Collection<T>, CacheError> {
        self.request(|respond_to| CacheRequest::Refetch { respond_to }).await
    }

    pub async fn create(&self, input: T::Input) -> Result<T, CacheError> {
        self.request(|respond_to| CacheRequest::Create { input, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, input: T::Input) -> Result<T, CacheError> {
        self.request(|respond_to| CacheRequest::Update { id, input, respond_to })
            .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<T::Id, CacheError> {
        self.request(|respond_to| CacheRequest::Delete { id, respond_to }).await
    }

    pub async fn reset_mutation(&self, kind: MutationKind) -> Result<(), CacheError> {
        self.sender
            .send(CacheRequest::ResetMutation { kind })
            .await
            .map_err(|_| CacheError::ActorCommunication("Actor closed".to_string()))
    }

    pub async fn shutdown(&self) -> Result<(), CacheError> {
        self.sender
            .send(CacheRequest::Shutdown)
            .await
            .map_err(|_| CacheError::ActorCommunication("Actor closed".to_string()))
    }

    pub fn snapshot(&self) -> CacheSnapshot<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheSnapshot<T>> {
        self.state.clone()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }
}

// =============================================================================
// 6. TESTS
// =============================================================================
