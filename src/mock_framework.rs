//! # Mock Framework
//!
//! Utilities for testing clients and the cache actor in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver, then helpers like
//! [`expect_create`] or [`expect_update`] to assert what reached the actor.
//! [`ScriptedSource`] and [`FailingWriter`] stand in for the adapters when a
//! real [`CacheActor`](crate::cache_framework::CacheActor) is under test.

use crate::cache_framework::{CacheClient, CacheRequest, Entity, Response, Source, Writer};
use crate::error::{FetchError, MutationError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// Creates a mock client and a receiver for asserting requests.
///
/// Nothing answers on the receiver side unless the test does, so a test can
/// also assert that a request never arrived (`try_recv` is empty).
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (CacheClient<T>, mpsc::Receiver<CacheRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (_, state) = watch::channel(crate::cache_framework::CacheSnapshot {
        query: crate::cache_framework::QueryState::idle(),
        mutations: Default::default(),
    });
    let (notifications, _) = broadcast::channel(buffer_size);
    (CacheClient::new(sender, state, notifications), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<CacheRequest<T>>,
) -> Option<(T::Input, Response<T>)> {
    match receiver.recv().await {
        Some(CacheRequest::Create { input, respond_to }) => Some((input, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<CacheRequest<T>>,
) -> Option<(T::Id, T::Input, Response<T>)> {
    match receiver.recv().await {
        Some(CacheRequest::Update { id, input, respond_to }) => Some((id, input, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Delete request
pub async fn expect_delete<T: Entity>(
    receiver: &mut mpsc::Receiver<CacheRequest<T>>,
) -> Option<(T::Id, Response<T::Id>)> {
    match receiver.recv().await {
        Some(CacheRequest::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Source that replays a script of outcomes, repeating the last one forever.
pub struct ScriptedSource<T> {
    script: Mutex<VecDeque<Result<Vec<T>, FetchError>>>,
    last: Mutex<Option<Result<Vec<T>, FetchError>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl<T: Entity> ScriptedSource<T> {
    pub fn script(outcomes: Vec<Result<Vec<T>, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(items: Vec<T>) -> Arc<Self> {
        Self::script(vec![Ok(items)])
    }

    pub fn failing(error: FetchError) -> Arc<Self> {
        Self::script(vec![Err(error)])
    }

    /// Only usable before the source is shared.
    pub fn with_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        let mut inner = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("source already shared"));
        inner.delay = delay;
        Arc::new(inner)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Entity> Source<T> for ScriptedSource<T> {
    async fn fetch(&self) -> Result<Vec<T>, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(outcome) = next {
            *last = Some(outcome);
        }
        last.clone()
            .unwrap_or_else(|| Err(FetchError::Transport("empty script".to_string())))
    }
}

/// Writer whose every operation fails after a delay.
pub struct FailingWriter<T> {
    message: String,
    delay: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> FailingWriter<T> {
    pub fn new(message: impl Into<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            message: message.into(),
            delay,
            _entity: PhantomData,
        })
    }

    async fn fail<R>(&self) -> Result<R, MutationError> {
        tokio::time::sleep(self.delay).await;
        Err(MutationError::Rejected(self.message.clone()))
    }
}

#[async_trait]
impl<T: Entity> Writer<T> for FailingWriter<T> {
    async fn create(&self, _input: T::Input) -> Result<T, MutationError> {
        self.fail().await
    }

    async fn update(&self, _id: T::Id, _input: T::Input) -> Result<T, MutationError> {
        self.fail().await
    }

    async fn delete(&self, _id: T::Id) -> Result<T::Id, MutationError> {
        self.fail().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserId, UserInput};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let create_task = tokio::spawn(async move {
            let input = UserInput {
                name: Some("Test".to_string()),
                email: "test@example.com".to_string(),
                ..Default::default()
            };
            client.create(input).await
        });

        let (input, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(input.name.as_deref(), Some("Test"));
        let user = User::new(UserId(1), "Test", "test@example.com");
        responder.send(Ok(user.clone())).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(user));
    }

    #[tokio::test]
    async fn test_scripted_source_repeats_last_outcome() {
        let source = ScriptedSource::<User>::script(vec![
            Err(FetchError::Status { status: 500 }),
            Ok(vec![]),
        ]);
        assert!(source.fetch().await.is_err());
        assert_eq!(source.fetch().await, Ok(vec![]));
        assert_eq!(source.fetch().await, Ok(vec![]));
        assert_eq!(source.calls(), 3);
    }
}
