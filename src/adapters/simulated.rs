use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument};

use crate::cache_framework::Writer;
use crate::domain::{User, UserId, UserInput};
use crate::error::MutationError;

#[derive(Debug, Clone, PartialEq)]
pub struct WriteLatency {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for WriteLatency {
    fn default() -> Self {
        Self {
            create: Duration::from_millis(1000),
            update: Duration::from_millis(800),
            delete: Duration::from_millis(500),
        }
    }
}

/// Confirms writes after a fixed delay without contacting any server.
///
/// Ids come from a counter seeded with the current UNIX time in milliseconds,
/// so they stay clear of the small ids the remote collection uses and never
/// repeat within a session.
pub struct SimulatedWriter {
    latency: WriteLatency,
    next_id: AtomicU64,
}

impl SimulatedWriter {
    pub fn new(latency: WriteLatency) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::with_first_id(latency, seed)
    }

    pub fn with_first_id(latency: WriteLatency, first_id: u64) -> Self {
        Self {
            latency,
            next_id: AtomicU64::new(first_id),
        }
    }

    fn allocate_id(&self) -> UserId {
        UserId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

fn require_name(input: &mut UserInput) -> Result<String, MutationError> {
    input
        .name
        .take()
        .ok_or_else(|| MutationError::Rejected("Name is required".to_string()))
}

#[async_trait]
impl Writer<User> for SimulatedWriter {
    #[instrument(skip(self, input))]
    async fn create(&self, mut input: UserInput) -> Result<User, MutationError> {
        debug!("Simulating create");
        tokio::time::sleep(self.latency.create).await;
        let name = require_name(&mut input)?;
        let id = self.allocate_id();
        info!(%id, "Create confirmed");
        Ok(User::from_input(id, name, input))
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: UserId, mut input: UserInput) -> Result<User, MutationError> {
        debug!("Simulating update");
        tokio::time::sleep(self.latency.update).await;
        let name = require_name(&mut input)?;
        info!("Update confirmed");
        Ok(User::from_input(id, name, input))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<UserId, MutationError> {
        debug!("Simulating delete");
        tokio::time::sleep(self.latency.delete).await;
        info!("Delete confirmed");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CITY_NOT_INFORMED;
    use tokio::time::Instant;

    fn input(name: &str, city: Option<&str>) -> UserInput {
        UserInput {
            name: Some(name.to_string()),
            email: format!("{}@example.com", name.to_lowercase()),
            city: city.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_and_fills_defaults() {
        let writer = SimulatedWriter::new(WriteLatency::default());
        let started = Instant::now();

        let user = writer.create(input("Ana", None)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert_eq!(user.name, "Ana");
        assert_eq!(user.address.city.as_deref(), Some(CITY_NOT_INFORMED));
        assert_eq!(user.phone, "");
        assert_eq!(user.company.name, "");
        assert!(user.id.0 > 1_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_are_unique_under_rapid_creates() {
        let writer = SimulatedWriter::with_first_id(WriteLatency::default(), 100);
        let (a, b, c) = tokio::join!(
            writer.create(input("Ana", None)),
            writer.create(input("Bob", None)),
            writer.create(input("Cid", None)),
        );
        let mut ids = vec![a.unwrap().id, b.unwrap().id, c.unwrap().id];
        ids.sort();
        ids.dedup();
        assert_eq!(ids, vec![UserId(100), UserId(101), UserId(102)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_keeps_id() {
        let writer = SimulatedWriter::new(WriteLatency::default());
        let user = writer.update(UserId(3), input("Clementine", Some("Recife"))).await.unwrap();
        assert_eq!(user.id, UserId(3));
        assert_eq!(user.informed_city(), Some("Recife"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_without_name_is_rejected() {
        let writer = SimulatedWriter::new(WriteLatency::default());
        let mut nameless = input("x", None);
        nameless.name = None;
        let err = writer.update(UserId(3), nameless).await.unwrap_err();
        assert_eq!(err, MutationError::Rejected("Name is required".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_acknowledges_unknown_id() {
        let writer = SimulatedWriter::new(WriteLatency::default());
        assert_eq!(writer.delete(UserId(999)).await, Ok(UserId(999)));
    }
}
