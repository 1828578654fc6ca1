use std::sync::Arc;
use tracing::{error, info};

use crate::adapters::{HttpUserSource, SimulatedWriter};
use crate::cache_framework::{CacheActor, Source, Writer};
use crate::clients::UserClient;
use crate::config::RosterConfig;
use crate::domain::User;
use crate::error::FetchError;

/// Owns the running actors of a session.
///
/// Responsible for starting the cache actor, wiring it to its adapters, and
/// handling shutdown.
pub struct RosterSystem {
    pub user_client: UserClient,
    pub config: RosterConfig,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl RosterSystem {
    /// Reads from the configured endpoint, writes through the simulated adapter.
    pub fn new(config: RosterConfig) -> Result<Self, FetchError> {
        let source = HttpUserSource::new(config.endpoint.clone(), config.http_timeout)?;
        let writer = SimulatedWriter::new(config.write_latency.clone());
        Ok(Self::with_adapters(config, Arc::new(source), Arc::new(writer)))
    }

    pub fn with_adapters(
        config: RosterConfig,
        source: Arc<dyn Source<User>>,
        writer: Arc<dyn Writer<User>>,
    ) -> Self {
        let (user_actor, user_cache_client) = CacheActor::new(config.cache.clone(), source, writer);
        let user_client = UserClient::new(user_cache_client);
        let user_handle = tokio::spawn(user_actor.run());

        Self {
            user_client,
            config,
            handles: vec![user_handle],
        }
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        self.user_client
            .shutdown()
            .await
            .map_err(|e| e.to_string())?;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
