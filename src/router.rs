//! Cluster router façade.
//!
//! # Responsibilities
//! - Connect to the bootstrap node and discover its peers (fatal on failure)
//! - Spawn the topology poller and manager joined by a bounded channel
//! - Serve endpoint selection to callers
//! - Shut everything down and close every handle
//!
//! # Design Decisions
//! - Startup is ordered: bootstrap, discovery, service connection, background tasks
//! - A failed startup closes whatever handles it already opened
//! - `close` is idempotent and waits for the background tasks
//! - Dropping the router signals shutdown; the registry closes its handles once
//!   the last task lets go of it

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::balancer::BalanceStrategy;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, RouterConfig};
use crate::endpoint::{self, Connection, Connector, Endpoint, NodeAddress};
use crate::error::{RouterError, RouterResult};
use crate::lifecycle::Shutdown;
use crate::registry::ConnectionRegistry;
use crate::topology::{discovery, ChangeFilter, TopologyManager, TopologyPoller};

/// Client-side router over a live set of cluster nodes.
pub struct ClusterRouter<K: Connector> {
    config: RouterConfig,
    registry: Arc<ConnectionRegistry<K::Conn>>,
    service: Option<Arc<K::Conn>>,
    shutdown: Shutdown,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<K: Connector> ClusterRouter<K> {
    /// Connect to the cluster described by `config`.
    pub async fn connect(config: RouterConfig, connector: K) -> RouterResult<Self> {
        validate_config(&config)
            .map_err(|errors| RouterError::Config(ConfigError::Validation(errors)))?;

        let connector = Arc::new(connector);
        let connect_timeout = Duration::from_millis(config.bootstrap.connect_timeout_ms);
        let bootstrap: NodeAddress = config.bootstrap.address.parse()?;
        let bootstrap_key = config.bootstrap.address.clone();

        let initial = endpoint::open(connector.as_ref(), &bootstrap, connect_timeout).await?;
        let strategy = config.balancer.strategy.build();
        let registry = Arc::new(ConnectionRegistry::with_strategy(strategy));
        registry.add(&bootstrap_key, initial)?;

        let discovered = discovery::discover(
            &registry,
            connector.as_ref(),
            &bootstrap_key,
            connect_timeout,
        )
        .await;
        if let Err(e) = discovered {
            registry.close_all();
            return Err(e);
        }

        let router = Self {
            config,
            registry,
            service: None,
            shutdown: Shutdown::new(),
            tasks: Mutex::new(Vec::new()),
        };

        if !router.config.topology.enabled {
            tracing::info!(
                endpoints = router.registry.len(),
                "Cluster router ready, topology management disabled"
            );
            return Ok(router);
        }

        router.start_topology(connector, &bootstrap_key, connect_timeout).await
    }

    async fn start_topology(
        mut self,
        connector: Arc<K>,
        bootstrap: &str,
        connect_timeout: Duration,
    ) -> RouterResult<Self> {
        if let Some(service_address) = &self.config.topology.service_address {
            let address: NodeAddress = service_address.parse()?;
            match endpoint::open(connector.as_ref(), &address, connect_timeout).await {
                Ok(conn) => self.service = Some(Arc::new(conn)),
                Err(e) => {
                    self.registry.close_all();
                    return Err(e);
                }
            }
        }

        let topology = &self.config.topology;
        let (events_tx, events_rx) = mpsc::channel(topology.event_queue_capacity);

        let manager = TopologyManager::new(self.registry.clone(), connector);
        let poller = TopologyPoller::new(
            self.registry.clone(),
            self.service.clone(),
            ChangeFilter::new(bootstrap),
            Duration::from_millis(topology.poll_interval_ms),
        );

        {
            let mut tasks = self.tasks.lock();
            tasks.push(tokio::spawn(manager.run(events_rx)));
            tasks.push(tokio::spawn(poller.run(events_tx, self.shutdown.subscribe())));
        }

        tracing::info!(
            endpoints = self.registry.len(),
            strategy = self.registry.strategy_name(),
            service = self.service.is_some(),
            "Cluster router ready"
        );
        Ok(self)
    }

    /// Pick the endpoint for the next request.
    pub fn select(&self) -> RouterResult<Arc<Endpoint<K::Conn>>> {
        self.registry.select()
    }

    pub fn endpoints(&self) -> Vec<Arc<Endpoint<K::Conn>>> {
        self.registry.list()
    }

    pub fn endpoint_map(&self) -> HashMap<String, Arc<Endpoint<K::Conn>>> {
        self.registry.map()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry<K::Conn>> {
        &self.registry
    }

    pub fn set_strategy(&self, strategy: Box<dyn BalanceStrategy>) {
        self.registry.set_strategy(strategy);
    }

    pub fn strategy(&self) -> &'static str {
        self.registry.strategy_name()
    }

    /// Copy of the configuration the router was built from.
    pub fn config(&self) -> RouterConfig {
        self.config.clone()
    }

    /// Ping every registered endpoint.
    pub async fn ping(&self) -> RouterResult<()> {
        let endpoints = self.registry.list();
        try_join_all(endpoints.iter().map(|endpoint| async move {
            endpoint.handle().ping().await.map_err(|source| RouterError::Connect {
                address: endpoint.address().to_string(),
                source,
            })
        }))
        .await?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Stop background tasks, drain pending events and close every handle.
    ///
    /// Safe to call more than once.
    pub async fn close(&self) {
        if !self.shutdown.trigger() {
            return;
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }

        self.registry.close_all();
        if let Some(service) = &self.service {
            service.close();
        }
        tracing::info!("Cluster router closed");
    }
}

impl<K: Connector> Drop for ClusterRouter<K> {
    fn drop(&mut self) {
        if self.shutdown.trigger() {
            tracing::debug!("Cluster router dropped without close");
        }
        if let Some(service) = &self.service {
            service.close();
        }
    }
}
