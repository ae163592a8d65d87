//! Wiring of gateways, session and cache into the workflows.

use aquaroute_gateway::{GatewayResult, RestTransport, SessionContext};

use crate::adjustments::AdjustmentWorkflow;
use crate::cache::ReadCache;
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::orders::OrderWorkflow;
use crate::resources::Backend;

/// Application handle. Cheap to clone; clones share session and cache.
#[derive(Clone)]
pub struct AppContext {
    backend: Backend,
    session: SessionContext,
    cache: ReadCache,
}

impl AppContext {
    pub fn new(backend: Backend, session: SessionContext, cache: ReadCache) -> Self {
        Self {
            backend,
            session,
            cache,
        }
    }

    /// REST-backed context built from configuration.
    pub fn connect(config: &ClientConfig, session: SessionContext) -> GatewayResult<Self> {
        let transport = RestTransport::new(
            &config.api_url,
            &config.api_prefix,
            config.http_timeout,
            session.clone(),
        )?;
        tracing::info!(base_url = transport.base_url(), prefix = %config.api_prefix, "backend configured");
        Ok(Self::new(
            Backend::rest(transport),
            session,
            ReadCache::new(config.cache_max_age),
        ))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.backend.clone(), self.cache.clone())
    }

    pub fn adjustments(&self) -> AdjustmentWorkflow {
        AdjustmentWorkflow::new(self.backend.clone(), self.session.clone(), self.cache.clone())
    }

    pub fn orders(&self) -> OrderWorkflow {
        OrderWorkflow::new(self.backend.clone(), self.session.clone(), self.cache.clone())
    }
}
