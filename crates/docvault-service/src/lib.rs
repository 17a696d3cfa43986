//! # docvault-service
//!
//! Business logic for DocVault: the version chain, rollback, retention,
//! comparison, analytics, document intake, and the approval workflow.
//! Services receive their stores and the content store through
//! constructors and never touch SQL directly.

pub mod context;
pub mod intake;
pub mod version;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use docvault_core::config::AppConfig;
use docvault_core::events::EventBus;
use docvault_core::traits::storage::ContentStore;
use docvault_database::store::Stores;

pub use context::ActorContext;
pub use intake::{IntakeService, Registration};
pub use version::{
    AnalyticsService, RetentionPolicy, RetentionService, RollbackService, VersionChain,
    VersionContent,
};
pub use workflow::WorkflowService;

/// Every service, wired against one set of stores.
#[derive(Debug, Clone)]
pub struct Services {
    pub chain: VersionChain,
    pub rollback: RollbackService,
    pub retention: RetentionService,
    pub analytics: AnalyticsService,
    pub workflows: WorkflowService,
    pub intake: IntakeService,
}

impl Services {
    /// Build all services from configuration.
    pub fn new(
        stores: Stores,
        content: Arc<dyn ContentStore>,
        events: EventBus,
        config: &AppConfig,
    ) -> Self {
        let chain = VersionChain::new(
            stores.clone(),
            content.clone(),
            events.clone(),
            config.storage.max_content_bytes,
        );
        let workflows = WorkflowService::new(
            stores.clone(),
            events.clone(),
            config.workflow.approval_due_days,
        );

        Self {
            rollback: RollbackService::new(chain.clone()),
            retention: RetentionService::new(
                stores.clone(),
                content,
                events,
                RetentionPolicy::from(&config.retention),
            ),
            analytics: AnalyticsService::new(stores.clone()),
            intake: IntakeService::new(stores, chain.clone(), workflows.clone()),
            workflows,
            chain,
        }
    }
}
