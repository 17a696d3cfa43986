//! Document version chain services.

pub mod analytics;
pub mod chain;
pub mod diff;
pub mod retention;
pub mod rollback;

pub use analytics::{Analytics, AnalyticsService, BatchAnalytics};
pub use chain::{StoredContent, VersionChain, VersionContent};
pub use diff::{Comparison, compare};
pub use retention::{CleanupReport, RetentionPolicy, RetentionService, SweepReport};
pub use rollback::RollbackService;
