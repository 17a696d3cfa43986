//! End-to-end tests across services, stores, the content store, and the
//! HTTP router.

mod helpers;
mod http_test;
mod retention_test;
mod version_chain_test;
mod workflow_test;
