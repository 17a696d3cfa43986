//! # docvault-entity
//!
//! Domain entity models for DocVault. Every struct in this crate represents
//! a database table row or a domain value object. Row types derive
//! `sqlx::FromRow`; enums map to PostgreSQL enum types via `sqlx::Type`.

pub mod approval;
pub mod document;
pub mod version;
pub mod workflow;
