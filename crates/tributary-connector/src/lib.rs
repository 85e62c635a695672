//! # Connector Boundary
//!
//! Abstractions every tributary connector implements to expose an external
//! SaaS system (Dropbox, GitLab, OneDrive, Nextcloud, Zammad, ...) as a
//! paginated change feed.
//!
//! The sync engine in `tributary-sync` consumes these types; nothing in this
//! crate knows about record reconciliation, batching, or cursors beyond the
//! opaque strings a [`ChangeSource`] hands back.
//!
//! ## Crate Organization
//!
//! - [`error`] - Error types with transient/permanent classification
//! - [`item`] - [`ExternalItem`], the normalized changed-entity shape
//! - [`permission`] - Access-control entries and principal kinds
//! - [`scope`] - [`SyncScope`], the independently-cursored unit of work
//! - [`source`] - The [`ChangeSource`] trait and [`ChangePage`]

pub mod error;
pub mod item;
pub mod permission;
pub mod scope;
pub mod source;

pub use error::{ConnectorError, ConnectorResult};
pub use item::ExternalItem;
pub use permission::{Permission, PermissionLevel, PrincipalKind};
pub use scope::SyncScope;
pub use source::{ChangePage, ChangeSource};

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
