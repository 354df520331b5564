//! # authz-policy
//!
//! Per-request access decisions for an MCP gateway.
//!
//! A deployment picks one [`Mode`] (public, private, org or custom). At
//! deploy time the [`PolicyCompiler`] turns the mode and its
//! [`PolicyContext`] into a [`PolicyArtifact`]. At request time the
//! [`DecisionEngine`] combines that artifact with the deployment's
//! [`AuthzTables`] and the caller's verified [`DecisionInput`] into a
//! [`Decision`].
//!
//! ## Key invariants
//!
//! - **Default deny**: no artifact match, no table grant, no admin role →
//!   denied. Missing tables are empty, never wildcards.
//! - **Every deny has a reason**: [`DenyReason`]s are collected from every
//!   layer for audit, and never returned to the caller.
//! - **Base rule first**: in private and org mode a caller the base rule
//!   rejects gets in only through a table grant. Neither `admin` nor
//!   `mcp:access` bypasses it.
//! - **`admin` is not `super_admin`**: admin reaches every tool, but only
//!   super_admin may call a dangerous tool.
//! - **Deterministic compile**: equal inputs give byte-identical artifacts.
//! - **Atomic reload**: [`SnapshotStore`] swaps whole snapshots.

pub mod artifact;
pub mod authorizer;
pub mod compiler;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod input;
pub mod mode;
pub mod rate_limit;
pub mod request;
pub mod snapshot;
pub mod tables;

pub use artifact::{PolicyArtifact, RuleTemplate};
pub use authorizer::{Authorizer, DecisionRecord};
pub use compiler::PolicyCompiler;
pub use config::{CompiledPolicy, CustomPolicy, DeploymentConfig};
pub use context::PolicyContext;
pub use engine::{Decision, DecisionEngine, DecisionTrace, DenyReason, Layer, LayerStep};
pub use error::{ArtifactError, ConfigError, TablesError};
pub use input::{Claims, DecisionInput, McpContext, RequestInfo, TokenInfo};
pub use mode::{ActorType, Mode};
pub use rate_limit::{NoUsageCounter, UsageCounter};
pub use request::component_from_path;
pub use snapshot::{PolicySnapshot, SnapshotStore};
pub use tables::{AuthzTables, RateLimit, ToolPermission};
