// snapshot.rs - Immutable per-deployment policy snapshots.
//
// A snapshot bundles everything a decision reads: the mode, the compiled
// artifact and the authorization tables. Readers take an `Arc` to the
// current snapshot and evaluate against it without holding any lock. A hot
// reload builds a complete new snapshot and swaps the pointer, so a reader
// sees either the old tables or the new ones, never a mix.

use std::sync::{Arc, RwLock};

use crate::artifact::PolicyArtifact;
use crate::mode::Mode;
use crate::tables::AuthzTables;

/// Everything one decision reads, frozen.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    generation: u64,
    mode: Mode,
    artifact: Option<PolicyArtifact>,
    tables: AuthzTables,
}

impl PolicySnapshot {
    pub fn new(mode: Mode, artifact: Option<PolicyArtifact>, tables: AuthzTables) -> Self {
        Self {
            generation: 0,
            mode,
            artifact,
            tables,
        }
    }

    /// Monotonic counter bumped on every swap; 0 for the initial snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn artifact(&self) -> Option<&PolicyArtifact> {
        self.artifact.as_ref()
    }

    pub fn tables(&self) -> &AuthzTables {
        &self.tables
    }
}

/// Holds the current snapshot and swaps it atomically.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<PolicySnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in force right now.
    pub fn current(&self) -> Arc<PolicySnapshot> {
        // The lock only guards a pointer; a poisoned guard still holds a
        // complete snapshot.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Install a new snapshot and return its generation.
    pub fn replace(&self, snapshot: PolicySnapshot) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        install(&mut *guard, snapshot)
    }

    /// Swap in new tables, keeping the mode and artifact in force at the
    /// moment of the swap.
    pub fn replace_tables(&self, tables: AuthzTables) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let snapshot = PolicySnapshot::new(guard.mode, guard.artifact.clone(), tables);
        install(&mut *guard, snapshot)
    }
}

fn install(current: &mut Arc<PolicySnapshot>, mut snapshot: PolicySnapshot) -> u64 {
    snapshot.generation = current.generation + 1;
    let generation = snapshot.generation;
    *current = Arc::new(snapshot);
    tracing::info!(generation, mode = %current.mode, "installed policy snapshot");
    generation
}
