// SPDX-License-Identifier: Apache-2.0
//! Per-module runtime state: the state chunks, arena, capability guard, and
//! violation tracker a registered module needs outside the registry's own
//! bookkeeping.

use hmr_sandbox::{CapabilityGuard, ModuleArena, ViolationTracker};
use hmr_state::ModuleState;

/// Everything [`crate::Runtime`] keeps for one registered module besides its
/// `hmr-registry` entry.
pub struct ModuleRuntimeState {
    pub(crate) state: ModuleState,
    pub(crate) arena: ModuleArena,
    pub(crate) capabilities: CapabilityGuard,
    pub(crate) violations: ViolationTracker,
}

impl ModuleRuntimeState {
    pub(crate) fn new(
        state: ModuleState,
        arena: ModuleArena,
        capabilities: CapabilityGuard,
        violations: ViolationTracker,
    ) -> Self {
        Self {
            state,
            arena,
            capabilities,
            violations,
        }
    }

    /// The module's chunked state.
    pub fn state(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    /// The module's arena, for resource accounting.
    #[must_use]
    pub fn arena(&self) -> &ModuleArena {
        &self.arena
    }

    /// The module's granted-capability guard.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityGuard {
        &self.capabilities
    }

    /// The module's sandbox violation tracker.
    #[must_use]
    pub fn violations(&self) -> &ViolationTracker {
        &self.violations
    }
}
