// SPDX-License-Identifier: Apache-2.0
//! The atomic hot-swap protocol (spec §4.D).
//!
//! `attempt_swap` runs the eight numbered steps in order. Failures before
//! step 6 (the atomic handle store) are fully reversible: the candidate is
//! discarded and the module stays on its previous version. Failures at or
//! after step 6 are routed to [`crate::recovery::RecoveryOrchestrator`]
//! instead of returned directly, matching §7's propagation policy for the
//! post-commit path.

use hmr_cas::ChunkCas;
use hmr_scheduler::{FrameScheduler, ResourceProjection, SwapRequest};
use hmr_state::{Checkpoint, ModuleState};
use hmr_types::{HmrError, LifecycleState, ModuleIdentity, VersionNumber};

use crate::recovery::RecoveryOrchestrator;
use crate::registry::Registry;

/// Runs the reversible prefix of the swap protocol: checkpoint (step 2),
/// migration (step 3), and the registry's move into `HotSwapping` (step 4).
fn run_pre_commit(
    registry: &Registry,
    state: &mut ModuleState,
    cas: &mut dyn ChunkCas,
    identity: ModuleIdentity,
    version: VersionNumber,
    migrate: impl FnOnce(&mut ModuleState) -> Result<(), HmrError>,
) -> Result<Checkpoint, HmrError> {
    let checkpoint = hmr_state::create_checkpoint(state, version, cas)?;
    migrate(state)?;
    registry.transition(identity, LifecycleState::HotSwapping)?;
    Ok(checkpoint)
}

/// Attempts to hot-swap `identity`'s active handle for the candidate
/// already staged via [`Registry::propose_candidate`].
///
/// `migrate` performs the candidate's declared version-to-version state
/// migration (identity function when the ABI is unchanged). `post_swap_hook`
/// runs once the new handle is in place and the accessor count is zero.
///
/// Returns `Ok(())` only once the entry has been promoted back to `Active`
/// on the candidate version. On any pre-step-6 failure the candidate is
/// discarded and the entry is left untouched (still `Active` on the
/// previous version). On a post-step-6 failure, recovery has already run by
/// the time this returns `Err`.
#[allow(clippy::too_many_arguments)]
pub fn attempt_swap(
    registry: &Registry,
    scheduler: &FrameScheduler,
    recovery: &RecoveryOrchestrator,
    identity: ModuleIdentity,
    request: SwapRequest,
    projection: ResourceProjection,
    version: VersionNumber,
    state: &mut ModuleState,
    cas: &mut dyn ChunkCas,
    migrate: impl FnOnce(&mut ModuleState) -> Result<(), HmrError>,
    post_swap_hook: impl FnOnce() -> bool,
) -> Result<(), HmrError> {
    // Step 1.
    scheduler.admit_swap(request, projection)?;

    let checkpoint = match run_pre_commit(registry, state, cas, identity, version, migrate) {
        Ok(checkpoint) => checkpoint,
        Err(err) => {
            let _ = registry.revert_candidate(identity);
            scheduler.release_swap(&identity);
            return Err(err);
        }
    };

    // Step 5.
    registry.wait_for_quiescence(identity);

    // Step 6.
    if let Err(err) = registry.promote_candidate(identity) {
        scheduler.release_swap(&identity);
        return Err(err);
    }

    // Step 7: everything past this point is post-commit; failures go to
    // Recovery, never straight back to the caller (spec §7).
    if post_swap_hook() {
        registry.transition(identity, LifecycleState::Active)?;
        scheduler.release_swap(&identity);
        Ok(())
    } else {
        recovery.recover_from_post_swap_failure(registry, state, cas, identity, &checkpoint)?;
        scheduler.release_swap(&identity);
        Err(HmrError::PostSwapHookFailed(identity))
    }
}
