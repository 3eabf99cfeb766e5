// SPDX-License-Identifier: Apache-2.0
//! The top-level `Runtime` context (spec §2, §5): wires the Registry,
//! Loader, State Manager, Swap Coordinator, Frame Scheduler, Sandbox, and
//! Telemetry together behind the frame loop and the administrative control
//! surface of spec §6.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hmr_cas::MemoryChunkCas;
use hmr_loader::{Loader, ModuleHandle, SelfCheck};
use hmr_registry::{attempt_swap, RecoveryOrchestrator, Registry};
use hmr_sandbox::{CapabilityGuard, GlobalArenaPool, ModuleArena, ViolationTracker};
use hmr_scheduler::{FrameScheduler, ResourceProjection, SwapRequest};
use hmr_state::{Checkpoint, Chunk, ChunkId, ModuleState, StateAccessor};
use hmr_telemetry::{FrameMetrics, HealthSignal, TelemetryRegistry};
use hmr_types::{CapabilitySet, HmrError, LifecycleState, ModuleIdentity, VersionDescriptor};
use tracing::{info, instrument};

use crate::config::RuntimeConfig;
use crate::module::ModuleRuntimeState;
use crate::worker_pool::WorkerPool;

type SharedModuleState = Arc<Mutex<ModuleRuntimeState>>;

/// The named transition chain a fresh entry walks from `Discovered` to
/// `Initializing`, immediately before its first handle installs it into
/// `Active` (spec §3 Lifecycle, §4.D).
const PRE_ACTIVATION_CHAIN: [LifecycleState; 7] = [
    LifecycleState::Building,
    LifecycleState::Built,
    LifecycleState::Loading,
    LifecycleState::Loaded,
    LifecycleState::Linking,
    LifecycleState::Linked,
    LifecycleState::Initializing,
];

/// Owns every HMR component for one simulation process and drives the
/// frame loop and administrative control surface over them.
pub struct Runtime {
    config: RuntimeConfig,
    registry: Registry,
    scheduler: FrameScheduler,
    recovery: RecoveryOrchestrator,
    telemetry: TelemetryRegistry,
    arena_pool: GlobalArenaPool,
    workers: WorkerPool,
    cas: Mutex<MemoryChunkCas>,
    modules: Mutex<HashMap<ModuleIdentity, SharedModuleState>>,
    checkpoints: Mutex<HashMap<ModuleIdentity, Checkpoint>>,
}

impl Runtime {
    /// Builds a runtime from `config`, starting its worker pool from the
    /// configured count or, absent one, `WorkerPool::from_environment`.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        let workers = config
            .worker_count
            .map_or_else(WorkerPool::from_environment, WorkerPool::new);
        info!(workers = workers.worker_count(), "HMR runtime initialized");
        Self {
            registry: Registry::new(config.checkpoint_retention),
            scheduler: FrameScheduler::new(config.frame_budget_ns),
            recovery: RecoveryOrchestrator::new(
                config.capability_violation_threshold,
                config.recovery_cooldown_frames,
            ),
            telemetry: TelemetryRegistry::new(
                config.telemetry_ring_capacity,
                config.telemetry_trend_window,
                config.telemetry_failure_rate_threshold,
                config.telemetry_memory_growth_threshold_bytes,
            ),
            arena_pool: GlobalArenaPool::new(),
            workers,
            cas: Mutex::new(MemoryChunkCas::new()),
            modules: Mutex::new(HashMap::new()),
            checkpoints: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// The registry (read-only diagnostics, lifecycle inspection).
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The frame scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// The telemetry registry.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryRegistry {
        &self.telemetry
    }

    /// The worker pool driving frame jobs.
    #[must_use]
    pub fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    fn module(&self, identity: ModuleIdentity) -> Result<SharedModuleState, HmrError> {
        self.modules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&identity)
            .cloned()
            .ok_or(HmrError::UnknownModule(identity))
    }

    /// Registers a fresh module: creates its registry entry (`Discovered`)
    /// and its arena, capability guard, and violation tracker, seeded with
    /// `initial_chunks` (spec §3: entries are created by the external
    /// watcher; this runtime is the caller that plays that role since no
    /// watcher is implemented, per §10.7).
    pub fn register_module(
        &self,
        identity: ModuleIdentity,
        critical_of: Vec<ModuleIdentity>,
        memory_limit_bytes: u64,
        granted_capabilities: CapabilitySet,
        initial_chunks: BTreeMap<ChunkId, Chunk>,
    ) -> Result<(), HmrError> {
        self.registry.register(identity, critical_of)?;
        let arena = ModuleArena::new(identity, memory_limit_bytes, self.arena_pool.clone());
        let capabilities = CapabilityGuard::new(identity, granted_capabilities);
        let violations = ViolationTracker::new(identity, self.config.capability_violation_threshold);
        let state = ModuleState::new(identity, initial_chunks);
        self.modules.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(
            identity,
            Arc::new(Mutex::new(ModuleRuntimeState::new(
                state,
                arena,
                capabilities,
                violations,
            ))),
        );
        Ok(())
    }

    /// Drives a registered module from `Discovered` through the pre-
    /// activation chain, loads `artifact_bytes` against `descriptor`, and
    /// installs the resulting handle as the module's first active version
    /// (spec §4.B, §4.D first-activation path).
    #[instrument(skip(self, loader, artifact_bytes, self_check))]
    pub fn load_and_activate(
        &self,
        identity: ModuleIdentity,
        loader: &Loader,
        descriptor: &VersionDescriptor,
        artifact_bytes: &[u8],
        available_exports: &std::collections::BTreeSet<String>,
        self_check: &SelfCheck,
    ) -> Result<(), HmrError> {
        for next in PRE_ACTIVATION_CHAIN {
            self.registry.transition(identity, next)?;
        }
        let handle = loader
            .load(
                descriptor,
                artifact_bytes,
                hmr_loader::SymbolTable::default(),
                available_exports,
                self_check,
            )
            .map_err(HmrError::from)?;
        self.registry.install_first_handle(identity, handle)
    }

    /// Loads a candidate artifact and stages it as `identity`'s pending
    /// swap target (spec §4.B then §4.A `propose_candidate`).
    pub fn propose_candidate(
        &self,
        identity: ModuleIdentity,
        loader: &Loader,
        descriptor: &VersionDescriptor,
        artifact_bytes: &[u8],
        available_exports: &std::collections::BTreeSet<String>,
        self_check: &SelfCheck,
        compatible_with: &[hmr_types::AbiSignature],
    ) -> Result<(), HmrError> {
        let candidate = loader
            .load(
                descriptor,
                artifact_bytes,
                hmr_loader::SymbolTable::default(),
                available_exports,
                self_check,
            )
            .map_err(HmrError::from)?;
        self.registry
            .propose_candidate(identity, candidate, compatible_with)
    }

    /// Runs the eight-step atomic swap protocol against `identity`'s staged
    /// candidate, persisting the checkpoint taken along the way so
    /// [`Runtime::force_rollback`] has something to act on.
    pub fn hot_swap(
        &self,
        identity: ModuleIdentity,
        estimated_cost_ns: u64,
        projection: ResourceProjection,
        migrate: impl FnOnce(&mut ModuleState) -> Result<(), HmrError>,
        post_swap_hook: impl FnOnce() -> bool,
    ) -> Result<(), HmrError> {
        let module = self.module(identity)?;
        let (_active, pin) = self.registry.lookup(identity)?;
        let version = _active.version();
        drop(pin);

        let mut guard = module.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut cas = self.cas.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let result = attempt_swap(
            &self.registry,
            &self.scheduler,
            &self.recovery,
            identity,
            SwapRequest {
                module: identity,
                estimated_cost_ns,
            },
            projection,
            version,
            &mut guard.state,
            &mut *cas,
            migrate,
            post_swap_hook,
        );

        if let Ok(checkpoint) = hmr_state::create_checkpoint(&mut guard.state, version, &mut *cas) {
            self.checkpoints
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(identity, checkpoint);
        }

        result
    }

    /// Runs `tick` once for every identity in `identities` across the
    /// worker pool, bracketed by `begin_frame`/`end_frame` (spec §5: "worker
    /// threads never block on HMR operations except at the frame-end
    /// barrier"). Identities not currently lookup-eligible are skipped.
    #[instrument(skip(self, identities, tick))]
    pub fn run_frame<F>(&self, identities: &[ModuleIdentity], tick: F)
    where
        F: Fn(ModuleIdentity, &mut StateAccessor<'_>) + Sync,
    {
        self.scheduler.begin_frame();
        self.workers.run(identities, |identity| {
            let Ok((_, entry_pin)) = self.registry.lookup(*identity) else {
                return;
            };
            let frame_pin = self.scheduler.accessor_enter();
            if let Ok(module) = self.module(*identity) {
                let mut guard = module
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                let ModuleRuntimeState {
                    state,
                    arena,
                    capabilities,
                    ..
                } = &mut *guard;
                let mut accessor = StateAccessor::new(state, capabilities, arena);
                tick(*identity, &mut accessor);
            }
            drop(frame_pin);
            drop(entry_pin);
        });
        self.scheduler.end_frame();
    }

    /// Records a frame's telemetry sample for `identity`.
    pub fn record_telemetry(&self, identity: ModuleIdentity, sample: FrameMetrics) -> HealthSignal {
        self.telemetry.record(identity, sample)
    }

    // -- Control surface (spec §6) --------------------------------------

    /// `pause-module`: drains in-flight accessors, then parks the module
    /// out of the frame loop without discarding its state.
    pub fn pause_module(&self, identity: ModuleIdentity) -> Result<(), HmrError> {
        self.registry.transition(identity, LifecycleState::Pausing)?;
        self.registry.wait_for_quiescence(identity);
        self.registry.transition(identity, LifecycleState::Paused)
    }

    /// `resume-module`: returns a paused module to the frame loop.
    pub fn resume_module(&self, identity: ModuleIdentity) -> Result<(), HmrError> {
        self.registry.transition(identity, LifecycleState::Resuming)?;
        self.registry.transition(identity, LifecycleState::Active)
    }

    /// `retire-module`: retires the module and drops its runtime state and
    /// telemetry.
    pub fn retire_module(&self, identity: ModuleIdentity) -> Result<(), HmrError> {
        self.registry.retire(identity)?;
        self.modules
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&identity);
        self.checkpoints
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&identity);
        self.telemetry.forget(identity);
        Ok(())
    }

    /// `force-rollback`: restores `identity`'s most recently recorded
    /// checkpoint and previous handle outside of any in-flight swap,
    /// matching Recovery's rollback step (spec §4.H) without requiring a
    /// failed swap to trigger it.
    pub fn force_rollback(&self, identity: ModuleIdentity) -> Result<(), HmrError> {
        let module = self.module(identity)?;
        let checkpoint = self
            .checkpoints
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&identity)
            .cloned()
            .ok_or(HmrError::NoCheckpoint(identity))?;
        let mut guard = module.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let cas = self.cas.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        hmr_state::rollback(&mut guard.state, &checkpoint, &*cas)
            .map_err(|_| HmrError::RollbackFailed(identity))?;
        drop(cas);
        if let Some(previous) = self.registry.previous_handle(identity) {
            self.registry.restore_active(identity, previous)?;
        }
        Ok(())
    }

    /// `set-capability-threshold`: replaces `identity`'s violation tracker
    /// with a fresh one at `threshold`, resetting its accrued count.
    pub fn set_capability_threshold(&self, identity: ModuleIdentity, threshold: u64) -> Result<(), HmrError> {
        let module = self.module(identity)?;
        let mut guard = module.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.violations = ViolationTracker::new(identity, threshold);
        Ok(())
    }

    /// Records a sandbox capability violation for `identity` and runs the
    /// recovery ladder if it trips the module's tracker (spec §4.F/§4.H).
    pub fn report_capability_violation(&self, identity: ModuleIdentity) -> Result<bool, HmrError> {
        let module = self.module(identity)?;
        let guard = module.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let tripped = self
            .recovery
            .handle_capability_violation(&self.registry, &guard.violations, identity)?;
        Ok(tripped)
    }

    /// The currently active module handle, without pinning an accessor
    /// beyond this call (diagnostics; callers touching state should use
    /// [`Runtime::run_frame`] instead, which pins for the whole tick).
    pub fn active_handle(&self, identity: ModuleIdentity) -> Result<ModuleHandle, HmrError> {
        self.registry.lookup(identity).map(|(handle, _pin)| handle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hmr_loader::NullVerifier;
    use hmr_types::{AbiSignature, Capability, ContentHash, ResourceLimits, DESCRIPTOR_MAGIC, DESCRIPTOR_VERSION};

    fn descriptor(identity: ModuleIdentity, version: u64, abi: [u8; 32]) -> VersionDescriptor {
        VersionDescriptor {
            magic: DESCRIPTOR_MAGIC,
            descriptor_version: DESCRIPTOR_VERSION,
            module_identity: identity,
            version_number: hmr_types::VersionNumber(version),
            content_hash: ContentHash::of(b"artifact"),
            abi_signature: AbiSignature(abi),
            compatible_with: Vec::new(),
            capabilities: CapabilitySet::from_iter([Capability::ReadState, Capability::WriteState]),
            limits: ResourceLimits::new(65_536, 1, 5_000),
            signature: [0u8; 64],
        }
    }

    fn runtime() -> Runtime {
        Runtime::new(RuntimeConfig::builder().worker_count(2).build())
    }

    fn chunks() -> BTreeMap<ChunkId, Chunk> {
        let mut chunks = BTreeMap::new();
        chunks.insert(ChunkId(0), Chunk::new(vec![0u8; 64]));
        chunks
    }

    #[test]
    fn register_then_activate_reaches_active() {
        let runtime = runtime();
        let identity = ModuleIdentity::from_name("physics");
        runtime
            .register_module(
                identity,
                Vec::new(),
                65_536,
                CapabilitySet::from_iter([Capability::ReadState, Capability::WriteState]),
                chunks(),
            )
            .expect("register");
        let loader = Loader::new(Box::new(NullVerifier));
        runtime
            .load_and_activate(
                identity,
                &loader,
                &descriptor(identity, 1, [0u8; 32]),
                b"artifact",
                &std::collections::BTreeSet::new(),
                &|_| true,
            )
            .expect("activate");
        assert_eq!(runtime.registry().state_of(identity), Some(LifecycleState::Active));
    }

    #[test]
    fn hot_swap_promotes_candidate_and_records_checkpoint() {
        let runtime = runtime();
        let identity = ModuleIdentity::from_name("physics");
        runtime
            .register_module(identity, Vec::new(), 65_536, CapabilitySet::NONE, chunks())
            .expect("register");
        let loader = Loader::new(Box::new(NullVerifier));
        runtime
            .load_and_activate(
                identity,
                &loader,
                &descriptor(identity, 1, [0u8; 32]),
                b"artifact",
                &std::collections::BTreeSet::new(),
                &|_| true,
            )
            .expect("activate");
        runtime
            .propose_candidate(
                identity,
                &loader,
                &descriptor(identity, 2, [0u8; 32]),
                b"artifact-2",
                &std::collections::BTreeSet::new(),
                &|_| true,
                &[],
            )
            .expect("propose");

        runtime.scheduler().begin_frame();
        runtime
            .hot_swap(identity, 1_000, ResourceProjection { exceeds_budget: false }, |_| Ok(()), || true)
            .expect("swap");

        assert_eq!(runtime.registry().state_of(identity), Some(LifecycleState::Active));
        assert_eq!(runtime.active_handle(identity).expect("lookup").version(), hmr_types::VersionNumber(2));
    }

    #[test]
    fn pause_then_resume_round_trips_through_active() {
        let runtime = runtime();
        let identity = ModuleIdentity::from_name("physics");
        runtime
            .register_module(identity, Vec::new(), 65_536, CapabilitySet::NONE, chunks())
            .expect("register");
        let loader = Loader::new(Box::new(NullVerifier));
        runtime
            .load_and_activate(
                identity,
                &loader,
                &descriptor(identity, 1, [0u8; 32]),
                b"artifact",
                &std::collections::BTreeSet::new(),
                &|_| true,
            )
            .expect("activate");

        runtime.pause_module(identity).expect("pause");
        assert_eq!(runtime.registry().state_of(identity), Some(LifecycleState::Paused));
        runtime.resume_module(identity).expect("resume");
        assert_eq!(runtime.registry().state_of(identity), Some(LifecycleState::Active));
    }

    #[test]
    fn retire_module_drops_runtime_state() {
        let runtime = runtime();
        let identity = ModuleIdentity::from_name("physics");
        runtime
            .register_module(identity, Vec::new(), 65_536, CapabilitySet::NONE, chunks())
            .expect("register");
        runtime.retire_module(identity).expect("retire");
        assert_eq!(runtime.registry().state_of(identity), Some(LifecycleState::Unloaded));
        assert!(matches!(
            runtime.active_handle(identity),
            Err(HmrError::NotActive(_))
        ));
    }

    #[test]
    fn capability_violation_quarantines_after_threshold() {
        let runtime = runtime();
        let identity = ModuleIdentity::from_name("physics");
        runtime
            .register_module(
                identity,
                Vec::new(),
                65_536,
                CapabilitySet::from_iter([Capability::ReadState]),
                chunks(),
            )
            .expect("register");
        runtime.set_capability_threshold(identity, 1).expect("set threshold");

        let loader = Loader::new(Box::new(NullVerifier));
        runtime
            .load_and_activate(
                identity,
                &loader,
                &descriptor(identity, 1, [0u8; 32]),
                b"artifact",
                &std::collections::BTreeSet::new(),
                &|_| true,
            )
            .expect("activate");

        let tripped = runtime
            .report_capability_violation(identity)
            .expect("record violation");
        assert!(tripped);
        assert_eq!(runtime.registry().state_of(identity), Some(LifecycleState::Error));
    }

    #[test]
    fn run_frame_ticks_every_active_module() {
        let runtime = runtime();
        let identity = ModuleIdentity::from_name("physics");
        runtime
            .register_module(
                identity,
                Vec::new(),
                65_536,
                CapabilitySet::from_iter([Capability::ReadState]),
                chunks(),
            )
            .expect("register");
        let loader = Loader::new(Box::new(NullVerifier));
        runtime
            .load_and_activate(
                identity,
                &loader,
                &descriptor(identity, 1, [0u8; 32]),
                b"artifact",
                &std::collections::BTreeSet::new(),
                &|_| true,
            )
            .expect("activate");

        let ticked = std::sync::atomic::AtomicUsize::new(0);
        runtime.run_frame(&[identity], |_identity, accessor| {
            let bytes = accessor.read(ChunkId(0), 0, 1).expect("read");
            assert_eq!(bytes, vec![0u8]);
            ticked.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        });
        assert_eq!(ticked.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
