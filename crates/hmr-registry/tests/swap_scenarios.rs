// SPDX-License-Identifier: Apache-2.0
//! The concrete end-to-end scenarios of spec §8, seeded with the literal
//! values stated there.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet};

use hmr_cas::MemoryChunkCas;
use hmr_registry::{attempt_swap, RecoveryOrchestrator, Registry};
use hmr_sandbox::{CapabilityGuard, GlobalArenaPool, ModuleArena, ViolationTracker};
use hmr_scheduler::{FrameScheduler, ResourceProjection, SwapRequest};
use hmr_state::{
    create_checkpoint, Chunk, ChunkId, ModuleState, RetentionPolicy, StateAccessor,
};
use hmr_types::{
    AbiSignature, Capability, CapabilitySet, ContentHash, HmrError, LifecycleState,
    ModuleIdentity, ResourceLimits, VersionNumber, DESCRIPTOR_MAGIC, DESCRIPTOR_VERSION,
};

fn loaded_handle(
    identity: ModuleIdentity,
    version: u64,
    abi: [u8; 32],
    caps: CapabilitySet,
) -> hmr_loader::ModuleHandle {
    let descriptor = hmr_types::VersionDescriptor {
        magic: DESCRIPTOR_MAGIC,
        descriptor_version: DESCRIPTOR_VERSION,
        module_identity: identity,
        version_number: VersionNumber(version),
        content_hash: ContentHash::of(b"artifact"),
        abi_signature: AbiSignature(abi),
        compatible_with: Vec::new(),
        capabilities: caps,
        limits: ResourceLimits::new(65_536, 1, 5_000),
        signature: [0u8; 64],
    };
    hmr_loader::Loader::new(Box::new(hmr_loader::NullVerifier))
        .load(
            &descriptor,
            b"artifact",
            hmr_loader::SymbolTable::default(),
            &BTreeSet::new(),
            &|_| true,
        )
        .expect("load should succeed")
}

fn bring_to_initializing(registry: &Registry, identity: ModuleIdentity, critical_of: Vec<ModuleIdentity>) {
    registry.register(identity, critical_of).expect("register");
    for next in [
        LifecycleState::Building,
        LifecycleState::Built,
        LifecycleState::Loading,
        LifecycleState::Loaded,
        LifecycleState::Linking,
        LifecycleState::Linked,
        LifecycleState::Initializing,
    ] {
        registry.transition(identity, next).expect("named transition");
    }
}

#[test]
fn baseline_load_and_run() {
    let registry = Registry::new(RetentionPolicy::KeepAll);
    let identity = ModuleIdentity::from_name("M1");
    let caps = CapabilitySet::from_iter([Capability::ReadState, Capability::WriteState]);
    bring_to_initializing(&registry, identity, Vec::new());
    registry
        .install_first_handle(identity, loaded_handle(identity, 1, [0u8; 32], caps))
        .expect("install");

    let mut chunks = BTreeMap::new();
    chunks.insert(ChunkId(0), Chunk::new(vec![0u8; 4096]));
    let mut state = ModuleState::new(identity, chunks);

    let guard = CapabilityGuard::new(identity, caps);
    let arena = ModuleArena::new(identity, 65_536, GlobalArenaPool::new());
    let mut accessor = StateAccessor::new(&mut state, &guard, &arena);
    let byte = accessor.read(ChunkId(0), 0, 1).expect("read");
    assert_eq!(byte, vec![0u8]);

    let telemetry = hmr_telemetry::TelemetryRegistry::new(16, 8, 0.5, 1_000_000);
    telemetry.record(identity, hmr_telemetry::FrameMetrics::default());
    assert_eq!(telemetry.drain(identity).len(), 1);

    let (looked_up, _pin) = registry.lookup(identity).expect("lookup");
    assert_eq!(looked_up.version(), VersionNumber(1));
}

#[test]
fn incremental_update_dirties_one_block() {
    let identity = ModuleIdentity::from_name("M1");
    let mut chunks = BTreeMap::new();
    chunks.insert(ChunkId(0), Chunk::new(vec![0u8; 4096]));
    let mut state = ModuleState::new(identity, chunks);
    let mut cas = MemoryChunkCas::new();

    let checkpoint = create_checkpoint(&mut state, VersionNumber(1), &mut cas).expect("checkpoint");
    let before = state.chunks()[&ChunkId(0)].clone();

    state.begin_update().expect("begin");
    let mut patched = vec![0u8; 4096];
    patched[100..108].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF]);
    state.write_chunk(ChunkId(0), patched.clone()).expect("write");
    state.commit_update().expect("commit");

    let mut committed = state.chunks()[&ChunkId(0)].clone();
    assert_eq!(
        &committed.raw_bytes().expect("raw")[100..108],
        &[0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF]
    );
    let checks = state.validate();
    assert!(checks.iter().all(|c| c.ok));

    let mut before_mut = before;
    let before_raw = before_mut.raw_bytes().expect("raw").to_vec();
    let diff = hmr_state::diff_chunk(ChunkId(0), &before_raw, &patched);
    assert_eq!(diff.blocks.len(), 1);
    assert_eq!(diff.blocks[0].offset, 64);

    let _ = checkpoint;
}

#[test]
fn hot_swap_same_abi_retires_old_handle_after_promotion() {
    let registry = Registry::new(RetentionPolicy::KeepAll);
    let scheduler = FrameScheduler::new(1_000_000);
    let recovery = RecoveryOrchestrator::new(3, 60);
    let identity = ModuleIdentity::from_name("M1");
    bring_to_initializing(&registry, identity, Vec::new());
    registry
        .install_first_handle(identity, loaded_handle(identity, 1, [0u8; 32], CapabilitySet::NONE))
        .expect("install");
    registry
        .propose_candidate(
            identity,
            loaded_handle(identity, 2, [0u8; 32], CapabilitySet::NONE),
            &[],
        )
        .expect("propose");

    let mut chunks = BTreeMap::new();
    chunks.insert(ChunkId(0), Chunk::new(vec![7u8; 64]));
    let mut state = ModuleState::new(identity, chunks);
    let mut cas = MemoryChunkCas::new();

    scheduler.begin_frame();
    attempt_swap(
        &registry,
        &scheduler,
        &recovery,
        identity,
        SwapRequest {
            module: identity,
            estimated_cost_ns: 1_000,
        },
        ResourceProjection {
            exceeds_budget: false,
        },
        VersionNumber(1),
        &mut state,
        &mut cas,
        |_| Ok(()),
        || true,
    )
    .expect("swap should succeed");

    assert_eq!(registry.state_of(identity), Some(LifecycleState::Active));
    let (active, _pin) = registry.lookup(identity).expect("lookup");
    assert_eq!(active.version(), VersionNumber(2));
    assert_eq!(state.chunks()[&ChunkId(0)].checksum(), hmr_cas::crc64(&[7u8; 64]));
    let previous = registry.previous_handle(identity).expect("history retains demoted handle");
    assert_eq!(previous.version(), VersionNumber(1));
}

#[test]
fn hot_swap_abi_incompatible_is_rejected() {
    let registry = Registry::new(RetentionPolicy::KeepAll);
    let identity = ModuleIdentity::from_name("M1");
    bring_to_initializing(&registry, identity, Vec::new());
    registry
        .install_first_handle(identity, loaded_handle(identity, 2, [1u8; 32], CapabilitySet::NONE))
        .expect("install at version 2");

    let candidate = loaded_handle(identity, 3, [2u8; 32], CapabilitySet::NONE);
    assert!(matches!(
        registry.propose_candidate(identity, candidate, &[]),
        Err(HmrError::AbiIncompatible(_))
    ));
    let (active, _pin) = registry.lookup(identity).expect("lookup");
    assert_eq!(active.version(), VersionNumber(2));
}

#[test]
fn post_swap_hook_failure_rolls_back_to_previous_version() {
    let registry = Registry::new(RetentionPolicy::KeepAll);
    let scheduler = FrameScheduler::new(1_000_000);
    let recovery = RecoveryOrchestrator::new(3, 60);
    let identity = ModuleIdentity::from_name("M1");
    bring_to_initializing(&registry, identity, Vec::new());
    registry
        .install_first_handle(identity, loaded_handle(identity, 2, [0u8; 32], CapabilitySet::NONE))
        .expect("install at version 2");
    registry
        .propose_candidate(
            identity,
            loaded_handle(identity, 4, [0u8; 32], CapabilitySet::NONE),
            &[],
        )
        .expect("propose");

    let mut chunks = BTreeMap::new();
    chunks.insert(ChunkId(0), Chunk::new(vec![3u8; 64]));
    let mut state = ModuleState::new(identity, chunks);
    let mut cas = MemoryChunkCas::new();
    let telemetry = hmr_telemetry::TelemetryRegistry::new(16, 8, 0.5, 1_000_000);

    scheduler.begin_frame();
    let result = attempt_swap(
        &registry,
        &scheduler,
        &recovery,
        identity,
        SwapRequest {
            module: identity,
            estimated_cost_ns: 1_000,
        },
        ResourceProjection {
            exceeds_budget: false,
        },
        VersionNumber(2),
        &mut state,
        &mut cas,
        |_| Ok(()),
        || false,
    );
    assert!(matches!(result, Err(HmrError::PostSwapHookFailed(_))));

    let mut sample = hmr_telemetry::FrameMetrics::default();
    sample.swap_failure_count = 1;
    telemetry.record(identity, sample);

    let (active, _pin) = registry.lookup(identity).expect("lookup after rollback");
    assert_eq!(active.version(), VersionNumber(2));
    assert_eq!(
        telemetry.latest(identity).expect("sample").swap_failure_count,
        1
    );
}

#[test]
fn capability_violation_quarantines_after_threshold() {
    let registry = Registry::new(RetentionPolicy::KeepAll);
    let recovery = RecoveryOrchestrator::new(3, 60);
    let identity = ModuleIdentity::from_name("M2");
    bring_to_initializing(&registry, identity, Vec::new());
    registry
        .install_first_handle(
            identity,
            loaded_handle(identity, 1, [0u8; 32], CapabilitySet::from_iter([Capability::ReadState])),
        )
        .expect("install");

    let mut chunks = BTreeMap::new();
    chunks.insert(ChunkId(0), Chunk::new(vec![0u8; 64]));
    let mut state = ModuleState::new(identity, chunks);
    let guard = CapabilityGuard::new(identity, CapabilitySet::from_iter([Capability::ReadState]));
    let arena = ModuleArena::new(identity, 4096, GlobalArenaPool::new());
    let tracker = ViolationTracker::new(identity, 3);

    for _ in 0..3 {
        let mut accessor = StateAccessor::new(&mut state, &guard, &arena);
        let attempt = accessor.write(ChunkId(0), 0, &[1u8; 4]);
        assert!(matches!(attempt, Err(HmrError::CapabilityMissing(_))));
        recovery
            .handle_capability_violation(&registry, &tracker, identity)
            .expect("recording a violation does not itself error");
    }

    assert!(tracker.is_tripped());
    assert_eq!(tracker.count(), 3);
    assert_eq!(registry.state_of(identity), Some(LifecycleState::Error));
    assert!(matches!(
        registry.lookup(identity),
        Err(HmrError::ModuleQuarantined(_))
    ));
}
