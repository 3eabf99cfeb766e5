// SPDX-License-Identifier: Apache-2.0
//! The module version descriptor (spec §3, wire layout in spec §6).

use crate::capability::CapabilitySet;
use crate::ident::{AbiSignature, ContentHash, ModuleIdentity, VersionNumber};

/// Identifies this runtime's descriptor format; guards against loading
/// artifacts built against an incompatible HMR runtime.
pub const DESCRIPTOR_MAGIC: u32 = 0x484d_5231; // "HMR1"

/// Current descriptor schema version understood by this crate.
pub const DESCRIPTOR_VERSION: u16 = 1;

/// Declared resource limits for a module version.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ResourceLimits {
    /// Peak arena bytes the module may hold live at once.
    pub memory_limit: u64,
    /// Peak number of worker threads the module may occupy concurrently.
    pub thread_limit: u32,
    /// Fixed-point percent (basis points of 100, e.g. `5000` = 50.00%) of a
    /// frame's CPU share the module may consume.
    pub cpu_share: u16,
}

impl ResourceLimits {
    /// Constructs limits, clamping `cpu_share` to the valid `0..=10000` range.
    #[must_use]
    pub fn new(memory_limit: u64, thread_limit: u32, cpu_share: u16) -> Self {
        Self {
            memory_limit,
            thread_limit,
            cpu_share: cpu_share.min(10_000),
        }
    }
}

/// An ordered record describing a module version, as handed to the core by
/// the external artifact watcher (spec §6).
///
/// Field order matches the wire table in spec §6 exactly so that a
/// byte-for-byte codec (owned by external tooling, not this crate) can be
/// written against this struct without reordering.
#[derive(Clone, Debug)]
pub struct VersionDescriptor {
    /// Runtime identifier magic; must equal [`DESCRIPTOR_MAGIC`].
    pub magic: u32,
    /// Descriptor schema version; must be understood by this crate.
    pub descriptor_version: u16,
    /// The module this descriptor belongs to.
    pub module_identity: ModuleIdentity,
    /// Monotonic version number within the module's history.
    pub version_number: VersionNumber,
    /// Hash of the artifact's code bytes.
    pub content_hash: ContentHash,
    /// Hash of the exported symbol types and state schema.
    pub abi_signature: AbiSignature,
    /// ABI signatures this version declares itself compatible with, beyond
    /// exact equality (see [`AbiSignature::is_compatible_with`]).
    pub compatible_with: Vec<AbiSignature>,
    /// Capabilities this version requests.
    pub capabilities: CapabilitySet,
    /// Declared resource ceilings.
    pub limits: ResourceLimits,
    /// Signature over all preceding fields, verified by the loader
    /// (spec §4.B); opaque to this crate.
    pub signature: [u8; 64],
}

impl VersionDescriptor {
    /// Returns `true` if the descriptor's `magic`/`descriptor_version` match
    /// what this crate understands.
    #[must_use]
    pub fn is_known_schema(&self) -> bool {
        self.magic == DESCRIPTOR_MAGIC && self.descriptor_version == DESCRIPTOR_VERSION
    }
}
