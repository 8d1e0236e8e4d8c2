//! Device provider kinds and their mixing rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage technology backing a storage pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Diskless,
    Lvm,
    LvmThin,
    Zfs,
    ZfsThin,
    File,
    FileThin,
    Spdk,
}

impl ProviderKind {
    pub fn is_diskless(self) -> bool {
        matches!(self, ProviderKind::Diskless)
    }

    /// Thick and thin variants of the same technology share a family.
    fn family(self) -> &'static str {
        match self {
            ProviderKind::Diskless => "diskless",
            ProviderKind::Lvm | ProviderKind::LvmThin => "lvm",
            ProviderKind::Zfs | ProviderKind::ZfsThin => "zfs",
            ProviderKind::File | ProviderKind::FileThin => "file",
            ProviderKind::Spdk => "spdk",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Diskless => "diskless",
            ProviderKind::Lvm => "lvm",
            ProviderKind::LvmThin => "lvm_thin",
            ProviderKind::Zfs => "zfs",
            ProviderKind::ZfsThin => "zfs_thin",
            ProviderKind::File => "file",
            ProviderKind::FileThin => "file_thin",
            ProviderKind::Spdk => "spdk",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairwise predicate deciding whether two provider kinds may coexist
/// within one resource's replica set.
pub trait MixingPolicy {
    fn is_mixing_allowed(&self, a: ProviderKind, b: ProviderKind) -> bool;
}

impl<F> MixingPolicy for F
where
    F: Fn(ProviderKind, ProviderKind) -> bool,
{
    fn is_mixing_allowed(&self, a: ProviderKind, b: ProviderKind) -> bool {
        self(a, b)
    }
}

/// Default table: diskless mixes with everything, otherwise both kinds
/// must belong to the same family (e.g. `lvm` with `lvm_thin`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMixingPolicy;

impl MixingPolicy for DefaultMixingPolicy {
    fn is_mixing_allowed(&self, a: ProviderKind, b: ProviderKind) -> bool {
        a.is_diskless() || b.is_diskless() || a.family() == b.family()
    }
}
