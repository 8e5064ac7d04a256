//! Identity uniqueness within one scan.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use vidg_core::{FileId, InodeInfo};

/// Why a path could not claim an identity. Holds the path that got it first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clash {
    /// Another path to the same file (a hardlink).
    SameFile(PathBuf),
    /// A different file on another device with the same inode number.
    OtherDevice(PathBuf),
}

/// Remembers the first path that claimed each [`FileId`].
///
/// Identities are inode numbers, which repeat across hardlinks and across
/// devices. Only the first claim wins, so no two scanned files ever share
/// an identity in the catalog.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    claimed: HashMap<FileId, (InodeInfo, PathBuf)>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for the file at `path`.
    pub fn claim(&mut self, id: FileId, inode: InodeInfo, path: &Path) -> Result<(), Clash> {
        match self.claimed.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert((inode, path.to_path_buf()));
                Ok(())
            }
            Entry::Occupied(existing) => {
                let (first_inode, first_path) = existing.get();
                if *first_inode == inode {
                    Err(Clash::SameFile(first_path.clone()))
                } else {
                    Err(Clash::OtherDevice(first_path.clone()))
                }
            }
        }
    }

    /// Number of distinct identities claimed.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
