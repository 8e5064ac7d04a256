//! Moving files to the desktop trash.

use std::path::PathBuf;

use tracing::info;

use crate::error::StoreError;

/// Somewhere files can be moved to reversibly.
pub trait TrashBin {
    fn discard(&self, paths: &[PathBuf]) -> Result<(), StoreError>;
}

/// The platform trash / recycle bin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl TrashBin for SystemTrash {
    fn discard(&self, paths: &[PathBuf]) -> Result<(), StoreError> {
        if paths.is_empty() {
            return Ok(());
        }
        trash::delete_all(paths)?;
        info!(count = paths.len(), "Moved files to trash");
        Ok(())
    }
}
