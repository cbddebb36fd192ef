//! Request-scoped working storage
//!
//! Every pipeline run gets its own directory under the configured work root:
//!
//! ```text
//! <work_root>/vcd-<request_id>-XXXXXX/
//!     downloads/     acquired waveform
//!     separation/    isolation output tree
//! ```
//!
//! The directory is removed by [`RequestWorkspace::cleanup`] on normal
//! completion and by `Drop` on any other exit (early return, panic unwind,
//! cancelled future), so concurrent requests never share or delete each
//! other's files.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

const DOWNLOADS_DIR: &str = "downloads";
const SEPARATION_DIR: &str = "separation";

#[derive(Debug)]
pub struct RequestWorkspace {
    dir: TempDir,
    downloads: PathBuf,
    separation: PathBuf,
}

impl RequestWorkspace {
    /// Create a fresh workspace for `request_id` under `work_root`
    pub fn create(work_root: &Path, request_id: Uuid) -> std::io::Result<Self> {
        std::fs::create_dir_all(work_root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("vcd-{}-", request_id))
            .tempdir_in(work_root)?;

        let downloads = dir.path().join(DOWNLOADS_DIR);
        let separation = dir.path().join(SEPARATION_DIR);
        std::fs::create_dir(&downloads)?;
        std::fs::create_dir(&separation)?;

        debug!(request_id = %request_id, path = %dir.path().display(), "Workspace created");

        Ok(Self {
            dir,
            downloads,
            separation,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Root for acquired audio
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads
    }

    /// Root for isolation output
    pub fn separation_dir(&self) -> &Path {
        &self.separation
    }

    /// Remove the workspace, logging (not propagating) any failure
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "Workspace removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove workspace"),
        }
    }
}
