//! Target filenames and per-media saving

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Harvester;
use crate::error::Result;
use crate::types::{DownloadTarget, Event, MediaKind, ResourceId, SavedMedia};
use crate::utils::{VIDEO_EXTENSION, image_file_extension};

impl Harvester {
    /// Make sure one medium of a resource is on disk
    ///
    /// An existing file at the target path counts as saved and no request is
    /// made. Images go through the buffered download path.
    pub(super) async fn save_media(
        &self,
        id: ResourceId,
        name: &str,
        kind: MediaKind,
        url: &str,
    ) -> Result<SavedMedia> {
        let ext = match kind {
            MediaKind::Video => VIDEO_EXTENSION,
            MediaKind::Image => image_file_extension(url),
        };
        let path = self.target_path(id, name, ext).await;

        if let Ok(meta) = tokio::fs::metadata(&path).await
            && meta.is_file()
        {
            self.observer.on_progress(&Event::AlreadyExists {
                id,
                kind,
                path: path.clone(),
                bytes: meta.len(),
            });
            return Ok(SavedMedia {
                kind,
                path,
                source_url: url.to_string(),
                bytes: meta.len(),
                reused_existing: true,
            });
        }

        let target = DownloadTarget::new(url, &path);
        let bytes = self
            .fetcher
            .fetch(&target, kind == MediaKind::Image)
            .await?;

        Ok(SavedMedia {
            kind,
            path,
            source_url: url.to_string(),
            bytes,
            reused_existing: false,
        })
    }

    /// `<id>_<name><ext>` if the filesystem accepts it, otherwise `<id><ext>`
    async fn target_path(&self, id: ResourceId, name: &str, ext: &str) -> PathBuf {
        let preferred = self.config.output_dir.join(format!("{id}_{name}{ext}"));
        if name_is_writable(&preferred).await {
            return preferred;
        }

        let fallback = self.config.output_dir.join(format!("{id}{ext}"));
        self.observer.on_progress(&Event::FilenameSimplified {
            id,
            path: fallback.clone(),
        });
        fallback
    }
}

/// Create and remove `<path>.tmp` to see whether `path` is a usable name
async fn name_is_writable(path: &Path) -> bool {
    let mut scratch = OsString::from(path.as_os_str());
    scratch.push(".tmp");
    let scratch = PathBuf::from(scratch);

    match tokio::fs::File::create(&scratch).await {
        Ok(file) => {
            drop(file);
            if let Err(e) = tokio::fs::remove_file(&scratch).await {
                debug!(path = %scratch.display(), error = %e, "Could not remove scratch file");
            }
            true
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Filename rejected");
            false
        }
    }
}
