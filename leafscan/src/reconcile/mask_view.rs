//! Scoped access to persisted masks during review.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::scoped_ref::ScopeRef;
use image::GrayImage;

use crate::error::{Error, Result};

/// Counts mask views that are currently open.
#[derive(Debug, Clone, Default)]
pub struct ViewTracker {
    open: Arc<AtomicUsize>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_views(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// A mask loaded for display. Released when dropped.
pub struct MaskView {
    path: PathBuf,
    image: GrayImage,
    _release: ScopeRef<Box<dyn FnOnce()>>,
}

impl MaskView {
    pub fn open(path: &Path, tracker: &ViewTracker) -> Result<Self> {
        let image = image::open(path)
            .map_err(|source| Error::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_luma8();

        tracker.open.fetch_add(1, Ordering::SeqCst);
        let open = Arc::clone(&tracker.open);
        let released = path.to_path_buf();
        let release: Box<dyn FnOnce()> = Box::new(move || {
            open.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!(path = %released.display(), "Mask view released");
        });

        Ok(Self {
            path: path.to_path_buf(),
            image,
            _release: ScopeRef::new(release),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Pixels drawn as particles (dark in the saved, inverted mask).
    pub fn particle_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] < 128).count()
    }
}

impl fmt::Debug for MaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskView")
            .field("path", &self.path)
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .finish()
    }
}
