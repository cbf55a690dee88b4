//! The image store: named profiles, each with its own filter chain.
//!
//! A store owns a root directory and an ordered list of profiles. Pushing an
//! image decodes it once, corrects its EXIF orientation once, then runs every
//! profile's chain on its own copy and writes the result to
//! `<root>/<profile>/<filename>`:
//!
//! ```text
//! store/
//! ├── original/
//! │   └── dawn.jpg        # Identity
//! ├── full/
//! │   └── dawn.jpg        # Shrink (2000x2000)
//! └── thumbnail/
//!     └── dawn.jpg        # Crop (1.00) → Shrink (256x256)
//! ```
//!
//! ## Ordering
//!
//! Profiles run in registration order (re-registering a name replaces its
//! chain in place). Maps handed back to callers are `BTreeMap`s, so they
//! iterate by profile name.
//!
//! ## Parallel Processing
//!
//! Profiles are independent, so [`ImageStore::push`] applies them in parallel
//! with [rayon](https://docs.rs/rayon) on the global pool.
//!
//! ## Failure Policy
//!
//! A source that cannot be decoded fails the push before anything is written.
//! After that every profile is attempted; if some fail, the push returns
//! [`StoreError::PartialPush`] listing what was written and what failed.
//! Nothing is retried and nothing already written is rolled back.
//!
//! Directories are not created implicitly; call [`ImageStore::prepare`] first.

use crate::filter::{Filter, FilterError};
use crate::imaging::{BackendError, ImageBackend, Orientation, RustBackend, Source};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("store has no profiles configured")]
    NoProfiles,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("filter failed: {0}")]
    Filter(#[from] FilterError),
    #[error("{} of {} profiles failed", failures.len(), failures.len() + written.len())]
    PartialPush {
        written: BTreeMap<String, PathBuf>,
        failures: Vec<ProfileFailure>,
    },
}

/// Why a single profile could not be stored during a push.
#[derive(Debug)]
pub struct ProfileFailure {
    pub profile: String,
    pub error: StoreError,
}

/// A named storage variant: a directory under the root plus a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub chain: Filter,
}

/// Check that `name` is usable as a single path component.
pub(crate) fn validate_component(kind: &str, name: &str) -> Result<(), StoreError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name => Ok(()),
        _ => Err(StoreError::InvalidArgument(format!(
            "{kind} must be a plain file name, got {name:?}"
        ))),
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Image store rooted at a directory.
#[derive(Debug)]
pub struct ImageStore<B: ImageBackend = RustBackend> {
    root: PathBuf,
    backend: B,
    profiles: Vec<Profile>,
}

impl ImageStore<RustBackend> {
    /// Store using the default [`RustBackend`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_backend(root, RustBackend::new())
    }
}

impl<B: ImageBackend> ImageStore<B> {
    pub fn with_backend(root: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            root: root.into(),
            backend,
            profiles: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registered profiles in processing order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Directory a profile stores its files in.
    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Register `chain` under `name`, replacing any chain already registered there.
    pub fn add_profile(&mut self, name: impl Into<String>, chain: Filter) -> Result<(), StoreError> {
        let name = name.into();
        validate_component("profile name", &name)?;
        debug!(profile = %name, chain = %chain, "profile registered");

        match self.profiles.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.chain = chain,
            None => self.profiles.push(Profile { name, chain }),
        }
        Ok(())
    }

    /// Register a profile that stores images untransformed.
    pub fn add_plain_profile(&mut self, name: impl Into<String>) -> Result<(), StoreError> {
        self.add_profile(name, Filter::identity())
    }

    /// Create the root and every profile directory.
    pub fn prepare(&self) -> Result<(), StoreError> {
        for profile in &self.profiles {
            std::fs::create_dir_all(self.profile_dir(&profile.name))?;
        }
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Store `source` under `filename` in every profile.
    ///
    /// Returns the written path per profile. See the [module docs](self) for
    /// the failure policy.
    pub fn push(
        &self,
        source: Source<'_>,
        filename: &str,
    ) -> Result<BTreeMap<String, PathBuf>, StoreError> {
        validate_component("filename", filename)?;
        if self.profiles.is_empty() {
            return Err(StoreError::NoProfiles);
        }

        let decoded = self.backend.decode(&source)?;
        debug!(
            format = ?decoded.format,
            width = decoded.image.width(),
            height = decoded.image.height(),
            filename,
            "decoded source"
        );
        if decoded.orientation != Orientation::Normal {
            debug!(orientation = ?decoded.orientation, "correcting orientation");
        }
        let image = decoded.into_oriented();

        let results: Vec<(String, Result<PathBuf, StoreError>)> = self
            .profiles
            .par_iter()
            .map(|profile| {
                let path = self.profile_dir(&profile.name).join(filename);
                let result = profile
                    .chain
                    .apply(image.clone())
                    .map_err(StoreError::from)
                    .and_then(|out| {
                        self.backend.save(&out, &path)?;
                        info!(
                            profile = %profile.name,
                            path = %path.display(),
                            width = out.width(),
                            height = out.height(),
                            "stored"
                        );
                        Ok(path)
                    });
                (profile.name.clone(), result)
            })
            .collect();

        let mut written = BTreeMap::new();
        let mut failures = Vec::new();
        for (profile, result) in results {
            match result {
                Ok(path) => {
                    written.insert(profile, path);
                }
                Err(error) => {
                    warn!(profile = %profile, %error, "profile failed");
                    failures.push(ProfileFailure { profile, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(written)
        } else {
            Err(StoreError::PartialPush { written, failures })
        }
    }

    /// Files currently stored, per profile.
    ///
    /// Lists regular, non-hidden files directly inside each profile directory.
    /// A profile whose directory does not exist yet has an empty set.
    pub fn list_files(&self) -> Result<BTreeMap<String, BTreeSet<PathBuf>>, StoreError> {
        let mut listing = BTreeMap::new();
        for profile in &self.profiles {
            let dir = self.profile_dir(&profile.name);
            let mut files = BTreeSet::new();
            if dir.is_dir() {
                for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
                    let entry = entry.map_err(|e| {
                        StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                            std::io::Error::other(format!("failed to walk {}", dir.display()))
                        }))
                    })?;
                    if entry.file_type().is_file() && !is_hidden(entry.path()) {
                        files.insert(entry.into_path());
                    }
                }
            }
            listing.insert(profile.name.clone(), files);
        }
        Ok(listing)
    }
}
