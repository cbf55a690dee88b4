//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.
//!
//! ## Push
//!
//! ```text
//! dawn.jpg
//!     original: store/original/dawn.jpg
//!     thumbnail: store/thumbnail/dawn.jpg
//! ```
//!
//! ## List
//!
//! ```text
//! original (2 files)
//!     store/original/dawn.jpg
//!     store/original/dusk.jpg
//! thumbnail (0 files)
//! ```
//!
//! ## Profiles
//!
//! ```text
//! original → store/original/
//!     Identity
//! thumbnail → store/thumbnail/
//!     Crop (1.00) → Shrink (256x256)
//! ```

use crate::store::{Profile, ProfileFailure};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const INDENT: &str = "    ";

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Lines describing where one pushed file was written, plus any failures.
pub fn format_push(
    filename: &str,
    written: &BTreeMap<String, PathBuf>,
    failures: &[ProfileFailure],
) -> Vec<String> {
    let mut lines = vec![filename.to_string()];
    for (profile, path) in written {
        lines.push(format!("{INDENT}{profile}: {}", path.display()));
    }
    for failure in failures {
        lines.push(format!(
            "{INDENT}{}: FAILED ({})",
            failure.profile, failure.error
        ));
    }
    lines
}

pub fn print_push(
    filename: &str,
    written: &BTreeMap<String, PathBuf>,
    failures: &[ProfileFailure],
) {
    for line in format_push(filename, written, failures) {
        println!("{line}");
    }
}

/// Lines listing stored files per profile.
pub fn format_listing(listing: &BTreeMap<String, BTreeSet<PathBuf>>) -> Vec<String> {
    let mut lines = Vec::new();
    for (profile, files) in listing {
        lines.push(format!("{profile} ({})", plural(files.len(), "file")));
        for file in files {
            lines.push(format!("{INDENT}{}", file.display()));
        }
    }
    lines
}

pub fn print_listing(listing: &BTreeMap<String, BTreeSet<PathBuf>>) {
    for line in format_listing(listing) {
        println!("{line}");
    }
}

/// Lines showing each profile's directory and filter chain, in processing order.
pub fn format_profiles(root: &Path, profiles: &[Profile]) -> Vec<String> {
    let mut lines = Vec::new();
    for profile in profiles {
        lines.push(format!(
            "{} → {}/",
            profile.name,
            root.join(&profile.name).display()
        ));
        lines.push(format!("{INDENT}{}", profile.chain));
    }
    lines
}

pub fn print_profiles(root: &Path, profiles: &[Profile]) {
    for line in format_profiles(root, profiles) {
        println!("{line}");
    }
}
