use std::path::{Path, PathBuf};

/// Normalize a path string based on the current operating system
///
/// - On Windows: Keeps backslashes
/// - On other platforms: Converts backslashes to forward slashes
///
/// Patches are often written on one platform and loaded on another, so
/// `sample=drums\kick.wav` must still find `drums/kick.wav` on Linux.
///
/// # Example
///
/// ```
/// use jmage_sfz::parser::normalize_path;
///
/// let normalized = normalize_path("samples\\piano\\C4.wav");
///
/// #[cfg(windows)]
/// assert_eq!(normalized, "samples\\piano\\C4.wav");
///
/// #[cfg(not(windows))]
/// assert_eq!(normalized, "samples/piano/C4.wav");
/// ```
pub fn normalize_path(path: &str) -> String {
    if cfg!(windows) {
        path.to_string()
    } else {
        path.replace('\\', "/")
    }
}

/// Resolve a sample path the way the sampler loads it
///
/// 1. Separators are normalized for the current OS
/// 2. Absolute sample paths are used as-is
/// 3. Relative sample paths are taken relative to the directory holding the
///    patch file, when it is known
///
/// # Example
///
/// ```
/// use jmage_sfz::parser::resolve_sample_path;
/// use std::path::{Path, PathBuf};
///
/// let patch = Path::new("/music/kits/drums.jmz");
/// let resolved = resolve_sample_path("kick.wav", Some(patch));
/// assert_eq!(resolved, PathBuf::from("/music/kits/kick.wav"));
/// ```
pub fn resolve_sample_path(sample: &str, patch_file: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(normalize_path(sample));
    if path.is_absolute() {
        return path;
    }

    match patch_file.and_then(Path::parent) {
        Some(dir) => dir.join(path),
        None => path,
    }
}
