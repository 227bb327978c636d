//! Path normalisation and allow-list containment.
//!
//! Every requested path is normalised lexically (joined to the working
//! directory, `.` and `..` resolved without touching the filesystem) and then
//! checked against the [`AllowedBaseSet`]. Containment is decided on path
//! components, so a base of `/data` admits `/data/a.pdf` but not
//! `/data2/a.pdf`.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Fixed container mount points always present in the allow-list.
pub const DEFAULT_MOUNT_POINTS: &[&str] = &["/app/data", "/app/input"];

/// Read-only set of directories a requested path must fall under.
#[derive(Debug, Clone, Default)]
pub struct AllowedBaseSet {
    /// Lexically normalised entries, used for the pre-existence check.
    bases: Vec<PathBuf>,
    /// Symlink-resolved form of each entry (or the lexical form when the
    /// directory does not exist), used once the target is known to exist.
    resolved: Vec<PathBuf>,
}

impl AllowedBaseSet {
    /// Build a set from arbitrary entries.
    ///
    /// Relative entries are resolved against `cwd`; trailing separators are
    /// stripped; duplicates are dropped.
    pub fn new<I, P>(entries: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut set = Self::default();
        for entry in entries {
            set.insert(entry.as_ref(), cwd);
        }
        set
    }

    /// The standard allow-list: `cwd`, the fixed mount points, and the
    /// optional extra entry (usually `ALLOWED_BASE_PATH`).
    pub fn standard(cwd: &Path, extra: Option<&str>) -> Self {
        let mut set = Self::default();
        set.insert(cwd, cwd);
        for mount in DEFAULT_MOUNT_POINTS {
            set.insert(Path::new(mount), cwd);
        }
        if let Some(extra) = extra.map(strip_trailing_separators) {
            if !extra.is_empty() {
                set.insert(Path::new(extra), cwd);
            }
        }
        set
    }

    fn insert(&mut self, entry: &Path, cwd: &Path) {
        let base = normalize(entry, cwd);
        if self.bases.contains(&base) {
            return;
        }
        let resolved = std::fs::canonicalize(&base).unwrap_or_else(|_| base.clone());
        debug!(
            "Allowed base: {} (resolved: {})",
            base.display(),
            resolved.display()
        );
        self.bases.push(base);
        self.resolved.push(resolved);
    }

    /// Entries in insertion order.
    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }

    /// Whether a lexically normalised path lies under at least one entry.
    pub fn permits(&self, normalized: &Path) -> bool {
        self.bases.iter().any(|base| is_within(normalized, base))
    }

    /// Whether a symlink-resolved path lies under at least one resolved entry.
    pub fn permits_resolved(&self, canonical: &Path) -> bool {
        self.resolved.iter().any(|base| is_within(canonical, base))
    }
}

/// Lexically normalise `path` to an absolute form.
///
/// Relative paths are joined to `cwd`. `..` at the root stays at the root.
pub fn normalize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Component-wise containment: `path` equals `base` or is nested below it.
pub fn is_within(path: &Path, base: &Path) -> bool {
    let mut path_components = path.components();
    base.components()
        .all(|b| path_components.next().is_some_and(|p| p == b))
}

fn strip_trailing_separators(s: &str) -> &str {
    let trimmed = s.trim_end_matches(std::path::is_separator);
    if trimmed.is_empty() && !s.is_empty() {
        // "/" alone: keep the root
        &s[..1]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_relative_and_dots() {
        let cwd = Path::new("/srv/app");
        assert_eq!(
            normalize(Path::new("./data/report.pdf"), cwd),
            PathBuf::from("/srv/app/data/report.pdf")
        );
        assert_eq!(
            normalize(Path::new("data/../../etc/passwd"), cwd),
            PathBuf::from("/srv/etc/passwd")
        );
        assert_eq!(
            normalize(Path::new("/../../etc"), cwd),
            PathBuf::from("/etc")
        );
        assert_eq!(normalize(Path::new(""), cwd), PathBuf::from("/srv/app"));
    }

    #[test]
    fn containment_is_segment_wise() {
        let base = Path::new("/data");
        assert!(is_within(Path::new("/data"), base));
        assert!(is_within(Path::new("/data/a.pdf"), base));
        assert!(is_within(Path::new("/data/sub/a.pdf"), base));
        assert!(!is_within(Path::new("/data2/a.pdf"), base));
        assert!(!is_within(Path::new("/dat"), base));
        assert!(!is_within(Path::new("/"), base));
    }

    #[test]
    fn standard_set_contains_cwd_and_mounts() {
        let set = AllowedBaseSet::standard(Path::new("/srv/app"), None);
        assert!(set.permits(Path::new("/srv/app/data/report.pdf")));
        assert!(set.permits(Path::new("/app/data/x.pdf")));
        assert!(set.permits(Path::new("/app/input/x.pdf")));
        assert!(!set.permits(Path::new("/etc/passwd")));
        assert!(!set.permits(Path::new("/srv/application/x.pdf")));
    }

    #[test]
    fn extra_entry_has_trailing_separator_stripped() {
        let set = AllowedBaseSet::standard(Path::new("/srv/app"), Some("/tmp/x///"));
        assert!(set.bases().contains(&PathBuf::from("/tmp/x")));
        assert!(set.permits(Path::new("/tmp/x/doc.pdf")));
        assert!(!set.permits(Path::new("/tmp/xy/doc.pdf")));
    }

    #[test]
    fn empty_extra_entry_is_ignored() {
        let without = AllowedBaseSet::standard(Path::new("/srv/app"), None);
        let with_empty = AllowedBaseSet::standard(Path::new("/srv/app"), Some(""));
        assert_eq!(without.bases(), with_empty.bases());
    }

    #[test]
    fn duplicates_are_dropped() {
        let set = AllowedBaseSet::new(["/a", "/a/", "/a/./"], Path::new("/"));
        assert_eq!(set.bases().len(), 1);
    }

    #[test]
    fn strip_keeps_root() {
        assert_eq!(strip_trailing_separators("/"), "/");
        assert_eq!(strip_trailing_separators("/a/b/"), "/a/b");
        assert_eq!(strip_trailing_separators(""), "");
    }
}
