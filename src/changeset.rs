//! Ordered set of paths changed between two revisions.
use serde::Serialize;

/// Paths reported by a two-revision diff, in diff order.
///
/// Paths are kept exactly as the diff printed them; nothing is normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    paths: Vec<String>,
}

impl ChangeSet {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    /// Parse `git diff --name-only -z` output: raw paths separated by NUL.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD.
    pub fn from_name_only_z(output: &[u8]) -> Self {
        let paths = output
            .split(|&b| b == 0)
            .filter(|path| !path.is_empty())
            .map(|path| String::from_utf8_lossy(path).into_owned())
            .collect();
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_only_output_keeps_order_and_skips_empty_entries() {
        let changes = ChangeSet::from_name_only_z(b"src/main.rs\0\0Cargo.lock\0docs/a b.md\0");
        assert_eq!(
            changes.iter().collect::<Vec<_>>(),
            ["src/main.rs", "Cargo.lock", "docs/a b.md"]
        );
    }

    #[test]
    fn empty_output_is_empty_changeset() {
        assert!(ChangeSet::from_name_only_z(b"").is_empty());
    }

    #[test]
    fn nul_separated_output_keeps_paths_verbatim() {
        let output = "src/na\u{ef}ve/lib.rs\0resources/seccomp/\u{e9}.json\0docs/a\nb.md\0";
        let changes = ChangeSet::from_name_only_z(output.as_bytes());
        assert_eq!(
            changes.iter().collect::<Vec<_>>(),
            ["src/naïve/lib.rs", "resources/seccomp/é.json", "docs/a\nb.md"]
        );
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let changes = ChangeSet::from_name_only_z(b"src/\xffbad.rs\0");
        assert_eq!(changes.iter().collect::<Vec<_>>(), ["src/\u{fffd}bad.rs"]);
    }
}
