//! Line-level diffs between version contents
//!
//! Two presentations of the same comparison: a structured line list for
//! side-by-side UI rendering, and a unified-diff string with hunk headers
//! for plain-text display and export.

use similar::{ChangeTag, TextDiff};

use crate::model::PromptVersion;

/// How a single line differs between two contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    /// Present only in the newer content
    Added,
    /// Present only in the older content
    Removed,
    /// Present in both
    Unchanged,
}

/// One line of a structured diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// How this line differs
    pub kind: DiffLineKind,
    /// 1-based line number in the older content, if present there
    pub old_index: Option<usize>,
    /// 1-based line number in the newer content, if present there
    pub new_index: Option<usize>,
    /// Line text without its trailing newline
    pub text: String,
}

/// A structured comparison of two contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDiff {
    /// Label for the older side, typically a version string
    pub old_label: String,
    /// Label for the newer side
    pub new_label: String,
    /// All lines of both contents in diff order
    pub lines: Vec<DiffLine>,
    /// Count of added lines
    pub added: usize,
    /// Count of removed lines
    pub removed: usize,
}

impl VersionDiff {
    /// True if the two contents differ at all
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Compare two contents line by line
pub fn diff_contents(
    old_content: &str,
    new_content: &str,
    old_label: impl Into<String>,
    new_label: impl Into<String>,
) -> VersionDiff {
    let diff = TextDiff::from_lines(old_content, new_content);
    let mut lines = Vec::new();
    let mut added = 0;
    let mut removed = 0;

    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Insert => {
                added += 1;
                DiffLineKind::Added
            }
            ChangeTag::Delete => {
                removed += 1;
                DiffLineKind::Removed
            }
            ChangeTag::Equal => DiffLineKind::Unchanged,
        };
        lines.push(DiffLine {
            kind,
            old_index: change.old_index().map(|i| i + 1),
            new_index: change.new_index().map(|i| i + 1),
            text: change.value().trim_end_matches('\n').to_string(),
        });
    }

    VersionDiff {
        old_label: old_label.into(),
        new_label: new_label.into(),
        lines,
        added,
        removed,
    }
}

/// Render a unified diff with `@@` hunk headers and 3 lines of context
pub fn unified_diff(
    old_content: &str,
    new_content: &str,
    old_label: &str,
    new_label: &str,
) -> String {
    let diff = TextDiff::from_lines(old_content, new_content);
    let mut output = String::new();

    output.push_str(&format!("--- {old_label}\n"));
    output.push_str(&format!("+++ {new_label}\n"));

    for group in diff.grouped_ops(3) {
        let (old_start, old_count, new_start, new_count) = group.iter().fold(
            (usize::MAX, 0, usize::MAX, 0),
            |(old_start, old_count, new_start, new_count), op| {
                let old_range = op.old_range();
                let new_range = op.new_range();
                (
                    old_start.min(old_range.start),
                    old_count + old_range.len(),
                    new_start.min(new_range.start),
                    new_count + new_range.len(),
                )
            },
        );

        output.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start + 1,
            old_count,
            new_start + 1,
            new_count
        ));

        for op in group {
            for change in diff.iter_changes(&op) {
                let prefix = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                output.push_str(prefix);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}

/// The version snapshot immediately preceding `selected` in history
///
/// History order is newest first by creation time, with version numbers
/// breaking ties. Returns `None` for the oldest snapshot, which diffs
/// against empty content.
pub fn previous_version<'a>(
    versions: &'a [PromptVersion],
    selected: &PromptVersion,
) -> Option<&'a PromptVersion> {
    let mut ordered: Vec<&PromptVersion> = versions.iter().collect();
    ordered.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.version.cmp(&a.version))
    });
    let position = ordered.iter().position(|v| v.id == selected.id)?;
    ordered.get(position + 1).copied()
}

/// Sort snapshots newest first, the order version history is presented in
pub fn sort_newest_first(versions: &mut [PromptVersion]) {
    versions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.version.cmp(&a.version))
    });
}
