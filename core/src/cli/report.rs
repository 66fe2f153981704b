use crate::api::FileStatus;
use crate::record::{DirectoryIndex, RecordTree};
use crate::types::RecordKind;
use std::fmt;

/// Text report of a record tree and, optionally, the files added to it
pub struct TextReport<'a> {
    index: &'a DirectoryIndex,
    files: &'a [FileStatus],
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(index: &'a DirectoryIndex) -> Self {
        Self { index, files: &[] }
    }

    /// Appends the pass/fail state of each added file
    pub fn with_files(mut self, files: &'a [FileStatus]) -> Self {
        self.files = files;
        self
    }

    fn write_record(&self, f: &mut fmt::Formatter<'_>, id: usize, depth: usize) -> fmt::Result {
        let tree = &self.index.tree;
        if let Some(record) = tree.get(id) {
            write!(f, "{:indent$}{}", "", record.kind, indent = depth * 2)?;
            let key = record.display_key();
            if !key.is_empty() {
                write!(f, " {}", key)?;
            }
            if let Some(file_id) = &record.referenced_file_id {
                write!(f, " [{}]", file_id)?;
            }
            writeln!(f)?;
        }
        for &child in tree.children(id) {
            self.write_record(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DICOMDIR Records")?;
        writeln!(f, "================")?;
        writeln!(f)?;
        if let Some(id) = &self.index.fileset_id {
            writeln!(f, "File-set ID:    {}", id)?;
        }
        if let Some(descriptor) = &self.index.descriptor {
            writeln!(
                f,
                "Descriptor:     {} ({})",
                descriptor.file_id,
                descriptor.charset.as_deref().unwrap_or("default charset")
            )?;
        }

        let tree = &self.index.tree;
        if tree.is_empty() {
            writeln!(f, "(no records)")?;
        } else {
            for &root in tree.children(RecordTree::ROOT) {
                self.write_record(f, root, 0)?;
            }
        }
        writeln!(f)?;
        write!(f, "{}", TreeSummary::new(tree))?;

        if !self.files.is_empty() {
            let failed = self.files.iter().filter(|s| !s.passed()).count();
            writeln!(f)?;
            writeln!(f, "Files")?;
            writeln!(f, "-----")?;
            for status in self.files {
                match &status.error {
                    None => writeln!(f, "  ok      {}", status.file)?,
                    Some(reason) => writeln!(f, "  FAILED  {}: {}", status.file, reason)?,
                }
            }
            writeln!(
                f,
                "{} added, {} failed",
                self.files.len() - failed,
                failed
            )?;
        }

        Ok(())
    }
}

/// Number of records per kind
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct TreeSummary {
    pub counts: Vec<(RecordKind, usize)>,
    pub total: usize,
}

impl TreeSummary {
    /// Counts the records of `tree`; kinds without records are left out
    pub fn new(tree: &RecordTree) -> Self {
        let counts: Vec<(RecordKind, usize)> = RecordKind::ALL
            .iter()
            .map(|&kind| (kind, tree.count_kind(kind)))
            .filter(|&(_, count)| count > 0)
            .collect();
        Self {
            counts,
            total: tree.record_count(),
        }
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|&(_, count)| count)
            .unwrap_or(0)
    }
}

impl fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary")?;
        writeln!(f, "-------")?;
        for (kind, count) in &self.counts {
            writeln!(f, "{:<15} {}", format!("{}:", kind), count)?;
        }
        writeln!(f, "{:<15} {}", "Total:", self.total)
    }
}
