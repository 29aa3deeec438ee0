//! Writing generated files and diffing them against what is on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::{ChangeTag, TextDiff};
use tracing::debug;

use crate::emit::GeneratedFile;
use crate::error::{GenerateError, Result};

/// One generated file compared with the current file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the output directory.
    pub rel_path: PathBuf,
    /// New content to write
    pub new_content: String,
    /// Existing content (None if file doesn't exist)
    pub existing_content: Option<String>,
}

impl FileChange {
    /// The file does not exist yet.
    pub fn is_new(&self) -> bool {
        self.existing_content.is_none()
    }

    /// The file exists with different content.
    pub fn is_modified(&self) -> bool {
        match &self.existing_content {
            Some(existing) => existing != &self.new_content,
            None => false,
        }
    }

    /// Writing the file would change the disk.
    pub fn is_stale(&self) -> bool {
        self.is_new() || self.is_modified()
    }

    /// Unified diff from the current file to the new content, `None` when
    /// nothing changes. A missing file diffs against empty text.
    pub fn diff(&self) -> Option<String> {
        if !self.is_stale() {
            return None;
        }
        let existing = self.existing_content.as_deref().unwrap_or_default();
        let diff = TextDiff::from_lines(existing, &self.new_content);
        let path = self.rel_path.display();

        let mut output = String::new();
        if self.is_new() {
            output.push_str(&format!("--- {path} (missing)\n"));
        } else {
            output.push_str(&format!("--- {path} (current)\n"));
        }
        output.push_str(&format!("+++ {path} (generated)\n"));

        for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
            if idx > 0 {
                output.push_str("...\n");
            }
            for op in group {
                for change in diff.iter_changes(op) {
                    let sign = match change.tag() {
                        ChangeTag::Delete => "-",
                        ChangeTag::Insert => "+",
                        ChangeTag::Equal => " ",
                    };
                    output.push_str(sign);
                    output.push_str(change.value());
                    if change.missing_newline() {
                        output.push('\n');
                    }
                }
            }
        }

        Some(output)
    }
}

/// Compare generated files with the contents of `output_dir`.
pub fn plan(output_dir: &Path, files: &[GeneratedFile]) -> Result<Vec<FileChange>> {
    files
        .iter()
        .map(|file| {
            let full_path = output_dir.join(&file.path);
            let existing_content = match fs::read_to_string(&full_path) {
                Ok(contents) => Some(contents),
                Err(err) if err.kind() == ErrorKind::NotFound => None,
                Err(err) => return Err(GenerateError::io(full_path, err)),
            };
            Ok(FileChange {
                rel_path: file.path.clone(),
                new_content: file.contents.clone(),
                existing_content,
            })
        })
        .collect()
}

/// What [`write`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Files created or overwritten.
    pub written: Vec<PathBuf>,
    /// Files already up to date.
    pub unchanged: Vec<PathBuf>,
}

/// Write stale files, leaving up-to-date ones untouched.
pub fn write(output_dir: &Path, changes: &[FileChange]) -> Result<WriteSummary> {
    fs::create_dir_all(output_dir).map_err(|err| GenerateError::io(output_dir, err))?;

    let mut summary = WriteSummary::default();
    for change in changes {
        if !change.is_stale() {
            debug!(path = %change.rel_path.display(), "File is up to date.");
            summary.unchanged.push(change.rel_path.clone());
            continue;
        }
        let full_path = output_dir.join(&change.rel_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|err| GenerateError::io(parent, err))?;
        }
        fs::write(&full_path, &change.new_content)
            .map_err(|err| GenerateError::io(&full_path, err))?;
        debug!(path = %full_path.display(), bytes = change.new_content.len(), "Wrote generated file.");
        summary.written.push(change.rel_path.clone());
    }
    Ok(summary)
}
