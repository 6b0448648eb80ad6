//! Change classification.
//!
//! Combines function extraction over the working-copy and committed versions
//! of a file with the diff's changed-line set, partitioning each current
//! function into new / modified / unchanged.

use std::{collections::HashSet, path::Path};

use crate::{
   diff::{ChangedLineSet, changed_lines},
   error::Result,
   extract::extract_functions,
   git::GitRepo,
   types::{ChangedFunction, FileChangeReport},
};

/// Partition the current version's functions against the committed version.
///
/// A function is new when its name has no committed counterpart, modified
/// when any line of its span intersects the changed-line set, and dropped
/// otherwise. Deterministic for identical inputs.
pub fn classify_functions(
   current_source: &str,
   committed_source: &str,
   changed: &ChangedLineSet,
) -> Result<(Vec<ChangedFunction>, Vec<ChangedFunction>)> {
   let current_functions = extract_functions(current_source)?;
   let committed_functions = extract_functions(committed_source)?;

   let committed_names: HashSet<&str> =
      committed_functions.iter().map(|f| f.name.as_str()).collect();

   let mut new_functions = Vec::new();
   let mut modified_functions = Vec::new();

   for func in current_functions {
      let span = func.start_line..func.start_line + func.line_count();
      if !committed_names.contains(func.name.as_str()) {
         new_functions.push(ChangedFunction { name: func.name, source_text: func.source_text });
      } else if changed.iter().any(|line| span.contains(line)) {
         modified_functions
            .push(ChangedFunction { name: func.name, source_text: func.source_text });
      }
   }

   Ok((new_functions, modified_functions))
}

/// Classify one file of the working tree.
///
/// Returns `None` when nothing in the file is new or modified. The committed
/// content is the empty string for untracked files, so every function in them
/// classifies as new.
pub fn classify_file(repo: &GitRepo, path: &str) -> Result<Option<FileChangeReport>> {
   let diff = repo.diff_head(path)?;
   let changed = changed_lines(&diff);

   let current_content = std::fs::read_to_string(Path::new(repo.dir()).join(path))?;
   let committed_content = repo.show_head(path)?;

   let (new_functions, modified_functions) =
      classify_functions(&current_content, &committed_content, &changed)?;

   if new_functions.is_empty() && modified_functions.is_empty() {
      return Ok(None);
   }

   Ok(Some(FileChangeReport {
      file_name: path.to_string(),
      new_functions,
      modified_functions,
      original_content: Some(current_content),
      error: None,
   }))
}

/// Scan every candidate file (modified + untracked) and accumulate one
/// report per file with at least one new or modified function.
///
/// Failure isolation: an error while processing one file becomes an
/// error-tagged report and the remaining files keep processing. Only the
/// initial candidate listing can fail the scan as a whole.
pub fn scan_changed_files(repo: &GitRepo) -> Result<Vec<FileChangeReport>> {
   let mut candidates = repo.modified_files()?;
   for path in repo.untracked_files()? {
      if !candidates.contains(&path) {
         candidates.push(path);
      }
   }

   let mut reports = Vec::new();
   for path in candidates {
      match classify_file(repo, &path) {
         Ok(Some(report)) => reports.push(report),
         Ok(None) => {},
         Err(e) => reports.push(FileChangeReport::failed(path, e.to_string())),
      }
   }

   Ok(reports)
}
