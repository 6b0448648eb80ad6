//! Unified-diff analysis.
//!
//! Maps diff-relative positions to absolute line numbers in the working-copy
//! version of a file, producing the set of lines that were added or changed.

use std::collections::BTreeSet;

/// Line numbers touched in the new (working-copy) version of a file.
pub type ChangedLineSet = BTreeSet<usize>;

/// Collect every new-version line number that a unified diff marks as added
/// or changed.
///
/// Walks the diff with a running cursor: a hunk header resets the cursor to
/// the hunk's new-side start, a `+` line records the cursor and advances it,
/// a `-` line does not advance (it has no position in the new version), and
/// context lines advance without recording. The `+++` file header is not a
/// change line.
pub fn changed_lines(diff: &str) -> ChangedLineSet {
   let mut changed = ChangedLineSet::new();
   let mut cursor = 0usize;

   for line in diff.lines() {
      if line.starts_with("@@") {
         if let Some(new_start) = parse_hunk_new_start(line) {
            cursor = new_start;
         }
      } else if line.starts_with('+') && !line.starts_with("+++") {
         changed.insert(cursor);
         cursor += 1;
      } else if !line.starts_with('-') {
         cursor += 1;
      }
   }

   changed
}

/// Parse the new-side start line out of a hunk header.
/// Format: `@@ -old_start,old_count +new_start,new_count @@` (counts may be
/// omitted for single-line hunks).
fn parse_hunk_new_start(header: &str) -> Option<usize> {
   let new_part = header.split_whitespace().find(|part| part.starts_with('+'))?;
   new_part
      .trim_start_matches('+')
      .split(',')
      .next()?
      .parse()
      .ok()
}
