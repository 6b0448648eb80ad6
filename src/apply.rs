//! Test merge applier.
//!
//! Takes the generator's per-file instructions and turns them into
//! filesystem mutations: exclusive file creation, duplicate-aware appends,
//! and guarded directory creation. Every instruction yields a diagnostic
//! outcome; a failing instruction never stops the remaining ones.

use std::{
   fmt,
   fs::{self, OpenOptions},
   io::{ErrorKind, Write},
   path::{Component, Path, PathBuf},
};

use crate::{
   config::TestGenConfig,
   error::{Result, TestGenError},
   types::TestInstruction,
};

/// Per-instruction diagnostic emitted by the applier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
   Created { path: PathBuf },
   AlreadyExists { path: PathBuf },
   Appended { file: String, function: String },
   DuplicateSkipped { file: String, function: String },
   Updated { file: String, function: String },
   MissingFunction { file: String, function: String },
   FileNotFound { file: String },
   Failed { file: String, reason: String },
}

impl ApplyOutcome {
   /// Outcomes that indicate nothing was written for the instruction.
   pub const fn is_failure(&self) -> bool {
      matches!(self, Self::MissingFunction { .. } | Self::FileNotFound { .. } | Self::Failed { .. })
   }
}

impl fmt::Display for ApplyOutcome {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::Created { path } => {
            write!(f, "File '{}' created successfully.", path.display())
         },
         Self::AlreadyExists { path } => {
            write!(f, "File '{}' already exists. Skipping creation.", path.display())
         },
         Self::Appended { file, function } => {
            write!(f, "Added test '{function}' to '{file}'.")
         },
         Self::DuplicateSkipped { file, function } => {
            write!(f, "Function '{function}' already exists in '{file}'. Skipping new test.")
         },
         Self::Updated { file, function } => {
            write!(f, "Updated test '{function}' in '{file}'.")
         },
         Self::MissingFunction { file, function } => {
            write!(f, "Function '{function}' not found in '{file}'. Cannot update test.")
         },
         Self::FileNotFound { file } => {
            write!(f, "File '{file}' not found. Cannot update tests.")
         },
         Self::Failed { file, reason } => {
            write!(f, "Failed to apply changes to '{file}': {reason}")
         },
      }
   }
}

/// Apply every instruction in order, collecting one outcome per operation.
pub fn apply_instructions(
   root: &Path,
   instructions: &[TestInstruction],
   config: &TestGenConfig,
) -> Vec<ApplyOutcome> {
   let mut outcomes = Vec::new();

   for instr in instructions {
      if let Some(ref spec) = instr.new_file {
         match create_file(root, &spec.file_name, &spec.content, config) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => outcomes
               .push(ApplyOutcome::Failed { file: spec.file_name.clone(), reason: e.to_string() }),
         }
      }

      if instr.new_tests.is_empty() && instr.modified_tests.is_empty() {
         continue;
      }

      let Some(path) = find_file(&instr.target_file, root) else {
         outcomes.push(ApplyOutcome::FileNotFound { file: instr.target_file.clone() });
         continue;
      };

      // One read per target file; all duplicate checks run against this
      // snapshot, not the partially-appended result
      let existing = match fs::read_to_string(&path) {
         Ok(text) => text,
         Err(e) => {
            outcomes.push(ApplyOutcome::Failed {
               file:   instr.target_file.clone(),
               reason: format!("Failed to read existing file: {e}"),
            });
            continue;
         },
      };

      for test in &instr.new_tests {
         if existing.contains(&test.function_name) {
            outcomes.push(ApplyOutcome::DuplicateSkipped {
               file:     instr.target_file.clone(),
               function: test.function_name.clone(),
            });
         } else {
            outcomes.push(match append_to_file(&path, &test.content) {
               Ok(()) => ApplyOutcome::Appended {
                  file:     instr.target_file.clone(),
                  function: test.function_name.clone(),
               },
               Err(e) => ApplyOutcome::Failed {
                  file:   instr.target_file.clone(),
                  reason: e.to_string(),
               },
            });
         }
      }

      for test in &instr.modified_tests {
         if existing.contains(&test.function_name) {
            outcomes.push(match append_to_file(&path, &test.content) {
               Ok(()) => ApplyOutcome::Updated {
                  file:     instr.target_file.clone(),
                  function: test.function_name.clone(),
               },
               Err(e) => ApplyOutcome::Failed {
                  file:   instr.target_file.clone(),
                  reason: e.to_string(),
               },
            });
         } else {
            outcomes.push(ApplyOutcome::MissingFunction {
               file:     instr.target_file.clone(),
               function: test.function_name.clone(),
            });
         }
      }
   }

   outcomes
}

/// Create `filename` under `root` with `content`, only if it does not exist.
///
/// The extension must be on the configured allow-list and the path may not
/// contain a parent-traversal segment. An already existing file is a
/// reported no-op, never an overwrite.
pub fn create_file(
   root: &Path,
   filename: &str,
   content: &str,
   config: &TestGenConfig,
) -> Result<ApplyOutcome> {
   if !config.is_valid_extension(filename) {
      return Err(TestGenError::ValidationError(format!(
         "invalid filename '{filename}': extension must be one of {:?}",
         config.valid_extensions
      )));
   }

   let rel = Path::new(filename);
   if rel.components().any(|c| matches!(c, Component::ParentDir)) {
      return Err(TestGenError::ValidationError(format!(
         "invalid filename '{filename}': path may not contain '..'"
      )));
   }

   let path = root.join(rel);
   if let Some(parent) = path.parent()
      && parent != root
      && !parent.as_os_str().is_empty()
   {
      create_directory(parent)?;
   }

   match OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(mut file) => {
         file
            .write_all(content.as_bytes())
            .map_err(|e| TestGenError::Other(format!("Failed to write '{filename}': {e}")))?;
         Ok(ApplyOutcome::Created { path })
      },
      Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(ApplyOutcome::AlreadyExists { path }),
      Err(e) => Err(TestGenError::Other(format!("Failed to create file '{filename}': {e}"))),
   }
}

/// Append `content` to an existing file.
fn append_to_file(path: &Path, content: &str) -> Result<()> {
   let mut file = OpenOptions::new()
      .append(true)
      .open(path)
      .map_err(|e| TestGenError::Other(format!("Failed to open '{}': {e}", path.display())))?;
   file
      .write_all(content.as_bytes())
      .map_err(|e| TestGenError::Other(format!("Failed to append to '{}': {e}", path.display())))?;
   Ok(())
}

/// Recursively search for a file named `filename` under `root`.
pub fn find_file(filename: &str, root: &Path) -> Option<PathBuf> {
   let entries = fs::read_dir(root).ok()?;
   let mut subdirs = Vec::new();

   for entry in entries.flatten() {
      let path = entry.path();
      if path.is_dir() {
         subdirs.push(path);
      } else if path.file_name().is_some_and(|n| n == filename) {
         return Some(path);
      }
   }

   subdirs.into_iter().find_map(|dir| find_file(filename, &dir))
}

/// Create a directory (and parents) and assert it ends up writable.
///
/// Rejects any requested path containing a `..` segment so instructions
/// cannot escape the project root.
pub fn create_directory(path: &Path) -> Result<()> {
   if path.components().any(|c| matches!(c, Component::ParentDir)) {
      return Err(TestGenError::ValidationError(format!(
         "cannot create directory '{}': path may not contain '..'",
         path.display()
      )));
   }

   fs::create_dir_all(path).map_err(|e| {
      TestGenError::Other(format!("Failed to create directory '{}': {e}", path.display()))
   })?;

   let mut perms = fs::metadata(path)
      .map_err(|e| {
         TestGenError::Other(format!("Failed to stat directory '{}': {e}", path.display()))
      })?
      .permissions();
   if perms.readonly() {
      perms.set_readonly(false);
      fs::set_permissions(path, perms).map_err(|e| {
         TestGenError::Other(format!(
            "Failed to make directory '{}' writable: {e}",
            path.display()
         ))
      })?;
   }

   Ok(())
}

#[cfg(test)]
mod tests {
   use tempfile::tempdir;

   use super::*;
   use crate::types::{NewFileSpec, TestCase};

   fn config() -> TestGenConfig {
      TestGenConfig::default()
   }

   fn instruction(target: &str) -> TestInstruction {
      TestInstruction {
         target_file:    target.to_string(),
         new_file:       None,
         new_tests:      Vec::new(),
         modified_tests: Vec::new(),
      }
   }

   #[test]
   fn test_create_file_then_noop_on_existing() {
      let dir = tempdir().unwrap();
      let first = create_file(dir.path(), "test_foo.py", "content A", &config()).unwrap();
      assert!(matches!(first, ApplyOutcome::Created { .. }));

      let second = create_file(dir.path(), "test_foo.py", "content B", &config()).unwrap();
      assert!(matches!(second, ApplyOutcome::AlreadyExists { .. }));

      // Never overwrites
      let text = fs::read_to_string(dir.path().join("test_foo.py")).unwrap();
      assert_eq!(text, "content A");
   }

   #[test]
   fn test_create_file_rejects_bad_extension() {
      let dir = tempdir().unwrap();
      let err = create_file(dir.path(), "script.exe", "MZ", &config()).unwrap_err();
      assert!(matches!(err, TestGenError::ValidationError(_)));
      assert!(!dir.path().join("script.exe").exists());
   }

   #[test]
   fn test_create_file_rejects_traversal() {
      let dir = tempdir().unwrap();
      let err = create_file(dir.path(), "../escape.py", "x", &config()).unwrap_err();
      assert!(matches!(err, TestGenError::ValidationError(_)));
   }

   #[test]
   fn test_create_file_makes_parent_directories() {
      let dir = tempdir().unwrap();
      let outcome = create_file(dir.path(), "tests/unit/test_deep.py", "x", &config()).unwrap();
      assert!(matches!(outcome, ApplyOutcome::Created { .. }));
      assert!(dir.path().join("tests/unit/test_deep.py").exists());
   }

   #[test]
   fn test_find_file_nested() {
      let dir = tempdir().unwrap();
      fs::create_dir_all(dir.path().join("a/b")).unwrap();
      fs::write(dir.path().join("a/b/test_target.py"), "x").unwrap();

      let found = find_file("test_target.py", dir.path()).unwrap();
      assert!(found.ends_with("a/b/test_target.py"));
      assert!(find_file("missing.py", dir.path()).is_none());
   }

   #[test]
   fn test_create_directory_rejects_parent_segments() {
      let dir = tempdir().unwrap();
      let err = create_directory(&dir.path().join("../sneaky")).unwrap_err();
      assert!(matches!(err, TestGenError::ValidationError(_)));
   }

   #[test]
   fn test_apply_appends_new_test() {
      let dir = tempdir().unwrap();
      fs::write(dir.path().join("test_mod.py"), "import pytest\n").unwrap();

      let mut instr = instruction("test_mod.py");
      instr.new_tests.push(TestCase {
         function_name: "test_foo".to_string(),
         content:       "def test_foo():\n    assert True\n".to_string(),
      });

      let outcomes = apply_instructions(dir.path(), &[instr], &config());
      assert_eq!(outcomes.len(), 1);
      assert!(matches!(outcomes[0], ApplyOutcome::Appended { .. }));

      let text = fs::read_to_string(dir.path().join("test_mod.py")).unwrap();
      assert!(text.starts_with("import pytest\n"));
      assert!(text.contains("def test_foo"));
   }

   #[test]
   fn test_apply_is_idempotent() {
      let dir = tempdir().unwrap();
      fs::write(dir.path().join("test_mod.py"), "import pytest\n").unwrap();

      let mut instr = instruction("test_mod.py");
      instr.new_tests.push(TestCase {
         function_name: "test_foo".to_string(),
         content:       "def test_foo():\n    assert True\n".to_string(),
      });
      let instructions = [instr];

      apply_instructions(dir.path(), &instructions, &config());
      let after_first = fs::read_to_string(dir.path().join("test_mod.py")).unwrap();

      let outcomes = apply_instructions(dir.path(), &instructions, &config());
      assert!(matches!(outcomes[0], ApplyOutcome::DuplicateSkipped { .. }));
      let after_second = fs::read_to_string(dir.path().join("test_mod.py")).unwrap();
      assert_eq!(after_first, after_second);
   }

   #[test]
   fn test_apply_modified_requires_existing_function() {
      let dir = tempdir().unwrap();
      fs::write(dir.path().join("test_mod.py"), "import pytest\n").unwrap();

      let mut instr = instruction("test_mod.py");
      instr.modified_tests.push(TestCase {
         function_name: "test_foo".to_string(),
         content:       "def test_foo():\n    assert False\n".to_string(),
      });

      let outcomes = apply_instructions(dir.path(), &[instr], &config());
      assert!(matches!(outcomes[0], ApplyOutcome::MissingFunction { .. }));
      // File left unchanged
      let text = fs::read_to_string(dir.path().join("test_mod.py")).unwrap();
      assert_eq!(text, "import pytest\n");
   }

   #[test]
   fn test_apply_modified_appends_when_present() {
      let dir = tempdir().unwrap();
      fs::write(dir.path().join("test_mod.py"), "def test_foo():\n    assert True\n").unwrap();

      let mut instr = instruction("test_mod.py");
      instr.modified_tests.push(TestCase {
         function_name: "test_foo".to_string(),
         content:       "def test_foo():\n    assert 1 + 1 == 2\n".to_string(),
      });

      let outcomes = apply_instructions(dir.path(), &[instr], &config());
      assert!(matches!(outcomes[0], ApplyOutcome::Updated { .. }));
   }

   #[test]
   fn test_apply_missing_target_file() {
      let dir = tempdir().unwrap();
      let mut instr = instruction("test_nowhere.py");
      instr.new_tests.push(TestCase {
         function_name: "test_x".to_string(),
         content:       "def test_x(): ...".to_string(),
      });

      let outcomes = apply_instructions(dir.path(), &[instr], &config());
      assert_eq!(outcomes.len(), 1);
      assert!(matches!(outcomes[0], ApplyOutcome::FileNotFound { .. }));
      assert!(outcomes[0].is_failure());
   }

   #[test]
   fn test_apply_new_file_then_tests_in_one_pass() {
      let dir = tempdir().unwrap();
      let mut instr = instruction("test_fresh.py");
      instr.new_file = Some(NewFileSpec {
         file_name: "test_fresh.py".to_string(),
         content:   "import pytest\n".to_string(),
      });
      instr.new_tests.push(TestCase {
         function_name: "test_fresh_case".to_string(),
         content:       "def test_fresh_case():\n    assert True\n".to_string(),
      });

      let outcomes = apply_instructions(dir.path(), &[instr], &config());
      assert_eq!(outcomes.len(), 2);
      assert!(matches!(outcomes[0], ApplyOutcome::Created { .. }));
      assert!(matches!(outcomes[1], ApplyOutcome::Appended { .. }));
   }

   #[test]
   fn test_apply_continues_after_failure() {
      let dir = tempdir().unwrap();
      fs::write(dir.path().join("test_ok.py"), "import pytest\n").unwrap();

      let mut missing = instruction("test_gone.py");
      missing.new_tests.push(TestCase {
         function_name: "test_a".to_string(),
         content:       "def test_a(): ...".to_string(),
      });
      let mut ok = instruction("test_ok.py");
      ok.new_tests.push(TestCase {
         function_name: "test_b".to_string(),
         content:       "def test_b(): ...".to_string(),
      });

      let outcomes = apply_instructions(dir.path(), &[missing, ok], &config());
      assert_eq!(outcomes.len(), 2);
      assert!(matches!(outcomes[0], ApplyOutcome::FileNotFound { .. }));
      assert!(matches!(outcomes[1], ApplyOutcome::Appended { .. }));
   }
}
