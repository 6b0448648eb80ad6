use std::process::Command;

use crate::error::{Result, TestGenError};

/// Explicit repository context for one scan run.
///
/// Every git query goes through this value; there is no module-level global
/// session. All operations shell out to the `git` binary and block until
/// complete.
#[derive(Debug, Clone)]
pub struct GitRepo {
   dir: String,
}

impl GitRepo {
   /// Open a repository at `dir`, verifying it actually is one.
   pub fn open(dir: &str) -> Result<Self> {
      let output = Command::new("git")
         .args(["rev-parse", "--git-dir"])
         .current_dir(dir)
         .output()
         .map_err(|e| TestGenError::GitError(format!("Failed to run git rev-parse: {e}")))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(TestGenError::GitError(format!("Not a git repository at '{dir}': {stderr}")));
      }

      Ok(Self { dir: dir.to_string() })
   }

   pub fn dir(&self) -> &str {
      &self.dir
   }

   /// Tracked files with uncommitted modifications.
   pub fn modified_files(&self) -> Result<Vec<String>> {
      let output = Command::new("git")
         .args(["diff", "--name-only"])
         .current_dir(&self.dir)
         .output()
         .map_err(|e| TestGenError::GitError(format!("Failed to run git diff --name-only: {e}")))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(TestGenError::GitError(format!("git diff --name-only failed: {stderr}")));
      }

      let stdout = String::from_utf8_lossy(&output.stdout);
      Ok(stdout.lines().filter(|s| !s.is_empty()).map(|s| s.to_string()).collect())
   }

   /// Untracked files (respecting the standard exclude rules).
   pub fn untracked_files(&self) -> Result<Vec<String>> {
      let output = Command::new("git")
         .args(["ls-files", "--others", "--exclude-standard"])
         .current_dir(&self.dir)
         .output()
         .map_err(|e| TestGenError::GitError(format!("Failed to list untracked files: {e}")))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(TestGenError::GitError(format!("git ls-files failed: {stderr}")));
      }

      let stdout = String::from_utf8_lossy(&output.stdout);
      Ok(stdout.lines().filter(|s| !s.is_empty()).map(|s| s.to_string()).collect())
   }

   /// Unified diff of the working copy against HEAD for one path.
   ///
   /// An untracked path produces an empty diff; the classifier still sees
   /// all of its functions as new via the empty committed name set.
   pub fn diff_head(&self, path: &str) -> Result<String> {
      let output = Command::new("git")
         .args(["diff", "HEAD", "--", path])
         .current_dir(&self.dir)
         .output()
         .map_err(|e| TestGenError::GitError(format!("Failed to run git diff HEAD: {e}")))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(TestGenError::GitError(format!("git diff HEAD failed for {path}: {stderr}")));
      }

      Ok(String::from_utf8_lossy(&output.stdout).to_string())
   }

   /// Full text of `path` as stored in the last commit.
   ///
   /// Returns an empty string when the path has no committed version, so
   /// untracked files classify as 100% new instead of erroring.
   pub fn show_head(&self, path: &str) -> Result<String> {
      let output = Command::new("git")
         .args(["show", &format!("HEAD:{path}")])
         .current_dir(&self.dir)
         .output()
         .map_err(|e| TestGenError::GitError(format!("Failed to run git show: {e}")))?;

      if !output.status.success() {
         return Ok(String::new());
      }

      Ok(String::from_utf8_lossy(&output.stdout).to_string())
   }
}
