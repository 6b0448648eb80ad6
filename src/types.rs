use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// A function definition extracted from one version of a source file.
///
/// Identity is the function name within that file version; duplicate names
/// are possible and the classifier treats the name set as authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
   pub name:        String,
   /// Verbatim text of the definition, signature through end of body.
   pub source_text: String,
   /// 1-based line number of the signature line.
   pub start_line:  usize,
}

impl FunctionRecord {
   /// Number of lines the definition spans.
   pub fn line_count(&self) -> usize {
      self.source_text.matches('\n').count() + 1
   }
}

/// A function the classifier flagged as new or modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFunction {
   pub name:        String,
   pub source_text: String,
}

/// Per-file classification result.
///
/// Produced only for files with at least one new or modified function, or
/// for files whose processing failed (`error` set, everything else empty).
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileChangeReport {
   pub file_name:          String,
   pub new_functions:      Vec<ChangedFunction>,
   pub modified_functions: Vec<ChangedFunction>,
   /// Full working-copy text, attached so the generator sees naming and
   /// import conventions of the surrounding file.
   #[serde(skip_serializing_if = "Option::is_none")]
   pub original_content:   Option<String>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub error:              Option<String>,
}

impl FileChangeReport {
   pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
      Self { file_name: file_name.into(), error: Some(error.into()), ..Self::default() }
   }

   pub const fn is_failed(&self) -> bool {
      self.error.is_some()
   }
}

/// One generated test case targeting a single function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
   pub function_name: String,
   pub content:       String,
}

/// A brand-new test file the generator wants created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFileSpec {
   pub file_name: String,
   pub content:   String,
}

/// Structured output of the test-generation collaborator for one target file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestInstruction {
   /// Name of the test file the edits apply to.
   pub target_file: String,

   /// Present when the target test file does not exist yet.
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub new_file: Option<NewFileSpec>,

   /// Tests to append if their function name is not already present.
   #[serde(default)]
   pub new_tests: Vec<TestCase>,

   /// Tests replacing existing ones; skipped if the name is absent.
   #[serde(default)]
   pub modified_tests: Vec<TestCase>,
}

// CLI Args
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Generate unit tests for changed functions using LLMs", long_about = None)]
pub struct Args {
   /// Repository directory to scan
   #[arg(long, default_value = ".")]
   pub dir: String,

   /// Path to config file (default: ~/.config/llm-testgen/config.toml)
   #[arg(long)]
   pub config: Option<PathBuf>,

   /// Only scan and report changed functions, skip generation
   #[arg(long)]
   pub scan_only: bool,

   /// Override the generation model
   #[arg(long)]
   pub model: Option<String>,

   /// Print the full change report as JSON
   #[arg(long, short)]
   pub verbose: bool,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_function_record_line_count() {
      let rec = FunctionRecord {
         name:        "foo".to_string(),
         source_text: "def foo():\n    return 1".to_string(),
         start_line:  1,
      };
      assert_eq!(rec.line_count(), 2);

      let one_liner = FunctionRecord {
         name:        "bar".to_string(),
         source_text: "def bar(): pass".to_string(),
         start_line:  7,
      };
      assert_eq!(one_liner.line_count(), 1);
   }

   #[test]
   fn test_failed_report() {
      let report = FileChangeReport::failed("broken.py", "unreadable");
      assert!(report.is_failed());
      assert_eq!(report.file_name, "broken.py");
      assert!(report.new_functions.is_empty());
      assert!(report.original_content.is_none());
   }

   #[test]
   fn test_instruction_deserialize_full() {
      let json = r#"{
         "target_file": "test_utils.py",
         "new_tests": [{"function_name": "test_foo", "content": "def test_foo(): ..."}],
         "modified_tests": [{"function_name": "test_bar", "content": "def test_bar(): ..."}]
      }"#;
      let instr: TestInstruction = serde_json::from_str(json).unwrap();
      assert_eq!(instr.target_file, "test_utils.py");
      assert!(instr.new_file.is_none());
      assert_eq!(instr.new_tests.len(), 1);
      assert_eq!(instr.new_tests[0].function_name, "test_foo");
      assert_eq!(instr.modified_tests.len(), 1);
   }

   #[test]
   fn test_instruction_deserialize_new_file_only() {
      let json = r#"{
         "target_file": "test_new.py",
         "new_file": {"file_name": "test_new.py", "content": "import pytest\n"}
      }"#;
      let instr: TestInstruction = serde_json::from_str(json).unwrap();
      assert_eq!(instr.new_file.as_ref().unwrap().file_name, "test_new.py");
      assert!(instr.new_tests.is_empty());
      assert!(instr.modified_tests.is_empty());
   }
}
