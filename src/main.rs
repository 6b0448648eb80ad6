use std::path::Path;

use api::{HttpTestGenerator, TestGenerator};
use apply::apply_instructions;
use clap::Parser;
use config::TestGenConfig;
use error::Result;
use git::GitRepo;
use llm_testgen::*;
use types::{Args, FileChangeReport, TestInstruction};

/// Load config from args or default
fn load_config_from_args(args: &Args) -> Result<TestGenConfig> {
   if let Some(ref config_path) = args.config {
      TestGenConfig::from_file(config_path)
   } else {
      TestGenConfig::load()
   }
}

/// One-line summary of a file's classification for the scan report.
fn report_summary(report: &FileChangeReport) -> String {
   if let Some(ref error) = report.error {
      return format!("{}: error: {error}", report.file_name);
   }

   let new_names: Vec<&str> = report.new_functions.iter().map(|f| f.name.as_str()).collect();
   let modified_names: Vec<&str> =
      report.modified_functions.iter().map(|f| f.name.as_str()).collect();

   let mut parts = Vec::new();
   if !new_names.is_empty() {
      parts.push(format!("new: {}", new_names.join(", ")));
   }
   if !modified_names.is_empty() {
      parts.push(format!("modified: {}", modified_names.join(", ")));
   }

   format!("{}: {}", report.file_name, parts.join("; "))
}

/// Generate instructions for every changed function in the report set.
///
/// A generation failure marks that file's processing as errored and moves on
/// to the next file; it never aborts the run.
fn generate_instructions(
   generator: &dyn TestGenerator,
   reports: &[FileChangeReport],
) -> Vec<TestInstruction> {
   let mut instructions = Vec::new();

   'files: for report in reports.iter().filter(|r| !r.is_failed()) {
      let changed = report.new_functions.iter().chain(&report.modified_functions);
      for func in changed {
         match generator.generate(&func.source_text) {
            Ok(instruction) => instructions.push(instruction),
            Err(e) => {
               eprintln!(
                  "{}",
                  style::warning(&format!(
                     "Generation failed for '{}' in {}: {e}",
                     func.name, report.file_name
                  ))
               );
               continue 'files;
            },
         }
      }
   }

   instructions
}

fn main() -> Result<()> {
   let args = Args::parse();
   let config = load_config_from_args(&args)?;

   let repo = GitRepo::open(&args.dir)?;
   println!("Scanning working tree for changed functions...");
   let reports = classify::scan_changed_files(&repo)?;

   if reports.is_empty() {
      println!("No new or modified functions found.");
      return Ok(());
   }

   for report in &reports {
      let line = report_summary(report);
      if report.is_failed() {
         eprintln!("{}", style::error(&line));
      } else {
         println!("{line}");
      }
   }

   if args.verbose {
      println!("\n{}", serde_json::to_string_pretty(&reports)?);
   }

   if args.scan_only {
      return Ok(());
   }

   let generator = HttpTestGenerator::new(&config, args.model.as_deref());
   println!("\nGenerating tests with {}...", style::bold(&config.generation_model));
   let instructions = generate_instructions(&generator, &reports);

   if instructions.is_empty() {
      println!("Nothing to apply.");
      return Ok(());
   }

   let outcomes = apply_instructions(Path::new(&args.dir), &instructions, &config);
   let mut failures = 0;
   for outcome in &outcomes {
      if outcome.is_failure() {
         failures += 1;
         eprintln!("{}", style::warning(&outcome.to_string()));
      } else {
         println!("{}", style::dim(&outcome.to_string()));
      }
   }

   if failures == 0 {
      println!("{}", style::success("✓ All generated tests applied"));
   } else {
      println!(
         "{}",
         style::warning(&format!("Applied with {failures}/{} skipped", outcomes.len()))
      );
   }

   Ok(())
}
