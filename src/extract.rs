//! Function extraction from source text.
//!
//! Parses one version of a source file into ordered [`FunctionRecord`]s, one
//! per top-level `def`. Spans are indentation-based: a definition runs from
//! its signature line through the last indented (or blank) line that follows,
//! with trailing blank lines trimmed off.

use crate::{
   error::{Result, TestGenError},
   types::FunctionRecord,
};

/// Extract every top-level function definition from `source`, in source
/// order. Nested functions stay inside their parent's span and are not
/// reported separately.
pub fn extract_functions(source: &str) -> Result<Vec<FunctionRecord>> {
   let lines: Vec<&str> = source.lines().collect();
   let mut records = Vec::new();
   let mut i = 0;

   while i < lines.len() {
      let line = lines[i];
      if !is_top_level_def(line) {
         i += 1;
         continue;
      }

      let name = parse_def_name(line, i + 1)?;

      // Body: every following line that is blank or indented
      let mut end = i + 1;
      while end < lines.len() {
         let next = lines[end];
         if next.trim().is_empty() || next.starts_with(' ') || next.starts_with('\t') {
            end += 1;
         } else {
            break;
         }
      }

      // Blank lines between functions are not part of the body
      while end > i + 1 && lines[end - 1].trim().is_empty() {
         end -= 1;
      }

      records.push(FunctionRecord {
         name,
         source_text: lines[i..end].join("\n"),
         start_line: i + 1,
      });
      i = end;
   }

   Ok(records)
}

/// A zero-indent `def` or `async def` header line.
fn is_top_level_def(line: &str) -> bool {
   line.starts_with("def ") || line.starts_with("async def ")
}

/// Pull the function name out of a `def` header.
fn parse_def_name(line: &str, line_number: usize) -> Result<String> {
   let after_def = line
      .strip_prefix("async def ")
      .or_else(|| line.strip_prefix("def "))
      .unwrap_or(line);

   let Some(paren) = after_def.find('(') else {
      return Err(TestGenError::ParseError(format!(
         "malformed def header at line {line_number}: missing parameter list"
      )));
   };

   let name = after_def[..paren].trim();
   if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
      return Err(TestGenError::ParseError(format!(
         "malformed def header at line {line_number}: invalid function name '{name}'"
      )));
   }

   Ok(name.to_string())
}
