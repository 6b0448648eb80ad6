//! Test-generation collaborator.
//!
//! One blocking round-trip per function against an OpenAI-compatible API,
//! using a forced tool call so the response arrives as a structured
//! [`TestInstruction`] instead of free-form text.

use std::{thread, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
   config::TestGenConfig,
   error::{Result, TestGenError},
   types::TestInstruction,
};

const GENERATION_PROMPT: &str = r"Generate comprehensive unit tests for the function below.

Return the result through the write_unit_tests tool:
- target_file: name of the test file the tests belong in (test_<module>.py convention)
- new_file: include only when that test file would not exist yet, with its full content
- new_tests: one entry per generated test function, content being the complete test source
- modified_tests: entries replacing an existing test for the same function

## Function to be tested:
```
{function}
```";

/// Anything that can turn a function body into test instructions.
///
/// The pipeline only depends on this seam, so tests can substitute a
/// canned generator for the HTTP one.
pub trait TestGenerator {
   fn generate(&self, function_source: &str) -> Result<TestInstruction>;
}

/// Build HTTP client with timeouts from config
fn build_client(config: &TestGenConfig) -> Result<reqwest::blocking::Client> {
   Ok(reqwest::blocking::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .build()?)
}

#[derive(Debug, Serialize)]
struct Message {
   role:    String,
   content: String,
}

#[derive(Debug, Serialize)]
struct FunctionParameters {
   #[serde(rename = "type")]
   param_type: String,
   properties: serde_json::Value,
   required:   Vec<String>,
}

#[derive(Debug, Serialize)]
struct Function {
   name:        String,
   description: String,
   parameters:  FunctionParameters,
}

#[derive(Debug, Serialize)]
struct Tool {
   #[serde(rename = "type")]
   tool_type: String,
   function:  Function,
}

#[derive(Debug, Serialize)]
struct ApiRequest {
   model:       String,
   max_tokens:  u32,
   temperature: f32,
   tools:       Vec<Tool>,
   tool_choice: serde_json::Value,
   messages:    Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
   function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
   arguments: String,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
   #[serde(default)]
   tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct Choice {
   message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
   choices: Vec<Choice>,
}

/// Retry an API call with exponential backoff
fn retry_api_call<F, T>(config: &TestGenConfig, mut f: F) -> Result<T>
where
   F: FnMut() -> Result<T>,
{
   let mut attempt = 0;

   loop {
      attempt += 1;

      match f() {
         Ok(result) => return Ok(result),
         Err(e) if attempt < config.max_retries => {
            let backoff_ms = config.initial_backoff_ms * (1 << (attempt - 1));
            eprintln!("Error: {} - Retry {}/{} after {}ms...", e, attempt, config.max_retries, backoff_ms);
            thread::sleep(Duration::from_millis(backoff_ms));
         },
         Err(e) => {
            return Err(TestGenError::ApiRetryExhausted {
               retries: config.max_retries,
               source:  Box::new(e),
            });
         },
      }
   }
}

/// HTTP-backed generator against an OpenAI-compatible endpoint.
pub struct HttpTestGenerator<'a> {
   config: &'a TestGenConfig,
   model:  String,
}

impl<'a> HttpTestGenerator<'a> {
   pub fn new(config: &'a TestGenConfig, model_override: Option<&str>) -> Self {
      let model = model_override.map_or_else(|| config.generation_model.clone(), |m| m.to_string());
      Self { config, model }
   }

   fn instruction_tool() -> Tool {
      Tool {
         tool_type: "function".to_string(),
         function:  Function {
            name:        "write_unit_tests".to_string(),
            description: "Emit generated unit tests for one function as structured merge \
                          instructions"
               .to_string(),
            parameters:  FunctionParameters {
               param_type: "object".to_string(),
               properties: serde_json::json!({
                  "target_file": {
                     "type": "string",
                     "description": "Test file the edits apply to"
                  },
                  "new_file": {
                     "type": "object",
                     "description": "Present only when the test file does not exist yet",
                     "properties": {
                        "file_name": { "type": "string" },
                        "content": { "type": "string" }
                     },
                     "required": ["file_name", "content"]
                  },
                  "new_tests": {
                     "type": "array",
                     "items": {
                        "type": "object",
                        "properties": {
                           "function_name": { "type": "string" },
                           "content": { "type": "string" }
                        },
                        "required": ["function_name", "content"]
                     }
                  },
                  "modified_tests": {
                     "type": "array",
                     "items": {
                        "type": "object",
                        "properties": {
                           "function_name": { "type": "string" },
                           "content": { "type": "string" }
                        },
                        "required": ["function_name", "content"]
                     }
                  }
               }),
               required:   vec!["target_file".to_string(), "new_tests".to_string()],
            },
         },
      }
   }

   fn request_once(&self, function_source: &str) -> Result<TestInstruction> {
      let client = build_client(self.config)?;

      let request = ApiRequest {
         model:       self.model.clone(),
         max_tokens:  4000,
         temperature: self.config.temperature,
         tools:       vec![Self::instruction_tool()],
         tool_choice: serde_json::json!({
            "type": "function",
            "function": { "name": "write_unit_tests" }
         }),
         messages:    vec![Message {
            role:    "user".to_string(),
            content: GENERATION_PROMPT.replace("{function}", function_source),
         }],
      };

      let mut req = client
         .post(format!("{}/v1/chat/completions", self.config.api_base_url))
         .json(&request);
      if let Some(ref key) = self.config.api_key {
         req = req.bearer_auth(key);
      }

      let response = req.send()?;
      let status = response.status();
      if !status.is_success() {
         return Err(TestGenError::ApiError {
            status: status.as_u16(),
            body:   response.text().unwrap_or_default(),
         });
      }

      let parsed: ApiResponse = response.json()?;
      let arguments = parsed
         .choices
         .first()
         .and_then(|c| c.message.tool_calls.first())
         .map(|t| t.function.arguments.as_str())
         .ok_or_else(|| TestGenError::Other("API response contained no tool call".to_string()))?;

      Ok(serde_json::from_str(arguments)?)
   }
}

impl TestGenerator for HttpTestGenerator<'_> {
   fn generate(&self, function_source: &str) -> Result<TestInstruction> {
      retry_api_call(self.config, || self.request_once(function_source))
   }
}
