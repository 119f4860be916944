//! taskpipe: composable task pipelines with declarative subcommand trees
//!
//! A task is a unit of work with a lifecycle (preamble, perform, postamble),
//! a result record, and a statically declared table of mergeable fields.
//! Tasks pick up state from plain mappings, parsed command-line arguments,
//! other tasks or prior results, and chain left to right into pipelines.
//! The [`cli`] module maps tasks onto `clap` subcommand trees built from a
//! declarative configuration.
//!
//! ```
//! use taskpipe::{mergeable, task_result, Task};
//!
//! #[derive(Debug, Default)]
//! struct GreetResult {
//!     err: Option<anyhow::Error>,
//!     greeting: String,
//! }
//! task_result!(GreetResult { greeting });
//!
//! #[derive(Debug, Default)]
//! struct GreetTask {
//!     name: String,
//!     result: GreetResult,
//! }
//! mergeable!(GreetTask { name });
//!
//! impl Task for GreetTask {
//!     type Result = GreetResult;
//!
//!     fn result(&self) -> &GreetResult {
//!         &self.result
//!     }
//!
//!     fn result_mut(&mut self) -> &mut GreetResult {
//!         &mut self.result
//!     }
//!
//!     fn into_result(self) -> GreetResult {
//!         self.result
//!     }
//!
//!     fn perform(&mut self) -> anyhow::Result<()> {
//!         self.result.greeting = format!("hello, {}", self.name);
//!         Ok(())
//!     }
//! }
//!
//! let result = GreetTask { name: "ferris".into(), ..Default::default() }.run()?;
//! assert_eq!(result.greeting, "hello, ferris");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod error;
pub mod state;
pub mod task;

pub use error::ConfigError;
pub use state::{merge_object, FieldMap, Fields, MergeOptions, MergeSource};
pub use task::{BaseResult, Task, TaskResult};

/// Dynamic field value exchanged by the merge engine.
pub use serde_json::Value;

// Crates the exported macros expand against.
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use serde_json;
    pub use tracing;
}
