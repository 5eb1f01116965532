//! External tool invocation.
//!
//! Every subprocess the orchestrator starts (archive tools, `patch`,
//! `configure`, `make`, `vcvarsall.bat`) goes through [`run_tool`]. Invocations
//! are all-or-nothing: a non-zero exit becomes [`ToolError::Failed`] carrying
//! the tool's stdout and stderr verbatim, and nothing is retried.

mod cmd;
mod tools;

pub use cmd::*;
pub use tools::ToolPaths;
