//! # gpumcp-tools
//!
//! The tool dispatch surface, the static prompt library, the tool/prompt
//! registries, the NVML backend abstraction, and the kernel-log XID
//! extractor.
//!
//! Agent-role binaries register [`tools::register_agent_tools`] into a
//! [`registry::ToolRegistry`]; gateway-role binaries build their own
//! registry of `gpumcp-gateway` proxy handlers under the same names
//! (see [`tools::AGENT_TOOL_NAMES`]) so the MCP session core in
//! `gpumcp-server` never has to know which role it's running.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod agent_context;
pub mod kmsg;
pub mod nvml;
pub mod prompts;
pub mod registry;
pub mod tool;
pub mod tools;

pub use agent_context::AgentContext;
pub use prompts::{PromptArgSpec, PromptDefinition, PromptError};
pub use registry::{PromptRegistry, ToolRegistry};
pub use tool::{ArgumentError, ToolArguments, ToolDescriptor, ToolHandler, ToolOutcome, ToolStatus};
