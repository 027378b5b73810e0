//! `unifi_tool_guide`: the intent table as a tool.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use unifi_core::ToolResponse;

use crate::guide::{WORKFLOW, lookup, non_functional_tools};
use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{handle, make_tool};

/// `{"query": ...}`
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GuideArgs {
    /// What you want to do, e.g. "give the printer a static IP". Omit to
    /// list every entry.
    #[serde(default)]
    pub query: Option<String>,
}

fn guide(args: GuideArgs) -> ToolResponse {
    let query = args.query.unwrap_or_default();
    let entries = lookup(&query);
    let broken: Vec<&str> = non_functional_tools().into_iter().collect();
    ToolResponse::ok()
        .with("workflow", WORKFLOW)
        .with("query", query.as_str())
        .with("count", entries.len())
        .with_serialized("entries", &entries)
        .with("non_functional_tools", broken)
}

/// Provides `unifi_tool_guide`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GuideTools;

impl ToolRegistry for GuideTools {
    fn tools(&self) -> Vec<Tool> {
        vec![make_tool::<GuideArgs>(
            "unifi_tool_guide",
            "Find the right tools for a task and learn which operations do not work. Does not contact the controller.",
        )]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        (name == "unifi_tool_guide")
            .then(|| handle(args, |a: GuideArgs| async move { guide(a) }))
    }
}
