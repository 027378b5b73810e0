//! Tool registration and dispatch.
//!
//! Each resource family (devices, clients, DHCP, ...) implements
//! [`ToolRegistry`]. [`CompositeRegistry`] stacks them so the server sees a
//! single flat tool list.

use std::future::Future;
use std::pin::Pin;

use rmcp::model::{CallToolResult, ErrorData, Tool};
use serde_json::Value;

/// Future returned by a tool handler.
pub type ToolResult = Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send>>;

/// A source of MCP tools.
///
/// `call` returns `None` for names the registry does not own so that
/// composites can try the next registry.
pub trait ToolRegistry: Send + Sync {
    /// Every tool this registry owns.
    fn tools(&self) -> Vec<Tool>;

    /// Dispatch a call by tool name.
    fn call(&self, name: &str, args: Value) -> Option<ToolResult>;

    /// Number of tools.
    fn tool_count(&self) -> usize {
        self.tools().len()
    }

    /// Whether a tool named `name` is registered.
    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }

    /// Registered tool names in registration order.
    fn tool_names(&self) -> Vec<String> {
        self.tools().into_iter().map(|t| t.name.to_string()).collect()
    }
}

/// Registries stacked in order; the first one that owns a name handles it.
pub struct CompositeRegistry {
    registries: Vec<Box<dyn ToolRegistry>>,
}

impl CompositeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            registries: Vec::new(),
        }
    }

    /// Append a sub-registry.
    #[allow(clippy::should_implement_trait)]
    pub fn add<R: ToolRegistry + 'static>(mut self, registry: R) -> Self {
        self.registries.push(Box::new(registry));
        self
    }

    /// Number of sub-registries.
    pub fn len(&self) -> usize {
        self.registries.len()
    }

    /// Whether no sub-registry was added.
    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

impl Default for CompositeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry for CompositeRegistry {
    fn tools(&self) -> Vec<Tool> {
        self.registries.iter().flat_map(|r| r.tools()).collect()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        self.registries
            .iter()
            .find(|r| r.has_tool(name))
            .and_then(|r| r.call(name, args))
    }
}

// ============================================================================
// Tests
// ============================================================================
