//! The two-catalog tool registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use conductor_primitives::validate_tool_name;
use tracing::{debug, info};

use crate::binding::HttpBinding;
use crate::spec::ToolSpec;
use crate::tool::{Tool, ToolError, ToolResult};

/// Whether a tool was compiled in or created at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolOrigin {
    /// Registered at process start and never removed.
    Static,
    /// Registered by the runtime tool creator; lost on restart.
    Dynamic,
}

/// Handler behind a registry entry: a compiled-in implementation or an HTTP
/// binding routed through the generic caller.
#[derive(Clone)]
enum ToolHandler {
    Native(Arc<dyn Tool>),
    Remote(HttpBinding),
}

#[derive(Clone)]
struct ToolEntry {
    spec: ToolSpec,
    handler: ToolHandler,
    origin: ToolOrigin,
}

/// A resolved registry entry, ready for dispatch.
#[derive(Clone)]
pub enum ResolvedTool {
    /// A compiled-in handler.
    Native {
        /// Schema of the resolved tool.
        spec: ToolSpec,
        /// Handler to invoke.
        tool: Arc<dyn Tool>,
    },
    /// A dynamic HTTP binding.
    Remote {
        /// Schema of the resolved tool.
        spec: ToolSpec,
        /// Binding routed through the generic caller.
        binding: HttpBinding,
    },
}

impl ResolvedTool {
    /// Schema of the resolved tool.
    #[must_use]
    pub fn spec(&self) -> &ToolSpec {
        match self {
            Self::Native { spec, .. } | Self::Remote { spec, .. } => spec,
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, ToolEntry>,
    order: Vec<String>,
}

/// Registry of every invocable tool, static and dynamic, in one namespace.
///
/// Both catalogs share one map so a dynamic tool can never shadow a static
/// one, and resolution is a single lookup regardless of origin. The registry
/// is process-lifetime state: entries are added but never removed.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<RegistryInner>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("tool registry poisoned");
        f.debug_struct("ToolRegistry")
            .field("registered", &inner.order)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a compiled-in tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidName`] for a malformed name and
    /// [`ToolError::DuplicateTool`] when the name exists in either catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register_static<T>(&self, spec: ToolSpec, tool: T) -> ToolResult<()>
    where
        T: Tool + 'static,
    {
        self.insert(spec, ToolHandler::Native(Arc::new(tool)), ToolOrigin::Static)
    }

    /// Registers a dynamic tool bound to an HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidName`] for a malformed name and
    /// [`ToolError::DuplicateTool`] when the name exists in either catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register_dynamic(&self, spec: ToolSpec, binding: HttpBinding) -> ToolResult<()> {
        self.insert(spec, ToolHandler::Remote(binding), ToolOrigin::Dynamic)
    }

    fn insert(&self, spec: ToolSpec, handler: ToolHandler, origin: ToolOrigin) -> ToolResult<()> {
        validate_tool_name(spec.name())?;

        let mut inner = self.inner.write().expect("tool registry poisoned");
        let name = spec.name().to_owned();
        if inner.entries.contains_key(&name) {
            return Err(ToolError::DuplicateTool { name });
        }

        if origin == ToolOrigin::Dynamic {
            info!(tool = %name, "registered dynamic tool");
        } else {
            debug!(tool = %name, "registered static tool");
        }

        inner.order.push(name.clone());
        inner.entries.insert(
            name,
            ToolEntry {
                spec,
                handler,
                origin,
            },
        );
        Ok(())
    }

    /// Resolves a tool by name for dispatch.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ResolvedTool> {
        let inner = self.inner.read().expect("tool registry poisoned");
        let entry = inner.entries.get(name)?;
        Some(match &entry.handler {
            ToolHandler::Native(tool) => ResolvedTool::Native {
                spec: entry.spec.clone(),
                tool: Arc::clone(tool),
            },
            ToolHandler::Remote(binding) => ResolvedTool::Remote {
                spec: entry.spec.clone(),
                binding: binding.clone(),
            },
        })
    }

    /// Whether a tool with this name exists in either catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner.entries.contains_key(name)
    }

    /// Renders the model-facing catalog text covering both catalogs, in
    /// registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn describe_all(&self) -> String {
        let inner = self.inner.read().expect("tool registry poisoned");
        let mut out = String::new();
        for name in &inner.order {
            if let Some(entry) = inner.entries.get(name) {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&entry.spec.describe());
            }
        }
        out
    }

    /// Specs of the static catalog only, in registration order.
    ///
    /// The read-only catalog listing deliberately excludes dynamic tools;
    /// they appear only in the model-facing text from [`Self::describe_all`].
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn static_specs(&self) -> Vec<ToolSpec> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner
            .order
            .iter()
            .filter_map(|name| inner.entries.get(name))
            .filter(|entry| entry.origin == ToolOrigin::Static)
            .map(|entry| entry.spec.clone())
            .collect()
    }

    /// Names of every registered tool, in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner.order.clone()
    }

    /// Number of registered tools across both catalogs.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner.entries.len()
    }

    /// Whether the registry holds no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindMethod;
    use crate::spec::{ParamKind, ParamSpec};
    use serde_json::{Map, Value};

    fn echo_spec(name: &str) -> ToolSpec {
        ToolSpec::new(name, "Echoes its parameters back.")
            .expect("valid spec")
            .with_param(ParamSpec::new("value", ParamKind::String, "Value to echo."))
    }

    fn binding() -> HttpBinding {
        HttpBinding::new("https://api.example.com", "/echo", BindMethod::Get).expect("binding")
    }

    async fn echo(params: Map<String, Value>) -> ToolResult<Value> {
        Ok(Value::Object(params))
    }

    #[test]
    fn static_and_dynamic_share_one_namespace() {
        let registry = ToolRegistry::new();
        registry
            .register_static(echo_spec("echo"), echo)
            .expect("register static");

        let err = registry
            .register_dynamic(echo_spec("echo"), binding())
            .expect_err("collision across catalogs");
        assert!(matches!(err, ToolError::DuplicateTool { name } if name == "echo"));

        // The failed registration left the registry unchanged.
        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.resolve("echo"),
            Some(ResolvedTool::Native { .. })
        ));
    }

    #[test]
    fn malformed_name_is_rejected() {
        let registry = ToolRegistry::new();
        let spec = echo_spec("valid_name");
        registry.register_static(spec, echo).expect("register");

        let err = registry
            .register_dynamic(
                // Bypass ToolSpec validation by deserializing a bad name.
                serde_json::from_value(serde_json::json!({
                    "name": "bad-name",
                    "description": "x",
                }))
                .expect("deserialize"),
                binding(),
            )
            .expect_err("malformed name");
        assert!(matches!(err, ToolError::InvalidName(_)));
    }

    #[test]
    fn resolve_returns_none_for_missing_tools() {
        let registry = ToolRegistry::new();
        assert!(registry.resolve("missing").is_none());
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn describe_all_covers_both_catalogs_in_order() {
        let registry = ToolRegistry::new();
        registry
            .register_static(echo_spec("first_tool"), echo)
            .expect("register");
        registry
            .register_dynamic(echo_spec("second_tool"), binding())
            .expect("register");

        let text = registry.describe_all();
        let first = text.find("first_tool").expect("first listed");
        let second = text.find("second_tool").expect("second listed");
        assert!(first < second);
    }

    #[test]
    fn static_specs_exclude_dynamic_tools() {
        let registry = ToolRegistry::new();
        registry
            .register_static(echo_spec("compiled"), echo)
            .expect("register");
        registry
            .register_dynamic(echo_spec("created"), binding())
            .expect("register");

        let specs = registry.static_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name(), "compiled");
        assert_eq!(registry.names(), ["compiled", "created"]);
    }
}
