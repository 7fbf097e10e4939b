//! Ordered strategy chain over fenced blocks, merged with bare calls.

use std::sync::LazyLock;

use conductor_primitives::ToolCall;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{bare, fence};

const DEFAULT_CODE_TOOL: &str = "execute_code";
const TRIPLE: &str = "\"\"\"";

static TOOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""tool"\s*:\s*"([A-Za-z0-9_]+)""#).expect("tool-name regex"));
static VIS_KIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""visualization_type"\s*:\s*"([^"]*)""#).expect("visualization regex")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title"\s*:\s*"([^"]*)""#).expect("title regex"));

/// A parser strategy takes a block body plus the name of the code tool and
/// either recovers a call or passes.
type Strategy = fn(&str, &str) -> Option<ToolCall>;

/// Tried in order; the first success wins and later strategies never run.
const STRATEGIES: [(&str, Strategy); 3] = [
    ("strict", parse_strict),
    ("requoted", parse_requoted),
    ("scraped", parse_scraped),
];

/// Extracts tool calls from generated text.
///
/// The extractor is total: malformed input can only reduce the number of
/// calls found, never produce an error or a panic.
#[derive(Debug, Clone)]
pub struct CallExtractor {
    code_tool: String,
}

impl CallExtractor {
    /// Creates an extractor wired to the default code-execution tool name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_tool: DEFAULT_CODE_TOOL.to_owned(),
        }
    }

    /// Overrides which tool's blocks get the field-scraping fallback for
    /// multi-line code payloads.
    #[must_use]
    pub fn with_code_tool(mut self, name: impl Into<String>) -> Self {
        self.code_tool = name.into();
        self
    }

    /// Pulls every recoverable call out of `text`, in order of appearance.
    ///
    /// Fenced blocks are parsed regardless of tool name; bare
    /// `name(key=value)` calls are only recognised for names present in
    /// `known_tools`, and never inside a fenced block they would otherwise
    /// shadow.
    #[must_use]
    pub fn extract(&self, text: &str, known_tools: &[String]) -> Vec<ToolCall> {
        let blocks = fence::find_blocks(text);
        let mut found: Vec<(usize, ToolCall)> = Vec::new();

        for block in &blocks {
            if let Some(call) = self.parse_block(block.body) {
                found.push((block.start, call));
            }
        }
        for (start, call) in bare::find_calls(text, known_tools) {
            let inside_fence = blocks
                .iter()
                .any(|block| start >= block.start && start < block.end);
            if !inside_fence {
                found.push((start, call));
            }
        }

        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, call)| call).collect()
    }

    fn parse_block(&self, body: &str) -> Option<ToolCall> {
        for (label, strategy) in STRATEGIES {
            if let Some(call) = strategy(body, &self.code_tool) {
                debug!(tool = %call.tool(), strategy = label, "parsed tool block");
                return Some(call);
            }
        }
        warn!("dropping tool block that defeated every parser strategy");
        None
    }
}

impl Default for CallExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strict parse: an object with a `tool` string and an optional `params`
/// object.
fn parse_strict(body: &str, _code_tool: &str) -> Option<ToolCall> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    let tool = object.get("tool")?.as_str()?;
    let params = match object.get("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return None,
    };
    Some(ToolCall::from_parts(tool, params))
}

/// Recovery for triple-quoted multi-line literals: re-escape each
/// `"""..."""` stretch into a valid string and retry the strict parse.
fn parse_requoted(body: &str, code_tool: &str) -> Option<ToolCall> {
    let rebuilt = requote(body)?;
    parse_strict(&rebuilt, code_tool)
}

fn requote(body: &str) -> Option<String> {
    let mut rest = body;
    let mut rebuilt = String::with_capacity(body.len() + 16);
    let mut replaced = false;
    while let Some(open) = rest.find(TRIPLE) {
        let after = open + TRIPLE.len();
        let Some(len) = rest[after..].find(TRIPLE) else {
            break;
        };
        let escaped = serde_json::to_string(&rest[after..after + len]).ok()?;
        rebuilt.push_str(&rest[..open]);
        rebuilt.push_str(&escaped);
        rest = &rest[after + len + TRIPLE.len()..];
        replaced = true;
    }
    if !replaced {
        return None;
    }
    rebuilt.push_str(rest);
    Some(rebuilt)
}

/// Last resort, for the code tool only: scrape the tool name, the code
/// between triple-quote markers, and the scalar presentation fields.
fn parse_scraped(body: &str, code_tool: &str) -> Option<ToolCall> {
    let name = TOOL_NAME.captures(body)?.get(1)?.as_str();
    if name != code_tool {
        return None;
    }
    let open = body.find(TRIPLE)?;
    let after = open + TRIPLE.len();
    let len = body[after..].find(TRIPLE)?;
    let code = &body[after..after + len];

    let mut call = ToolCall::new(name).with_param("code", Value::String(code.to_owned()));
    if let Some(kind) = VIS_KIND.captures(body).and_then(|caps| caps.get(1)) {
        call = call.with_param("visualization_type", Value::String(kind.as_str().to_owned()));
    }
    if let Some(title) = TITLE.captures(body).and_then(|caps| caps.get(1)) {
        call = call.with_param("title", Value::String(title.as_str().to_owned()));
    }
    Some(call)
}
