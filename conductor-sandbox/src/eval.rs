//! The restricted interpreter.
//!
//! Each evaluation builds a fresh rhai engine with hard operation and size
//! limits, captured print output, and exactly three registered capabilities:
//! tabular values, numeric-array helpers, and a record-store handle whose
//! only method is `query`. rhai itself has no file, process, or environment
//! access, and the `eval` symbol is disabled on top.

use std::sync::{Arc, Mutex};

use rhai::{Array, Dynamic, Engine, EvalAltResult, Scope};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{SandboxError, SandboxResult};
use crate::store::RecordStore;

/// Hard limits applied to every evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalConfig {
    max_operations: u64,
    max_call_levels: usize,
    max_string_size: usize,
    max_array_size: usize,
}

impl EvalConfig {
    /// Sets the operation budget; exceeding it aborts the evaluation.
    #[must_use]
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    /// Sets the maximum call-stack depth.
    #[must_use]
    pub fn with_max_call_levels(mut self, max_call_levels: usize) -> Self {
        self.max_call_levels = max_call_levels;
        self
    }

    /// Sets the maximum size of any string value.
    #[must_use]
    pub fn with_max_string_size(mut self, max_string_size: usize) -> Self {
        self.max_string_size = max_string_size;
        self
    }

    /// Sets the maximum length of any array value.
    #[must_use]
    pub fn with_max_array_size(mut self, max_array_size: usize) -> Self {
        self.max_array_size = max_array_size;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_string_size: 64 * 1024,
            max_array_size: 10_000,
        }
    }
}

/// What an evaluation produced: the `result` variable plus captured prints.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Evaluation {
    pub result: Value,
    pub stdout: String,
}

/// Tabular value evaluated code can build and assign to `result`.
///
/// Serialized in column/row form so chart-style consumers get a stable
/// shape regardless of what the code did.
#[derive(Debug, Clone, Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Array>,
}

impl Table {
    fn from_parts(columns: Array, rows: Array) -> Result<Self, Box<EvalAltResult>> {
        let columns = columns.iter().map(ToString::to_string).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.try_cast::<Array>()
                    .ok_or_else(|| "table rows must be arrays".into())
            })
            .collect::<Result<Vec<Array>, Box<EvalAltResult>>>()?;
        Ok(Self { columns, rows })
    }

    fn push_row(&mut self, row: Array) {
        self.rows.push(row);
    }

    fn to_value(&self) -> Value {
        let rows: Vec<Value> = self
            .rows
            .iter()
            .map(|row| Value::Array(row.iter().map(cell_to_value).collect()))
            .collect();
        json!({ "columns": self.columns, "rows": rows })
    }
}

/// Handle giving evaluated code read access to the record store.
#[derive(Clone)]
struct StoreHandle {
    store: Arc<dyn RecordStore>,
}

/// Runs one code payload to completion inside a fresh engine.
pub(crate) fn run(
    code: &str,
    store: &Arc<dyn RecordStore>,
    config: EvalConfig,
) -> SandboxResult<Evaluation> {
    let captured = Arc::new(Mutex::new(String::new()));
    let engine = build_engine(Arc::clone(store), config, &captured);

    let mut scope = Scope::new();
    scope.push("result", Dynamic::UNIT);

    if let Err(err) = engine.run_with_scope(&mut scope, code) {
        let stdout = captured.lock().expect("print capture poisoned").clone();
        return Err(SandboxError::Execution {
            reason: err.to_string(),
            stdout,
        });
    }

    let dynamic = scope
        .get_value::<Dynamic>("result")
        .unwrap_or(Dynamic::UNIT);
    let result = serialize_result(&dynamic);
    let stdout = captured.lock().expect("print capture poisoned").clone();
    debug!(has_result = !result.is_null(), stdout_chars = stdout.len(), "evaluation finished");
    Ok(Evaluation { result, stdout })
}

fn build_engine(
    store: Arc<dyn RecordStore>,
    config: EvalConfig,
    captured: &Arc<Mutex<String>>,
) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(config.max_operations);
    engine.set_max_call_levels(config.max_call_levels);
    engine.set_max_string_size(config.max_string_size);
    engine.set_max_array_size(config.max_array_size);
    engine.disable_symbol("eval");

    let sink = Arc::clone(captured);
    engine.on_print(move |text| {
        let mut out = sink.lock().expect("print capture poisoned");
        out.push_str(text);
        out.push('\n');
    });

    engine
        .register_type_with_name::<Table>("Table")
        .register_fn("table", Table::from_parts)
        .register_fn("push_row", Table::push_row);

    engine
        .register_fn("sum_of", sum_of)
        .register_fn("mean_of", mean_of)
        .register_fn("min_of", min_of)
        .register_fn("max_of", max_of);

    engine.register_type_with_name::<StoreHandle>("Store");
    engine.register_fn("open_store", move || StoreHandle {
        store: Arc::clone(&store),
    });
    engine.register_fn(
        "query",
        |handle: &mut StoreHandle, sql: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            let rows = handle
                .store
                .query(sql)
                .map_err(|err| Into::<Box<EvalAltResult>>::into(err.to_string()))?;
            rhai::serde::to_dynamic(rows)
        },
    );

    engine
}

fn serialize_result(dynamic: &Dynamic) -> Value {
    if dynamic.is_unit() {
        return Value::Null;
    }
    if let Some(table) = dynamic.clone().try_cast::<Table>() {
        return table.to_value();
    }
    rhai::serde::from_dynamic::<Value>(dynamic)
        .unwrap_or_else(|_| Value::String(dynamic.to_string()))
}

fn cell_to_value(cell: &Dynamic) -> Value {
    rhai::serde::from_dynamic::<Value>(cell)
        .unwrap_or_else(|_| Value::String(cell.to_string()))
}

fn numeric(items: &Array) -> Result<Vec<f64>, Box<EvalAltResult>> {
    items
        .iter()
        .map(|item| {
            item.as_float()
                .or_else(|_| item.as_int().map(|i| i as f64))
                .map_err(|_| "array must contain only numbers".into())
        })
        .collect()
}

fn sum_of(items: Array) -> Result<f64, Box<EvalAltResult>> {
    Ok(numeric(&items)?.iter().sum())
}

fn mean_of(items: Array) -> Result<f64, Box<EvalAltResult>> {
    let values = numeric(&items)?;
    if values.is_empty() {
        return Err("cannot take the mean of an empty array".into());
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn min_of(items: Array) -> Result<f64, Box<EvalAltResult>> {
    numeric(&items)?
        .into_iter()
        .reduce(f64::min)
        .ok_or_else(|| "cannot take the minimum of an empty array".into())
}

fn max_of(items: Array) -> Result<f64, Box<EvalAltResult>> {
    numeric(&items)?
        .into_iter()
        .reduce(f64::max)
        .ok_or_else(|| "cannot take the maximum of an empty array".into())
}
