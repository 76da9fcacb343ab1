//! Task-data resolver: per-domain compression of auxiliary payloads.
//!
//! A raw payload (an electronic invoice, a product record) is turned into a
//! compact summary before it is embedded in the context. Formatters are
//! registered explicitly by domain id; domains without one pass the raw
//! payload through unchanged.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A named, pure payload → summary transformation.
pub trait TaskFormatter: Send + Sync {
    fn name(&self) -> &str;

    fn summarize(&self, raw: &Value) -> Value;
}

/// Domain id → formatter dispatch table.
#[derive(Clone, Default)]
pub struct TaskDataResolver {
    formatters: HashMap<String, Arc<dyn TaskFormatter>>,
}

impl TaskDataResolver {
    /// An empty table: every payload passes through.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with the bundled `fiscal` and `product_catalog` formatters.
    pub fn with_builtin_formatters() -> Self {
        let mut resolver = Self::new();
        resolver.register("fiscal", Arc::new(FiscalDocumentFormatter));
        resolver.register("product_catalog", Arc::new(ProductRecordFormatter));
        resolver
    }

    /// Register (or replace) the formatter for a domain.
    pub fn register(&mut self, domain_id: impl Into<String>, formatter: Arc<dyn TaskFormatter>) {
        self.formatters.insert(domain_id.into(), formatter);
    }

    pub fn formatter_name(&self, domain_id: &str) -> Option<&str> {
        self.formatters.get(domain_id).map(|f| f.name())
    }

    /// Summarize `raw` with the domain's formatter, or return it unchanged.
    pub fn resolve(&self, domain_id: &str, raw: Value) -> Value {
        match self.formatters.get(domain_id) {
            Some(formatter) => {
                debug!(domain_id, formatter = formatter.name(), "Summarizing task data");
                formatter.summarize(&raw)
            }
            None => raw,
        }
    }
}

impl std::fmt::Debug for TaskDataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut domains: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        domains.sort_unstable();
        f.debug_struct("TaskDataResolver")
            .field("domains", &domains)
            .finish()
    }
}

/// First present, non-null value among `keys`.
fn pick<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

/// A party field may be a bare string or an object with a name.
fn party_name(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Object(_) => pick(value, &["name", "nome", "razao_social", "legal_name"]).cloned(),
        _ => None,
    }
}

/// Summary of an electronic fiscal document.
pub struct FiscalDocumentFormatter;

impl TaskFormatter for FiscalDocumentFormatter {
    fn name(&self) -> &str {
        "fiscal_document"
    }

    fn summarize(&self, raw: &Value) -> Value {
        let mut summary = Map::new();
        summary.insert("kind".into(), Value::from(self.name()));

        if let Some(number) = pick(raw, &["number", "numero", "nfe", "id"]) {
            summary.insert("number".into(), number.clone());
        }
        if let Some(issuer) = pick(raw, &["issuer", "emitente", "emit"]).and_then(party_name) {
            summary.insert("issuer".into(), issuer);
        }
        if let Some(recipient) =
            pick(raw, &["recipient", "destinatario", "dest"]).and_then(party_name)
        {
            summary.insert("recipient".into(), recipient);
        }
        if let Some(total) = pick(raw, &["total", "valor_total", "amount"]) {
            summary.insert("total".into(), total.clone());
        }
        if let Some(Value::Array(items)) = pick(raw, &["items", "itens"]) {
            summary.insert("item_count".into(), Value::from(items.len()));
        }
        if let Some(status) = pick(raw, &["status", "situacao"]) {
            summary.insert("status".into(), status.clone());
        }
        Value::Object(summary)
    }
}

/// Summary of a product catalog record.
pub struct ProductRecordFormatter;

impl TaskFormatter for ProductRecordFormatter {
    fn name(&self) -> &str {
        "product_record"
    }

    fn summarize(&self, raw: &Value) -> Value {
        let mut summary = Map::new();
        summary.insert("kind".into(), Value::from(self.name()));

        let fields: [(&str, &[&str]); 4] = [
            ("sku", &["sku", "codigo", "code"]),
            ("description", &["description", "descricao", "name", "nome"]),
            ("brand", &["brand", "marca"]),
            ("price", &["price", "preco", "unit_price"]),
        ];
        for (out, keys) in fields {
            if let Some(value) = pick(raw, keys) {
                summary.insert(out.into(), value.clone());
            }
        }
        Value::Object(summary)
    }
}
