//! Schema-driven rendering of configuration values into Terraform syntax.
//!
//! The renderer walks a configuration value alongside its [`SchemaNode`] and
//! produces the text fragment for that value. Provider-specific (union)
//! values are handed to the injected [`ProviderResolver`].

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use tfgen_schema::{RecordFields, ScalarKind, SchemaNode, SchemaShape};

use crate::error::{CodegenError, CodegenResult};
use crate::resolver::{ProviderResolver, Resolution};

const INDENT: &str = "  ";

/// Upper bound on consecutive resolver round-trips for one value.
pub const MAX_RESOLUTION_DEPTH: usize = 16;

/// Syntax for record and dictionary values that carry no block marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeObjectSyntax {
    /// `=` opener and no closer. Nested under a key this yields `key = =`.
    #[default]
    Legacy,
    /// Brace-delimited object literal, `key = { ... }`.
    Braced,
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default)]
    pub attribute_objects: AttributeObjectSyntax,
}

/// Dotted location of a value, used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn child(&self, key: &str) -> Self {
        Self(format!("{}.{}", self.0, key))
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text of a rendered value plus the companion data sources it produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    pub text: String,
    pub companions: Vec<String>,
}

/// Per-call state. Owned by a single top-level render call.
struct Scope<'s> {
    resource_type: &'s str,
    companions: Vec<String>,
}

/// Per-key schema lookup of an object body.
enum ChildSchemas<'n> {
    Uniform(&'n SchemaNode),
    Fields(&'n RecordFields),
}

struct Entry {
    text: String,
    is_block: bool,
}

/// Recursive renderer.
#[derive(Clone)]
pub struct Renderer {
    resolver: Arc<dyn ProviderResolver>,
    options: RenderOptions,
}

impl Renderer {
    /// Create a renderer that resolves provider-specific values with `resolver`.
    pub fn new(resolver: Arc<dyn ProviderResolver>) -> Self {
        Self {
            resolver,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Render `value` of `resource_type` against `node`.
    pub fn render(
        &self,
        resource_type: &str,
        node: &SchemaNode,
        value: &Value,
    ) -> CodegenResult<Rendered> {
        self.render_at(resource_type, node, value, &FieldPath::root(resource_type))
    }

    /// Same as [`Renderer::render`], reporting errors relative to `path`.
    pub fn render_at(
        &self,
        resource_type: &str,
        node: &SchemaNode,
        value: &Value,
        path: &FieldPath,
    ) -> CodegenResult<Rendered> {
        let mut scope = Scope {
            resource_type,
            companions: Vec::new(),
        };
        let text = self.render_node(&mut scope, node, value, 0, path, 0)?;
        Ok(Rendered {
            text,
            companions: scope.companions,
        })
    }

    fn render_node(
        &self,
        scope: &mut Scope<'_>,
        node: &SchemaNode,
        value: &Value,
        level: usize,
        path: &FieldPath,
        depth: usize,
    ) -> CodegenResult<String> {
        match node.shape() {
            SchemaShape::Scalar(ScalarKind::String) => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| mismatch(path, "string", value))?;
                Ok(format!("\"{}\"", escape_interpolation(raw)))
            }
            SchemaShape::Scalar(ScalarKind::Boolean) => {
                Ok(matches!(value, Value::Bool(true)).to_string())
            }
            SchemaShape::Scalar(ScalarKind::Number) => Ok(format_number(value, path)),
            SchemaShape::List(element) => self.render_list(scope, element, value, level, path),
            SchemaShape::Dictionary(element) => {
                self.render_object(scope, node, ChildSchemas::Uniform(element), value, level, path)
            }
            SchemaShape::Record(fields) => {
                self.render_object(scope, node, ChildSchemas::Fields(fields), value, level, path)
            }
            SchemaShape::Union(_) => self.render_union(scope, node, value, level, path, depth),
        }
    }

    fn render_list(
        &self,
        scope: &mut Scope<'_>,
        element: &SchemaNode,
        value: &Value,
        level: usize,
        path: &FieldPath,
    ) -> CodegenResult<String> {
        let items = value
            .as_array()
            .ok_or_else(|| mismatch(path, "list", value))?;
        if items.is_empty() {
            return Ok("[]".to_string());
        }

        let child_indent = indent(level + 1);
        let mut out = String::from("[");
        for (i, item) in items.iter().enumerate() {
            let rendered = self.render_node(scope, element, item, level + 1, &path.index(i), 0)?;
            out.push('\n');
            out.push_str(&child_indent);
            out.push_str(&rendered);
            out.push(',');
        }
        out.push('\n');
        out.push_str(&indent(level));
        out.push(']');
        Ok(out)
    }

    fn render_object(
        &self,
        scope: &mut Scope<'_>,
        node: &SchemaNode,
        children: ChildSchemas<'_>,
        value: &Value,
        level: usize,
        path: &FieldPath,
    ) -> CodegenResult<String> {
        let map = value
            .as_object()
            .ok_or_else(|| mismatch(path, node.kind_name(), value))?;
        let quote_keys = matches!(children, ChildSchemas::Uniform(_));
        let braced = node.marker().is_braced()
            || self.options.attribute_objects == AttributeObjectSyntax::Braced;

        let members = lookup_members(map, &children, path)?;

        // Block keys count towards the width even though only attributes are padded.
        let key_width = members
            .iter()
            .map(|(key, _, schema)| match schema.block_schema() {
                Some(_) => key.chars().count(),
                None => display_key(key, quote_keys).chars().count(),
            })
            .max()
            .unwrap_or(0);

        let child_level = level + 1;
        let child_indent = indent(child_level);
        let mut entries = Vec::with_capacity(members.len());

        for (key, item, schema) in members {
            let child_path = path.child(key);
            match schema.block_schema() {
                Some((block, repeated)) => {
                    let blocks: Vec<(&Value, FieldPath)> = if repeated {
                        item.as_array()
                            .ok_or_else(|| mismatch(&child_path, "list", item))?
                            .iter()
                            .enumerate()
                            .map(|(i, v)| (v, child_path.index(i)))
                            .collect()
                    } else {
                        vec![(item, child_path.clone())]
                    };
                    for (block_value, block_path) in blocks {
                        let body =
                            self.render_node(scope, block, block_value, child_level, &block_path, 0)?;
                        entries.push(Entry {
                            text: format!("{}{} {}", child_indent, key, body),
                            is_block: true,
                        });
                    }
                }
                None => {
                    let rendered = self.render_node(scope, schema, item, child_level, &child_path, 0)?;
                    entries.push(Entry {
                        text: format!(
                            "{}{:<width$} = {}",
                            child_indent,
                            display_key(key, quote_keys),
                            rendered,
                            width = key_width
                        ),
                        is_block: false,
                    });
                }
            }
        }

        let body = join_entries(&entries);
        if braced {
            let mut out = String::from("{");
            if !body.is_empty() {
                out.push('\n');
                out.push_str(&body);
            }
            out.push('\n');
            out.push_str(&indent(level));
            out.push('}');
            Ok(out)
        } else if body.is_empty() {
            Ok("=".to_string())
        } else {
            Ok(format!("=\n{}", body))
        }
    }

    fn render_union(
        &self,
        scope: &mut Scope<'_>,
        node: &SchemaNode,
        value: &Value,
        level: usize,
        path: &FieldPath,
        depth: usize,
    ) -> CodegenResult<String> {
        if depth >= MAX_RESOLUTION_DEPTH {
            return Err(CodegenError::ResolutionDepthExceeded {
                path: path.to_string(),
                depth,
            });
        }

        let resolution = self
            .resolver
            .resolve(scope.resource_type, node, value, &mut scope.companions)
            .map_err(|source| CodegenError::Resolution {
                path: path.to_string(),
                source: Box::new(source),
            })?;

        match resolution {
            Resolution::Direct(text) => Ok(text),
            Resolution::Indirect { schema, value } => {
                self.render_node(scope, &schema, &value, level, path, depth + 1)
            }
        }
    }
}

/// Pair every non-null member with its child schema, in value order.
fn lookup_members<'v, 'n>(
    map: &'v Map<String, Value>,
    children: &ChildSchemas<'n>,
    path: &FieldPath,
) -> CodegenResult<Vec<(&'v str, &'v Value, &'n SchemaNode)>> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(key, v)| {
            let schema = match children {
                ChildSchemas::Uniform(schema) => *schema,
                ChildSchemas::Fields(fields) => {
                    let fields: &'n RecordFields = fields;
                    fields.get(key).ok_or_else(|| CodegenError::UnknownField {
                        path: path.to_string(),
                        field: key.clone(),
                    })?
                }
            };
            Ok((key.as_str(), v, schema))
        })
        .collect()
}

/// Join object entries, keeping a blank line around block stanzas.
fn join_entries(entries: &[Entry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            if entry.is_block || entries[i - 1].is_block {
                out.push('\n');
            }
        }
        out.push_str(&entry.text);
    }
    out
}

fn display_key(key: &str, quoted: bool) -> Cow<'_, str> {
    if quoted {
        Cow::Owned(format!("\"{}\"", escape_interpolation(key)))
    } else {
        Cow::Borrowed(key)
    }
}

fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

fn mismatch(path: &FieldPath, expected: &'static str, found: &Value) -> CodegenError {
    CodegenError::ShapeMismatch {
        path: path.to_string(),
        expected,
        found: value_kind(found),
    }
}

/// JSON kind of a value, used in diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Escape Terraform string interpolation.
///
/// Every `${` not already preceded by `$` becomes `$${`.
pub fn escape_interpolation(raw: &str) -> Cow<'_, str> {
    if !raw.contains("${") {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev = None;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') && prev != Some('$') {
            out.push_str("$$");
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    Cow::Owned(out)
}

/// Render a value through permissive numeric coercion.
///
/// Numbers print as-is, booleans as `1`/`0`, null as `0`, strings are
/// parsed after trimming (empty is `0`). Anything else prints `NaN`.
pub fn format_number(value: &Value, path: &FieldPath) -> String {
    let coerced = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return i.to_string();
            }
            if let Some(u) = n.as_u64() {
                return u.to_string();
            }
            n.as_f64().unwrap_or(f64::NAN)
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::String(s) => parse_numeric(s),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    };

    if coerced.is_nan() {
        warn!("Value at {} is not numeric, emitting NaN", path);
    }
    format_f64(coerced)
}

fn parse_numeric(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Rust also accepts "inf" and "nan", which are not numeric here.
    let plain = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    if !plain {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_f64(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{}Infinity", sign)
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        // Exponent form with an explicit sign, `1e+21` and `1.5e-7`.
        let formatted = format!("{:e}", value);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        value.to_string()
    }
}
