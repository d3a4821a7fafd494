//! Provider-specific resolution of union-shaped values.
//!
//! Union schemas describe values whose concrete form only the owning provider
//! understands (raw expressions, references, lookups). The render engine never
//! inspects them itself; it asks a [`ProviderResolver`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use tfgen_schema::{ScalarKind, SchemaNode, SchemaShape};

use crate::error::{CodegenError, CodegenResult};
use crate::render::value_kind;

/// Object key marking a raw expression: `{"$expr": "azurerm_subnet.main.id"}`.
pub const EXPRESSION_KEY: &str = "$expr";

/// Outcome of resolving a union value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Pre-rendered text spliced into the output verbatim.
    Direct(String),
    /// A concrete alternative and the value to render against it.
    Indirect { schema: SchemaNode, value: Value },
}

/// Resolves provider-specific values.
///
/// Implementations may push companion data-source stanzas onto `companions`;
/// they end up in the module's data-source output.
#[cfg_attr(test, mockall::automock)]
pub trait ProviderResolver: Send + Sync {
    fn resolve(
        &self,
        resource_type: &str,
        node: &SchemaNode,
        value: &Value,
        companions: &mut Vec<String>,
    ) -> CodegenResult<Resolution>;
}

/// Fallback resolver for providers without dedicated resolution logic.
///
/// Raw expressions become [`Resolution::Direct`]; any other value resolves to
/// the first alternative whose shape accepts it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralResolver;

impl StructuralResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ProviderResolver for StructuralResolver {
    fn resolve(
        &self,
        resource_type: &str,
        node: &SchemaNode,
        value: &Value,
        _companions: &mut Vec<String>,
    ) -> CodegenResult<Resolution> {
        if let Some(expression) = raw_expression(value) {
            return Ok(Resolution::Direct(expression.to_string()));
        }

        let unresolved = |reason: String| CodegenError::UnresolvedUnion {
            resource_type: resource_type.to_string(),
            union: node.display_name().to_string(),
            reason,
        };

        let SchemaShape::Union(alternatives) = node.shape() else {
            return Err(unresolved(format!("{} is not a union", node.kind_name())));
        };

        alternatives
            .iter()
            .find(|alternative| accepts(alternative, value))
            .map(|alternative| Resolution::Indirect {
                schema: alternative.clone(),
                value: value.clone(),
            })
            .ok_or_else(|| {
                unresolved(format!(
                    "no alternative accepts value of kind {}",
                    value_kind(value)
                ))
            })
    }
}

fn raw_expression(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(EXPRESSION_KEY)?.as_str()
}

/// Shallow structural check of a value against a schema.
fn accepts(node: &SchemaNode, value: &Value) -> bool {
    match (node.shape(), value) {
        (SchemaShape::Scalar(ScalarKind::String), Value::String(_)) => true,
        (SchemaShape::Scalar(ScalarKind::Boolean), Value::Bool(_)) => true,
        (SchemaShape::Scalar(ScalarKind::Number), Value::Number(_)) => true,
        (SchemaShape::List(_), Value::Array(_)) => true,
        (SchemaShape::Dictionary(_), Value::Object(_)) => true,
        (SchemaShape::Record(fields), Value::Object(map)) => {
            map.keys().all(|k| fields.get(k).is_some())
                && fields
                    .iter()
                    .filter(|(name, _)| fields.is_required(name))
                    .all(|(name, _)| map.get(name).map_or(false, |v| !v.is_null()))
        }
        (SchemaShape::Union(alternatives), _) => alternatives.iter().any(|a| accepts(a, value)),
        _ => false,
    }
}

/// Routes resolution to the resolver of the provider owning a resource type.
///
/// The provider is the resource type's prefix up to the first `_`
/// (`azurerm_subnet` belongs to `azurerm`).
#[derive(Clone)]
pub struct ResolverChain {
    providers: HashMap<String, Arc<dyn ProviderResolver>>,
    fallback: Arc<dyn ProviderResolver>,
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::new(Arc::new(StructuralResolver::new()))
    }
}

impl ResolverChain {
    pub fn new(fallback: Arc<dyn ProviderResolver>) -> Self {
        Self {
            providers: HashMap::new(),
            fallback,
        }
    }

    /// Register a resolver for one provider.
    pub fn with_provider(
        mut self,
        provider: impl Into<String>,
        resolver: Arc<dyn ProviderResolver>,
    ) -> Self {
        self.providers.insert(provider.into(), resolver);
        self
    }

    pub fn provider_of(resource_type: &str) -> &str {
        resource_type
            .split_once('_')
            .map_or(resource_type, |(provider, _)| provider)
    }

    fn resolver_for(&self, resource_type: &str) -> &Arc<dyn ProviderResolver> {
        self.providers
            .get(Self::provider_of(resource_type))
            .unwrap_or(&self.fallback)
    }
}

impl ProviderResolver for ResolverChain {
    fn resolve(
        &self,
        resource_type: &str,
        node: &SchemaNode,
        value: &Value,
        companions: &mut Vec<String>,
    ) -> CodegenResult<Resolution> {
        debug!(
            "Resolving {} value for {}",
            node.display_name(),
            resource_type
        );
        self.resolver_for(resource_type)
            .resolve(resource_type, node, value, companions)
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
