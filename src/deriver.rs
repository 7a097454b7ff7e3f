// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Derivation of Avro record schemas from model descriptors.

use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::error::Error;
use crate::model::{
    DeclaredType, FieldDescriptor, ModelDescriptor, ModelRegistry, RelationDescriptor,
    RelationKind,
};
use crate::schema::{FieldSchema, Primitive, RecordSchema, SchemaNode};
use crate::DeriveResult;

/// Name of the shared monetary record type, defined at most once per
/// derivation tree.
pub const MONEY_RECORD_NAME: &str = "Money";

/// What to do with a declared type outside the mapping table when no
/// explicit override is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Fail the derivation with [`Error::UnsupportedType`].
    #[default]
    Strict,
    /// Fall back to `"string"` and log a warning.
    Permissive,
}

/// Numeric representation of the `cents` field of the shared Money record.
/// Both forms appear in valid deployments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MoneyCents {
    Int,
    #[default]
    Double,
}

/// Naming convention for the top-level record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordNaming {
    /// The bare class name: `Billing::Invoice` becomes `Invoice`.
    #[default]
    Bare,
    /// The fully qualified underscored form: `Billing::Invoice` becomes
    /// `billing_invoice`.
    QualifiedUnderscored,
}

/// Namespace style for records nested inside the top-level record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmbeddedNamespace {
    /// Write the parent namespace on every nested record.
    #[default]
    Inherit,
    /// Leave the namespace off; Avro resolution inherits the enclosing one.
    Omit,
}

/// Representation of arbitrary-precision decimal fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecimalFormat {
    /// `{"type": "string", "logicalType": "decimal"}`.
    #[default]
    LogicalString,
    /// The bare `"decimal"` tag. Not standard Avro: a tree containing it is
    /// rejected by the external parser, so it is only reachable through
    /// [`SchemaDeriver::build`].
    Raw,
}

/// Representation of untyped map/hash fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapFormat {
    /// `{"type": "string", "logicalType": "json"}`.
    #[default]
    JsonString,
    /// Plain `"string"`.
    PlainString,
}

/// Deployment-time configuration of the deriver.
///
/// The defaults follow the most common deployment: strict unknown-type
/// handling, double cents, bare record names, inherited namespaces, logical
/// annotations and `doc` attributes on every field.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct DeriverConfig {
    #[builder(default)]
    pub unknown_types: UnknownTypePolicy,
    #[builder(default)]
    pub money_cents: MoneyCents,
    #[builder(default)]
    pub record_naming: RecordNaming,
    #[builder(default)]
    pub embedded_namespace: EmbeddedNamespace,
    #[builder(default)]
    pub decimal_format: DecimalFormat,
    #[builder(default)]
    pub map_format: MapFormat,
    /// Attach a `doc` attribute to scalar output fields, an empty string
    /// when the descriptor carries none.
    #[builder(default = true)]
    pub include_doc: bool,
}

impl Default for DeriverConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Per-call state threaded through the recursive traversal.
///
/// Created fresh at the start of every top-level derivation and dropped with
/// it, so nothing leaks across calls or across threads sharing a deriver.
#[derive(Debug, Default)]
struct DerivationContext {
    money_emitted: bool,
}

/// Derives Avro record schemas from [`ModelDescriptor`]s.
///
/// The deriver holds only its immutable [`DeriverConfig`]; all traversal
/// state lives in a per-call context, so one instance can serve concurrent
/// derivations.
#[derive(Clone, Debug, Default)]
pub struct SchemaDeriver {
    config: DeriverConfig,
}

impl SchemaDeriver {
    pub fn new(config: DeriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeriverConfig {
        &self.config
    }

    /// Derives the Avro record schema for `model` and validates it with the
    /// Avro schema parser.
    ///
    /// `optional` wraps every field except `_id` in a `["null", ...]` union
    /// with a null default, unless the field carries an explicit override.
    /// Embedded relations are resolved through `registry` and expanded into
    /// nested records, sharing one Money definition with the rest of the
    /// tree.
    pub fn derive(
        &self,
        model: &ModelDescriptor,
        registry: &dyn ModelRegistry,
        namespace: &str,
        optional: bool,
    ) -> DeriveResult<SchemaNode> {
        let record = self.build(model, registry, namespace, optional)?;
        let json = record.json()?;
        apache_avro::Schema::parse(&json).map_err(|source| Error::SchemaValidation {
            model: model.name.clone(),
            source: Box::new(source),
        })?;
        Ok(record)
    }

    /// Like [`derive`](Self::derive) but without the final validation pass,
    /// for deployments that post-process the tree before parsing it.
    pub fn build(
        &self,
        model: &ModelDescriptor,
        registry: &dyn ModelRegistry,
        namespace: &str,
        optional: bool,
    ) -> DeriveResult<SchemaNode> {
        debug!(
            "deriving Avro record schema for model `{}` ({} fields, {} relations)",
            model.name,
            model.fields.len(),
            model.relations.len()
        );

        let mut context = DerivationContext::default();
        let fields = self.record_fields(model, registry, namespace, optional, &mut context)?;

        Ok(SchemaNode::Record(RecordSchema {
            name: self.record_name(&model.name),
            namespace: Some(namespace.to_string()),
            fields,
        }))
    }

    /// Scalar fields in declaration order, then embeds-one relations, then
    /// embeds-many relations, each group in declaration order.
    fn record_fields(
        &self,
        model: &ModelDescriptor,
        registry: &dyn ModelRegistry,
        namespace: &str,
        optional: bool,
        context: &mut DerivationContext,
    ) -> DeriveResult<Vec<FieldSchema>> {
        let mut fields = Vec::with_capacity(model.fields.len() + model.relations.len());

        for field in &model.fields {
            fields.push(self.scalar_field(model, field, namespace, optional, context)?);
        }

        for kind in [RelationKind::EmbedsOne, RelationKind::EmbedsMany] {
            for relation in model.relations.iter().filter(|r| r.kind == kind) {
                fields.push(self.relation_field(
                    model, relation, registry, namespace, optional, context,
                )?);
            }
        }

        Ok(fields)
    }

    fn scalar_field(
        &self,
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        namespace: &str,
        optional: bool,
        context: &mut DerivationContext,
    ) -> DeriveResult<FieldSchema> {
        // `_id` is the document key: always required, never defaulted.
        let required = field.name == "_id";

        let (schema, overridden) = match field.avro_format {
            Some(ref explicit) => (explicit.clone(), true),
            None => (
                self.infer_type(model, field, namespace, context)?,
                false,
            ),
        };

        let wrap = optional && !required && !overridden;
        Ok(FieldSchema {
            name: field.name.clone(),
            schema: if wrap { schema.nullable() } else { schema },
            doc: self.doc_attribute(field),
            default: if wrap { Some(JsonValue::Null) } else { None },
        })
    }

    /// The fixed type-mapping table of the deriver.
    fn infer_type(
        &self,
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        namespace: &str,
        context: &mut DerivationContext,
    ) -> DeriveResult<SchemaNode> {
        if field.association_reference {
            // Belongs-to foreign keys are stored as the referenced id.
            return Ok(Primitive::String.into());
        }

        let schema = match field.declared_type {
            DeclaredType::String | DeclaredType::Symbol => Primitive::String.into(),
            DeclaredType::Integer => Primitive::Int.into(),
            DeclaredType::Float => Primitive::Double.into(),
            DeclaredType::Boolean => Primitive::Boolean.into(),
            DeclaredType::Decimal => match self.config.decimal_format {
                DecimalFormat::LogicalString => {
                    SchemaNode::logical(Primitive::String, "decimal")
                }
                DecimalFormat::Raw => Primitive::Decimal.into(),
            },
            DeclaredType::DateTime | DeclaredType::Time => {
                SchemaNode::logical(Primitive::Long, "timestamp-millis")
            }
            DeclaredType::Date => SchemaNode::logical(Primitive::Int, "date"),
            DeclaredType::ObjectId => Primitive::String.into(),
            DeclaredType::Array => SchemaNode::Array {
                items: Box::new(Primitive::String.into()),
                default: Some(JsonValue::Array(Vec::new())),
            },
            DeclaredType::Map => match self.config.map_format {
                MapFormat::JsonString => SchemaNode::logical(Primitive::String, "json"),
                MapFormat::PlainString => Primitive::String.into(),
            },
            DeclaredType::Money => self.money_schema(namespace, context),
            DeclaredType::Custom(_) => match self.config.unknown_types {
                UnknownTypePolicy::Strict => {
                    return Err(Error::UnsupportedType {
                        model: model.name.clone(),
                        field: field.name.clone(),
                        declared: field.declared_type.clone(),
                    });
                }
                UnknownTypePolicy::Permissive => {
                    warn!(
                        "falling back to \"string\" for unsupported declared type `{}` on field `{}` of model `{}`",
                        field.declared_type, field.name, model.name
                    );
                    Primitive::String.into()
                }
            },
        };

        Ok(schema)
    }

    /// The shared Money record: a full definition the first time it is seen
    /// in this derivation, a fully qualified reference afterwards.
    fn money_schema(&self, namespace: &str, context: &mut DerivationContext) -> SchemaNode {
        if context.money_emitted {
            return SchemaNode::Ref(format!("{namespace}.{MONEY_RECORD_NAME}"));
        }
        context.money_emitted = true;

        let cents = match self.config.money_cents {
            MoneyCents::Int => Primitive::Int,
            MoneyCents::Double => Primitive::Double,
        };
        SchemaNode::Record(RecordSchema {
            name: MONEY_RECORD_NAME.to_string(),
            namespace: self.embedded_namespace(namespace),
            fields: vec![
                FieldSchema::required("cents", cents.into()),
                FieldSchema::required("currency_iso", Primitive::String.into()),
            ],
        })
    }

    fn relation_field(
        &self,
        model: &ModelDescriptor,
        relation: &RelationDescriptor,
        registry: &dyn ModelRegistry,
        namespace: &str,
        optional: bool,
        context: &mut DerivationContext,
    ) -> DeriveResult<FieldSchema> {
        let target = relation.target_name();
        let target_model =
            registry
                .model(&target)
                .ok_or_else(|| Error::RelationResolution {
                    model: model.name.clone(),
                    relation: relation.name.clone(),
                    target: target.clone(),
                })?;

        let fields =
            self.record_fields(target_model, registry, namespace, optional, context)?;
        let record = SchemaNode::Record(RecordSchema {
            name: relation.name.clone(),
            namespace: self.embedded_namespace(namespace),
            fields,
        });

        let schema = match relation.kind {
            RelationKind::EmbedsOne => record,
            RelationKind::EmbedsMany => SchemaNode::Array {
                items: Box::new(record),
                default: None,
            },
        };

        Ok(FieldSchema {
            name: relation.name.clone(),
            schema: if optional { schema.nullable() } else { schema },
            doc: None,
            default: if optional { Some(JsonValue::Null) } else { None },
        })
    }

    fn doc_attribute(&self, field: &FieldDescriptor) -> Option<String> {
        if self.config.include_doc {
            Some(field.doc.clone().unwrap_or_default())
        } else {
            None
        }
    }

    fn embedded_namespace(&self, namespace: &str) -> Option<String> {
        match self.config.embedded_namespace {
            EmbeddedNamespace::Inherit => Some(namespace.to_string()),
            EmbeddedNamespace::Omit => None,
        }
    }

    fn record_name(&self, model_name: &str) -> String {
        match self.config.record_naming {
            RecordNaming::Bare => model_name
                .rsplit("::")
                .next()
                .unwrap_or(model_name)
                .to_string(),
            RecordNaming::QualifiedUnderscored => model_name
                .split("::")
                .map(underscore)
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

/// Converts a camel-cased class-name segment to snake case.
fn underscore(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let before_lower = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if after_lower || (i > 0 && before_lower) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_handles_camel_case_and_acronyms() {
        assert_eq!(underscore("TestModel"), "test_model");
        assert_eq!(underscore("Invoice"), "invoice");
        assert_eq!(underscore("HTTPServer"), "http_server");
        assert_eq!(underscore("TestModel2"), "test_model2");
    }

    #[test]
    fn record_name_follows_naming_convention() {
        let bare = SchemaDeriver::default();
        assert_eq!(bare.record_name("Billing::Invoice"), "Invoice");
        assert_eq!(bare.record_name("TestModel"), "TestModel");

        let qualified = SchemaDeriver::new(
            DeriverConfig::builder()
                .record_naming(RecordNaming::QualifiedUnderscored)
                .build(),
        );
        assert_eq!(qualified.record_name("Billing::Invoice"), "billing_invoice");
        assert_eq!(qualified.record_name("TestModel"), "test_model");
    }

    #[test]
    fn config_defaults_match_the_common_deployment() {
        let config = DeriverConfig::default();
        assert_eq!(config.unknown_types, UnknownTypePolicy::Strict);
        assert_eq!(config.money_cents, MoneyCents::Double);
        assert_eq!(config.record_naming, RecordNaming::Bare);
        assert_eq!(config.embedded_namespace, EmbeddedNamespace::Inherit);
        assert_eq!(config.decimal_format, DecimalFormat::LogicalString);
        assert_eq!(config.map_format, MapFormat::JsonString);
        assert!(config.include_doc);
    }

    #[test]
    fn money_schema_emits_definition_once_then_references() {
        let deriver = SchemaDeriver::default();
        let mut context = DerivationContext::default();

        let first = deriver.money_schema("ns1", &mut context);
        assert!(matches!(first, SchemaNode::Record(ref record) if record.name == "Money"));

        let second = deriver.money_schema("ns1", &mut context);
        assert_eq!(second, SchemaNode::Ref("ns1.Money".to_string()));
    }
}
