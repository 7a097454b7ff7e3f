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

//! Neutral descriptors for the fields and embedded relations of a
//! document-model class, as supplied by an external document-model layer.
//!
//! The deriver does not introspect live model classes. Instead the model
//! layer hands it a [`ModelDescriptor`] per class: an ordered list of
//! [`FieldDescriptor`]s plus an ordered list of [`RelationDescriptor`]s.
//! Embedded relations are resolved back to their target descriptors through
//! a [`ModelRegistry`].

use std::collections::HashMap;

use strum_macros::{Display, EnumString};

use crate::schema::SchemaNode;

/// The semantic type a field was declared with in the document model.
///
/// This is a closed tag set resolved at descriptor-construction time.
/// [`FromStr`](std::str::FromStr) accepts both the canonical tag and the
/// class-name strings used by the originating model layer
/// (e.g. `"BSON::ObjectId"`, `"Mongoid::Boolean"`), so descriptors can be
/// built directly from reflected type names. Anything unrecognized becomes
/// [`DeclaredType::Custom`] and is subject to the deriver's unknown-type
/// policy.
#[derive(Clone, Debug, PartialEq, Eq, Display, EnumString)]
pub enum DeclaredType {
    #[strum(to_string = "string", serialize = "String")]
    String,
    #[strum(to_string = "symbol", serialize = "Symbol")]
    Symbol,
    #[strum(to_string = "integer", serialize = "Integer")]
    Integer,
    #[strum(to_string = "float", serialize = "Float")]
    Float,
    #[strum(
        to_string = "boolean",
        serialize = "Boolean",
        serialize = "Mongoid::Boolean"
    )]
    Boolean,
    /// Arbitrary-precision decimal.
    #[strum(
        to_string = "decimal",
        serialize = "BigDecimal",
        serialize = "BSON::Decimal128"
    )]
    Decimal,
    #[strum(to_string = "date-time", serialize = "DateTime")]
    DateTime,
    #[strum(to_string = "time", serialize = "Time")]
    Time,
    #[strum(to_string = "date", serialize = "Date")]
    Date,
    #[strum(to_string = "object-id", serialize = "BSON::ObjectId")]
    ObjectId,
    /// An untyped array.
    #[strum(to_string = "array", serialize = "Array")]
    Array,
    /// An untyped map/hash.
    #[strum(to_string = "map", serialize = "Hash")]
    Map,
    /// The shared monetary amount type. Emitted as a named record once per
    /// derivation and referenced by fully qualified name afterwards.
    #[strum(to_string = "money", serialize = "Money", serialize = "PreciseMoney")]
    Money,
    /// Any type name outside the closed set above.
    #[strum(default, to_string = "{0}")]
    Custom(String),
}

/// Describes one scalar field of a document model.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, unique within its model. The name `_id` is special-cased
    /// by the deriver: it is always required.
    #[builder(into)]
    pub name: String,
    /// The semantic type the field was declared with.
    pub declared_type: DeclaredType,
    /// Explicit Avro type override. When set, it is used verbatim: no type
    /// inference and no automatic null-union or default for this field.
    pub avro_format: Option<SchemaNode>,
    /// Documentation string attached to the output field.
    #[builder(into)]
    pub doc: Option<String>,
    /// True for belongs-to style foreign keys. Forces the Avro type to
    /// `"string"` regardless of the declared type.
    #[builder(default)]
    pub association_reference: bool,
}

/// The kind of an embedded relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    EmbedsOne,
    EmbedsMany,
}

/// Describes one embedded relation of a document model.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct RelationDescriptor {
    /// Relation (and output field) name.
    #[builder(into)]
    pub name: String,
    /// Explicit target model name. When absent the target is derived from
    /// the relation name by convention, see [`RelationDescriptor::target_name`].
    #[builder(into)]
    pub target_model: Option<String>,
    pub kind: RelationKind,
}

impl RelationDescriptor {
    /// The model name this relation embeds.
    ///
    /// Uses the explicit `target_model` override when given, otherwise
    /// derives one from the relation name: underscored segments are
    /// upper-camel-cased and the trailing segment naively singularized,
    /// so `address` resolves to `Address` and `billing_items` to
    /// `BillingItem`.
    pub fn target_name(&self) -> String {
        match self.target_model {
            Some(ref explicit) => explicit.clone(),
            None => classify(&self.name),
        }
    }
}

/// An ordered snapshot of one model class: its name, scalar fields and
/// embedded relations, all in declaration order.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct ModelDescriptor {
    /// Class name, possibly `::`-qualified (`"Billing::Invoice"`).
    #[builder(into)]
    pub name: String,
    #[builder(default)]
    pub fields: Vec<FieldDescriptor>,
    #[builder(default)]
    pub relations: Vec<RelationDescriptor>,
}

/// Input collaborator resolving model names to their descriptors.
///
/// The deriver consults the registry for the target of every embedded
/// relation it encounters.
pub trait ModelRegistry {
    fn model(&self, name: &str) -> Option<&ModelDescriptor>;
}

/// The empty registry. Usable whenever a model has no embedded relations.
impl ModelRegistry for () {
    fn model(&self, _name: &str) -> Option<&ModelDescriptor> {
        None
    }
}

/// A simple map-backed [`ModelRegistry`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryModelRegistry {
    models: HashMap<String, ModelDescriptor>,
}

impl InMemoryModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `model` under its own name, replacing any previous entry.
    pub fn register(&mut self, model: ModelDescriptor) {
        self.models.insert(model.name.clone(), model);
    }
}

impl ModelRegistry for InMemoryModelRegistry {
    fn model(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.get(name)
    }
}

/// Upper-camel-cases an underscored relation name and singularizes its last
/// segment: `billing_items` becomes `BillingItem`.
fn classify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segments = name.split('_').filter(|s| !s.is_empty()).peekable();
    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();
        let segment = if last {
            singularize(segment)
        } else {
            segment.to_string()
        };
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Naive English singularization, enough for conventional relation names.
fn singularize(segment: &str) -> String {
    if let Some(stem) = segment.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if segment.ends_with('s') && !segment.ends_with("ss") && segment.len() > 1 {
        return segment[..segment.len() - 1].to_string();
    }
    segment.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro_test_helper::TestResult;
    use std::str::FromStr;

    #[test]
    fn declared_type_from_model_layer_class_names() -> TestResult {
        assert_eq!(DeclaredType::from_str("String")?, DeclaredType::String);
        assert_eq!(DeclaredType::from_str("Symbol")?, DeclaredType::Symbol);
        assert_eq!(DeclaredType::from_str("Integer")?, DeclaredType::Integer);
        assert_eq!(DeclaredType::from_str("Float")?, DeclaredType::Float);
        assert_eq!(
            DeclaredType::from_str("Mongoid::Boolean")?,
            DeclaredType::Boolean
        );
        assert_eq!(
            DeclaredType::from_str("BSON::Decimal128")?,
            DeclaredType::Decimal
        );
        assert_eq!(
            DeclaredType::from_str("BigDecimal")?,
            DeclaredType::Decimal
        );
        assert_eq!(DeclaredType::from_str("DateTime")?, DeclaredType::DateTime);
        assert_eq!(DeclaredType::from_str("Time")?, DeclaredType::Time);
        assert_eq!(DeclaredType::from_str("Date")?, DeclaredType::Date);
        assert_eq!(
            DeclaredType::from_str("BSON::ObjectId")?,
            DeclaredType::ObjectId
        );
        assert_eq!(DeclaredType::from_str("Array")?, DeclaredType::Array);
        assert_eq!(DeclaredType::from_str("Hash")?, DeclaredType::Map);
        assert_eq!(DeclaredType::from_str("Money")?, DeclaredType::Money);
        assert_eq!(
            DeclaredType::from_str("PreciseMoney")?,
            DeclaredType::Money
        );

        Ok(())
    }

    #[test]
    fn declared_type_falls_back_to_custom() -> TestResult {
        assert_eq!(
            DeclaredType::from_str("GeoPoint")?,
            DeclaredType::Custom("GeoPoint".to_string())
        );

        Ok(())
    }

    #[test]
    fn declared_type_displays_tag_names() {
        assert_eq!(DeclaredType::ObjectId.to_string(), "object-id");
        assert_eq!(DeclaredType::DateTime.to_string(), "date-time");
        assert_eq!(
            DeclaredType::Custom("GeoPoint".to_string()).to_string(),
            "GeoPoint"
        );
    }

    #[test]
    fn relation_target_name_by_convention() {
        let one = RelationDescriptor::builder()
            .name("address")
            .kind(RelationKind::EmbedsOne)
            .build();
        assert_eq!(one.target_name(), "Address");

        let many = RelationDescriptor::builder()
            .name("billing_items")
            .kind(RelationKind::EmbedsMany)
            .build();
        assert_eq!(many.target_name(), "BillingItem");

        let ies = RelationDescriptor::builder()
            .name("categories")
            .kind(RelationKind::EmbedsMany)
            .build();
        assert_eq!(ies.target_name(), "Category");
    }

    #[test]
    fn relation_target_name_explicit_override_wins() {
        let relation = RelationDescriptor::builder()
            .name("home")
            .target_model("PostalAddress")
            .kind(RelationKind::EmbedsOne)
            .build();
        assert_eq!(relation.target_name(), "PostalAddress");
    }

    #[test]
    fn registry_resolves_registered_models() {
        let mut registry = InMemoryModelRegistry::new();
        registry.register(ModelDescriptor::builder().name("Address").build());

        assert!(registry.model("Address").is_some());
        assert!(registry.model("Unknown").is_none());
        assert!(().model("Address").is_none());
    }
}
