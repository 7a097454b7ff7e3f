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

//! The schema tree produced by derivation.
//!
//! [`SchemaNode`] is a neutral value mirroring Avro's JSON schema
//! representation. Its [`Serialize`] impl renders exactly the nested
//! key/value structure (`type`, `name`, `namespace`, `fields`, `items`,
//! `logicalType`, `default`) that the external schema parser consumes.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value as JsonValue;
use strum_macros::Display;

use crate::DeriveResult;

/// Documentation attached to an output record field.
pub type Documentation = Option<String>;

/// An Avro primitive type tag.
///
/// `decimal` is not a primitive in the Avro specification; it exists here
/// for deployments that emit the bare tag and post-process the tree
/// themselves (see [`DecimalFormat::Raw`](crate::deriver::DecimalFormat::Raw)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Primitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Decimal,
}

impl Serialize for Primitive {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// One node of the derived schema tree.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaNode {
    /// A bare primitive type, serialized as a plain string.
    Primitive(Primitive),
    /// A primitive annotated with a `logicalType` refinement.
    Logical {
        base: Primitive,
        logical_type: String,
    },
    /// An `array` schema. The untyped-array mapping carries an empty-array
    /// default.
    Array {
        items: Box<SchemaNode>,
        default: Option<JsonValue>,
    },
    /// A union, serialized as the ordered list of its alternatives.
    Union(Vec<SchemaNode>),
    /// A named `record` schema.
    Record(RecordSchema),
    /// A reference to an already defined named schema, serialized as its
    /// fully qualified name.
    Ref(String),
    /// A verbatim caller-supplied schema fragment, passed through untouched.
    Custom(JsonValue),
}

impl SchemaNode {
    pub fn logical(base: Primitive, logical_type: &str) -> Self {
        Self::Logical {
            base,
            logical_type: logical_type.to_string(),
        }
    }

    /// Wraps this node as `["null", self]`.
    pub fn nullable(self) -> Self {
        Self::Union(vec![Self::Primitive(Primitive::Null), self])
    }

    /// Renders the tree in the schema-interchange representation handed to
    /// the external schema parser.
    pub fn json(&self) -> DeriveResult<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<Primitive> for SchemaNode {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

/// A named `record` schema with ordered fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub fields: Vec<FieldSchema>,
}

/// One field of a [`RecordSchema`].
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub schema: SchemaNode,
    pub doc: Documentation,
    /// Serialized only when present; `Some(JsonValue::Null)` renders an
    /// explicit `"default": null`.
    pub default: Option<JsonValue>,
}

impl FieldSchema {
    /// A field with neither documentation nor a default.
    pub fn required(name: &str, schema: SchemaNode) -> Self {
        Self {
            name: name.to_string(),
            schema,
            doc: None,
            default: None,
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SchemaNode::Primitive(primitive) => primitive.serialize(serializer),
            SchemaNode::Logical { base, logical_type } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", base)?;
                map.serialize_entry("logicalType", logical_type)?;
                map.end()
            }
            SchemaNode::Array { items, default } => {
                let mut map = serializer
                    .serialize_map(Some(2 + if default.is_some() { 1 } else { 0 }))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                if let Some(default) = default {
                    map.serialize_entry("default", default)?;
                }
                map.end()
            }
            SchemaNode::Union(variants) => serializer.collect_seq(variants),
            SchemaNode::Record(record) => record.serialize(serializer),
            SchemaNode::Ref(fullname) => serializer.serialize_str(fullname),
            SchemaNode::Custom(fragment) => fragment.serialize(serializer),
        }
    }
}

impl Serialize for RecordSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "record")?;
        map.serialize_entry("name", &self.name)?;
        if let Some(ref namespace) = self.namespace {
            map.serialize_entry("namespace", namespace)?;
        }
        map.serialize_entry("fields", &self.fields)?;
        map.end()
    }
}

impl Serialize for FieldSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;
        if let Some(ref doc) = self.doc {
            map.serialize_entry("doc", doc)?;
        }
        if let Some(ref default) = self.default {
            map.serialize_entry("default", default)?;
        }
        map.end()
    }
}
