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

use crate::model::DeclaredType;

/// Errors encountered while deriving an Avro record schema from a model
/// descriptor.
///
/// Every variant carries the model and field/relation names needed to locate
/// the offending declaration. Derivation never returns a partial schema: the
/// first error aborts the whole call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The declared type of a field has no entry in the type-mapping table,
    /// no explicit Avro override was given, and the deriver is configured
    /// with [`UnknownTypePolicy::Strict`](crate::deriver::UnknownTypePolicy::Strict).
    #[error("field `{field}` of model `{model}` has unsupported declared type `{declared}`")]
    UnsupportedType {
        model: String,
        field: String,
        declared: DeclaredType,
    },

    /// The target model of an embedded relation is not known to the
    /// [`ModelRegistry`](crate::model::ModelRegistry).
    #[error(
        "cannot resolve target model `{target}` for embedded relation `{relation}` of model `{model}`"
    )]
    RelationResolution {
        model: String,
        relation: String,
        target: String,
    },

    /// The derived schema tree was rejected by the Avro schema parser.
    #[error("derived schema for model `{model}` was rejected by the Avro parser")]
    SchemaValidation {
        model: String,
        #[source]
        source: Box<apache_avro::Error>,
    },

    /// The schema tree could not be rendered as JSON.
    #[error(transparent)]
    RenderJson(#[from] serde_json::Error),
}
