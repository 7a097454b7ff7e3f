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

//! Derive Avro record schemas from the field declarations of an
//! object-document model.
//!
//! The document-model layer supplies a [`ModelDescriptor`]: an ordered list
//! of scalar [`FieldDescriptor`]s and embedded [`RelationDescriptor`]s. A
//! [`SchemaDeriver`] turns it into a [`SchemaNode`] tree mirroring Avro's
//! JSON schema representation:
//!
//! * each declared type maps through a fixed table (strings, ints, logical
//!   timestamp/date types, untyped arrays and maps, ...);
//! * with `optional` derivation every field except `_id` is wrapped in a
//!   `["null", ...]` union with a null default;
//! * embedded relations expand into nested records (arrays of records for
//!   embeds-many), resolved through a [`ModelRegistry`];
//! * the shared `Money` record is defined once per derivation tree and
//!   referenced by fully qualified name afterwards.
//!
//! Derived trees are validated with the [`apache_avro`] schema parser before
//! they are returned. Deployment variations (unknown-type fallback, cents
//! representation, record naming, namespace style) are configured through
//! [`DeriverConfig`].
//!
//! # Example
//!
//! ```
//! use docmodel_avro::{DeclaredType, FieldDescriptor, ModelDescriptor, SchemaDeriver};
//!
//! let model = ModelDescriptor::builder()
//!     .name("Invoice")
//!     .fields(vec![
//!         FieldDescriptor::builder()
//!             .name("_id")
//!             .declared_type(DeclaredType::ObjectId)
//!             .build(),
//!         FieldDescriptor::builder()
//!             .name("total")
//!             .declared_type(DeclaredType::Money)
//!             .build(),
//!     ])
//!     .build();
//!
//! let deriver = SchemaDeriver::default();
//! let schema = deriver.derive(&model, &(), "accounting", true)?;
//! assert_eq!(schema.json()?["name"], "Invoice");
//! # Ok::<(), docmodel_avro::Error>(())
//! ```

pub mod deriver;
pub mod error;
pub mod model;
pub mod schema;

pub use deriver::{
    DecimalFormat, DeriverConfig, EmbeddedNamespace, MapFormat, MoneyCents, RecordNaming,
    SchemaDeriver, UnknownTypePolicy, MONEY_RECORD_NAME,
};
pub use error::Error;
pub use model::{
    DeclaredType, FieldDescriptor, InMemoryModelRegistry, ModelDescriptor, ModelRegistry,
    RelationDescriptor, RelationKind,
};
pub use schema::{Documentation, FieldSchema, Primitive, RecordSchema, SchemaNode};

/// A convenience type alias for `Result`s with [`Error`]s.
pub type DeriveResult<T> = Result<T, Error>;
