// Copyright (C) 2024 Parity Technologies (UK) Ltd. (admin@parity.io)
// This file is a part of the scale-metadata-codec crate.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//         http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Turning the type names found in legacy metadata into entries in a [`TypeGraph`], so that
//! legacy and modern metadata can be decoded in exactly the same way.

use crate::lookup_name::{self, LookupName, LookupNameDef};
use crate::type_graph::{
    Field, Shape, TypeDefinition, TypeGraph, TypeGraphBuilder, TypeGraphError, TypeId, Variant,
};
use crate::type_registry_set::TypeRegistrySet;
use crate::type_shape::{TypeShape, VariantDesc};
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;

/// An error resolving a legacy type name.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum LegacyTypeError {
    #[display(fmt = "Cannot parse '{name}' into a type name: {error}")]
    InvalidName { name: String, error: lookup_name::ParseError },
    #[display(fmt = "Type '{_0}' not found")]
    TypeNotFound(String),
    #[display(
        fmt = "Wrong number of params provided for {name}: expected {expected} but got {found}"
    )]
    ParamCountMismatch { name: String, expected: usize, found: usize },
    #[display(fmt = "Type '{_0}' is an alias which, eventually, refers to itself")]
    AliasCycle(String),
    #[display(fmt = "Array '{name}' has length {length}, which is too long")]
    ArrayTooLong { name: String, length: usize },
}

#[cfg(feature = "std")]
impl std::error::Error for LegacyTypeError {}

/// Lowers [`LookupName`]s into a [`TypeGraph`] under construction. Each distinct name (and
/// pallet scope) is lowered once, and aliases share the ID of whatever they point to.
pub(crate) struct Lowering<'r, 'a> {
    types: &'r TypeRegistrySet<'a>,
    builder: TypeGraphBuilder,
    cache: HashMap<LookupName, TypeId>,
    // Names which have been given an ID up front, regardless of pallet scope.
    bound: HashMap<String, TypeId>,
}

impl<'r, 'a> Lowering<'r, 'a> {
    pub fn new(types: &'r TypeRegistrySet<'a>) -> Self {
        Lowering {
            types,
            builder: TypeGraphBuilder::new(),
            cache: HashMap::new(),
            bound: HashMap::new(),
        }
    }

    /// Access the underlying builder, to add types which don't come from a name.
    pub fn builder(&mut self) -> &mut TypeGraphBuilder {
        &mut self.builder
    }

    /// Any type named `name` will be given this ID.
    pub fn bind(&mut self, name: &str, id: TypeId) {
        self.bound.insert(name.to_string(), id);
    }

    /// Parse a type name string and lower it.
    pub fn lower_str(
        &mut self,
        name: &str,
        pallet: Option<&str>,
    ) -> Result<TypeId, LegacyTypeError> {
        let mut lookup = LookupName::parse(name)
            .map_err(|error| LegacyTypeError::InvalidName { name: name.to_string(), error })?;
        if let Some(pallet) = pallet {
            lookup = lookup.in_pallet(pallet);
        }
        self.lower(&lookup)
    }

    /// Lower a name, returning the ID that it was given.
    pub fn lower(&mut self, name: &LookupName) -> Result<TypeId, LegacyTypeError> {
        if let Some(id) = self.cached(name) {
            return Ok(id);
        }

        match name.def() {
            LookupNameDef::Unnamed { params } => {
                let id = self.reserve(name);
                let ids = params
                    .iter()
                    .map(|p| self.lower(&name.with_def(p.clone())))
                    .collect::<Result<Vec<_>, _>>()?;
                self.builder.set(id, TypeDefinition::new(Shape::Tuple(ids)));
                Ok(id)
            }
            LookupNameDef::Array { param, length } => {
                let too_long =
                    || LegacyTypeError::ArrayTooLong { name: name.to_string(), length: *length };
                let length = u32::try_from(*length).map_err(|_| too_long())?;
                let id = self.reserve(name);
                let inner = self.lower(&name.with_def((**param).clone()))?;
                self.builder.set(id, TypeDefinition::new(Shape::Array(inner, length)));
                Ok(id)
            }
            LookupNameDef::Named { .. } => self.lower_named(name),
        }
    }

    /// Finish lowering, handing back the graph of everything that was lowered.
    pub fn finish(self) -> Result<TypeGraph, TypeGraphError> {
        self.builder.build()
    }

    fn cached(&self, name: &LookupName) -> Option<TypeId> {
        if let Some(id) = self.cache.get(name) {
            return Some(*id);
        }
        match name.def() {
            LookupNameDef::Named { name, params } if params.is_empty() => {
                self.bound.get(name.as_str()).copied()
            }
            _ => None,
        }
    }

    fn reserve(&mut self, name: &LookupName) -> TypeId {
        let id = self.builder.reserve();
        self.cache.insert(name.clone(), id);
        id
    }

    fn lower_named(&mut self, name: &LookupName) -> Result<TypeId, LegacyTypeError> {
        // Follow aliases by name until we hit something with a concrete shape. Every name we
        // pass through ends up with the same ID.
        let mut aliases = vec![name.clone()];
        let mut current = name.clone();
        let shape = loop {
            let shape = self
                .types
                .resolve(&current)?
                .ok_or_else(|| LegacyTypeError::TypeNotFound(current.to_string()))?;

            let target = match shape {
                TypeShape::AliasOf(target) => target,
                shape => break shape,
            };

            let structural = !matches!(target.def(), LookupNameDef::Named { .. });
            if let Some(id) = self.cached(&target) {
                return Ok(self.cache_all(aliases, id));
            } else if structural {
                let id = self.lower(&target)?;
                return Ok(self.cache_all(aliases, id));
            } else if aliases.contains(&target) {
                return Err(LegacyTypeError::AliasCycle(name.to_string()));
            }

            aliases.push(target.clone());
            current = target;
        };

        let id = self.builder.reserve();
        for alias in aliases {
            self.cache.insert(alias, id);
        }

        tracing::trace!(name = %current, pallet = ?current.pallet(), %id, "lowering legacy type");
        let path = current.def().name().unwrap_or_default();
        let definition = self.lower_shape(shape)?;
        self.builder.set(id, definition.with_path(path));
        Ok(id)
    }

    fn cache_all(&mut self, names: Vec<LookupName>, id: TypeId) -> TypeId {
        for name in names {
            self.cache.insert(name, id);
        }
        id
    }

    fn lower_shape(&mut self, shape: TypeShape) -> Result<TypeDefinition, LegacyTypeError> {
        let shape = match shape {
            TypeShape::StructOf(fields) => Shape::Composite(self.lower_fields(fields)?),
            // Named tuples are kept as composites, so that they keep a name.
            TypeShape::TupleOf(names) => Shape::Composite(self.lower_unnamed(names)?),
            TypeShape::EnumOf(variants) => {
                let variants = variants
                    .into_iter()
                    .map(|v| {
                        let fields = match v.fields {
                            VariantDesc::StructOf(fields) => self.lower_fields(fields)?,
                            VariantDesc::TupleOf(names) => self.lower_unnamed(names)?,
                        };
                        Ok(Variant::new(v.name, v.index, fields))
                    })
                    .collect::<Result<_, LegacyTypeError>>()?;
                Shape::Variant(variants)
            }
            TypeShape::SequenceOf(name) => Shape::Sequence(self.lower(&name)?),
            TypeShape::BitSequence { order, store } => {
                let store = self.lower(&store)?;
                let order = self.lower(&order)?;
                return Ok(TypeDefinition::new(Shape::BitSequence { store, order })
                    .with_param("Store", Some(store))
                    .with_param("Order", Some(order)));
            }
            TypeShape::Compact(name) => Shape::Compact(self.lower(&name)?),
            TypeShape::Primitive(p) => Shape::Primitive(p),
            // An alias is a transparent single element wrapper.
            TypeShape::AliasOf(name) => Shape::Tuple(vec![self.lower(&name)?]),
        };
        Ok(TypeDefinition::new(shape))
    }

    fn lower_fields(
        &mut self,
        fields: Vec<crate::type_shape::Field>,
    ) -> Result<Vec<Field>, LegacyTypeError> {
        fields.into_iter().map(|f| Ok(Field::named(f.name, self.lower(&f.value)?))).collect()
    }

    fn lower_unnamed(&mut self, names: Vec<LookupName>) -> Result<Vec<Field>, LegacyTypeError> {
        names.iter().map(|n| Ok(Field::unnamed(self.lower(n)?))).collect()
    }
}
