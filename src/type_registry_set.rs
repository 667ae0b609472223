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

//! Layering several [`TypeRegistry`]s so that chain or runtime specific definitions override
//! the basic ones. Legacy metadata is lowered against a [`TypeRegistrySet`].

use crate::lookup_name::{LookupName, LookupNameDef};
use crate::lowering::LegacyTypeError;
use crate::type_shape::TypeShape;
use crate::TypeRegistry;
use alloc::borrow::{Cow, ToOwned};
use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// An ordered stack of [`TypeRegistry`]s, built with [`FromIterator`]. The registry added last
/// is consulted first.
#[derive(Debug, Clone)]
pub struct TypeRegistrySet<'a> {
    registries: VecDeque<Cow<'a, TypeRegistry>>,
}

impl<'a> TypeRegistrySet<'a> {
    /// Clone any borrowed registries so that the set no longer borrows anything.
    pub fn to_owned(self) -> TypeRegistrySet<'static> {
        TypeRegistrySet {
            registries: self.registries.into_iter().map(|r| Cow::Owned(r.into_owned())).collect(),
        }
    }

    /// Push a registry underneath the others, so it is consulted last.
    pub fn prepend(&mut self, types: impl Into<Cow<'a, TypeRegistry>>) {
        self.registries.push_front(types.into());
    }

    /// Push a registry on top of the others, so it is consulted first.
    pub fn append(&mut self, types: impl Into<Cow<'a, TypeRegistry>>) {
        self.registries.push_back(types.into());
    }

    /// Find the shape of the type with the given [`LookupName`].
    ///
    /// This will work through the inner type registries from latest to earliest until it finds a
    /// matching type. Pallet scoped lookups look for a type in that pallet in every registry
    /// before looking for a global one. If nothing matches a path like `a::b::Foo`, we try again
    /// with just `Foo`.
    ///
    /// Any names in the returned shape inherit the pallet scope of the lookup.
    pub fn resolve(&self, name: &LookupName) -> Result<Option<TypeShape>, LegacyTypeError> {
        let mut candidates: Vec<LookupName> = Vec::with_capacity(4);
        candidates.push(name.clone());

        if let LookupNameDef::Named { name: ty_name, params } = name.def() {
            if let Some((_, last)) = ty_name.rsplit_once("::") {
                let def = LookupNameDef::generic(last, params.clone());
                candidates.push(name.with_def(def));
            }
        }

        // If the lookup was pallet scoped, then after trying everything in the pallet we
        // remove the scope and try again in the global scope.
        let scope = name.pallet();
        if scope.is_some() {
            let global: Vec<LookupName> = candidates
                .iter()
                .map(|c| {
                    let mut c = c.clone();
                    c.take_pallet();
                    c
                })
                .collect();
            candidates.extend(global);
        }

        for candidate in &candidates {
            for registry in self.registries.iter().rev() {
                if let Some(shape) = registry.resolve(candidate)? {
                    return Ok(Some(match scope {
                        Some(pallet) => with_scope(shape, pallet),
                        None => shape,
                    }));
                }
            }
        }

        Ok(None)
    }

    /// Like [`TypeRegistrySet::resolve()`], but parses the name from a string first.
    pub fn resolve_str(&self, name: &str) -> Result<Option<TypeShape>, LegacyTypeError> {
        let name = LookupName::parse(name)
            .map_err(|e| LegacyTypeError::InvalidName { name: name.to_owned(), error: e })?;
        self.resolve(&name)
    }
}

// Names without a pallet scope are given the one provided.
fn with_scope(shape: TypeShape, pallet: &str) -> TypeShape {
    shape.map_names(|n| if n.pallet().is_none() { n.in_pallet(pallet) } else { n })
}

impl<'a, R: Into<Cow<'a, TypeRegistry>>> core::iter::FromIterator<R> for TypeRegistrySet<'a> {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        TypeRegistrySet { registries: iter.into_iter().map(Into::into).collect() }
    }
}

impl<'a> From<&'a TypeRegistry> for Cow<'a, TypeRegistry> {
    fn from(value: &'a TypeRegistry) -> Self {
        Cow::Borrowed(value)
    }
}

impl From<TypeRegistry> for Cow<'_, TypeRegistry> {
    fn from(value: TypeRegistry) -> Self {
        Cow::Owned(value)
    }
}
