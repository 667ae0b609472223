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

//! This module provides a [`TypeGraph`], which is the single, version independent table of
//! type definitions that every parsed [`crate::Metadata`] hands out. Types are referred to by
//! [`TypeId`], which is just an index into the table. Types can refer to each other (and to
//! themselves), so the graph may contain cycles.
//!
//! [`TypeGraph`] implements [`scale_type_resolver::TypeResolver`], so it can be handed to any
//! crate which is generic over that.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use parity_scale_codec::{Compact, Decode, Input};
use scale_type_resolver::{ResolvedTypeVisitor, TypeResolver};

pub use scale_type_resolver::{BitsOrderFormat, BitsStoreFormat, Primitive};

/// The identifier of a type in a [`TypeGraph`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
#[display(fmt = "{_0}")]
pub struct TypeId(pub u32);

impl TypeId {
    /// The position of this type in the graph.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TypeId {
    fn from(value: u32) -> Self {
        TypeId(value)
    }
}

// Type IDs are compact encoded wherever metadata refers to them.
impl Decode for TypeId {
    fn decode<I: Input>(input: &mut I) -> Result<Self, parity_scale_codec::Error> {
        Compact::<u32>::decode(input).map(|id| TypeId(id.0))
    }
}

/// An error working with the [`TypeGraph`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TypeGraphError {
    #[display(fmt = "Type with ID {_0} not found")]
    TypeNotFound(TypeId),
    #[display(fmt = "Type with ID {_0} is a single field wrapper which eventually wraps itself")]
    CyclicWrapper(TypeId),
    #[display(fmt = "Type with ID {id} cannot be compact encoded: {reason}")]
    InvalidCompact { id: TypeId, reason: &'static str },
    #[display(fmt = "Type with ID {id} is not a supported bit sequence: {reason}")]
    UnsupportedBitSequenceFormat { id: TypeId, reason: &'static str },
    #[display(fmt = "Type with ID {id} has more than one variant with index {index}")]
    DuplicateVariantIndex { id: TypeId, index: u8 },
    #[display(fmt = "Type with ID {_0} was reserved but never given a definition")]
    ReservedButUnset(TypeId),
    #[display(fmt = "Type with ID {_0} contains itself without a length or variant in between")]
    InfinitelySized(TypeId),
}

#[cfg(feature = "std")]
impl std::error::Error for TypeGraphError {}

/// A single type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    /// The path to the type, eg `["sp_runtime", "multiaddress", "MultiAddress"]`. May be empty.
    pub path: Vec<String>,
    /// Generic parameters of the type, if any.
    pub params: Vec<Parameter>,
    /// How the type is laid out on the wire.
    pub shape: Shape,
    /// Documentation for the type.
    pub docs: Vec<String>,
}

impl TypeDefinition {
    /// A path-less, parameter-less and undocumented type with the given shape.
    pub fn new(shape: Shape) -> Self {
        TypeDefinition { path: Vec::new(), params: Vec::new(), shape, docs: Vec::new() }
    }

    /// Give the type a path, built from some `::` separated string.
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.split("::").filter(|s| !s.is_empty()).map(Into::into).collect();
        self
    }

    /// Add a named generic parameter to the type.
    pub fn with_param(mut self, name: impl Into<String>, ty: Option<TypeId>) -> Self {
        self.params.push(Parameter { name: name.into(), ty });
        self
    }

    /// The last segment of the path, which is usually the name of the type.
    pub fn name(&self) -> Option<&str> {
        self.path.last().map(|s| s.as_str())
    }

    /// The path segments joined with `::`.
    pub fn path_string(&self) -> String {
        self.path.join("::")
    }
}

/// A generic parameter of some type.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct Parameter {
    /// The name of the parameter, eg `T`.
    pub name: String,
    /// The concrete type of the parameter, if known.
    pub ty: Option<TypeId>,
}

/// The shape of a type, which is what determines how values of it are SCALE encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A primitive value.
    Primitive(Primitive),
    /// A struct. Fields are all named, or all unnamed.
    Composite(Vec<Field>),
    /// An enum.
    Variant(Vec<Variant>),
    /// A compact length prefixed sequence of the given type.
    Sequence(TypeId),
    /// A fixed length array of the given type.
    Array(TypeId, u32),
    /// A tuple of types.
    Tuple(Vec<TypeId>),
    /// A compact encoding of the given type.
    Compact(TypeId),
    /// A bit sequence. `store` should resolve to an unsigned integer and `order` to one of
    /// `bitvec::order::{Lsb0, Msb0}`.
    BitSequence {
        /// The type of each stored word.
        store: TypeId,
        /// The type describing the bit order.
        order: TypeId,
    },
}

impl Shape {
    // The nth type whose values are embedded directly in values of this shape, with no length
    // prefix or variant index in between.
    fn inline_child(&self, n: usize) -> Option<TypeId> {
        match self {
            Shape::Composite(fields) => fields.get(n).map(|f| f.ty),
            Shape::Tuple(ids) => ids.get(n).copied(),
            Shape::Array(ty, _) => (n == 0).then_some(*ty),
            _ => None,
        }
    }

    /// A short human friendly description of this kind of shape, for use in errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Primitive(_) => "primitive",
            Shape::Composite(_) => "composite",
            Shape::Variant(_) => "variant",
            Shape::Sequence(_) => "sequence",
            Shape::Array(..) => "array",
            Shape::Tuple(_) => "tuple",
            Shape::Compact(_) => "compact",
            Shape::BitSequence { .. } => "bit sequence",
        }
    }
}

/// A field in a composite type or variant.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct Field {
    /// The field name, if it has one.
    pub name: Option<String>,
    /// The field type.
    pub ty: TypeId,
    /// The name of the type as written in the source, if known.
    pub type_name: Option<String>,
    /// Documentation for the field.
    pub docs: Vec<String>,
}

impl Field {
    /// A named field.
    pub fn named(name: impl Into<String>, ty: TypeId) -> Self {
        Field { name: Some(name.into()), ty, type_name: None, docs: Vec::new() }
    }

    /// An unnamed field.
    pub fn unnamed(ty: TypeId) -> Self {
        Field { name: None, ty, type_name: None, docs: Vec::new() }
    }
}

/// A variant in a variant type.
#[derive(Debug, Clone, PartialEq, Eq, Decode)]
pub struct Variant {
    /// The variant name.
    pub name: String,
    /// Fields of the variant.
    pub fields: Vec<Field>,
    /// The index encoded to pick this variant.
    pub index: u8,
    /// Documentation for the variant.
    pub docs: Vec<String>,
}

impl Variant {
    /// A variant with the given fields and no docs.
    pub fn new(name: impl Into<String>, index: u8, fields: Vec<Field>) -> Self {
        Variant { name: name.into(), index, fields, docs: Vec::new() }
    }
}

/// What a compact encoded type decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactTarget {
    /// A zero sized type; nothing is encoded.
    Unit,
    /// An unsigned integer up to 128 bits wide.
    Int(Primitive),
}

impl CompactTarget {
    /// The largest value which can be represented.
    pub fn max_value(&self) -> u128 {
        match self {
            CompactTarget::Unit => 0,
            CompactTarget::Int(Primitive::U8) => u8::MAX as u128,
            CompactTarget::Int(Primitive::U16) => u16::MAX as u128,
            CompactTarget::Int(Primitive::U32) => u32::MAX as u128,
            CompactTarget::Int(Primitive::U64) => u64::MAX as u128,
            CompactTarget::Int(_) => u128::MAX,
        }
    }
}

/// A table of type definitions indexed by [`TypeId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeGraph {
    types: Vec<TypeDefinition>,
    by_path: HashMap<String, TypeId>,
}

impl TypeGraph {
    /// Construct a graph from a list of definitions. The [`TypeId`] of each definition is its
    /// position in the list.
    pub fn from_types(types: Vec<TypeDefinition>) -> Self {
        let mut by_path = HashMap::new();
        for (idx, ty) in types.iter().enumerate() {
            if !ty.path.is_empty() {
                // The first type to claim a path keeps it.
                by_path.entry(ty.path_string()).or_insert(TypeId(idx as u32));
            }
        }
        TypeGraph { types, by_path }
    }

    /// The number of types in the graph.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Is the graph empty?
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over each type in the graph along with its ID.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (TypeId, &TypeDefinition)> {
        self.types.iter().enumerate().map(|(idx, ty)| (TypeId(idx as u32), ty))
    }

    /// Look up a type definition.
    pub fn resolve(&self, id: TypeId) -> Option<&TypeDefinition> {
        self.types.get(id.index())
    }

    /// Look up the shape of a type, failing if it doesn't exist.
    pub fn shape(&self, id: TypeId) -> Result<&Shape, TypeGraphError> {
        self.resolve(id).map(|ty| &ty.shape).ok_or(TypeGraphError::TypeNotFound(id))
    }

    /// Return the first type for which the predicate returns true.
    pub fn search(
        &self,
        mut f: impl FnMut(&TypeDefinition) -> bool,
    ) -> Option<(TypeId, &TypeDefinition)> {
        self.iter().find(|(_, ty)| f(ty))
    }

    /// Find a type by its full path. Segments can be separated by `::` or `.`, so
    /// `sp_core.crypto.AccountId32` and `sp_core::crypto::AccountId32` are equivalent.
    pub fn find_by_path(&self, path: &str) -> Option<TypeId> {
        if path.contains('.') && !path.contains("::") {
            let normalized: Vec<&str> = path.split('.').collect();
            self.by_path.get(&normalized.join("::")).copied()
        } else {
            self.by_path.get(path).copied()
        }
    }

    /// Follow single field composites and single element tuples until reaching a type which is
    /// neither, returning it and its shape. Such wrappers are transparent on the wire.
    pub fn flatten(&self, id: TypeId) -> Result<(TypeId, &Shape), TypeGraphError> {
        let mut current = id;
        // A chain of wrappers longer than the graph must be revisiting something.
        for _ in 0..=self.types.len() {
            let shape = self.shape(current)?;
            current = match shape {
                Shape::Composite(fields) if fields.len() == 1 => fields[0].ty,
                Shape::Tuple(ids) if ids.len() == 1 => ids[0],
                _ => return Ok((current, shape)),
            };
        }
        Err(TypeGraphError::CyclicWrapper(id))
    }

    /// Work out what the inner type of some `Compact<T>` should be decoded as.
    pub fn compact_target(&self, of: TypeId) -> Result<CompactTarget, TypeGraphError> {
        let invalid = |reason| TypeGraphError::InvalidCompact { id: of, reason };
        match self.flatten(of)?.1 {
            Shape::Primitive(
                p @ (Primitive::U8
                | Primitive::U16
                | Primitive::U32
                | Primitive::U64
                | Primitive::U128),
            ) => Ok(CompactTarget::Int(*p)),
            Shape::Primitive(Primitive::U256) => Err(invalid("256 bit integers are too wide")),
            Shape::Primitive(_) => Err(invalid("only unsigned integers can be compact encoded")),
            Shape::Tuple(ids) if ids.is_empty() => Ok(CompactTarget::Unit),
            Shape::Composite(fields) if fields.is_empty() => Ok(CompactTarget::Unit),
            _ => Err(invalid("expected an unsigned integer or unit type")),
        }
    }

    /// Work out the store and order formats of a bit sequence type. The order is taken from
    /// the second generic parameter when one is present, falling back to the `order` type.
    pub fn bit_sequence_format(
        &self,
        id: TypeId,
    ) -> Result<(BitsStoreFormat, BitsOrderFormat), TypeGraphError> {
        let unsupported = |reason| TypeGraphError::UnsupportedBitSequenceFormat { id, reason };
        let ty = self.resolve(id).ok_or(TypeGraphError::TypeNotFound(id))?;
        let Shape::BitSequence { store, order } = &ty.shape else {
            return Err(unsupported("not a bit sequence"));
        };

        let store_format = match self.flatten(*store)?.1 {
            Shape::Primitive(Primitive::U8) => BitsStoreFormat::U8,
            Shape::Primitive(Primitive::U16) => BitsStoreFormat::U16,
            Shape::Primitive(Primitive::U32) => BitsStoreFormat::U32,
            Shape::Primitive(Primitive::U64) => BitsStoreFormat::U64,
            _ => return Err(unsupported("store type must be u8, u16, u32 or u64")),
        };

        let order_id = ty.params.get(1).and_then(|p| p.ty).unwrap_or(*order);
        let order_ty = self.resolve(order_id).ok_or(TypeGraphError::TypeNotFound(order_id))?;
        let order_format = match order_ty.name() {
            Some("Lsb0") => BitsOrderFormat::Lsb0,
            Some("Msb0") => BitsOrderFormat::Msb0,
            _ => return Err(unsupported("order type must be bitvec::order::Lsb0 or Msb0")),
        };

        Ok((store_format, order_format))
    }

    /// Does every value of this type encode to no bytes at all? This is true of unit types and
    /// of anything built only out of them.
    pub fn is_zero_sized(&self, id: TypeId) -> Result<bool, TypeGraphError> {
        self.is_zero_sized_on(id, &mut Vec::new())
    }

    fn is_zero_sized_on(&self, id: TypeId, path: &mut Vec<TypeId>) -> Result<bool, TypeGraphError> {
        if path.contains(&id) {
            return Err(TypeGraphError::InfinitelySized(id));
        }
        let shape = self.shape(id)?;
        let zero_sized = match shape {
            Shape::Array(_, 0) => true,
            Shape::Composite(_) | Shape::Tuple(_) | Shape::Array(..) => {
                path.push(id);
                let mut all = true;
                for child in (0..).map_while(|n| shape.inline_child(n)) {
                    if !self.is_zero_sized_on(child, path)? {
                        all = false;
                        break;
                    }
                }
                path.pop();
                all
            }
            Shape::Compact(of) => matches!(self.compact_target(*of), Ok(CompactTarget::Unit)),
            _ => false,
        };
        Ok(zero_sized)
    }

    // A type reachable from itself through composite fields, tuple elements and array elements
    // alone would need infinitely many bytes to encode.
    fn check_inline_cycles(&self) -> Result<(), TypeGraphError> {
        const UNSEEN: u8 = 0;
        const ON_PATH: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNSEEN; self.types.len()];
        for root in 0..self.types.len() {
            if state[root] != UNSEEN {
                continue;
            }
            state[root] = ON_PATH;
            let mut stack = vec![(root, 0usize)];
            while let Some(&(idx, next)) = stack.last() {
                let id = TypeId(idx as u32);
                let Some(child) = self.shape(id)?.inline_child(next) else {
                    state[idx] = DONE;
                    stack.pop();
                    continue;
                };
                let top = stack.len() - 1;
                stack[top].1 += 1;

                match state.get(child.index()).copied() {
                    Some(UNSEEN) => {
                        state[child.index()] = ON_PATH;
                        stack.push((child.index(), 0));
                    }
                    Some(ON_PATH) => return Err(TypeGraphError::InfinitelySized(child)),
                    Some(_) => {}
                    None => return Err(TypeGraphError::TypeNotFound(child)),
                }
            }
        }
        Ok(())
    }

    /// Check that every type referenced anywhere exists, that compact and bit sequence types
    /// are well formed, that variant indexes are unique, that no wrapper wraps itself and that
    /// no type contains itself directly.
    pub fn validate_all(&self) -> Result<(), TypeGraphError> {
        let check =
            |id: TypeId| self.resolve(id).map(|_| ()).ok_or(TypeGraphError::TypeNotFound(id));

        for (id, ty) in self.iter() {
            for param in &ty.params {
                if let Some(p) = param.ty {
                    check(p)?;
                }
            }
            match &ty.shape {
                Shape::Primitive(_) => {}
                Shape::Composite(fields) => {
                    fields.iter().try_for_each(|f| check(f.ty))?;
                    if fields.len() == 1 {
                        self.flatten(id)?;
                    }
                }
                Shape::Variant(variants) => {
                    let mut seen = HashSet::new();
                    for variant in variants {
                        if !seen.insert(variant.index) {
                            return Err(TypeGraphError::DuplicateVariantIndex {
                                id,
                                index: variant.index,
                            });
                        }
                        variant.fields.iter().try_for_each(|f| check(f.ty))?;
                    }
                }
                Shape::Sequence(inner) | Shape::Array(inner, _) => check(*inner)?,
                Shape::Tuple(ids) => {
                    ids.iter().try_for_each(|i| check(*i))?;
                    if ids.len() == 1 {
                        self.flatten(id)?;
                    }
                }
                Shape::Compact(inner) => {
                    check(*inner)?;
                    self.compact_target(*inner)?;
                }
                Shape::BitSequence { store, order } => {
                    check(*store)?;
                    check(*order)?;
                    self.bit_sequence_format(id)?;
                }
            }
        }
        self.check_inline_cycles()
    }
}

/// Build a [`TypeGraph`] one definition at a time. IDs can be reserved before their definition
/// is known, which is needed to build self referential types.
#[derive(Debug, Default)]
pub struct TypeGraphBuilder {
    types: Vec<Option<TypeDefinition>>,
}

impl TypeGraphBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, returning its ID.
    pub fn add(&mut self, ty: TypeDefinition) -> TypeId {
        let id = self.reserve();
        self.set(id, ty);
        id
    }

    /// Reserve an ID to be given a definition later via [`TypeGraphBuilder::set()`].
    pub fn reserve(&mut self) -> TypeId {
        self.types.push(None);
        TypeId(self.types.len() as u32 - 1)
    }

    /// Set the definition for some ID. IDs not handed out by this builder are ignored.
    pub fn set(&mut self, id: TypeId, ty: TypeDefinition) {
        if let Some(slot) = self.types.get_mut(id.index()) {
            *slot = Some(ty);
        }
    }

    /// Finish building, failing if any reserved ID was never given a definition.
    pub fn build(self) -> Result<TypeGraph, TypeGraphError> {
        let types = self
            .types
            .into_iter()
            .enumerate()
            .map(|(idx, ty)| ty.ok_or(TypeGraphError::ReservedButUnset(TypeId(idx as u32))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeGraph::from_types(types))
    }
}

fn to_resolver_field(field: &Field) -> scale_type_resolver::Field<'_, TypeId> {
    scale_type_resolver::Field { name: field.name.as_deref(), id: field.ty }
}

impl TypeResolver for TypeGraph {
    type TypeId = TypeId;
    type Error = TypeGraphError;

    fn resolve_type<'this, V: ResolvedTypeVisitor<'this, TypeId = Self::TypeId>>(
        &'this self,
        type_id: Self::TypeId,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let Some(ty) = self.resolve(type_id) else {
            return Ok(visitor.visit_not_found());
        };
        let path = ty.path.iter().map(|s| s.as_str());

        let value = match &ty.shape {
            Shape::Composite(fields) => {
                visitor.visit_composite(path, fields.iter().map(to_resolver_field))
            }
            Shape::Variant(variants) => visitor.visit_variant(
                path,
                variants.iter().map(|v| scale_type_resolver::Variant {
                    index: v.index,
                    name: &v.name,
                    fields: v.fields.iter().map(to_resolver_field),
                }),
            ),
            Shape::Sequence(inner) => visitor.visit_sequence(path, *inner),
            Shape::Array(inner, len) => visitor.visit_array(*inner, *len as usize),
            Shape::Tuple(ids) => visitor.visit_tuple(ids.iter().copied()),
            Shape::Primitive(p) => visitor.visit_primitive(*p),
            Shape::Compact(inner) => visitor.visit_compact(*inner),
            Shape::BitSequence { .. } => {
                let (store, order) = self.bit_sequence_format(type_id)?;
                visitor.visit_bit_sequence(store, order)
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{to_resolved_info, ResolvedTypeInfo};
    use alloc::boxed::Box;
    use alloc::vec;

    fn prim(p: Primitive) -> TypeDefinition {
        TypeDefinition::new(Shape::Primitive(p))
    }

    #[test]
    fn flatten_follows_single_field_wrappers() {
        let mut b = TypeGraphBuilder::new();
        let u32_id = b.add(prim(Primitive::U32));
        let tuple = b.add(TypeDefinition::new(Shape::Tuple(vec![u32_id])));
        let wrapper =
            b.add(TypeDefinition::new(Shape::Composite(vec![Field::named("inner", tuple)])));
        let types = b.build().unwrap();

        let (id, shape) = types.flatten(wrapper).unwrap();
        assert_eq!(id, u32_id);
        assert_eq!(shape, &Shape::Primitive(Primitive::U32));
    }

    #[test]
    fn flatten_detects_self_wrapping_types() {
        let mut b = TypeGraphBuilder::new();
        let a = b.reserve();
        let c = b.add(TypeDefinition::new(Shape::Tuple(vec![a])));
        b.set(a, TypeDefinition::new(Shape::Composite(vec![Field::unnamed(c)])));
        let types = b.build().unwrap();

        assert_eq!(types.flatten(a), Err(TypeGraphError::CyclicWrapper(a)));
        assert_eq!(types.validate_all(), Err(TypeGraphError::CyclicWrapper(a)));
    }

    #[test]
    fn compact_targets() {
        let mut b = TypeGraphBuilder::new();
        let u64_id = b.add(prim(Primitive::U64));
        let u256_id = b.add(prim(Primitive::U256));
        let i32_id = b.add(prim(Primitive::I32));
        let unit = b.add(TypeDefinition::new(Shape::Tuple(vec![])));
        let wrapped =
            b.add(TypeDefinition::new(Shape::Composite(vec![Field::named("value", u64_id)])));
        let types = b.build().unwrap();

        assert_eq!(types.compact_target(u64_id), Ok(CompactTarget::Int(Primitive::U64)));
        assert_eq!(types.compact_target(wrapped), Ok(CompactTarget::Int(Primitive::U64)));
        assert_eq!(types.compact_target(unit), Ok(CompactTarget::Unit));
        assert!(matches!(
            types.compact_target(u256_id),
            Err(TypeGraphError::InvalidCompact { .. })
        ));
        assert!(matches!(types.compact_target(i32_id), Err(TypeGraphError::InvalidCompact { .. })));
    }

    #[test]
    fn bit_sequence_order_prefers_second_param() {
        let mut b = TypeGraphBuilder::new();
        let store = b.add(prim(Primitive::U32));
        let unit = || TypeDefinition::new(Shape::Composite(vec![]));
        let lsb = b.add(unit().with_path("bitvec::order::Lsb0"));
        let msb = b.add(unit().with_path("bitvec::order::Msb0"));
        let plain = b.add(TypeDefinition::new(Shape::BitSequence { store, order: lsb }));
        let with_params = b.add(
            TypeDefinition::new(Shape::BitSequence { store, order: lsb })
                .with_param("T", Some(store))
                .with_param("O", Some(msb)),
        );
        let bad = b.add(TypeDefinition::new(Shape::BitSequence { store: lsb, order: lsb }));
        let types = b.build().unwrap();

        assert_eq!(
            types.bit_sequence_format(plain),
            Ok((BitsStoreFormat::U32, BitsOrderFormat::Lsb0))
        );
        assert_eq!(
            types.bit_sequence_format(with_params),
            Ok((BitsStoreFormat::U32, BitsOrderFormat::Msb0))
        );
        assert!(matches!(
            types.bit_sequence_format(bad),
            Err(TypeGraphError::UnsupportedBitSequenceFormat { .. })
        ));
    }

    #[test]
    fn find_by_path_accepts_either_separator() {
        let mut b = TypeGraphBuilder::new();
        let id = b.add(
            TypeDefinition::new(Shape::Array(TypeId(1), 32))
                .with_path("sp_core::crypto::AccountId32"),
        );
        b.add(prim(Primitive::U8));
        let types = b.build().unwrap();

        assert_eq!(types.find_by_path("sp_core::crypto::AccountId32"), Some(id));
        assert_eq!(types.find_by_path("sp_core.crypto.AccountId32"), Some(id));
        assert_eq!(types.find_by_path("sp_core::AccountId32"), None);
    }

    #[test]
    fn validate_all_catches_problems() {
        let missing = TypeGraph::from_types(vec![TypeDefinition::new(Shape::Sequence(TypeId(4)))]);
        assert_eq!(missing.validate_all(), Err(TypeGraphError::TypeNotFound(TypeId(4))));

        let dupes = TypeGraph::from_types(vec![TypeDefinition::new(Shape::Variant(vec![
            Variant::new("A", 1, vec![]),
            Variant::new("B", 1, vec![]),
        ]))]);
        assert_eq!(
            dupes.validate_all(),
            Err(TypeGraphError::DuplicateVariantIndex { id: TypeId(0), index: 1 })
        );

        let mut b = TypeGraphBuilder::new();
        b.reserve();
        assert_eq!(b.build(), Err(TypeGraphError::ReservedButUnset(TypeId(0))));
    }

    #[test]
    fn recursive_types_are_allowed() {
        // enum List { Nil, Cons(u8, Box<List>) }
        let mut b = TypeGraphBuilder::new();
        let list = b.reserve();
        let u8_id = b.add(prim(Primitive::U8));
        b.set(
            list,
            TypeDefinition::new(Shape::Variant(vec![
                Variant::new("Nil", 0, vec![]),
                Variant::new("Cons", 1, vec![Field::unnamed(u8_id), Field::unnamed(list)]),
            ]))
            .with_path("List"),
        );
        let types = b.build().unwrap();
        assert_eq!(types.validate_all(), Ok(()));
    }

    #[test]
    fn types_containing_themselves_inline_are_rejected() {
        // struct A { a: A, b: u8 }
        let direct = TypeGraph::from_types(vec![
            TypeDefinition::new(Shape::Composite(vec![
                Field::named("a", TypeId(0)),
                Field::named("b", TypeId(1)),
            ])),
            prim(Primitive::U8),
        ]);
        assert_eq!(direct.validate_all(), Err(TypeGraphError::InfinitelySized(TypeId(0))));

        // (u8, [B; 2]) where B is that tuple.
        let mut b = TypeGraphBuilder::new();
        let u8_id = b.add(prim(Primitive::U8));
        let tuple = b.reserve();
        let array = b.add(TypeDefinition::new(Shape::Array(tuple, 2)));
        b.set(tuple, TypeDefinition::new(Shape::Tuple(vec![u8_id, array])));
        let types = b.build().unwrap();
        assert_eq!(types.validate_all(), Err(TypeGraphError::InfinitelySized(tuple)));

        // Going through a sequence is fine, since an empty one ends the recursion.
        let mut b = TypeGraphBuilder::new();
        let u8_id = b.add(prim(Primitive::U8));
        let node = b.reserve();
        let children = b.add(TypeDefinition::new(Shape::Sequence(node)));
        b.set(
            node,
            TypeDefinition::new(Shape::Composite(vec![
                Field::named("value", u8_id),
                Field::named("children", children),
            ])),
        );
        assert_eq!(b.build().unwrap().validate_all(), Ok(()));
    }

    #[test]
    fn zero_sized_types() {
        let mut b = TypeGraphBuilder::new();
        let unit = b.add(TypeDefinition::new(Shape::Tuple(vec![])));
        let u8_id = b.add(prim(Primitive::U8));
        let units = b.add(TypeDefinition::new(Shape::Array(unit, 1000)));
        let no_bytes = b.add(TypeDefinition::new(Shape::Array(u8_id, 0)));
        let compact_unit = b.add(TypeDefinition::new(Shape::Compact(unit)));
        let mixed = b.add(TypeDefinition::new(Shape::Tuple(vec![unit, u8_id])));
        let seq = b.add(TypeDefinition::new(Shape::Sequence(unit)));
        let types = b.build().unwrap();

        for id in [unit, units, no_bytes, compact_unit] {
            assert_eq!(types.is_zero_sized(id), Ok(true), "{id}");
        }
        for id in [u8_id, mixed, seq] {
            assert_eq!(types.is_zero_sized(id), Ok(false), "{id}");
        }

        let cyclic = TypeGraph::from_types(vec![TypeDefinition::new(Shape::Tuple(vec![
            TypeId(0),
            TypeId(0),
        ]))]);
        let err = TypeGraphError::InfinitelySized(TypeId(0));
        assert_eq!(cyclic.is_zero_sized(TypeId(0)), Err(err));
    }

    #[test]
    fn type_resolver_visits_expected_shapes() {
        let mut b = TypeGraphBuilder::new();
        let u8_id = b.add(prim(Primitive::U8));
        let seq = b.add(TypeDefinition::new(Shape::Sequence(u8_id)));
        let compact = b.add(TypeDefinition::new(Shape::Compact(u8_id)));
        let s = b.add(TypeDefinition::new(Shape::Composite(vec![
            Field::named("a", seq),
            Field::named("b", compact),
        ])));
        let types = b.build().unwrap();

        assert_eq!(
            to_resolved_info(s, &types),
            ResolvedTypeInfo::CompositeOf(vec![
                (
                    Some("a".into()),
                    ResolvedTypeInfo::SequenceOf(Box::new(ResolvedTypeInfo::Primitive(
                        Primitive::U8
                    )))
                ),
                (
                    Some("b".into()),
                    ResolvedTypeInfo::Compact(Box::new(ResolvedTypeInfo::Primitive(
                        Primitive::U8
                    )))
                ),
            ])
        );
        assert_eq!(to_resolved_info(TypeId(99), &types), ResolvedTypeInfo::NotFound);
    }
}
