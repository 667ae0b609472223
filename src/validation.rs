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

//! Checking that the types described by some metadata line up with what we expect them to be.
//!
//! Code which works with strongly typed calls, events or storage values can describe the shape
//! it expects as an [`Expected`] (or derive one via [`StaticShape`]) and then [`validate()`] it
//! against a [`TypeGraph`] to catch a chain whose types have moved on.
//!
//! Single field composites and single element tuples are transparent here just as they are on
//! the wire, so expecting a `u32` will happily validate against a `struct Foo(u32)`.

use crate::metadata::Metadata;
use crate::type_graph::{Field, Primitive, Shape, TypeGraph, TypeGraphError, TypeId};
use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// The shape that we expect some type to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// Anything goes, so long as the type exists.
    Any,
    /// A specific primitive.
    Primitive(Primitive),
    /// A compact encoded value of the given shape.
    Compact(Box<Expected>),
    /// A variable length sequence.
    Sequence(Box<Expected>),
    /// A fixed length array.
    Array(Box<Expected>, u32),
    /// A tuple, or a composite with unnamed fields.
    Tuple(Vec<Expected>),
    /// A composite. Fields are compared by position, and by name where a name is given.
    Composite(Vec<ExpectedField>),
    /// A variant type containing at least the variants given.
    Variant(Vec<ExpectedVariant>),
    /// A bit sequence in any supported format.
    BitSequence,
    /// A string.
    Str,
}

/// A field of some [`Expected::Composite`] or [`ExpectedVariant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedField {
    /// The field name, if it should be checked.
    pub name: Option<String>,
    /// The expected shape of the field.
    pub shape: Expected,
}

impl ExpectedField {
    /// A field which must have the given name.
    pub fn named(name: impl Into<String>, shape: Expected) -> Self {
        ExpectedField { name: Some(name.into()), shape }
    }

    /// A field whose name is not checked.
    pub fn unnamed(shape: Expected) -> Self {
        ExpectedField { name: None, shape }
    }
}

/// A variant of some [`Expected::Variant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedVariant {
    /// The variant name.
    pub name: String,
    /// The index the variant is expected to be encoded with.
    pub index: u8,
    /// The fields of the variant.
    pub fields: Vec<ExpectedField>,
}

impl ExpectedVariant {
    /// Describe a variant.
    pub fn new(name: impl Into<String>, index: u8, fields: Vec<ExpectedField>) -> Self {
        ExpectedVariant { name: name.into(), index, fields }
    }
}

impl Expected {
    /// A short human friendly description of this kind of expectation, for use in errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expected::Any => "anything",
            Expected::Primitive(_) => "primitive",
            Expected::Compact(_) => "compact",
            Expected::Sequence(_) => "sequence",
            Expected::Array(..) => "array",
            Expected::Tuple(_) => "tuple",
            Expected::Composite(_) => "composite",
            Expected::Variant(_) => "variant",
            Expected::BitSequence => "bit sequence",
            Expected::Str => "string",
        }
    }

    // The one thing that a single field composite or single element tuple wraps.
    fn single_inner(&self) -> Option<&Expected> {
        match self {
            Expected::Tuple(items) if items.len() == 1 => Some(&items[0]),
            Expected::Composite(fields) if fields.len() == 1 => Some(&fields[0].shape),
            _ => None,
        }
    }
}

/// An error validating some type against an [`Expected`] shape.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ValidationError {
    #[display(fmt = "Type with ID {_0} not found")]
    TypeNotFound(TypeId),
    #[display(fmt = "{_0}")]
    InvalidType(TypeGraphError),
    #[display(fmt = "Expected a {expected} but type {id} is a {found}")]
    ShapeMismatch { id: TypeId, expected: &'static str, found: &'static str },
    #[display(fmt = "Expected primitive {:?} but found {:?}", expected, found)]
    PrimitiveMismatch { expected: Primitive, found: Primitive },
    #[display(fmt = "Expected {expected} fields but found {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[display(fmt = "Expected a field named '{expected}' but found {:?}", found)]
    FieldNameMismatch { expected: String, found: Option<String> },
    #[display(fmt = "Expected an array of length {expected} but found length {found}")]
    ArrayLengthMismatch { expected: u32, found: u32 },
    #[display(fmt = "Variant '{name}' not found")]
    VariantNotFound { name: String },
    #[display(fmt = "Variant '{name}' has index {found} but index {expected} was expected")]
    VariantIndexMismatch { name: String, expected: u8, found: u8 },
    #[display(fmt = "Type {id} is not a valid compact type: {error}")]
    InvalidCompact { id: TypeId, error: TypeGraphError },
    #[display(fmt = "Pallet '{_0}' not found")]
    PalletNotFound(String),
    #[display(fmt = "'{item}' not found in pallet '{pallet}'")]
    ItemNotFound { pallet: String, item: String },
    #[display(fmt = "In field '{field}': {error}")]
    InField { field: String, error: Box<ValidationError> },
    #[display(fmt = "In variant '{variant}': {error}")]
    InVariant { variant: String, error: Box<ValidationError> },
}

#[cfg(feature = "std")]
impl std::error::Error for ValidationError {}

impl From<TypeGraphError> for ValidationError {
    fn from(e: TypeGraphError) -> Self {
        match e {
            TypeGraphError::TypeNotFound(id) => ValidationError::TypeNotFound(id),
            e => ValidationError::InvalidType(e),
        }
    }
}

/// Check that the type with the given ID matches the shape we expect.
pub fn validate(
    expected: &Expected,
    id: TypeId,
    types: &TypeGraph,
) -> Result<(), ValidationError> {
    let shape = types.shape(id)?;

    // Matching structures are compared as they are, so that single field composites still
    // have their field names checked.
    match (expected, shape) {
        (Expected::Any, _) => return Ok(()),
        (Expected::Composite(e), Shape::Composite(a)) if e.len() == a.len() => {
            return validate_fields(e, a, types);
        }
        (Expected::Tuple(e), Shape::Tuple(a)) if e.len() == a.len() => {
            return validate_items(e, a.iter().copied(), types);
        }
        (Expected::Tuple(e), Shape::Composite(a))
            if e.len() == a.len() && a.iter().all(|f| f.name.is_none()) =>
        {
            return validate_items(e, a.iter().map(|f| f.ty), types);
        }
        _ => {}
    }

    // Otherwise, wrappers on either side are looked through. An expected wrapper is only
    // unwrapped when the live type doesn't itself hold some other number of fields.
    let live_fields = match shape {
        Shape::Composite(fields) => Some(fields.len()),
        Shape::Tuple(items) => Some(items.len()),
        _ => None,
    };
    if let Some(inner) = expected.single_inner().filter(|_| live_fields.unwrap_or(1) == 1) {
        return validate(inner, id, types);
    }
    let (flat_id, flat) = types.flatten(id)?;
    if flat_id != id {
        return validate(expected, flat_id, types);
    }

    match (expected, flat) {
        (Expected::Primitive(e), Shape::Primitive(a)) => {
            if e == a {
                Ok(())
            } else {
                Err(ValidationError::PrimitiveMismatch { expected: *e, found: *a })
            }
        }
        (Expected::Str, Shape::Primitive(Primitive::Str)) => Ok(()),
        (Expected::Compact(e), Shape::Compact(of)) => {
            types
                .compact_target(*of)
                .map_err(|error| ValidationError::InvalidCompact { id, error })?;
            validate(e, *of, types)
        }
        (Expected::Sequence(e), Shape::Sequence(of)) => validate(e, *of, types),
        (Expected::Array(e, len), Shape::Array(of, found)) => {
            if len != found {
                let (expected, found) = (*len, *found);
                return Err(ValidationError::ArrayLengthMismatch { expected, found });
            }
            validate(e, *of, types)
        }
        (Expected::Tuple(e), Shape::Tuple(a)) => {
            Err(ValidationError::WrongFieldCount { expected: e.len(), found: a.len() })
        }
        (Expected::Tuple(e), Shape::Composite(a)) if a.iter().all(|f| f.name.is_none()) => {
            Err(ValidationError::WrongFieldCount { expected: e.len(), found: a.len() })
        }
        (Expected::Composite(e), Shape::Composite(a)) => {
            Err(ValidationError::WrongFieldCount { expected: e.len(), found: a.len() })
        }
        (Expected::Variant(e), Shape::Variant(a)) => {
            for expected_variant in e {
                let variant = a
                    .iter()
                    .find(|v| v.name == expected_variant.name)
                    .ok_or_else(|| ValidationError::VariantNotFound {
                        name: expected_variant.name.clone(),
                    })?;
                if variant.index != expected_variant.index {
                    return Err(ValidationError::VariantIndexMismatch {
                        name: variant.name.clone(),
                        expected: expected_variant.index,
                        found: variant.index,
                    });
                }
                validate_fields(&expected_variant.fields, &variant.fields, types).map_err(
                    |error| ValidationError::InVariant {
                        variant: variant.name.clone(),
                        error: Box::new(error),
                    },
                )?;
            }
            Ok(())
        }
        (Expected::BitSequence, Shape::BitSequence { .. }) => {
            types.bit_sequence_format(id)?;
            Ok(())
        }
        _ => Err(ValidationError::ShapeMismatch {
            id,
            expected: expected.kind_name(),
            found: flat.kind_name(),
        }),
    }
}

fn validate_fields(
    expected: &[ExpectedField],
    actual: &[Field],
    types: &TypeGraph,
) -> Result<(), ValidationError> {
    if expected.len() != actual.len() {
        return Err(ValidationError::WrongFieldCount {
            expected: expected.len(),
            found: actual.len(),
        });
    }
    for (idx, (e, a)) in expected.iter().zip(actual).enumerate() {
        if let Some(name) = &e.name {
            if a.name.as_deref() != Some(name.as_str()) {
                return Err(ValidationError::FieldNameMismatch {
                    expected: name.clone(),
                    found: a.name.clone(),
                });
            }
        }
        validate(&e.shape, a.ty, types).map_err(|error| ValidationError::InField {
            field: a.name.clone().unwrap_or_else(|| format!("{idx}")),
            error: Box::new(error),
        })?;
    }
    Ok(())
}

// Lengths have been checked by the caller.
fn validate_items(
    expected: &[Expected],
    actual: impl Iterator<Item = TypeId>,
    types: &TypeGraph,
) -> Result<(), ValidationError> {
    for (idx, (e, id)) in expected.iter().zip(actual).enumerate() {
        validate(e, id, types).map_err(|error| ValidationError::InField {
            field: format!("{idx}"),
            error: Box::new(error),
        })?;
    }
    Ok(())
}

fn validate_variant_fields(
    types: &TypeGraph,
    ty: TypeId,
    name: &str,
    fields: &[ExpectedField],
) -> Result<(), ValidationError> {
    let Shape::Variant(variants) = types.shape(ty)? else {
        let found = types.shape(ty)?.kind_name();
        return Err(ValidationError::ShapeMismatch { id: ty, expected: "variant", found });
    };
    let variant = variants
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| ValidationError::VariantNotFound { name: name.to_owned() })?;
    validate_fields(fields, &variant.fields, types).map_err(|error| ValidationError::InVariant {
        variant: name.to_owned(),
        error: Box::new(error),
    })
}

/// Types which know what shape they are SCALE encoded as.
pub trait StaticShape {
    /// The shape that values of this type are expected to have.
    fn expected() -> Expected;
}

impl Expected {
    /// The expected shape of some [`StaticShape`] type.
    pub fn of<T: StaticShape>() -> Expected {
        T::expected()
    }
}

macro_rules! impl_static_shape_for_primitive {
    ($($ty:ty => $prim:ident),* $(,)?) => {$(
        impl StaticShape for $ty {
            fn expected() -> Expected {
                Expected::Primitive(Primitive::$prim)
            }
        }
    )*}
}

impl_static_shape_for_primitive!(
    bool => Bool,
    char => Char,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
);

impl StaticShape for String {
    fn expected() -> Expected {
        Expected::Str
    }
}

impl<T: StaticShape> StaticShape for Vec<T> {
    fn expected() -> Expected {
        Expected::Sequence(Box::new(T::expected()))
    }
}

impl<T: StaticShape> StaticShape for Box<T> {
    fn expected() -> Expected {
        T::expected()
    }
}

impl<T: StaticShape, const N: usize> StaticShape for [T; N] {
    fn expected() -> Expected {
        Expected::Array(Box::new(T::expected()), N as u32)
    }
}

impl<T: StaticShape> StaticShape for Option<T> {
    fn expected() -> Expected {
        Expected::Variant(vec![
            ExpectedVariant::new("None", 0, Vec::new()),
            ExpectedVariant::new("Some", 1, vec![ExpectedField::unnamed(T::expected())]),
        ])
    }
}

impl<T: StaticShape, E: StaticShape> StaticShape for Result<T, E> {
    fn expected() -> Expected {
        Expected::Variant(vec![
            ExpectedVariant::new("Ok", 0, vec![ExpectedField::unnamed(T::expected())]),
            ExpectedVariant::new("Err", 1, vec![ExpectedField::unnamed(E::expected())]),
        ])
    }
}

impl StaticShape for () {
    fn expected() -> Expected {
        Expected::Tuple(Vec::new())
    }
}

macro_rules! impl_static_shape_for_tuple {
    ($($t:ident)+) => {
        impl<$($t: StaticShape),+> StaticShape for ($($t,)+) {
            fn expected() -> Expected {
                Expected::Tuple(vec![$($t::expected()),+])
            }
        }
    }
}

impl_static_shape_for_tuple!(A);
impl_static_shape_for_tuple!(A B);
impl_static_shape_for_tuple!(A B C);
impl_static_shape_for_tuple!(A B C D);
impl_static_shape_for_tuple!(A B C D E);
impl_static_shape_for_tuple!(A B C D E F);
impl_static_shape_for_tuple!(A B C D E F G);
impl_static_shape_for_tuple!(A B C D E F G H);
impl_static_shape_for_tuple!(A B C D E F G H I);
impl_static_shape_for_tuple!(A B C D E F G H I J);
impl_static_shape_for_tuple!(A B C D E F G H I J K);
impl_static_shape_for_tuple!(A B C D E F G H I J K L);

/// Remembers the outcome of validating [`StaticShape`] types against the types in a single
/// [`TypeGraph`], so that repeated checks are cheap. Safe to share between threads.
///
/// A cache must only ever be used with the one graph, since results are keyed on type IDs.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct ValidationCache {
    results: std::sync::RwLock<ValidationResults>,
}

#[cfg(feature = "std")]
type ValidationResults =
    hashbrown::HashMap<(core::any::TypeId, TypeId), Result<(), ValidationError>>;

#[cfg(feature = "std")]
impl ValidationCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `T` against the given type, or return the result of doing so previously.
    pub fn validate<T: StaticShape + 'static>(
        &self,
        id: TypeId,
        types: &TypeGraph,
    ) -> Result<(), ValidationError> {
        use std::sync::PoisonError;

        let key = (core::any::TypeId::of::<T>(), id);
        let cached = self.results.read().unwrap_or_else(PoisonError::into_inner).get(&key).cloned();
        if let Some(result) = cached {
            tracing::trace!(type_id = %id, "validation cache hit");
            return result;
        }

        tracing::trace!(type_id = %id, "validation cache miss");
        let result = validate(&T::expected(), id, types);
        self.results.write().unwrap_or_else(PoisonError::into_inner).insert(key, result.clone());
        result
    }

    /// How many results are cached.
    pub fn len(&self) -> usize {
        self.results.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Metadata {
    /// Check the fields of some call against those given.
    pub fn validate_call(
        &self,
        pallet: &str,
        call: &str,
        fields: &[ExpectedField],
    ) -> Result<(), ValidationError> {
        let ty = self.find_pallet(pallet)?.call_ty().ok_or_else(|| item_not_found(pallet, call))?;
        validate_variant_fields(self.types(), ty, call, fields)
    }

    /// Check the fields of some event against those given.
    pub fn validate_event(
        &self,
        pallet: &str,
        event: &str,
        fields: &[ExpectedField],
    ) -> Result<(), ValidationError> {
        let ty =
            self.find_pallet(pallet)?.event_ty().ok_or_else(|| item_not_found(pallet, event))?;
        validate_variant_fields(self.types(), ty, event, fields)
    }

    /// Check the type of some constant.
    pub fn validate_constant(
        &self,
        pallet: &str,
        constant: &str,
        expected: &Expected,
    ) -> Result<(), ValidationError> {
        let c = self
            .find_pallet(pallet)?
            .constant(constant)
            .ok_or_else(|| item_not_found(pallet, constant))?;
        validate(expected, c.ty, self.types())
    }

    /// Check the type of the values stored in some storage entry.
    pub fn validate_storage_value(
        &self,
        pallet: &str,
        entry: &str,
        expected: &Expected,
    ) -> Result<(), ValidationError> {
        let e = self
            .find_pallet(pallet)?
            .storage_entry(entry)
            .ok_or_else(|| item_not_found(pallet, entry))?;
        validate(expected, e.value_ty, self.types())
    }

    fn find_pallet(
        &self,
        pallet: &str,
    ) -> Result<&crate::metadata::PalletMetadata, ValidationError> {
        self.pallet_by_name(pallet).ok_or_else(|| ValidationError::PalletNotFound(pallet.into()))
    }
}

fn item_not_found(pallet: &str, item: &str) -> ValidationError {
    ValidationError::ItemNotFound { pallet: pallet.to_owned(), item: item.to_owned() }
}
