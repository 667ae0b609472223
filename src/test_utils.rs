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

use crate::metadata::portable;
use crate::type_graph::{TypeGraph, TypeId};
use crate::wire::Cursor;
use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use parity_scale_codec::Encode;
use scale_type_resolver::{BitsOrderFormat, BitsStoreFormat, Primitive, TypeResolver};

type Fields<E> = Vec<(Option<String>, ResolvedTypeInfo<E>)>;

/// Walk a type and everything it refers to into a [`ResolvedTypeInfo`], so that whole type
/// trees can be compared with `assert_eq!`.
pub fn to_resolved_info<T>(type_id: TypeId, types: &T) -> ResolvedTypeInfo<T::Error>
where
    T: TypeResolver<TypeId = TypeId>,
{
    use scale_type_resolver::visitor;

    let boxed = |id: TypeId| Box::new(to_resolved_info(id, types));

    let visitor = visitor::new((), |_, _| unreachable!("every kind of type is visited"))
        .visit_not_found(|_| ResolvedTypeInfo::NotFound)
        .visit_primitive(|_, p| ResolvedTypeInfo::Primitive(p))
        .visit_compact(|_, id| ResolvedTypeInfo::Compact(boxed(id)))
        .visit_sequence(|_, _, id| ResolvedTypeInfo::SequenceOf(boxed(id)))
        .visit_array(|_, id, len| ResolvedTypeInfo::ArrayOf(boxed(id), len))
        .visit_tuple(|_, ids| {
            ResolvedTypeInfo::TupleOf(ids.map(|id| to_resolved_info(id, types)).collect())
        })
        .visit_bit_sequence(|_, store, order| ResolvedTypeInfo::BitSequence(store, order))
        .visit_composite(|_, _, fs| ResolvedTypeInfo::CompositeOf(fields(fs, types)))
        .visit_variant(|_, _, vs| {
            let vs = vs.map(|v| (v.name.to_owned(), fields(v.fields, types))).collect();
            ResolvedTypeInfo::VariantOf(vs)
        });

    types.resolve_type(type_id, visitor).unwrap_or_else(ResolvedTypeInfo::Err)
}

fn fields<'a, T, I>(fs: I, types: &T) -> Fields<T::Error>
where
    T: TypeResolver<TypeId = TypeId>,
    I: Iterator<Item = scale_type_resolver::Field<'a, TypeId>>,
{
    fs.map(|f| (f.name.map(String::from), to_resolved_info(f.id, types))).collect()
}

/// A fully expanded type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedTypeInfo<E> {
    Err(E),
    NotFound,
    CompositeOf(Fields<E>),
    VariantOf(Vec<(String, Fields<E>)>),
    SequenceOf(Box<ResolvedTypeInfo<E>>),
    ArrayOf(Box<ResolvedTypeInfo<E>>, usize),
    TupleOf(Vec<ResolvedTypeInfo<E>>),
    Primitive(Primitive),
    Compact(Box<ResolvedTypeInfo<E>>),
    BitSequence(BitsStoreFormat, BitsOrderFormat),
}

/// Register some Rust type with `scale-info`, SCALE encode the resulting portable registry and
/// decode that back into a [`TypeGraph`]. Returns the graph and the ID of the type.
pub fn graph_for<T: scale_info::TypeInfo + 'static>() -> (TypeGraph, TypeId) {
    let mut registry = scale_info::Registry::new();
    let id = registry.register_type(&scale_info::meta_type::<T>()).id;
    let portable: scale_info::PortableRegistry = registry.into();
    let bytes = portable.encode();

    let mut cursor = Cursor::new(&bytes);
    let types = portable::decode_registry(&mut cursor).expect("portable registry should decode");
    assert!(cursor.is_empty(), "portable registry bytes not fully consumed");
    (types, TypeId(id))
}

/// Like [`graph_for`], but registers several types in the same registry.
pub struct Registered {
    registry: scale_info::Registry,
}

impl Registered {
    pub fn new() -> Self {
        Registered { registry: scale_info::Registry::new() }
    }

    /// Register a type, returning its ID.
    pub fn add<T: scale_info::TypeInfo + 'static>(&mut self) -> TypeId {
        TypeId(self.registry.register_type(&scale_info::meta_type::<T>()).id)
    }

    /// The encoded portable registry, as it would appear in metadata.
    pub fn encoded(self) -> Vec<u8> {
        let portable: scale_info::PortableRegistry = self.registry.into();
        portable.encode()
    }

    /// Decode the registered types into a [`TypeGraph`].
    pub fn graph(self) -> TypeGraph {
        let bytes = self.encoded();
        let mut cursor = Cursor::new(&bytes);
        portable::decode_registry(&mut cursor).expect("portable registry should decode")
    }
}

/// Encodable mirrors of the modern metadata structures, for building test metadata.
pub mod modern {
    use super::*;

    #[derive(Encode, Clone, Copy)]
    pub struct Ty(#[codec(compact)] pub u32);

    impl From<TypeId> for Ty {
        fn from(id: TypeId) -> Self {
            Ty(id.0)
        }
    }

    #[derive(Encode, Clone, Copy)]
    pub enum Hasher {
        Blake2_128,
        Blake2_256,
        Blake2_128Concat,
        Twox128,
        Twox256,
        Twox64Concat,
        Identity,
    }

    #[derive(Encode)]
    pub enum Modifier {
        Optional,
        Default,
    }

    #[derive(Encode)]
    pub enum StorageType {
        Plain(Ty),
        Map { hashers: Vec<Hasher>, key: Ty, value: Ty },
    }

    #[derive(Encode)]
    pub struct StorageEntry {
        pub name: String,
        pub modifier: Modifier,
        pub ty: StorageType,
        pub default: Vec<u8>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct Storage {
        pub prefix: String,
        pub entries: Vec<StorageEntry>,
    }

    #[derive(Encode)]
    pub struct Constant {
        pub name: String,
        pub ty: Ty,
        pub value: Vec<u8>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct PalletV14 {
        pub name: String,
        pub storage: Option<Storage>,
        pub calls: Option<Ty>,
        pub event: Option<Ty>,
        pub constants: Vec<Constant>,
        pub error: Option<Ty>,
        pub index: u8,
    }

    #[derive(Encode)]
    pub struct PalletV15 {
        pub name: String,
        pub storage: Option<Storage>,
        pub calls: Option<Ty>,
        pub event: Option<Ty>,
        pub constants: Vec<Constant>,
        pub error: Option<Ty>,
        pub index: u8,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct SignedExtension {
        pub identifier: String,
        pub ty: Ty,
        pub additional_signed: Ty,
    }

    #[derive(Encode)]
    pub struct ExtrinsicV14 {
        pub ty: Ty,
        pub version: u8,
        pub signed_extensions: Vec<SignedExtension>,
    }

    #[derive(Encode)]
    pub struct ExtrinsicV15 {
        pub version: u8,
        pub address_ty: Ty,
        pub call_ty: Ty,
        pub signature_ty: Ty,
        pub extra_ty: Ty,
        pub signed_extensions: Vec<SignedExtension>,
    }

    #[derive(Encode)]
    pub struct ApiParam {
        pub name: String,
        pub ty: Ty,
    }

    #[derive(Encode)]
    pub struct ApiMethod {
        pub name: String,
        pub inputs: Vec<ApiParam>,
        pub output: Ty,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct Api {
        pub name: String,
        pub methods: Vec<ApiMethod>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct OuterEnums {
        pub call: Ty,
        pub event: Ty,
        pub error: Ty,
    }

    #[derive(Encode)]
    pub struct CustomValue {
        pub ty: Ty,
        pub value: Vec<u8>,
    }

    /// V14 metadata containing the given types and pallets. The extrinsic and runtime types
    /// are both `()`.
    pub fn v14_bytes(mut types: Registered, pallets: Vec<PalletV14>) -> Vec<u8> {
        let unit = types.add::<()>();
        let extrinsic =
            ExtrinsicV14 { ty: unit.into(), version: 4, signed_extensions: Vec::new() };
        let mut bytes = with_header(14, ());
        bytes.extend(types.encoded());
        (pallets, extrinsic, Ty::from(unit)).encode_to(&mut bytes);
        bytes
    }

    /// Prefix the magic number and version byte to some encoded metadata body.
    pub fn with_header(version: u8, body: impl Encode) -> Vec<u8> {
        let mut out = crate::metadata::MAGIC_NUMBER.to_le_bytes().to_vec();
        out.push(version);
        body.encode_to(&mut out);
        out
    }
}

/// Encodable mirrors of the V9 to V13 metadata structures, for building test metadata.
pub mod legacy {
    use super::*;

    pub use super::modern::Modifier;

    #[derive(Encode)]
    pub struct Arg {
        pub name: String,
        pub ty: String,
    }

    #[derive(Encode)]
    pub struct Call {
        pub name: String,
        pub args: Vec<Arg>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct Event {
        pub name: String,
        pub args: Vec<String>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct Constant {
        pub name: String,
        pub ty: String,
        pub value: Vec<u8>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct Error {
        pub name: String,
        pub docs: Vec<String>,
    }

    /// The hasher enum from V11 onwards. V9 and V10 number their hashers differently.
    #[derive(Encode, Clone, Copy)]
    pub enum Hasher {
        Blake2_128,
        Blake2_256,
        Blake2_128Concat,
        Twox128,
        Twox256,
        Twox64Concat,
        Identity,
    }

    #[derive(Encode)]
    pub enum StorageType {
        Plain(String),
        Map { hasher: Hasher, key: String, value: String, unused: bool },
        DoubleMap {
            hasher: Hasher,
            key1: String,
            key2: String,
            value: String,
            key2_hasher: Hasher,
        },
        NMap { keys: Vec<String>, hashers: Vec<Hasher>, value: String },
    }

    #[derive(Encode)]
    pub struct StorageEntry {
        pub name: String,
        pub modifier: Modifier,
        pub ty: StorageType,
        pub default: Vec<u8>,
        pub docs: Vec<String>,
    }

    #[derive(Encode)]
    pub struct Storage {
        pub prefix: String,
        pub entries: Vec<StorageEntry>,
    }

    /// A V9 to V11 module.
    #[derive(Encode)]
    pub struct Module {
        pub name: String,
        pub storage: Option<Storage>,
        pub calls: Option<Vec<Call>>,
        pub event: Option<Vec<Event>>,
        pub constants: Vec<Constant>,
        pub errors: Vec<Error>,
    }

    /// A V12 or V13 module, which also has an index.
    #[derive(Encode)]
    pub struct IndexedModule {
        pub name: String,
        pub storage: Option<Storage>,
        pub calls: Option<Vec<Call>>,
        pub event: Option<Vec<Event>>,
        pub constants: Vec<Constant>,
        pub errors: Vec<Error>,
        pub index: u8,
    }

    #[derive(Encode)]
    pub struct Extrinsic {
        pub version: u8,
        pub signed_extensions: Vec<String>,
    }

    pub fn s(v: &str) -> String {
        v.to_owned()
    }
}
