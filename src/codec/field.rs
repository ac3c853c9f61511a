//! Typed request fields.
//!
//! [`WireField`] covers the primitive field types; [`WireArgs`] lays a tuple
//! of fields out in declaration order. Both sides of the protocol use the
//! same impls, so a request's byte layout is fixed by its Rust type.

use serde::Serialize;

use super::parcel::{Parcel, ParcelReader};
use crate::error::DecodeError;

/// Field types that may appear in a request schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int32,
    Uint32,
    Float32,
    Bool,
    /// `(uint32, uint32)*` with no count, terminated by buffer exhaustion.
    /// Only valid as the last field of a request.
    PairList,
}

impl FieldType {
    /// Encoded size in bytes, `None` for the variable-length list.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            FieldType::PairList => None,
            _ => Some(super::parcel::WORD_SIZE),
        }
    }
}

/// A single value with a fixed wire encoding.
pub trait WireField: Sized {
    /// Schema type of this field.
    const FIELD: FieldType;

    fn encode(&self, parcel: &mut Parcel);

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError>;
}

impl WireField for i32 {
    const FIELD: FieldType = FieldType::Int32;

    fn encode(&self, parcel: &mut Parcel) {
        parcel.write_i32(*self);
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        reader.read_i32()
    }
}

impl WireField for u32 {
    const FIELD: FieldType = FieldType::Uint32;

    fn encode(&self, parcel: &mut Parcel) {
        parcel.write_u32(*self);
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        reader.read_u32()
    }
}

impl WireField for f32 {
    const FIELD: FieldType = FieldType::Float32;

    fn encode(&self, parcel: &mut Parcel) {
        parcel.write_f32(*self);
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        reader.read_f32()
    }
}

impl WireField for bool {
    const FIELD: FieldType = FieldType::Bool;

    fn encode(&self, parcel: &mut Parcel) {
        parcel.write_bool(*self);
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        reader.read_bool()
    }
}

/// Length-by-exhaustion list of `(uint32, uint32)` pairs.
///
/// Decoding stops at the first pair whose first element cannot be read.
/// A first element without its second is a decode error.
impl WireField for Vec<(u32, u32)> {
    const FIELD: FieldType = FieldType::PairList;

    fn encode(&self, parcel: &mut Parcel) {
        for (first, second) in self {
            parcel.write_u32(*first);
            parcel.write_u32(*second);
        }
    }

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        let mut pairs = Vec::new();
        while let Ok(first) = reader.read_u32() {
            let second = reader.read_u32()?;
            pairs.push((first, second));
        }
        Ok(pairs)
    }
}

/// An ordered tuple of fields forming one request body.
pub trait WireArgs: Sized {
    /// Field types in wire order.
    fn schema() -> Vec<FieldType>;

    fn encode(&self, parcel: &mut Parcel);

    fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError>;
}

impl WireArgs for () {
    fn schema() -> Vec<FieldType> {
        Vec::new()
    }

    fn encode(&self, _parcel: &mut Parcel) {}

    fn decode(_reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! impl_wire_args {
    ($($name:ident),+) => {
        impl<$($name: WireField),+> WireArgs for ($($name,)+) {
            fn schema() -> Vec<FieldType> {
                vec![$($name::FIELD),+]
            }

            #[allow(non_snake_case)]
            fn encode(&self, parcel: &mut Parcel) {
                let ($($name,)+) = self;
                $($name.encode(parcel);)+
            }

            fn decode(reader: &mut ParcelReader<'_>) -> Result<Self, DecodeError> {
                Ok(($($name::decode(reader)?,)+))
            }
        }
    };
}

impl_wire_args!(A);
impl_wire_args!(A, B);
impl_wire_args!(A, B, C);
impl_wire_args!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<A: WireArgs>(args: &A) -> bytes::Bytes {
        let mut parcel = Parcel::new();
        args.encode(&mut parcel);
        parcel.freeze()
    }

    #[test]
    fn test_tuple_field_order() {
        let bytes = encode(&(1i32, 2u32, 0.5f32, true));
        let mut reader = ParcelReader::new(&bytes);
        assert_eq!(reader.read_i32().unwrap(), 1);
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert_eq!(reader.read_f32().unwrap(), 0.5);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_schema_matches_types() {
        assert_eq!(
            <(i32, f32)>::schema(),
            vec![FieldType::Int32, FieldType::Float32]
        );
        assert_eq!(
            <(i32, i32, Vec<(u32, u32)>)>::schema(),
            vec![FieldType::Int32, FieldType::Int32, FieldType::PairList]
        );
        assert!(<()>::schema().is_empty());
    }

    #[test]
    fn test_truncated_tuple_fails() {
        let bytes = encode(&(1u32, 2u32, 3u32));
        let mut reader = ParcelReader::new(&bytes[..8]);
        assert!(matches!(
            <(u32, u32, u32)>::decode(&mut reader),
            Err(DecodeError::NotEnoughData { .. })
        ));
    }

    #[test]
    fn test_pair_list_terminates_on_exhaustion() {
        let args = (1i32, 5_000_000i32, vec![(2u32, 8_333_333u32), (1, 16_666_667)]);
        let bytes = encode(&args);
        let mut reader = ParcelReader::new(&bytes);
        let decoded = <(i32, i32, Vec<(u32, u32)>)>::decode(&mut reader).unwrap();
        assert_eq!(decoded, args);
        assert_eq!(decoded.2.len(), 2);
    }

    #[test]
    fn test_pair_list_empty() {
        let bytes = encode(&(3i32, 0i32));
        let mut reader = ParcelReader::new(&bytes);
        let (_, _, pairs) = <(i32, i32, Vec<(u32, u32)>)>::decode(&mut reader).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_pair_list_half_pair_is_error() {
        let args = (1i32, 5_000_000i32, vec![(2u32, 8_333_333u32), (1, 16_666_667)]);
        let bytes = encode(&args);
        // Two scalars plus the first element of the first pair.
        let cut = &bytes[..12];
        let mut reader = ParcelReader::new(cut);
        assert!(matches!(
            <(i32, i32, Vec<(u32, u32)>)>::decode(&mut reader),
            Err(DecodeError::NotEnoughData { .. })
        ));
    }

    #[test]
    fn test_pair_list_trailing_partial_word_terminates() {
        let mut bytes = encode(&(vec![(4u32, 5u32)],)).to_vec();
        bytes.extend_from_slice(&[9, 9]);
        let mut reader = ParcelReader::new(&bytes);
        let (pairs,) = <(Vec<(u32, u32)>,)>::decode(&mut reader).unwrap();
        assert_eq!(pairs, vec![(4, 5)]);
    }
}
