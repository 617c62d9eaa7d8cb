//! Capturing declared values into the plan document.
//!
//! `serde_json` writes NaN and infinities as `null`, so a plain
//! `to_value` would drop them without an error. Values are walked first and
//! any non-finite float is rejected.

use serde::ser::{self, Error as _};
use serde::Serialize;
use serde_json::{Error, Value};

/// Serialize `value` for the plan document, failing on anything JSON cannot
/// represent.
pub(crate) fn to_document_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, String> {
    value.serialize(FiniteCheck).map_err(|e| e.to_string())?;
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// A serializer that produces nothing and fails on non-finite floats.
#[derive(Clone, Copy)]
struct FiniteCheck;

fn check_float(v: f64) -> Result<(), Error> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(Error::custom(format!("{v} cannot be represented in the plan document")))
    }
}

fn in_field(key: &str, e: Error) -> Error {
    Error::custom(format!("'{key}': {e}"))
}

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _v: bool) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_i8(self, _v: i8) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_i16(self, _v: i16) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_i32(self, _v: i32) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_i64(self, _v: i64) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_u8(self, _v: u8) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_u16(self, _v: u16) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_u32(self, _v: u32) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_u64(self, _v: u64) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_f32(self, v: f32) -> Result<(), Error> {
        check_float(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> Result<(), Error> {
        check_float(v)
    }
    fn serialize_char(self, _v: char) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_str(self, _v: &str) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_bytes(self, _v: &[u8]) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Error> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(self).map_err(|e| in_field(variant, e))
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self, Error> {
        Ok(self)
    }
    fn serialize_tuple(self, _len: usize) -> Result<Self, Error> {
        Ok(self)
    }
    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self, Error> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, Error> {
        Ok(self)
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self, Error> {
        Ok(self)
    }
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self, Error> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self, Error> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = Error;

    // Keys that are not strings are reported by serde_json itself.
    fn serialize_key<T: Serialize + ?Sized>(&mut self, _key: &T) -> Result<(), Error> {
        Ok(())
    }
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.serialize(*self)
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(*self).map_err(|e| in_field(key, e))
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(*self).map_err(|e| in_field(key, e))
    }
    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use serde_json::json;

    #[derive(Serialize)]
    struct Settings {
        connection: String,
        temperature: f64,
        stops: Vec<Option<f32>>,
    }

    #[test]
    fn finite_values_pass_through() {
        let value = to_document_value(&Settings {
            connection: "c".into(),
            temperature: 0.5,
            stops: vec![None, Some(1.0)],
        })
        .unwrap();
        assert_eq!(value, json!({"connection": "c", "temperature": 0.5, "stops": [null, 1.0]}));
    }

    #[test]
    fn nan_field_is_rejected_with_its_name() {
        let err = to_document_value(&Settings {
            connection: "c".into(),
            temperature: f64::NAN,
            stops: vec![],
        })
        .unwrap_err();
        assert!(err.contains("'temperature'"), "{err}");
        assert!(err.contains("NaN"), "{err}");
    }

    #[test]
    fn infinity_nested_in_collections_is_rejected() {
        let mut args = BTreeMap::new();
        args.insert("stops", vec![Some(1.0f32), Some(f32::NEG_INFINITY)]);
        assert!(to_document_value(&args).is_err());
    }
}
