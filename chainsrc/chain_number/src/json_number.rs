//! Serde helpers for big integers embedded in JSON.
//!
//! Decoding goes through [`RawValue`], so the digits of a JSON number are read as text and never
//! pass through `f64`/`u64`. A value may also be given as a decimal or `0x` hex string.
//! These helpers only work with `serde_json` (de)serializers fed from a string or a byte slice.

use crate::hex_codec::hex_to_big_uint;
use num_bigint::{BigInt, BigUint};
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

fn parse_big_uint_text(text: &str) -> Result<BigUint, String> {
    if text.starts_with("0x") || text.starts_with("0X") {
        return hex_to_big_uint(text).map_err(|e| e.into_inner().to_string());
    }
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not an unsigned integer", text));
    }
    BigUint::parse_bytes(text.as_bytes(), 10).ok_or_else(|| format!("'{}' is not an unsigned integer", text))
}

fn parse_big_int_text(text: &str) -> Result<BigInt, String> {
    match text.strip_prefix('-') {
        Some(abs) => parse_big_uint_text(abs).map(|n| -BigInt::from(n)),
        None => parse_big_uint_text(text).map(BigInt::from),
    }
}

/// Returns the textual content of a raw JSON number or string.
fn raw_text(raw: &RawValue) -> Result<String, String> {
    let text = raw.get().trim();
    if text.starts_with('"') {
        serde_json::from_str::<String>(text).map_err(|e| e.to_string())
    } else {
        Ok(text.to_owned())
    }
}

fn number_to_raw(digits: String) -> Result<Box<RawValue>, serde_json::Error> { RawValue::from_string(digits) }

/// `BigUint` written as a bare JSON number, read from a number or a string.
pub mod big_uint_number {
    use super::*;

    pub fn serialize<S: Serializer>(n: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        number_to_raw(n.to_string()).map_err(S::Error::custom)?.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let raw = Box::<RawValue>::deserialize(d)?;
        raw_text(&raw)
            .and_then(|text| parse_big_uint_text(&text))
            .map_err(D::Error::custom)
    }
}

/// Same as [`big_uint_number`] for optional fields. Use with `#[serde(default)]`.
pub mod opt_big_uint_number {
    use super::*;

    pub fn serialize<S: Serializer>(n: &Option<BigUint>, s: S) -> Result<S::Ok, S::Error> {
        match n {
            Some(n) => super::big_uint_number::serialize(n, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BigUint>, D::Error> {
        let raw = Option::<Box<RawValue>>::deserialize(d)?;
        raw.map(|raw| raw_text(&raw).and_then(|text| parse_big_uint_text(&text)))
            .transpose()
            .map_err(D::Error::custom)
    }
}

/// `BigUint` written as a decimal JSON string, read from a number or a string.
pub mod big_uint_str {
    use super::*;

    pub fn serialize<S: Serializer>(n: &BigUint, s: S) -> Result<S::Ok, S::Error> { s.serialize_str(&n.to_string()) }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        super::big_uint_number::deserialize(d)
    }
}

/// `BigInt` written as a decimal JSON string, read from a number or a string.
pub mod big_int_str {
    use super::*;

    pub fn serialize<S: Serializer>(n: &BigInt, s: S) -> Result<S::Ok, S::Error> { s.serialize_str(&n.to_string()) }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigInt, D::Error> {
        let raw = Box::<RawValue>::deserialize(d)?;
        raw_text(&raw)
            .and_then(|text| parse_big_int_text(&text))
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_derive::{Deserialize, Serialize};

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Request {
        #[serde(with = "big_uint_number")]
        amount: BigUint,
        #[serde(default, with = "opt_big_uint_number", skip_serializing_if = "Option::is_none")]
        fee_limit: Option<BigUint>,
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Generic {
        #[serde(with = "big_int_str")]
        amount: BigInt,
    }

    #[test]
    fn test_big_number_survives_json() {
        let json = r#"{"amount":115792089237316195423570985008687907853269984665640564039457584007913129639935}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert_eq!(
            req.amount.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert_eq!(req.fee_limit, None);
        assert_eq!(serde_json::to_string(&req).unwrap(), json);
    }

    #[test]
    fn test_amount_from_string_forms() {
        let req: Request = serde_json::from_str(r#"{"amount":"1000","fee_limit":"0x3e8"}"#).unwrap();
        assert_eq!(req.amount, BigUint::from(1000u32));
        assert_eq!(req.fee_limit, Some(BigUint::from(1000u32)));

        let req: Request = serde_json::from_str(r#"{"amount":1,"fee_limit":null}"#).unwrap();
        assert_eq!(req.fee_limit, None);
    }

    #[test]
    fn test_rejects_non_integers() {
        assert!(serde_json::from_str::<Request>(r#"{"amount":1.5}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"amount":-1}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"amount":"abc"}"#).is_err());
    }

    #[test]
    fn test_signed_amount() {
        let generic: Generic = serde_json::from_str(r#"{"amount":"-5"}"#).unwrap();
        assert_eq!(generic.amount, BigInt::from(-5));
        assert_eq!(serde_json::to_string(&generic).unwrap(), r#"{"amount":"-5"}"#);
    }
}
