use ethnum::{I256, U256};
use std::str::FromStr;
use troncrypt::{strip_hex_prefix, Address};

use crate::{AbiError, ParamType, Result, Value};

const WORD: usize = 32;

/// Head-tail encodes `values` against `types`.
pub fn encode(types: &[ParamType], values: &[Value]) -> Result<Vec<u8>> {
    if types.len() != values.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            got: values.len(),
        });
    }
    let head_len: usize = types.iter().map(ParamType::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for (ty, value) in types.iter().zip(values) {
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_tail(ty, value)?);
        } else {
            head.extend(encode_static(ty, value)?);
        }
    }
    head.extend(tail);
    Ok(head)
}

/// Decodes a head-tail payload into one value per type.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(types.len());
    let mut head = 0usize;
    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, head)?;
            let tail = data
                .get(offset..)
                .ok_or(AbiError::OffsetOutOfRange(offset))?;
            out.push(decode_tail(ty, tail)?);
            head += WORD;
        } else {
            out.push(decode_static(ty, data, head)?);
            head += ty.head_size();
        }
    }
    Ok(out)
}

/// Encodes a single static value into its 32-byte word.
pub fn encode_word(ty: &ParamType, value: &Value) -> Result<[u8; 32]> {
    let mut word = [0u8; WORD];
    match ty {
        ParamType::Address => {
            word[12..].copy_from_slice(&coerce_address(value)?.to_evm_bytes());
        }
        ParamType::Bool => {
            word[31] = coerce_bool(value)? as u8;
        }
        ParamType::Uint(bits) => {
            word = coerce_uint(value, *bits)?.to_be_bytes();
        }
        ParamType::Int(bits) => {
            word = coerce_int(value, *bits)?.to_be_bytes();
        }
        ParamType::FixedBytes(n) => {
            let bytes = coerce_bytes(ty, value)?;
            if bytes.len() != *n {
                return Err(AbiError::WrongLength {
                    ty: ty.to_string(),
                    expected: *n,
                    got: bytes.len(),
                });
            }
            word[..*n].copy_from_slice(&bytes);
        }
        _ => return Err(mismatch(ty, value)),
    }
    Ok(word)
}

fn encode_static(ty: &ParamType, value: &Value) -> Result<Vec<u8>> {
    match ty {
        ParamType::FixedArray(inner, k) => {
            let items = fixed_items(ty, value, *k)?;
            let mut out = Vec::with_capacity(ty.head_size());
            for item in items {
                out.extend(encode_static(inner, item)?);
            }
            Ok(out)
        }
        _ => Ok(encode_word(ty, value)?.to_vec()),
    }
}

fn encode_tail(ty: &ParamType, value: &Value) -> Result<Vec<u8>> {
    match ty {
        ParamType::Bytes => Ok(length_prefixed(&coerce_bytes(ty, value)?)),
        ParamType::String => match value {
            Value::String(s) => Ok(length_prefixed(s.as_bytes())),
            _ => Err(mismatch(ty, value)),
        },
        ParamType::Array(inner) => {
            let items = match value {
                Value::Array(items) => items,
                _ => return Err(mismatch(ty, value)),
            };
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode(&vec![inner.as_ref().clone(); items.len()], items)?);
            Ok(out)
        }
        ParamType::FixedArray(inner, k) => {
            let items = fixed_items(ty, value, *k)?;
            encode(&vec![inner.as_ref().clone(); *k], items)
        }
        _ => encode_static(ty, value),
    }
}

fn fixed_items<'a>(ty: &ParamType, value: &'a Value, k: usize) -> Result<&'a [Value]> {
    match value {
        Value::Array(items) if items.len() == k => Ok(items),
        Value::Array(items) => Err(AbiError::ArityMismatch {
            expected: k,
            got: items.len(),
        }),
        _ => Err(mismatch(ty, value)),
    }
}

fn decode_static(ty: &ParamType, data: &[u8], pos: usize) -> Result<Value> {
    match ty {
        ParamType::FixedArray(inner, k) => {
            let step = inner.head_size();
            let items = (0..*k)
                .map(|i| decode_static(inner, data, pos + i * step))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(items))
        }
        _ => decode_word(ty, read_word(data, pos)?),
    }
}

/// Decodes a value whose encoding starts at the beginning of `data`.
fn decode_tail(ty: &ParamType, data: &[u8]) -> Result<Value> {
    match ty {
        ParamType::Bytes => Ok(Value::Bytes(read_length_prefixed(data)?.to_vec())),
        ParamType::String => {
            let raw = read_length_prefixed(data)?;
            String::from_utf8(raw.to_vec())
                .map(Value::String)
                .map_err(|_| AbiError::InvalidUtf8)
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, 0)?;
            let elems = &data[WORD..];
            // every element occupies at least one head slot
            if len.checked_mul(inner.head_size()).map_or(true, |n| n > elems.len()) {
                return Err(AbiError::Truncated(format!(
                    "array of {} `{}` elements",
                    len, inner
                )));
            }
            Ok(Value::Array(decode(&vec![inner.as_ref().clone(); len], elems)?))
        }
        ParamType::FixedArray(inner, k) => Ok(Value::Array(decode(
            &vec![inner.as_ref().clone(); *k],
            data,
        )?)),
        _ => decode_static(ty, data, 0),
    }
}

/// Decodes one 32-byte word of a static type.
pub fn decode_word(ty: &ParamType, word: &[u8; 32]) -> Result<Value> {
    let out_of_range = || AbiError::OutOfRange {
        ty: ty.to_string(),
        value: format!("0x{}", hex::encode(word)),
    };
    match ty {
        ParamType::Address => {
            let mut evm = [0u8; 20];
            evm.copy_from_slice(&word[12..]);
            Ok(Value::Address(Address::from_evm(evm)))
        }
        ParamType::Bool => {
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(out_of_range());
            }
            Ok(Value::Bool(word[31] == 1))
        }
        ParamType::Uint(bits) => {
            if !fits_unsigned(word, *bits) {
                return Err(out_of_range());
            }
            Ok(Value::Uint(U256::from_be_bytes(*word)))
        }
        ParamType::Int(bits) => {
            if !fits_signed(word, *bits) {
                return Err(out_of_range());
            }
            Ok(Value::Int(I256::from_be_bytes(*word)))
        }
        ParamType::FixedBytes(n) => Ok(Value::FixedBytes(word[..*n].to_vec())),
        _ => Err(AbiError::UnknownType(ty.to_string())),
    }
}

fn fits_unsigned(word: &[u8; 32], bits: usize) -> bool {
    word[..WORD - bits / 8].iter().all(|b| *b == 0)
}

fn fits_signed(word: &[u8; 32], bits: usize) -> bool {
    let pad = WORD - bits / 8;
    if pad == 0 {
        return true;
    }
    let fill = if word[pad] & 0x80 != 0 { 0xff } else { 0x00 };
    word[..pad].iter().all(|b| *b == fill)
}

fn mismatch(ty: &ParamType, value: &Value) -> AbiError {
    AbiError::TypeMismatch {
        ty: ty.to_string(),
        value: format!("{:?}", value),
    }
}

fn coerce_address(value: &Value) -> Result<Address> {
    match value {
        Value::Address(a) => Ok(a.clone()),
        Value::Bytes(b) | Value::FixedBytes(b) => Ok(Address::from_bytes(b)?),
        Value::String(s) => Ok(Address::from_str(s)?),
        _ => Err(mismatch(&ParamType::Address, value)),
    }
}

fn coerce_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err(mismatch(&ParamType::Bool, value)),
    }
}

fn coerce_bytes(ty: &ParamType, value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Bytes(b) | Value::FixedBytes(b) => Ok(b.clone()),
        Value::String(s) => hex::decode(strip_hex_prefix(s)).map_err(|_| mismatch(ty, value)),
        _ => Err(mismatch(ty, value)),
    }
}

/// Parses a decimal or `0x`-hex magnitude with an optional leading minus sign.
fn parse_numeric(s: &str) -> Option<(bool, U256)> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hexdigits) => U256::from_str_radix(hexdigits, 16).ok()?,
        None => U256::from_str_radix(digits, 10).ok()?,
    };
    Some((negative, magnitude))
}

fn coerce_uint(value: &Value, bits: usize) -> Result<U256> {
    let ty = ParamType::Uint(bits);
    let out_of_range = || AbiError::OutOfRange {
        ty: ty.to_string(),
        value: value.to_string(),
    };
    let v = match value {
        Value::Uint(v) => *v,
        Value::Int(v) if *v >= I256::ZERO => U256::from_be_bytes(v.to_be_bytes()),
        Value::Int(_) => return Err(out_of_range()),
        Value::String(s) => match parse_numeric(s) {
            Some((false, v)) => v,
            Some((true, v)) if v == U256::ZERO => v,
            Some((true, _)) => return Err(out_of_range()),
            None => return Err(mismatch(&ty, value)),
        },
        _ => return Err(mismatch(&ty, value)),
    };
    if !fits_unsigned(&v.to_be_bytes(), bits) {
        return Err(out_of_range());
    }
    Ok(v)
}

fn coerce_int(value: &Value, bits: usize) -> Result<I256> {
    let ty = ParamType::Int(bits);
    let out_of_range = || AbiError::OutOfRange {
        ty: ty.to_string(),
        value: value.to_string(),
    };
    let max_magnitude = U256::from_be_bytes(I256::MAX.to_be_bytes());
    let from_magnitude = |negative: bool, m: U256| -> Result<I256> {
        if !negative && m <= max_magnitude {
            Ok(I256::from_be_bytes(m.to_be_bytes()))
        } else if negative && m <= max_magnitude + U256::ONE {
            // two's complement negation: !m + 1
            Ok(I256::from_be_bytes((!m).wrapping_add(U256::ONE).to_be_bytes()))
        } else {
            Err(out_of_range())
        }
    };
    let v = match value {
        Value::Int(v) => *v,
        Value::Uint(v) => from_magnitude(false, *v)?,
        Value::String(s) => match parse_numeric(s) {
            Some((negative, m)) => from_magnitude(negative, m)?,
            None => return Err(mismatch(&ty, value)),
        },
        _ => return Err(mismatch(&ty, value)),
    };
    if !fits_signed(&v.to_be_bytes(), bits) {
        return Err(out_of_range());
    }
    Ok(v)
}

fn usize_word(n: usize) -> [u8; 32] {
    U256::from(n as u128).to_be_bytes()
}

fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let padded = (bytes.len() + WORD - 1) / WORD * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

fn read_word(data: &[u8], pos: usize) -> Result<&[u8; 32]> {
    data.get(pos..pos + WORD)
        .and_then(|w| w.try_into().ok())
        .ok_or_else(|| AbiError::Truncated(format!("no word at offset {}", pos)))
}

fn read_usize(data: &[u8], pos: usize) -> Result<usize> {
    let word = read_word(data, pos)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::OffsetOutOfRange(usize::MAX));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(low)).map_err(|_| AbiError::OffsetOutOfRange(usize::MAX))
}

fn read_length_prefixed(data: &[u8]) -> Result<&[u8]> {
    let len = read_usize(data, 0)?;
    WORD.checked_add(len)
        .and_then(|end| data.get(WORD..end))
        .ok_or_else(|| AbiError::Truncated(format!("{} bytes of content", len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::*;

    fn types(list: &[&str]) -> Vec<ParamType> {
        ParamType::parse_all(list).unwrap()
    }

    #[test]
    fn static_words() {
        let data = encode(&types(&["uint256", "bool"]), &[1234u64.into(), true.into()]).unwrap();
        assert_eq!(data.len(), 64);
        assert_eq!(&data[30..32], &[0x04, 0xd2]);
        assert_eq!(data[63], 1);
    }

    #[test]
    fn dynamic_layout() {
        // the standard ABI example: f(uint256,uint32[],bytes10,bytes)
        let tys = types(&["uint256", "uint32[]", "bytes10", "bytes"]);
        let values = vec![
            Value::from(0x123u32),
            Value::Array(vec![0x456u32.into(), 0x789u32.into()]),
            Value::String("0x31323334353637383930".into()),
            Value::from(b"Hello, world!".to_vec()),
        ];
        let data = encode(&tys, &values).unwrap();
        let expected = "0000000000000000000000000000000000000000000000000000000000000123\
                        0000000000000000000000000000000000000000000000000000000000000080\
                        3132333435363738393000000000000000000000000000000000000000000000\
                        00000000000000000000000000000000000000000000000000000000000000e0\
                        0000000000000000000000000000000000000000000000000000000000000002\
                        0000000000000000000000000000000000000000000000000000000000000456\
                        0000000000000000000000000000000000000000000000000000000000000789\
                        000000000000000000000000000000000000000000000000000000000000000d\
                        48656c6c6f2c20776f726c642100000000000000000000000000000000000000";
        assert_eq!(hex::encode(&data), expected);
        let decoded = decode(&tys, &data).unwrap();
        assert_eq!(decoded[0], Value::Uint(U256::from(0x123u32)));
        assert_eq!(
            decoded[1],
            Value::Array(vec![
                Value::Uint(U256::from(0x456u32)),
                Value::Uint(U256::from(0x789u32))
            ])
        );
        assert_eq!(decoded[2], Value::FixedBytes(b"1234567890".to_vec()));
        assert_eq!(decoded[3], Value::Bytes(b"Hello, world!".to_vec()));
    }

    #[test]
    fn string_arrays_roundtrip() {
        let tys = types(&["string[]", "address", "string[2]"]);
        let addr = Address::from_evm([7u8; 20]);
        let values = vec![
            Value::Array(vec!["one".into(), "".into(), "three".into()]),
            Value::Address(addr.clone()),
            Value::Array(vec!["x".into(), "y".repeat(40).into()]),
        ];
        let data = encode(&tys, &values).unwrap();
        assert_eq!(decode(&tys, &data).unwrap(), values);
    }

    #[test]
    fn addresses_accept_every_form() {
        let addr = Address::from_base58("TSGkU4jYbYCosYFtrVSYMWGhatFjgSRfnq").unwrap();
        let expected = encode(&types(&["address"]), &[Value::Address(addr.clone())]).unwrap();
        for form in [
            Value::String(addr.to_base58()),
            Value::String(addr.to_hex()),
            Value::String(format!("0x{}", addr.to_evm_hex())),
            Value::Bytes(addr.to_bytes().to_vec()),
            Value::Bytes(addr.to_evm_bytes().to_vec()),
        ] {
            assert_eq!(encode(&types(&["address"]), &[form]).unwrap(), expected);
        }
        assert_eq!(&expected[..12], &[0u8; 12]);
        assert_eq!(&expected[12..], &addr.to_evm_bytes());
    }

    #[test]
    fn integer_ranges() {
        let u8t = types(&["uint8"]);
        assert!(encode(&u8t, &[255u32.into()]).is_ok());
        assert!(matches!(
            encode(&u8t, &[256u32.into()]),
            Err(AbiError::OutOfRange { .. })
        ));
        assert!(matches!(
            encode(&u8t, &[(-1i32).into()]),
            Err(AbiError::OutOfRange { .. })
        ));
        assert!(matches!(
            encode(&u8t, &["-1".into()]),
            Err(AbiError::OutOfRange { .. })
        ));
        let i8t = types(&["int8"]);
        assert!(encode(&i8t, &[(-128i32).into()]).is_ok());
        assert!(encode(&i8t, &[127i32.into()]).is_ok());
        assert!(encode(&i8t, &[128i32.into()]).is_err());
        assert!(encode(&i8t, &[(-129i32).into()]).is_err());
        let data = encode(&i8t, &["-2".into()]).unwrap();
        assert_eq!(data, vec![0xff; 31].into_iter().chain([0xfe]).collect::<Vec<_>>());
        assert_eq!(decode(&i8t, &data).unwrap(), vec![Value::Int(I256::from(-2i32))]);
    }

    #[test]
    fn numeric_strings() {
        let t = types(&["uint256"]);
        let a = encode(&t, &["1000".into()]).unwrap();
        let b = encode(&t, &["0x3e8".into()]).unwrap();
        assert_eq!(a, b);
        assert!(encode(&t, &["ten".into()]).is_err());
        let max = encode(&types(&["int256"]), &[Value::Int(I256::MIN)]).unwrap();
        assert_eq!(max[0], 0x80);
    }

    #[test]
    fn fixed_bytes_length_must_match() {
        let t = types(&["bytes32"]);
        assert!(encode(&t, &[Value::Bytes(vec![1u8; 32])]).is_ok());
        assert!(matches!(
            encode(&t, &[Value::Bytes(vec![1u8; 31])]),
            Err(AbiError::WrongLength { expected: 32, got: 31, .. })
        ));
        assert!(encode(&t, &[Value::String("0x1234".into())]).is_err());
    }

    #[test]
    fn decode_rejects_bad_payloads() {
        let t = types(&["string"]);
        assert!(matches!(decode(&t, &[0u8; 16]), Err(AbiError::Truncated(_))));
        let mut bad_offset = vec![0u8; 32];
        bad_offset[31] = 0x40;
        assert!(matches!(
            decode(&t, &bad_offset),
            Err(AbiError::OffsetOutOfRange(_))
        ));
        let mut bad_len = vec![0u8; 64];
        bad_len[31] = 0x20;
        bad_len[63] = 0x50;
        assert!(matches!(decode(&t, &bad_len), Err(AbiError::Truncated(_))));
        let mut huge_array = vec![0u8; 64];
        huge_array[31] = 0x20;
        huge_array[32..].copy_from_slice(&[0xffu8; 32]);
        assert!(decode(&types(&["uint8[]"]), &huge_array).is_err());
        let mut not_bool = [0u8; 32];
        not_bool[31] = 2;
        assert!(decode(&types(&["bool"]), &not_bool).is_err());
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!(
            encode(&types(&["uint8", "bool"]), &[1u8.into()]),
            Err(AbiError::ArityMismatch { expected: 2, got: 1 })
        );
    }

    #[quickcheck]
    fn bytes_and_ints_roundtrip(blob: Vec<u8>, n: u64, m: i64, s: String) -> bool {
        let tys = types(&["bytes", "uint64", "int64", "string", "uint256[]"]);
        let values = vec![
            Value::Bytes(blob),
            Value::from(n),
            Value::from(m),
            Value::String(s),
            Value::Array(vec![n.into(), 0u8.into()]),
        ];
        let data = match encode(&tys, &values) {
            Ok(d) => d,
            Err(_) => return false,
        };
        decode(&tys, &data).map(|v| {
            v[0] == values[0]
                && v[1].as_u64() == Some(n)
                && v[2].as_i64() == Some(m)
                && v[3] == values[3]
                && v[4].as_array().map(|a| a.len()) == Some(2)
        }) == Ok(true)
    }
}
