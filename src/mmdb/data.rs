//! MaxMind DB data-section value encoding.
//!
//! Implements the subset of the [MaxMind DB file format, v2.0][spec] needed
//! for ASN records and the metadata map: UTF-8 strings, unsigned integers,
//! maps, and arrays. Integers are written with the minimal number of bytes,
//! as the format requires.
//!
//! [spec]: https://maxmind.github.io/MaxMind-DB/
use bytes::{BufMut, BytesMut};

const TYPE_STRING: u8 = 2;
const TYPE_MAP: u8 = 7;
const TYPE_UINT16: u8 = 5;
const TYPE_UINT32: u8 = 6;
// extended types: control byte carries type 0, the next byte holds
// the actual type number minus 7
const TYPE_UINT64_EXT: u8 = 9 - 7;
const TYPE_ARRAY_EXT: u8 = 11 - 7;

/// A value to be serialized into the data section.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Map(Vec<(String, Value)>),
    Array(Vec<Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

fn put_control(buffer: &mut BytesMut, type_number: u8, size: usize) {
    if size < 29 {
        buffer.put_u8((type_number << 5) | size as u8);
    } else if size < 29 + 256 {
        buffer.put_u8((type_number << 5) | 29);
        buffer.put_u8((size - 29) as u8);
    } else if size < 285 + 65536 {
        buffer.put_u8((type_number << 5) | 30);
        buffer.put_u16((size - 285) as u16);
    } else {
        buffer.put_u8((type_number << 5) | 31);
        let adjusted = (size - 65821) as u32;
        buffer.put_slice(&adjusted.to_be_bytes()[1..]);
    }
}

/// Control byte for an extended type: the size bits live in the first byte,
/// the type number (minus 7) in the second.
fn put_extended_control(buffer: &mut BytesMut, ext_type: u8, size: usize) {
    let mut scratch = BytesMut::with_capacity(4);
    put_control(&mut scratch, 0, size);
    buffer.put_u8(scratch[0]);
    buffer.put_u8(ext_type);
    buffer.put_slice(&scratch[1..]);
}

fn minimal_be_bytes(value: u64) -> ([u8; 8], usize) {
    let bytes = value.to_be_bytes();
    let skip = value.leading_zeros() as usize / 8;
    (bytes, 8 - skip.min(8))
}

pub fn encode_value(buffer: &mut BytesMut, value: &Value) {
    match value {
        Value::String(s) => {
            put_control(buffer, TYPE_STRING, s.len());
            buffer.put_slice(s.as_bytes());
        }
        Value::Uint16(v) => {
            let (bytes, len) = minimal_be_bytes(*v as u64);
            put_control(buffer, TYPE_UINT16, len);
            buffer.put_slice(&bytes[8 - len..]);
        }
        Value::Uint32(v) => {
            let (bytes, len) = minimal_be_bytes(*v as u64);
            put_control(buffer, TYPE_UINT32, len);
            buffer.put_slice(&bytes[8 - len..]);
        }
        Value::Uint64(v) => {
            let (bytes, len) = minimal_be_bytes(*v);
            put_extended_control(buffer, TYPE_UINT64_EXT, len);
            buffer.put_slice(&bytes[8 - len..]);
        }
        Value::Map(entries) => {
            put_control(buffer, TYPE_MAP, entries.len());
            for (key, entry) in entries {
                encode_value(buffer, &Value::String(key.clone()));
                encode_value(buffer, entry);
            }
        }
        Value::Array(items) => {
            put_extended_control(buffer, TYPE_ARRAY_EXT, items.len());
            for item in items {
                encode_value(buffer, item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: &Value) -> Vec<u8> {
        let mut buffer = BytesMut::new();
        encode_value(&mut buffer, value);
        buffer.to_vec()
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(encoded(&Value::from("en")), vec![0b010_00010, b'e', b'n']);
        assert_eq!(encoded(&Value::from("")), vec![0b010_00000]);

        // 40-character string needs the one-byte extended size
        let long = "x".repeat(40);
        let bytes = encoded(&Value::from(long.as_str()));
        assert_eq!(bytes[0], 0b010_11101);
        assert_eq!(bytes[1], 40 - 29);
        assert_eq!(bytes.len(), 2 + 40);
    }

    #[test]
    fn test_encode_uints_minimal() {
        assert_eq!(encoded(&Value::Uint32(0)), vec![0b110_00000]);
        assert_eq!(encoded(&Value::Uint32(255)), vec![0b110_00001, 0xff]);
        assert_eq!(
            encoded(&Value::Uint32(15169)),
            vec![0b110_00010, 0x3b, 0x41]
        );
        assert_eq!(encoded(&Value::Uint16(2)), vec![0b101_00001, 2]);
        assert_eq!(
            encoded(&Value::Uint64(1_600_000_000)),
            vec![0b000_00100, 2, 0x5f, 0x5e, 0x10, 0x00]
        );
    }

    #[test]
    fn test_encode_map() {
        let value = Value::Map(vec![("asn".to_string(), Value::Uint32(1))]);
        assert_eq!(
            encoded(&value),
            vec![0b111_00001, 0b010_00011, b'a', b's', b'n', 0b110_00001, 1]
        );
    }

    #[test]
    fn test_encode_array() {
        let value = Value::Array(vec![Value::from("en")]);
        assert_eq!(
            encoded(&value),
            vec![0b000_00001, 4, 0b010_00010, b'e', b'n']
        );
    }
}
