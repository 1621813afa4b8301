//! The tagged, recursively-typed property tree (§4.1) plus the RGBA
//! convenience conversion.

use crate::{
    error::{CodecError, CodecResult},
    primitives::{Reader, Writer},
};

const TAG_NONE: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_DOUBLE: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_LIST: u8 = 4;
const TAG_DICTIONARY: u8 = 5;
const TAG_SIGNED_64: u8 = 6;
const TAG_UNSIGNED_64: u8 = 7;

/// A property tree value. `Dictionary` preserves insertion order rather than
/// using a hash map, since the write side must reproduce the exact byte
/// stream a matching read side produced.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyTree {
    None,
    Bool(bool),
    Double(f64),
    String(String),
    List(Vec<PropertyTree>),
    Dictionary(Vec<(String, PropertyTree)>),
    Signed64(i64),
    Unsigned64(u64),
}

impl PropertyTree {
    pub fn as_dictionary(&self) -> Option<&[(String, PropertyTree)]> {
        match self {
            PropertyTree::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn dict_get(&self, key: &str) -> Option<&PropertyTree> {
        self.as_dictionary()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

pub fn decode(reader: &mut Reader) -> CodecResult<PropertyTree> {
    let tag = reader.read_u8()?;
    let _any_type_flag = reader.read_u8()?;

    match tag {
        TAG_NONE => Ok(PropertyTree::None),
        TAG_BOOL => Ok(PropertyTree::Bool(reader.read_bool()?)),
        TAG_DOUBLE => Ok(PropertyTree::Double(reader.read_double()?)),
        TAG_STRING => Ok(PropertyTree::String(reader.read_string()?)),
        TAG_LIST => {
            let count = reader.read_space_optim_u32()?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(decode(reader)?);
            }
            Ok(PropertyTree::List(items))
        },
        TAG_DICTIONARY => {
            let count = reader.read_u32()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let key = reader.read_string_property()?;
                let value = decode(reader)?;
                entries.push((key, value));
            }
            Ok(PropertyTree::Dictionary(entries))
        },
        TAG_SIGNED_64 => Ok(PropertyTree::Signed64(reader.read_i64()?)),
        TAG_UNSIGNED_64 => Ok(PropertyTree::Unsigned64(reader.read_u64()?)),
        other => Err(CodecError::UnknownPropertyType(other)),
    }
}

pub fn encode(writer: &mut Writer, tree: &PropertyTree) {
    if let PropertyTree::String(s) = tree {
        if let Some(channels) = parse_rgba_string(s) {
            encode_rgba_dictionary(writer, channels);
            return;
        }
    }

    encode_plain(writer, tree)
}

fn encode_plain(writer: &mut Writer, tree: &PropertyTree) {
    match tree {
        PropertyTree::None => {
            writer.write_u8(TAG_NONE);
            writer.write_u8(0);
        },
        PropertyTree::Bool(v) => {
            writer.write_u8(TAG_BOOL);
            writer.write_u8(0);
            writer.write_bool(*v);
        },
        PropertyTree::Double(v) => {
            writer.write_u8(TAG_DOUBLE);
            writer.write_u8(0);
            writer.write_double(*v);
        },
        PropertyTree::String(v) => {
            writer.write_u8(TAG_STRING);
            writer.write_u8(0);
            writer.write_string(v);
        },
        PropertyTree::List(items) => {
            writer.write_u8(TAG_LIST);
            writer.write_u8(0);
            writer.write_space_optim_u32(items.len() as u32);
            for item in items {
                encode(writer, item);
            }
        },
        PropertyTree::Dictionary(entries) => {
            writer.write_u8(TAG_DICTIONARY);
            writer.write_u8(0);
            writer.write_u32(entries.len() as u32);
            for (key, value) in entries {
                writer.write_string_property(key);
                encode(writer, value);
            }
        },
        PropertyTree::Signed64(v) => {
            writer.write_u8(TAG_SIGNED_64);
            writer.write_u8(0);
            writer.write_i64(*v);
        },
        PropertyTree::Unsigned64(v) => {
            writer.write_u8(TAG_UNSIGNED_64);
            writer.write_u8(0);
            writer.write_u64(*v);
        },
    }
}

fn encode_rgba_dictionary(writer: &mut Writer, (r, g, b, a): (u8, u8, u8, u8)) {
    writer.write_u8(TAG_DICTIONARY);
    writer.write_u8(0);
    writer.write_u32(4);
    for (key, channel) in [("r", r), ("g", g), ("b", b), ("a", a)] {
        writer.write_string_property(key);
        writer.write_u8(TAG_DOUBLE);
        writer.write_u8(0);
        writer.write_double(channel as f64 / 255.0);
    }
}

/// Parses `rgba:RRGGBBAA` (case-insensitive hex), returning `(r, g, b, a)`.
fn parse_rgba_string(s: &str) -> Option<(u8, u8, u8, u8)> {
    let hex = s.get(0..5).filter(|prefix| prefix.eq_ignore_ascii_case("rgba:"))?;
    let _ = hex;
    let hex = &s[5..];

    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let byte_at = |i: usize| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok();
    Some((byte_at(0)?, byte_at(1)?, byte_at(2)?, byte_at(3)?))
}

/// Caller's-discretion conversion: a Dictionary whose key set is exactly
/// `{a,b,g,r}` may be converted back to an `rgba:` string. The codec itself
/// does not apply this automatically (§4.1).
pub fn dictionary_as_rgba_string(entries: &[(String, PropertyTree)]) -> Option<String> {
    if entries.len() != 4 {
        return None;
    }

    let channel = |key: &str| -> Option<u8> {
        entries.iter().find(|(k, _)| k == key).and_then(|(_, v)| match v {
            PropertyTree::Double(d) => Some((d.clamp(0.0, 1.0) * 255.0).round() as u8),
            _ => None,
        })
    };

    let keys: std::collections::BTreeSet<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
    let expected: std::collections::BTreeSet<&str> = ["a", "b", "g", "r"].into_iter().collect();
    if keys != expected {
        return None;
    }

    let (r, g, b, a) = (channel("r")?, channel("g")?, channel("b")?, channel("a")?);
    Some(format!("rgba:{:02x}{:02x}{:02x}{:02x}", r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(tree: &PropertyTree) -> PropertyTree {
        let mut w = Writer::new();
        encode(&mut w, tree);
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        decode(&mut r).unwrap()
    }

    #[test]
    fn none_round_trips() {
        assert_eq!(round_trip(&PropertyTree::None), PropertyTree::None);
    }

    #[test]
    fn nested_dictionary_and_list_round_trip() {
        let tree = PropertyTree::Dictionary(vec![
            ("a".into(), PropertyTree::Bool(true)),
            (
                "b".into(),
                PropertyTree::List(vec![PropertyTree::Double(1.5), PropertyTree::String("x".into())]),
            ),
        ]);
        assert_eq!(round_trip(&tree), tree);
    }

    #[test]
    fn exact_byte_layout_for_foo_true_dictionary() {
        let tree = PropertyTree::Dictionary(vec![("foo".into(), PropertyTree::Bool(true))]);
        let mut w = Writer::new();
        encode(&mut w, &tree);
        let bytes = w.into_bytes();

        let mut expected = vec![0x05, 0x00];
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(0x00); // string-property: not-empty flag
        expected.push(0x03); // space-optim length of "foo"
        expected.extend_from_slice(b"foo");
        expected.push(0x01); // bool tag
        expected.push(0x00); // any-type flag
        expected.push(0x01); // true

        assert_eq!(bytes, expected);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = [0x09, 0x00];
        let mut r = Reader::new(&bytes);
        assert!(matches!(decode(&mut r), Err(CodecError::UnknownPropertyType(9))));
    }

    #[test]
    fn rgba_string_encodes_as_dictionary() {
        let tree = PropertyTree::String("rgba:1a2b3c4d".to_string());
        let mut w = Writer::new();
        encode(&mut w, &tree);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let decoded = decode(&mut r).unwrap();
        let entries = decoded.as_dictionary().expect("expected dictionary");
        assert_eq!(dictionary_as_rgba_string(entries).as_deref(), Some("rgba:1a2b3c4d"));
    }

    #[test]
    fn non_rgba_string_round_trips_as_string() {
        let tree = PropertyTree::String("not-a-color".to_string());
        assert_eq!(round_trip(&tree), tree);
    }
}
