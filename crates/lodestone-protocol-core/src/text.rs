//! Text components on the wire: JSON strings before 1.20.3, NBT after.

use crate::buffer::{PacketReader, PacketWriter};
use crate::error::CodecResult;
use lodestone_nbt::NbtValue;
use lodestone_types::{ProtocolVersion, TextComponent};
use serde_json::{Map, Number, Value};

/// The client's limit for JSON chat strings.
pub const MAX_JSON_TEXT_LEN: usize = 262144;

pub fn uses_nbt_text(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_20_3
}

pub fn read_text(reader: &mut PacketReader<'_>) -> CodecResult<TextComponent> {
    if uses_nbt_text(reader.version()) {
        let nbt = reader.read_nbt_required("text component")?;
        Ok(nbt_to_text(&nbt)?)
    } else {
        read_json_text(reader)
    }
}

pub fn write_text(writer: &mut PacketWriter, text: &TextComponent) -> CodecResult<()> {
    if uses_nbt_text(writer.version()) {
        writer.write_nbt(Some(&text_to_nbt(text)?))
    } else {
        write_json_text(writer, text)
    }
}

/// JSON in every version (login disconnect never switched to NBT).
pub fn read_json_text(reader: &mut PacketReader<'_>) -> CodecResult<TextComponent> {
    let json = reader.read_string(MAX_JSON_TEXT_LEN)?;
    Ok(TextComponent::from_json(&json)?)
}

pub fn write_json_text(writer: &mut PacketWriter, text: &TextComponent) -> CodecResult<()> {
    writer.write_string(&serde_json::to_string(text)?, MAX_JSON_TEXT_LEN)
}

/// Plain text is sent as a bare string tag, anything styled as a compound.
pub fn text_to_nbt(text: &TextComponent) -> CodecResult<NbtValue> {
    if text.is_plain() {
        return Ok(NbtValue::String(text.text.clone()));
    }
    Ok(json_to_nbt(&serde_json::to_value(text)?))
}

pub fn nbt_to_text(nbt: &NbtValue) -> CodecResult<TextComponent> {
    Ok(serde_json::from_value(nbt_to_json(nbt))?)
}

/// Style keys the client reads as booleans even though NBT stores bytes.
const BOOLEAN_KEYS: &[&str] = &[
    "bold",
    "italic",
    "underlined",
    "strikethrough",
    "obfuscated",
    "interpret",
];

pub fn nbt_to_json(nbt: &NbtValue) -> Value {
    match nbt {
        NbtValue::Byte(v) => Value::from(*v),
        NbtValue::Short(v) => Value::from(*v),
        NbtValue::Int(v) => Value::from(*v),
        NbtValue::Long(v) => Value::from(*v),
        NbtValue::Float(v) => Number::from_f64(*v as f64).map_or(Value::Null, Value::Number),
        NbtValue::Double(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        NbtValue::String(v) => Value::String(v.clone()),
        NbtValue::ByteArray(v) => Value::Array(v.iter().map(|b| Value::from(*b)).collect()),
        NbtValue::IntArray(v) => Value::Array(v.iter().map(|i| Value::from(*i)).collect()),
        NbtValue::LongArray(v) => Value::Array(v.iter().map(|l| Value::from(*l)).collect()),
        NbtValue::List(items) => Value::Array(items.iter().map(unwrap_list_element).collect()),
        NbtValue::Compound(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                let json = match value {
                    NbtValue::Byte(b) if BOOLEAN_KEYS.contains(&key.as_str()) => Value::Bool(*b != 0),
                    other => nbt_to_json(other),
                };
                map.insert(key.clone(), json);
            }
            Value::Object(map)
        }
    }
}

/// Heterogeneous lists are stored as compounds with a single empty key.
fn unwrap_list_element(nbt: &NbtValue) -> Value {
    if let NbtValue::Compound(entries) = nbt {
        if let [(key, inner)] = entries.as_slice() {
            if key.is_empty() {
                return nbt_to_json(inner);
            }
        }
    }
    nbt_to_json(nbt)
}

pub fn json_to_nbt(json: &Value) -> NbtValue {
    match json {
        Value::Null => NbtValue::Compound(Vec::new()),
        Value::Bool(b) => NbtValue::Byte(*b as i8),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(i) => NbtValue::Int(i),
                    Err(_) => NbtValue::Long(i),
                }
            } else {
                NbtValue::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => NbtValue::String(s.clone()),
        Value::Array(items) => {
            let converted: Vec<NbtValue> = items.iter().map(json_to_nbt).collect();
            let homogeneous = converted
                .windows(2)
                .all(|pair| pair[0].tag_id() == pair[1].tag_id());
            if homogeneous {
                NbtValue::List(converted)
            } else {
                NbtValue::List(
                    converted
                        .into_iter()
                        .map(|value| match value {
                            NbtValue::Compound(_) => value,
                            other => NbtValue::Compound(vec![(String::new(), other)]),
                        })
                        .collect(),
                )
            }
        }
        Value::Object(map) => NbtValue::Compound(
            map.iter()
                .map(|(key, value)| (key.clone(), json_to_nbt(value)))
                .collect(),
        ),
    }
}
