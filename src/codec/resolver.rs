//! Two-pass decoding of option blocks
//!
//! The discriminator (`codec`, falling back to `format`) is decoded first and selects a
//! variant; the whole block is then decoded into that variant.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::codec::*;
use crate::domain::errors::DomainError;

/// Tag of an [`EncodingOptions`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Copy,
    Libx264,
    Libx265,
    GenericAudio,
    Matroska,
    Mp4,
}

impl OptionKind {
    /// Look up a discriminator value. `GenericAudio` has no tag of its own and is only
    /// reachable as a fallback.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "copy" => Some(OptionKind::Copy),
            "libx264" => Some(OptionKind::Libx264),
            "libx265" => Some(OptionKind::Libx265),
            "matroska" => Some(OptionKind::Matroska),
            "mp4" => Some(OptionKind::Mp4),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::Copy => "copy",
            OptionKind::Libx264 => "libx264",
            OptionKind::Libx265 => "libx265",
            OptionKind::GenericAudio => "audio",
            OptionKind::Matroska => "matroska",
            OptionKind::Mp4 => "mp4",
        }
    }

    /// Decode a block into this variant
    fn decode(self, block: &Value) -> Result<EncodingOptions, DomainError> {
        Ok(match self {
            OptionKind::Copy => EncodingOptions::Copy(decode_as(self, block)?),
            OptionKind::Libx264 => EncodingOptions::Libx264(decode_as(self, block)?),
            OptionKind::Libx265 => EncodingOptions::Libx265(decode_as(self, block)?),
            OptionKind::GenericAudio => EncodingOptions::GenericAudio(decode_as(self, block)?),
            OptionKind::Matroska => EncodingOptions::Matroska(decode_as(self, block)?),
            OptionKind::Mp4 => EncodingOptions::Mp4(decode_as(self, block)?),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Discriminator {
    codec: Option<String>,
    format: Option<String>,
}

impl Discriminator {
    fn tag(&self) -> &str {
        match self.codec.as_deref() {
            Some(codec) if !codec.is_empty() => codec,
            _ => self.format.as_deref().unwrap_or(""),
        }
    }
}

/// Resolve a block with no fallback; an unrecognized or missing tag fails
pub fn resolve(block: &Value) -> Result<EncodingOptions, DomainError> {
    resolve_with_fallback(block, None)
}

/// Resolve a block, decoding into the fallback's variant when the tag is not recognized
pub fn resolve_with_fallback(
    block: &Value,
    fallback: Option<&EncodingOptions>,
) -> Result<EncodingOptions, DomainError> {
    let block = normalize(block)?;

    let discriminator: Discriminator =
        serde_yaml::from_value(block.clone()).map_err(|e| DomainError::OptionDecode {
            variant: "option block",
            field: first_failing_field::<Discriminator>(&block),
            message: e.to_string(),
        })?;

    let tag = discriminator.tag();
    let kind = match (OptionKind::from_tag(tag), fallback) {
        (Some(kind), _) => kind,
        (None, Some(fallback)) => {
            tracing::debug!(tag, fallback = fallback.kind().name(), "using fallback options");
            fallback.kind()
        }
        (None, None) => {
            return Err(DomainError::UnknownCodec {
                value: tag.to_string(),
            })
        }
    };

    kind.decode(&block)
}

/// Null blocks are treated as empty mappings; anything else must be a mapping
fn normalize(block: &Value) -> Result<Value, DomainError> {
    match block {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(block.clone()),
        Value::Tagged(tagged) => normalize(&tagged.value),
        other => Err(DomainError::OptionDecode {
            variant: "option block",
            field: None,
            message: format!("expected a mapping, found {}", type_name(other)),
        }),
    }
}

fn decode_as<T: DeserializeOwned>(kind: OptionKind, block: &Value) -> Result<T, DomainError> {
    serde_yaml::from_value(block.clone()).map_err(|e| DomainError::OptionDecode {
        variant: kind.name(),
        field: first_failing_field::<T>(block),
        message: e.to_string(),
    })
}

/// Find the key responsible for a decode failure by decoding each entry on its own
fn first_failing_field<T: DeserializeOwned>(block: &Value) -> Option<String> {
    let Value::Mapping(mapping) = block else {
        return None;
    };

    mapping.iter().find_map(|(key, value)| {
        let mut single = Mapping::new();
        single.insert(key.clone(), value.clone());
        match serde_yaml::from_value::<T>(Value::Mapping(single)) {
            Ok(_) => None,
            Err(_) => Some(match key {
                Value::String(s) => s.clone(),
                other => format!("{:?}", other),
            }),
        }
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
