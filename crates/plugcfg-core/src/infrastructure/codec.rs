//! Document codec: YAML text ↔ typed Rust values.
//!
//! The store never talks to `serde_yaml` directly; it goes through the
//! [`DocumentCodec`] trait so tests can inject a codec that fails on demand.
//!
//! # Decoding pipeline
//!
//! ```text
//! text ──parse──▶ serde_yaml::Value ──tag check──▶ strip root tag ──▶ T
//! ```
//!
//! 1. The whole document is parsed into an untyped [`Value`] tree first.
//! 2. Every tagged node in the tree is checked against the caller's
//!    [`TagInspector`].  One disallowed tag anywhere rejects the whole document;
//!    nothing is dropped or coerced.
//! 3. A tag on the root node naming the target type itself (for example
//!    `!my_plugin::Settings`) is removed, because the target type is already
//!    known.  Nested tags are left in place: serde uses them to select enum
//!    variants.
//! 4. The remaining tree is deserialized into `T`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::value::TaggedValue;
use serde_yaml::Value;
use thiserror::Error;

use crate::domain::allow_list::{normalize, TagInspector};

/// File extension used by [`YamlCodec`].
pub const YAML_EXTENSION: &str = "yml";

/// Errors produced while decoding or encoding a document.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text is not well-formed YAML.
    #[error("malformed YAML document: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// The document carries a type tag outside the allow-list.
    #[error("type tag `!{tag}` is not in the allow-list")]
    DisallowedTag { tag: String },

    /// The YAML is well-formed but does not match the target type's shape.
    #[error("document does not match the target type: {0}")]
    Deserialize(#[source] serde_yaml::Error),

    /// The in-memory value could not be rendered as YAML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// A structured-document format a store can persist through.
pub trait DocumentCodec {
    /// File extension (without the dot) of documents in this format.
    fn extension(&self) -> &str;

    /// Decodes `text` into `T`, rejecting any tag `inspector` does not allow.
    ///
    /// `target_tag` is the tag naming `T` itself; a root node carrying it is
    /// accepted as an explicit type annotation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] for malformed text, disallowed tags, or a shape
    /// mismatch with `T`.
    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
        target_tag: &str,
        inspector: &dyn TagInspector,
    ) -> Result<T, CodecError>;

    /// Encodes `value` in the format's canonical block layout.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialize`] if `value` cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, CodecError>;
}

/// The default codec: block-style YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl DocumentCodec for YamlCodec {
    fn extension(&self) -> &str {
        YAML_EXTENSION
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
        target_tag: &str,
        inspector: &dyn TagInspector,
    ) -> Result<T, CodecError> {
        let tree: Value = serde_yaml::from_str(text).map_err(CodecError::Parse)?;
        check_tags(&tree, inspector)?;
        let tree = strip_root_tag(tree, target_tag);
        serde_yaml::from_value(tree).map_err(CodecError::Deserialize)
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<String, CodecError> {
        serde_yaml::to_string(value).map_err(CodecError::Serialize)
    }
}

/// Walks the whole tree and fails on the first tag `inspector` rejects.
///
/// Mapping keys are checked as well as values: a tag is a tag wherever it
/// appears.
fn check_tags(value: &Value, inspector: &dyn TagInspector) -> Result<(), CodecError> {
    match value {
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = normalize(&tag);
            if !inspector.is_type_allowed(name) {
                return Err(CodecError::DisallowedTag {
                    tag: name.to_string(),
                });
            }
            check_tags(&tagged.value, inspector)
        }
        Value::Sequence(items) => items
            .iter()
            .try_for_each(|item| check_tags(item, inspector)),
        Value::Mapping(map) => map.iter().try_for_each(|(key, item)| {
            check_tags(key, inspector)?;
            check_tags(item, inspector)
        }),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
    }
}

fn strip_root_tag(value: Value, target_tag: &str) -> Value {
    match value {
        Value::Tagged(tagged) if normalize(&tagged.tag.to_string()) == normalize(target_tag) => {
            let TaggedValue { value, .. } = *tagged;
            value
        }
        other => other,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
