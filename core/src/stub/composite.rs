//! Composite key encoding
//!
//! A composite key packs an object type and a list of attributes into one
//! world-state key:
//!
//! ```text
//! U+0000 objectType U+0000 attr1 U+0000 attr2 U+0000 ...
//! ```
//!
//! Every component is terminated by `U+0000`, and components may not contain
//! `U+0000` or `U+10FFFF`, so the encoding is injective and the key built from
//! a leading subset of attributes is a string prefix of every key extending
//! it. A partial key `p` therefore covers exactly the range `[p, p + U+10FFFF)`.

use crate::error::{CoreError, Result};

/// Leading character of every composite key
pub const NAMESPACE: char = '\u{0}';

/// Separator terminating every component
pub const SEPARATOR: char = '\u{0}';

/// Upper bound used to close a partial-key range
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

fn validate_component(component: &str) -> Result<()> {
    if component.contains(SEPARATOR) || component.contains(MAX_UNICODE_RUNE) {
        return Err(CoreError::InvalidArgument(format!(
            "composite key component {:?} contains U+0000 or U+10FFFF",
            component
        )));
    }
    Ok(())
}

/// Build a composite key from an object type and attributes
pub fn create_composite_key<S: AsRef<str>>(object_type: &str, attributes: &[S]) -> Result<String> {
    validate_component(object_type)?;

    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.as_ref().len() + 1).sum::<usize>(),
    );
    key.push(NAMESPACE);
    key.push_str(object_type);
    key.push(SEPARATOR);

    for attribute in attributes {
        let attribute = attribute.as_ref();
        validate_component(attribute)?;
        key.push_str(attribute);
        key.push(SEPARATOR);
    }

    Ok(key)
}

/// Split a composite key into its object type and attributes
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>)> {
    let body = key
        .strip_prefix(NAMESPACE)
        .and_then(|rest| rest.strip_suffix(SEPARATOR))
        .ok_or_else(|| CoreError::InvalidArgument(format!("{:?} is not a composite key", key)))?;

    let mut components = body.split(SEPARATOR).map(str::to_string);
    let object_type = components.next().unwrap_or_default();
    Ok((object_type, components.collect()))
}

/// Whether `key` is in the composite-key namespace
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(NAMESPACE)
}

/// Exclusive end of the range covered by a (partial) composite key
pub fn partial_key_range_end(prefix: &str) -> String {
    let mut end = String::with_capacity(prefix.len() + MAX_UNICODE_RUNE.len_utf8());
    end.push_str(prefix);
    end.push(MAX_UNICODE_RUNE);
    end
}
