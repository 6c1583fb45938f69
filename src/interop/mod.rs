//! Capability protocol for embedder-provided objects.
//!
//! A foreign object is never inspected directly: the engine asks it whether
//! it has members, indexed elements or hash entries, and whether a given
//! one can be removed. Any query may answer [`InteropError::Unsupported`],
//! which callers read as "capability absent".

pub mod host;

use crate::interpreter::{PropertyDescriptor, PropertyKey};
use crate::types::JsValue;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum InteropError {
    /// The object does not implement the queried message.
    Unsupported(&'static str),
    UnknownIdentifier(String),
    /// `remove_hash_entry` on a missing key.
    UnknownKey,
    InvalidArrayIndex(u64),
    /// The embedder refused the operation.
    Failed(String),
}

impl fmt::Display for InteropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteropError::Unsupported(message) => write!(f, "unsupported message: {message}"),
            InteropError::UnknownIdentifier(name) => write!(f, "unknown identifier: {name}"),
            InteropError::UnknownKey => write!(f, "unknown key"),
            InteropError::InvalidArrayIndex(index) => write!(f, "invalid array index: {index}"),
            InteropError::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for InteropError {}

pub type InteropResult<T> = Result<T, InteropError>;

/// Messages a foreign object may answer. Every method defaults to
/// "unsupported" (or `false` for the `has_*` capability checks), so an
/// embedder only implements what it actually exposes.
///
/// Mutation goes through `&self`: the object is owned by the embedder, which
/// is responsible for its own interior mutability.
pub trait ForeignObject: fmt::Debug {
    fn has_members(&self) -> InteropResult<bool> {
        Ok(false)
    }

    fn is_member_existing(&self, _name: &str) -> InteropResult<bool> {
        Err(InteropError::Unsupported("isMemberExisting"))
    }

    fn is_member_removable(&self, _name: &str) -> InteropResult<bool> {
        Err(InteropError::Unsupported("isMemberRemovable"))
    }

    fn remove_member(&self, _name: &str) -> InteropResult<()> {
        Err(InteropError::Unsupported("removeMember"))
    }

    fn read_member(&self, _name: &str) -> InteropResult<JsValue> {
        Err(InteropError::Unsupported("readMember"))
    }

    fn has_array_elements(&self) -> InteropResult<bool> {
        Ok(false)
    }

    fn array_size(&self) -> InteropResult<u64> {
        Err(InteropError::Unsupported("getArraySize"))
    }

    fn is_array_element_existing(&self, _index: u64) -> InteropResult<bool> {
        Err(InteropError::Unsupported("isArrayElementExisting"))
    }

    fn is_array_element_removable(&self, _index: u64) -> InteropResult<bool> {
        Err(InteropError::Unsupported("isArrayElementRemovable"))
    }

    fn read_array_element(&self, _index: u64) -> InteropResult<JsValue> {
        Err(InteropError::Unsupported("readArrayElement"))
    }

    fn has_hash_entries(&self) -> InteropResult<bool> {
        Ok(false)
    }

    /// Fails with [`InteropError::UnknownKey`] when `key` is absent.
    fn remove_hash_entry(&self, _key: &JsValue) -> InteropResult<()> {
        Err(InteropError::Unsupported("removeHashEntry"))
    }
}

/// A capability query that answered `true`. Errors mean "absent".
pub fn capability(answer: InteropResult<bool>) -> bool {
    matches!(answer, Ok(true))
}

/// Own property of a foreign object as a data descriptor: members first,
/// then indexed elements. Removability maps to `configurable`.
pub fn get_own_property(obj: &dyn ForeignObject, key: &PropertyKey) -> Option<PropertyDescriptor> {
    if let Some(name) = key.name()
        && capability(obj.has_members())
        && capability(obj.is_member_existing(&name))
        && let Ok(value) = obj.read_member(&name)
    {
        let removable = capability(obj.is_member_removable(&name));
        return Some(PropertyDescriptor::data(value, true, true, removable));
    }
    if let Some(index) = key.as_index()
        && capability(obj.has_array_elements())
    {
        let index = u64::from(index);
        if capability(obj.is_array_element_existing(index))
            && let Ok(value) = obj.read_array_element(index)
        {
            let removable = capability(obj.is_array_element_removable(index));
            return Some(PropertyDescriptor::data(value, true, true, removable));
        }
    }
    None
}

/// Whether `key` names an existing member or element.
pub fn has_property(obj: &dyn ForeignObject, key: &PropertyKey) -> bool {
    if let Some(name) = key.name()
        && capability(obj.has_members())
        && capability(obj.is_member_existing(&name))
    {
        return true;
    }
    match key.as_index() {
        Some(index) if capability(obj.has_array_elements()) => {
            let index = u64::from(index);
            match obj.is_array_element_existing(index) {
                Ok(exists) => exists,
                Err(_) => obj.array_size().is_ok_and(|size| index < size),
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::host::{HostList, HostRecord};
    use super::*;

    #[derive(Debug)]
    struct Opaque;

    impl ForeignObject for Opaque {}

    #[test]
    fn defaults_are_unsupported() {
        let obj = Opaque;
        assert_eq!(obj.has_members(), Ok(false));
        assert!(matches!(
            obj.remove_member("x"),
            Err(InteropError::Unsupported("removeMember"))
        ));
        assert!(!capability(obj.is_member_existing("x")));
        assert!(!has_property(&obj, &PropertyKey::from_str("x")));
        assert!(get_own_property(&obj, &PropertyKey::Index(0)).is_none());
    }

    #[test]
    fn member_descriptor() {
        let rec = HostRecord::new()
            .with_member("open", JsValue::Number(1.0), true)
            .with_member("fixed", JsValue::Number(2.0), false);
        let open = get_own_property(&rec, &PropertyKey::from_str("open")).unwrap();
        assert!(open.is_configurable());
        let fixed = get_own_property(&rec, &PropertyKey::from_str("fixed")).unwrap();
        assert!(!fixed.is_configurable());
        assert!(get_own_property(&rec, &PropertyKey::from_str("missing")).is_none());
    }

    #[test]
    fn element_descriptor() {
        let list = HostList::new(vec![JsValue::Boolean(true)]);
        let desc = get_own_property(&list, &PropertyKey::Index(0)).unwrap();
        assert!(!desc.is_configurable());
        assert!(has_property(&list, &PropertyKey::Index(0)));
        assert!(!has_property(&list, &PropertyKey::Index(1)));
        assert!(get_own_property(&list, &PropertyKey::Index(1)).is_none());
    }
}
