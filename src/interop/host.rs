//! In-process embedder objects: a record with named members, a list with
//! indexed elements and a map with hash entries.

use super::{ForeignObject, InteropError, InteropResult};
use crate::interpreter::to_js_string;
use crate::types::JsValue;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};

#[derive(Debug, Clone)]
struct Member {
    name: String,
    value: JsValue,
    removable: bool,
}

/// Named members, each either removable or fixed. A locked record still
/// reports its members as removable but refuses to remove them.
#[derive(Debug, Default)]
pub struct HostRecord {
    members: RefCell<Vec<Member>>,
    locked: Cell<bool>,
}

impl HostRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, name: &str, value: JsValue, removable: bool) -> Self {
        self.members.borrow_mut().push(Member {
            name: name.to_string(),
            value,
            removable,
        });
        self
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.set(locked);
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.borrow().iter().map(|m| m.name.clone()).collect()
    }

    fn find(&self, name: &str) -> Option<Member> {
        self.members.borrow().iter().find(|m| m.name == name).cloned()
    }
}

impl ForeignObject for HostRecord {
    fn has_members(&self) -> InteropResult<bool> {
        Ok(true)
    }

    fn is_member_existing(&self, name: &str) -> InteropResult<bool> {
        Ok(self.find(name).is_some())
    }

    fn is_member_removable(&self, name: &str) -> InteropResult<bool> {
        Ok(self.find(name).is_some_and(|m| m.removable))
    }

    fn remove_member(&self, name: &str) -> InteropResult<()> {
        let member = self
            .find(name)
            .ok_or_else(|| InteropError::UnknownIdentifier(name.to_string()))?;
        if !member.removable {
            return Err(InteropError::Unsupported("removeMember"));
        }
        if self.locked.get() {
            return Err(InteropError::Failed(format!("record is locked: {name}")));
        }
        self.members.borrow_mut().retain(|m| m.name != name);
        Ok(())
    }

    fn read_member(&self, name: &str) -> InteropResult<JsValue> {
        self.find(name)
            .map(|m| m.value)
            .ok_or_else(|| InteropError::UnknownIdentifier(name.to_string()))
    }
}

/// A fixed sequence of elements. Foreign sequences have no holes, so no
/// element is removable.
#[derive(Debug)]
pub struct HostList {
    elements: RefCell<Vec<JsValue>>,
}

impl HostList {
    pub fn new(elements: Vec<JsValue>) -> Self {
        Self {
            elements: RefCell::new(elements),
        }
    }
}

impl ForeignObject for HostList {
    fn has_array_elements(&self) -> InteropResult<bool> {
        Ok(true)
    }

    fn array_size(&self) -> InteropResult<u64> {
        Ok(self.elements.borrow().len() as u64)
    }

    fn is_array_element_existing(&self, index: u64) -> InteropResult<bool> {
        Ok(index < self.elements.borrow().len() as u64)
    }

    fn is_array_element_removable(&self, _index: u64) -> InteropResult<bool> {
        Ok(false)
    }

    fn read_array_element(&self, index: u64) -> InteropResult<JsValue> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.elements.borrow().get(i).cloned())
            .ok_or(InteropError::InvalidArrayIndex(index))
    }
}

/// Hash entries keyed by the string form of the key. A frozen map rejects
/// removals.
#[derive(Debug, Default)]
pub struct HostMap {
    entries: RefCell<FxHashMap<String, JsValue>>,
    frozen: Cell<bool>,
}

impl HostMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: JsValue) -> Self {
        self.entries.borrow_mut().insert(key.to_string(), value);
        self
    }

    pub fn set_frozen(&self, frozen: bool) {
        self.frozen.set(frozen);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ForeignObject for HostMap {
    fn has_hash_entries(&self) -> InteropResult<bool> {
        Ok(true)
    }

    fn remove_hash_entry(&self, key: &JsValue) -> InteropResult<()> {
        let key = to_js_string(key);
        if !self.entries.borrow().contains_key(&key) {
            return Err(InteropError::UnknownKey);
        }
        if self.frozen.get() {
            return Err(InteropError::Failed("map is frozen".to_string()));
        }
        self.entries.borrow_mut().remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_removal() {
        let rec = HostRecord::new()
            .with_member("a", JsValue::Null, true)
            .with_member("b", JsValue::Null, false);
        assert_eq!(rec.remove_member("a"), Ok(()));
        assert_eq!(rec.member_names(), vec!["b".to_string()]);
        assert!(rec.remove_member("b").is_err());
        assert!(matches!(
            rec.remove_member("zzz"),
            Err(InteropError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn locked_record_fails() {
        let rec = HostRecord::new().with_member("a", JsValue::Null, true);
        rec.set_locked(true);
        assert_eq!(rec.is_member_removable("a"), Ok(true));
        assert!(matches!(rec.remove_member("a"), Err(InteropError::Failed(_))));
        rec.set_locked(false);
        assert_eq!(rec.remove_member("a"), Ok(()));
    }

    #[test]
    fn list_bounds() {
        let list = HostList::new(vec![JsValue::Number(1.0), JsValue::Number(2.0)]);
        assert_eq!(list.array_size(), Ok(2));
        assert_eq!(list.is_array_element_existing(1), Ok(true));
        assert_eq!(list.is_array_element_existing(2), Ok(false));
        assert_eq!(
            list.read_array_element(5).unwrap_err(),
            InteropError::InvalidArrayIndex(5)
        );
    }

    #[test]
    fn map_entries() {
        let map = HostMap::new().with_entry("k", JsValue::Boolean(true));
        assert_eq!(
            map.remove_hash_entry(&JsValue::string("missing")),
            Err(InteropError::UnknownKey)
        );
        map.set_frozen(true);
        assert!(matches!(
            map.remove_hash_entry(&JsValue::string("k")),
            Err(InteropError::Failed(_))
        ));
        map.set_frozen(false);
        assert_eq!(map.remove_hash_entry(&JsValue::string("k")), Ok(()));
        assert!(map.is_empty());
    }
}
