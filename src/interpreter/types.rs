use crate::types::{JsObject, JsValue};
use rustc_hash::FxHashMap;

#[derive(Debug)]
pub enum Completion {
    Normal(JsValue),
    Throw(JsValue),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn is_configurable(&self) -> bool {
        self.configurable != Some(false)
    }
}

pub struct JsObjectData {
    pub id: Option<u64>,
    pub properties: FxHashMap<String, PropertyDescriptor>,
    pub property_order: Vec<String>,
    pub prototype: Option<JsObject>,
    /// Dense storage of an Array exotic object; `None` slots are holes.
    pub array_elements: Option<Vec<Option<JsValue>>>,
    pub class_name: String,
    pub primitive_value: Option<JsValue>,
}

impl JsObjectData {
    pub fn new() -> Self {
        Self {
            id: None,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype: None,
            array_elements: None,
            class_name: "Object".to_string(),
            primitive_value: None,
        }
    }

    pub fn new_array(elements: Vec<JsValue>) -> Self {
        Self {
            array_elements: Some(elements.into_iter().map(Some).collect()),
            class_name: "Array".to_string(),
            ..Self::new()
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_elements.is_some()
    }

    pub fn array_length(&self) -> usize {
        self.array_elements.as_ref().map_or(0, Vec::len)
    }

    pub fn get_element(&self, index: u32) -> Option<&JsValue> {
        self.array_elements
            .as_ref()
            .and_then(|elems| elems.get(index as usize))
            .and_then(Option::as_ref)
    }

    /// Punch a hole at `index`. The length is unchanged.
    pub fn delete_element(&mut self, index: u32) {
        if let Some(ref mut elems) = self.array_elements
            && let Some(slot) = elems.get_mut(index as usize)
        {
            *slot = None;
        }
    }

    /// Own property lookup, including the element storage and the
    /// non-configurable `length` of arrays.
    pub fn get_own_property(&self, key: &str) -> Option<PropertyDescriptor> {
        if let Some(desc) = self.properties.get(key) {
            return Some(desc.clone());
        }
        if self.is_array() {
            if key == "length" {
                return Some(PropertyDescriptor::data(
                    JsValue::Number(self.array_length() as f64),
                    true,
                    false,
                    false,
                ));
            }
            if let Ok(idx) = key.parse::<u32>()
                && idx.to_string() == key
                && let Some(value) = self.get_element(idx)
            {
                return Some(PropertyDescriptor::data_default(value.clone()));
            }
        }
        None
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.get_own_property(key).is_some()
    }

    pub fn get_property(&self, key: &str) -> JsValue {
        if let Some(desc) = self.get_own_property(key) {
            return desc.value.unwrap_or(JsValue::Undefined);
        }
        if let Some(proto) = &self.prototype {
            return proto.data.borrow().get_property(key);
        }
        JsValue::Undefined
    }

    pub fn insert_value(&mut self, key: String, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data_default(value));
    }

    pub fn insert_property(&mut self, key: String, desc: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
    }

    /// Drop an own property from the property table. Returns whether it
    /// was present. Configurability is the caller's concern.
    pub fn remove_own_property(&mut self, key: &str) -> bool {
        if self.properties.remove(key).is_some() {
            self.property_order.retain(|k| k != key);
            true
        } else {
            false
        }
    }
}

impl Default for JsObjectData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut obj = JsObjectData::new();
        obj.insert_value("x".to_string(), JsValue::Number(1.0));
        obj.insert_property(
            "y".to_string(),
            PropertyDescriptor::data(JsValue::Null, false, false, false),
        );
        obj.insert_value("x".to_string(), JsValue::Number(2.0));
        assert_eq!(obj.property_order, vec!["x".to_string(), "y".to_string()]);
        assert!(obj.get_own_property("x").unwrap().is_configurable());
        assert!(!obj.get_own_property("y").unwrap().is_configurable());
    }

    #[test]
    fn array_holes() {
        let mut arr = JsObjectData::new_array(vec![JsValue::Number(1.0), JsValue::Number(2.0)]);
        assert!(arr.has_own_property("1"));
        arr.delete_element(1);
        assert!(!arr.has_own_property("1"));
        assert!(arr.get_element(1).is_none());
        assert!(arr.has_own_property("0"));
        assert_eq!(arr.array_length(), 2);
        // Out of range is a no-op.
        arr.delete_element(9);
        assert_eq!(arr.array_length(), 2);
    }

    #[test]
    fn non_canonical_index_strings_are_not_elements() {
        let arr = JsObjectData::new_array(vec![JsValue::Null, JsValue::Null]);
        assert!(arr.has_own_property("1"));
        assert!(!arr.has_own_property("01"));
        assert!(!arr.has_own_property("+1"));
    }

    #[test]
    fn array_length_is_non_configurable() {
        let arr = JsObjectData::new_array(vec![JsValue::Null]);
        let len = arr.get_own_property("length").unwrap();
        assert!(!len.is_configurable());
        assert!(matches!(len.value, Some(JsValue::Number(n)) if n == 1.0));
        assert!(!JsObjectData::new().has_own_property("length"));
    }

    #[test]
    fn inherited_lookup() {
        let mut proto = JsObjectData::new();
        proto.insert_value("inherited".to_string(), JsValue::Number(1.0));
        let mut child = JsObjectData::new();
        child.prototype = Some(JsObject::new(proto));
        assert!(!child.has_own_property("inherited"));
        assert!(matches!(child.get_property("inherited"), JsValue::Number(n) if n == 1.0));
        assert!(matches!(child.get_property("missing"), JsValue::Undefined));
    }

    #[test]
    fn remove_keeps_order() {
        let mut obj = JsObjectData::new();
        obj.insert_value("a".to_string(), JsValue::Null);
        obj.insert_value("b".to_string(), JsValue::Null);
        obj.insert_value("c".to_string(), JsValue::Null);
        assert!(obj.remove_own_property("b"));
        assert!(!obj.remove_own_property("b"));
        assert_eq!(obj.property_order, vec!["a".to_string(), "c".to_string()]);
    }
}
