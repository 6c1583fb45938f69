use super::*;
use crate::specialize::KeyShape;
use std::fmt;

/// Largest valid array index, 2^32 - 2 (§6.1.7).
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// A property key after §7.1.19 ToPropertyKey, with canonical array
/// indices split out so dispatch can treat them separately.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKey {
    String(JsString),
    Index(u32),
    Symbol(JsSymbol),
}

impl PropertyKey {
    pub fn from_str(s: &str) -> Self {
        canonicalize(JsString::from_str(s))
    }

    pub fn shape(&self) -> KeyShape {
        match self {
            PropertyKey::String(_) => KeyShape::String,
            PropertyKey::Index(_) => KeyShape::Index,
            PropertyKey::Symbol(_) => KeyShape::Symbol,
        }
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// The key under which a native object stores this property.
    pub fn to_storage_key(&self) -> String {
        match self {
            PropertyKey::String(s) => s.to_rust_string(),
            PropertyKey::Index(i) => i.to_string(),
            PropertyKey::Symbol(sym) => sym.to_property_key(),
        }
    }

    /// String name of the key; `None` for symbols.
    pub fn name(&self) -> Option<String> {
        match self {
            PropertyKey::String(s) => Some(s.to_rust_string()),
            PropertyKey::Index(i) => Some(i.to_string()),
            PropertyKey::Symbol(_) => None,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, PropertyKey::String(s) if s.eq_str(name))
    }

    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::String(s) => JsValue::String(s.clone()),
            PropertyKey::Index(i) => JsValue::string(&i.to_string()),
            PropertyKey::Symbol(sym) => JsValue::Symbol(sym.clone()),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s}"),
            PropertyKey::Index(i) => write!(f, "{i}"),
            PropertyKey::Symbol(sym) => match &sym.description {
                Some(desc) => write!(f, "Symbol({desc})"),
                None => write!(f, "Symbol()"),
            },
        }
    }
}

// §6.1.7 array index: the canonical decimal form of an integer in 0..=2^32-2
pub fn array_index_from_str(s: &JsString) -> Option<u32> {
    let units = &s.code_units;
    if units.is_empty() || units.len() > 10 {
        return None;
    }
    if units.len() > 1 && units[0] == u16::from(b'0') {
        return None;
    }
    let mut n: u64 = 0;
    for &cu in units {
        if !(u16::from(b'0')..=u16::from(b'9')).contains(&cu) {
            return None;
        }
        n = n * 10 + u64::from(cu - u16::from(b'0'));
    }
    u32::try_from(n).ok().filter(|&i| i <= MAX_ARRAY_INDEX)
}

fn canonicalize(s: JsString) -> PropertyKey {
    match array_index_from_str(&s) {
        Some(i) => PropertyKey::Index(i),
        None => PropertyKey::String(s),
    }
}

fn number_to_key(n: f64) -> PropertyKey {
    // -0 stringifies to "0", so it is index 0 as well
    if n.fract() == 0.0 && n >= 0.0 && n <= f64::from(MAX_ARRAY_INDEX) {
        return PropertyKey::Index(n as u32);
    }
    PropertyKey::String(JsString::from_str(&number_ops::to_string(n)))
}

// §7.1.19 ToPropertyKey. Objects are reduced through their primitive value
// or their default string form; no user code runs.
pub fn to_property_key(val: &JsValue) -> PropertyKey {
    match val {
        JsValue::String(s) => canonicalize(s.clone()),
        JsValue::Symbol(sym) => PropertyKey::Symbol(sym.clone()),
        JsValue::Number(n) => number_to_key(*n),
        JsValue::Object(o) => {
            let primitive = o.data.borrow().primitive_value.clone();
            match primitive {
                Some(p) if !matches!(p, JsValue::Object(_)) => to_property_key(&p),
                _ => canonicalize(JsString::from_str(&to_js_string(val))),
            }
        }
        other => canonicalize(JsString::from_str(&to_js_string(other))),
    }
}

// §7.1.17 ToString for the values the delete path can meet
pub fn to_js_string(val: &JsValue) -> String {
    to_js_string_guarded(val, &mut Vec::new())
}

/// `active` holds the ids of the objects being stringified further up the
/// stack. An object met again renders as `""`, as Array.prototype.join does
/// for cycles.
fn to_js_string_guarded(val: &JsValue, active: &mut Vec<u64>) -> String {
    let o = match val {
        JsValue::Object(o) => o,
        JsValue::BigInt(b) => return b.value.to_string(),
        other => return format!("{other}"),
    };
    if active.contains(&o.id) {
        return String::new();
    }
    active.push(o.id);
    let data = o.data.borrow();
    let result = if let Some(ref p) = data.primitive_value {
        to_js_string_guarded(p, active)
    } else {
        match data.array_elements {
            // Array.prototype.join with ","
            Some(ref elems) => elems
                .iter()
                .map(|e| match e {
                    None | Some(JsValue::Undefined) | Some(JsValue::Null) => String::new(),
                    Some(v) => to_js_string_guarded(v, active),
                })
                .collect::<Vec<_>>()
                .join(","),
            None => format!("[object {}]", data.class_name),
        }
    };
    active.pop();
    result
}
