use crate::interop::ForeignObject;
use crate::interpreter::JsObjectData;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    BigInt(JsBigInt),
    Object(JsObject),
    /// A value owned by the embedder, reachable only through the
    /// capability protocol in [`crate::interop`].
    Foreign(ForeignRef),
}

// UTF-16 code unit string, ECMA-262 §6.1.4
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JsString {
    pub code_units: Vec<u16>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn eq_str(&self, s: &str) -> bool {
        self.code_units.iter().copied().eq(s.encode_utf16())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug)]
pub struct JsSymbol {
    pub id: u64,
    pub description: Option<JsString>,
}

impl JsSymbol {
    pub fn new(description: Option<&str>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(JsString::from_str),
        }
    }

    /// Convert to the internal property key string.
    /// Well-known symbols (description starts with "Symbol.") use a stable format
    /// without id, so hardcoded lookups like "Symbol(Symbol.iterator)" still work.
    /// User-created symbols include the unique id to avoid collisions.
    pub fn to_property_key(&self) -> String {
        match &self.description {
            Some(desc) if desc.to_string().starts_with("Symbol.") => {
                format!("Symbol({})", desc)
            }
            Some(desc) => format!("Symbol({})#{}", desc, self.id),
            None => format!("Symbol()#{}", self.id),
        }
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Clone, Debug)]
pub struct JsBigInt {
    pub value: num_bigint::BigInt,
}

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a native object. Cloning the handle aliases the object.
#[derive(Clone)]
pub struct JsObject {
    pub id: u64,
    pub data: Rc<RefCell<JsObjectData>>,
}

impl JsObject {
    pub fn new(data: JsObjectData) -> Self {
        let id = NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed);
        let data = Rc::new(RefCell::new(JsObjectData { id: Some(id), ..data }));
        Self { id, data }
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsObject({}, {})", self.id, self.data.borrow().class_name)
    }
}

/// Shared reference to an embedder object.
#[derive(Clone)]
pub struct ForeignRef(pub Rc<dyn ForeignObject>);

impl ForeignRef {
    pub fn new(obj: impl ForeignObject + 'static) -> Self {
        Self(Rc::new(obj))
    }
}

impl std::ops::Deref for ForeignRef {
    type Target = dyn ForeignObject;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for ForeignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Foreign({:?})", &*self.0)
    }
}

impl JsValue {
    pub fn string(s: &str) -> Self {
        JsValue::String(JsString::from_str(s))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }
}

// §6.1.6.1 Number type operations
pub mod number_ops {
    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x == 0.0 {
            return "0".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        // Shortest round-trip form, as Number::toString requires
        let mut buf = ryu_js::Buffer::new();
        buf.format(x).to_string()
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Symbol(s) => {
                if let Some(desc) = &s.description {
                    write!(f, "Symbol({desc})")
                } else {
                    write!(f, "Symbol()")
                }
            }
            JsValue::BigInt(b) => write!(f, "{}n", b.value),
            JsValue::Object(o) => write!(f, "[object {}]", o.data.borrow().class_name),
            JsValue::Foreign(_) => write!(f, "[foreign object]"),
        }
    }
}
