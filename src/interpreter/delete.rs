//! §13.5.1 The `delete` operator, as a set of guarded specializations plus
//! the generic reference implementation they must agree with.

use super::*;
use crate::config::ContextOptions;
use crate::interop::{self, ForeignObject, InteropError, capability};
use crate::specialize::{KeyShape, Operand, OperandShape, ShapePair, Specialization};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteError {
    /// Strict-mode deletion of an existing non-configurable property.
    ConfigurableViolation { key: String },
    /// Strict-mode deletion that a foreign object refused.
    ForeignOperationFailed { key: String, reason: String },
    Interrupted,
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteError::ConfigurableViolation { key } => {
                write!(f, "Cannot delete non-configurable property '{key}'")
            }
            DeleteError::ForeignOperationFailed { key, reason } => {
                write!(f, "Cannot delete property '{key}' of foreign object: {reason}")
            }
            DeleteError::Interrupted => write!(f, "Execution interrupted"),
        }
    }
}

impl std::error::Error for DeleteError {}

/// Fixed configuration of one delete site.
#[derive(Clone, Debug)]
pub struct DeleteConfig {
    pub strict: bool,
    /// Treat foreign hash entries as properties.
    pub foreign_hash_properties: bool,
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl DeleteConfig {
    pub fn new(strict: bool, options: &ContextOptions, interrupt: Option<Arc<AtomicBool>>) -> Self {
        Self {
            strict,
            foreign_hash_properties: options.foreign_hash_properties,
            interrupt,
        }
    }

    const fn uncached(strict: bool) -> Self {
        Self {
            strict,
            foreign_hash_properties: false,
            interrupt: None,
        }
    }
}

// Stateless, shared by every uncached caller for the life of the process.
static UNCACHED_STRICT: DeleteConfig = DeleteConfig::uncached(true);
static UNCACHED_SLOPPY: DeleteConfig = DeleteConfig::uncached(false);

/// `delete target[key]` without a call site, through the generic path.
pub fn delete_uncached(target: &JsValue, key: &JsValue, strict: bool) -> Result<bool, DeleteError> {
    let config = if strict {
        &UNCACHED_STRICT
    } else {
        &UNCACHED_SLOPPY
    };
    DeleteSpecialization::generic(config, target, &to_property_key(key))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeleteSpecialization {
    OrdinaryObject,
    ArrayIndex,
    ArrayProperty,
    StringIndex,
    StringProperty,
    Symbol,
    Numeric,
    OtherPrimitive,
    ForeignMember,
    ForeignElement,
    ForeignObject,
}

impl Specialization for DeleteSpecialization {
    type Config = DeleteConfig;
    type Output = bool;
    type Error = DeleteError;

    fn guard(self, shapes: ShapePair, _config: &DeleteConfig) -> bool {
        use DeleteSpecialization as D;
        match self {
            D::OrdinaryObject => shapes.target == OperandShape::OrdinaryObject,
            D::ArrayIndex => {
                shapes.target == OperandShape::ExoticArrayLikeObject
                    && shapes.key == KeyShape::Index
            }
            D::ArrayProperty => shapes.target == OperandShape::ExoticArrayLikeObject,
            D::StringIndex => {
                shapes.target == OperandShape::PrimitiveString && shapes.key == KeyShape::Index
            }
            D::StringProperty => shapes.target == OperandShape::PrimitiveString,
            D::Symbol => shapes.target == OperandShape::SymbolValue,
            D::Numeric => shapes.target == OperandShape::NumericValue,
            D::OtherPrimitive => shapes.target == OperandShape::OtherPrimitive,
            D::ForeignMember => {
                shapes.target == OperandShape::ForeignObject && shapes.key == KeyShape::String
            }
            D::ForeignElement => {
                shapes.target == OperandShape::ForeignObject && shapes.key == KeyShape::Index
            }
            D::ForeignObject => shapes.target == OperandShape::ForeignObject,
        }
    }

    fn narrowest(shapes: ShapePair, _config: &DeleteConfig) -> Self {
        use DeleteSpecialization as D;
        match (shapes.target, shapes.key) {
            (OperandShape::OrdinaryObject, _) => D::OrdinaryObject,
            (OperandShape::ExoticArrayLikeObject, KeyShape::Index) => D::ArrayIndex,
            (OperandShape::ExoticArrayLikeObject, _) => D::ArrayProperty,
            (OperandShape::PrimitiveString, KeyShape::Index) => D::StringIndex,
            (OperandShape::PrimitiveString, _) => D::StringProperty,
            (OperandShape::SymbolValue, _) => D::Symbol,
            (OperandShape::NumericValue, _) => D::Numeric,
            (OperandShape::OtherPrimitive, _) => D::OtherPrimitive,
            (OperandShape::ForeignObject, KeyShape::String) => D::ForeignMember,
            (OperandShape::ForeignObject, KeyShape::Index) => D::ForeignElement,
            (OperandShape::ForeignObject, KeyShape::Symbol) => D::ForeignObject,
        }
    }

    fn invoke(
        self,
        config: &DeleteConfig,
        target: &JsValue,
        key: &PropertyKey,
    ) -> Result<bool, DeleteError> {
        use DeleteSpecialization as D;
        let strict = config.strict;
        match (self, Operand::of(target), key) {
            (D::OrdinaryObject, Operand::Ordinary(obj), _) => delete_ordinary(obj, key, strict),
            (D::ArrayIndex, Operand::ArrayLike(obj), PropertyKey::Index(index)) => {
                Ok(delete_array_element(obj, *index))
            }
            (D::ArrayProperty, Operand::ArrayLike(obj), _) => {
                delete_array_property(obj, key, strict)
            }
            (D::StringIndex, Operand::String(s), PropertyKey::Index(index)) => {
                delete_string_index(s, *index, key, strict)
            }
            (D::StringProperty, Operand::String(s), _) => delete_string_property(s, key, strict),
            (D::Symbol, Operand::Symbol, _)
            | (D::Numeric, Operand::Numeric, _)
            | (D::OtherPrimitive, Operand::Other, _) => Ok(true),
            (D::ForeignMember, Operand::Foreign(obj), PropertyKey::String(_)) => {
                delete_foreign_named(obj, key, config)
            }
            (D::ForeignElement | D::ForeignObject, Operand::Foreign(obj), _) => {
                delete_foreign(obj, key, config)
            }
            // Guards keep this unreachable from a site.
            _ => Self::generic(config, target, key),
        }
    }

    fn generic(
        config: &DeleteConfig,
        target: &JsValue,
        key: &PropertyKey,
    ) -> Result<bool, DeleteError> {
        let strict = config.strict;
        match Operand::of(target) {
            Operand::Ordinary(obj) => delete_ordinary(obj, key, strict),
            Operand::ArrayLike(obj) => delete_array_property(obj, key, strict),
            Operand::String(s) => delete_string_property(s, key, strict),
            // Primitives own nothing deletable; the key has been normalized.
            Operand::Numeric | Operand::Symbol | Operand::Other => Ok(true),
            Operand::Foreign(obj) => delete_foreign(obj, key, config),
        }
    }

    fn check_budget(config: &DeleteConfig) -> Result<(), DeleteError> {
        match config.interrupt {
            Some(ref flag) if flag.load(Ordering::Relaxed) => Err(DeleteError::Interrupted),
            _ => Ok(()),
        }
    }
}

fn not_configurable(key: &PropertyKey, strict: bool) -> Result<bool, DeleteError> {
    if strict {
        Err(DeleteError::ConfigurableViolation {
            key: key.to_string(),
        })
    } else {
        Ok(false)
    }
}

fn foreign_failure(
    key: &PropertyKey,
    err: InteropError,
    strict: bool,
) -> Result<bool, DeleteError> {
    if strict {
        Err(DeleteError::ForeignOperationFailed {
            key: key.to_string(),
            reason: err.to_string(),
        })
    } else {
        Ok(false)
    }
}

// §10.1.10.1 OrdinaryDelete. Inherited properties are not looked at.
fn delete_ordinary(obj: &JsObject, key: &PropertyKey, strict: bool) -> Result<bool, DeleteError> {
    let storage = key.to_storage_key();
    let mut data = obj.data.borrow_mut();
    match data.get_own_property(&storage) {
        None => Ok(true),
        Some(desc) if !desc.is_configurable() => not_configurable(key, strict),
        Some(_) => {
            data.remove_own_property(&storage);
            Ok(true)
        }
    }
}

/// Leaves a hole; the length does not change.
fn delete_array_element(obj: &JsObject, index: u32) -> bool {
    obj.data.borrow_mut().delete_element(index);
    true
}

fn delete_array_property(
    obj: &JsObject,
    key: &PropertyKey,
    strict: bool,
) -> Result<bool, DeleteError> {
    match key {
        PropertyKey::Index(index) => Ok(delete_array_element(obj, *index)),
        _ => delete_ordinary(obj, key, strict),
    }
}

// §10.4.3 String exotic objects: indices in range and "length" are own,
// non-configurable properties.
fn delete_string_index(
    s: &JsString,
    index: u32,
    key: &PropertyKey,
    strict: bool,
) -> Result<bool, DeleteError> {
    if (index as usize) < s.len() {
        not_configurable(key, strict)
    } else {
        Ok(true)
    }
}

fn delete_string_property(
    s: &JsString,
    key: &PropertyKey,
    strict: bool,
) -> Result<bool, DeleteError> {
    match key {
        PropertyKey::Index(index) => delete_string_index(s, *index, key, strict),
        _ if key.is_named("length") => not_configurable(key, strict),
        _ => Ok(true),
    }
}

/// Hash-entry removal. `None` means the capability is not there and the
/// caller should go on to members.
fn delete_hash_entry(
    obj: &dyn ForeignObject,
    key: &PropertyKey,
    config: &DeleteConfig,
) -> Option<Result<bool, DeleteError>> {
    if !config.foreign_hash_properties || !capability(obj.has_hash_entries()) {
        return None;
    }
    match obj.remove_hash_entry(&key.to_value()) {
        Ok(()) | Err(InteropError::UnknownKey) => Some(Ok(true)),
        Err(InteropError::Unsupported(_)) => None,
        Err(err) => Some(foreign_failure(key, err, config.strict)),
    }
}

fn delete_member(
    obj: &dyn ForeignObject,
    name: &str,
    key: &PropertyKey,
    strict: bool,
) -> Result<bool, DeleteError> {
    if !capability(obj.is_member_existing(name)) {
        return Ok(true);
    }
    // An unanswered removability query leaves the decision to remove_member.
    if let Ok(false) = obj.is_member_removable(name) {
        return not_configurable(key, strict);
    }
    match obj.remove_member(name) {
        Ok(()) => Ok(true),
        Err(err) => foreign_failure(key, err, strict),
    }
}

// Foreign sequences never have holes, so their elements are never
// configurable; deleting past the end trivially succeeds.
fn delete_element(
    obj: &dyn ForeignObject,
    index: u32,
    key: &PropertyKey,
    strict: bool,
) -> Result<bool, DeleteError> {
    let size = match obj.array_size() {
        Ok(size) => size,
        Err(_) => return Ok(true),
    };
    if u64::from(index) < size {
        not_configurable(key, strict)
    } else {
        Ok(true)
    }
}

/// Foreign target with a plain string key: hash entries, then members.
fn delete_foreign_named(
    obj: &dyn ForeignObject,
    key: &PropertyKey,
    config: &DeleteConfig,
) -> Result<bool, DeleteError> {
    if let Some(result) = delete_hash_entry(obj, key, config) {
        return result;
    }
    match key.name() {
        Some(name) if capability(obj.has_members()) => {
            delete_member(obj, &name, key, config.strict)
        }
        _ => Ok(true),
    }
}

/// Any key on a foreign target. An index names a member only when the
/// object has no indexed elements.
fn delete_foreign(
    obj: &dyn ForeignObject,
    key: &PropertyKey,
    config: &DeleteConfig,
) -> Result<bool, DeleteError> {
    if let Some(result) = delete_hash_entry(obj, key, config) {
        return result;
    }
    let indexed = capability(obj.has_array_elements());
    if capability(obj.has_members()) {
        let name = match key {
            PropertyKey::String(_) => key.name(),
            PropertyKey::Index(_) if !indexed => key.name(),
            _ => None,
        };
        if let Some(name) = name {
            return delete_member(obj, &name, key, config.strict);
        }
    }
    match key {
        PropertyKey::Index(index) if indexed => delete_element(obj, *index, key, config.strict),
        _ => Ok(true),
    }
}

/// Whether `key` denotes an existing own property of `target`, whatever
/// its shape.
pub fn has_own_property(target: &JsValue, key: &JsValue) -> bool {
    let key = to_property_key(key);
    match Operand::of(target) {
        Operand::Ordinary(obj) | Operand::ArrayLike(obj) => {
            obj.data.borrow().has_own_property(&key.to_storage_key())
        }
        Operand::String(s) => match key {
            PropertyKey::Index(index) => (index as usize) < s.len(),
            _ => key.is_named("length"),
        },
        Operand::Numeric | Operand::Symbol | Operand::Other => false,
        Operand::Foreign(obj) => interop::has_property(obj, &key),
    }
}
