//! Operand shapes: the closed set of categories a specialization can be
//! guarded on.

use crate::interop::ForeignObject;
use crate::types::{JsObject, JsString, JsValue};

/// Category of a target operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandShape {
    OrdinaryObject,
    /// Native objects with special index handling (Array exotic objects).
    ExoticArrayLikeObject,
    PrimitiveString,
    /// Numbers, safe integers and BigInts alike.
    NumericValue,
    SymbolValue,
    /// `true`, `false`, `undefined` and `null`.
    OtherPrimitive,
    ForeignObject,
}

/// Category of a normalized property key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyShape {
    String,
    Index,
    Symbol,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapePair {
    pub target: OperandShape,
    pub key: KeyShape,
}

impl ShapePair {
    pub fn new(target: OperandShape, key: KeyShape) -> Self {
        Self { target, key }
    }
}

/// A borrowed view of a value, tagged by its shape. Matching on this is how
/// implementations get at the payload once the shape is known.
#[derive(Clone, Copy)]
pub enum Operand<'a> {
    Ordinary(&'a JsObject),
    ArrayLike(&'a JsObject),
    String(&'a JsString),
    Numeric,
    Symbol,
    Other,
    Foreign(&'a dyn ForeignObject),
}

impl<'a> Operand<'a> {
    pub fn of(value: &'a JsValue) -> Self {
        match value {
            // Checked first: an embedder value is never treated natively,
            // whatever it looks like.
            JsValue::Foreign(f) => Operand::Foreign(&**f),
            JsValue::Object(o) => {
                if o.data.borrow().is_array() {
                    Operand::ArrayLike(o)
                } else {
                    Operand::Ordinary(o)
                }
            }
            JsValue::String(s) => Operand::String(s),
            JsValue::Number(_) | JsValue::BigInt(_) => Operand::Numeric,
            JsValue::Symbol(_) => Operand::Symbol,
            JsValue::Boolean(_) | JsValue::Undefined | JsValue::Null => Operand::Other,
        }
    }

    pub fn shape(&self) -> OperandShape {
        match self {
            Operand::Ordinary(_) => OperandShape::OrdinaryObject,
            Operand::ArrayLike(_) => OperandShape::ExoticArrayLikeObject,
            Operand::String(_) => OperandShape::PrimitiveString,
            Operand::Numeric => OperandShape::NumericValue,
            Operand::Symbol => OperandShape::SymbolValue,
            Operand::Other => OperandShape::OtherPrimitive,
            Operand::Foreign(_) => OperandShape::ForeignObject,
        }
    }
}

pub fn classify(value: &JsValue) -> OperandShape {
    Operand::of(value).shape()
}
