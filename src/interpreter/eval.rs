use super::*;
use crate::ast::{Expression, IdentNode, Literal, MemberProperty};
use crate::specialize::{Operand, SiteId};
use std::fmt;
use tracing::debug;

/// Early errors found while lowering an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    /// `delete x` in strict mode code.
    StrictIdentifierDelete(String),
    /// `delete this.#x`.
    PrivateFieldDelete(String),
    InvalidBigInt(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::StrictIdentifierDelete(name) => {
                write!(f, "Delete of an unqualified identifier '{name}' in strict mode")
            }
            CompileError::PrivateFieldDelete(name) => {
                write!(f, "Private field '#{name}' cannot be deleted")
            }
            CompileError::InvalidBigInt(text) => write!(f, "Invalid BigInt literal: {text}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Lowered expression. `delete` nodes refer to their execution site by id;
/// the site itself lives in the interpreter's arena.
#[derive(Clone, Debug)]
pub enum Node {
    Constant(JsValue),
    Global(IdentNode),
    Member(Box<Node>, KeyNode),
    DeleteProperty {
        object: Box<Node>,
        key: KeyNode,
        site: SiteId,
    },
    /// Sloppy-mode `delete x`.
    DeleteBinding(IdentNode),
    /// `delete` of anything that is not a reference.
    DeleteValue(Box<Node>),
    Sequence(Vec<Node>),
}

#[derive(Clone, Debug)]
pub enum KeyNode {
    Named(JsString),
    Computed(Box<Node>),
}

/// A compiled expression together with its strictness.
#[derive(Clone, Debug)]
pub struct Script {
    pub(crate) root: Node,
    pub strict: bool,
}

impl Interpreter {
    pub(crate) fn lower(&mut self, expr: &Expression, strict: bool) -> Result<Node, CompileError> {
        Ok(match expr {
            Expression::Literal(lit) => Node::Constant(lower_literal(lit)?),
            Expression::Identifier(id) => Node::Global(id.clone()),
            Expression::Member(obj, prop) => {
                let object = self.lower(obj, strict)?;
                Node::Member(Box::new(object), self.lower_key(prop, strict)?)
            }
            Expression::Delete(operand) => match operand.as_ref() {
                Expression::Member(obj, prop) => {
                    let object = self.lower(obj, strict)?;
                    let key = self.lower_key(prop, strict)?;
                    let config = DeleteConfig::new(
                        strict,
                        &self.options,
                        Some(Arc::clone(&self.interrupt)),
                    );
                    let site = self.sites.alloc(config, self.options.polymorphism_limit);
                    debug!(site = site.index(), strict, "allocated delete site");
                    Node::DeleteProperty {
                        object: Box::new(object),
                        key,
                        site,
                    }
                }
                Expression::Identifier(id) if strict => {
                    return Err(CompileError::StrictIdentifierDelete(id.name().to_string()));
                }
                Expression::Identifier(id) => Node::DeleteBinding(id.clone()),
                other => Node::DeleteValue(Box::new(self.lower(other, strict)?)),
            },
            Expression::Sequence(exprs) => Node::Sequence(
                exprs
                    .iter()
                    .map(|e| self.lower(e, strict))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    fn lower_key(&mut self, prop: &MemberProperty, strict: bool) -> Result<KeyNode, CompileError> {
        match prop {
            MemberProperty::Dot(name) => Ok(KeyNode::Named(JsString::from_str(name.name()))),
            MemberProperty::Computed(expr) => {
                Ok(KeyNode::Computed(Box::new(self.lower(expr, strict)?)))
            }
            MemberProperty::Private(name) => {
                Err(CompileError::PrivateFieldDelete(name.name().to_string()))
            }
        }
    }

    pub(crate) fn eval_node(&self, node: &Node) -> Completion {
        match node {
            Node::Constant(value) => Completion::Normal(value.clone()),
            Node::Global(id) => match self.globals.get(id.name()) {
                Some(value) => Completion::Normal(value.clone()),
                None => Completion::Throw(
                    self.create_error("ReferenceError", &format!("{} is not defined", id.name())),
                ),
            },
            Node::Member(obj, key) => {
                let (base, key) = match self.eval_reference(obj, key) {
                    Ok(r) => r,
                    Err(thrown) => return thrown,
                };
                Completion::Normal(get_value(&base, &to_property_key(&key)))
            }
            Node::DeleteProperty { object, key, site } => {
                let (base, key) = match self.eval_reference(object, key) {
                    Ok(r) => r,
                    Err(thrown) => return thrown,
                };
                let Some(site) = self.sites.get(*site) else {
                    return Completion::Throw(self.create_type_error("Unknown delete site"));
                };
                match site.execute(&base, &key) {
                    Ok(deleted) => Completion::Normal(JsValue::Boolean(deleted)),
                    Err(err) => Completion::Throw(self.create_type_error(&err.to_string())),
                }
            }
            // Bindings created by `define_global` are declarations and so
            // cannot be deleted; unresolvable names trivially can.
            Node::DeleteBinding(id) => {
                Completion::Normal(JsValue::Boolean(!self.globals.contains_key(id.name())))
            }
            Node::DeleteValue(inner) => match self.eval_node(inner) {
                Completion::Normal(_) => Completion::Normal(JsValue::Boolean(true)),
                other => other,
            },
            Node::Sequence(nodes) => {
                let mut result = JsValue::Undefined;
                for n in nodes {
                    result = match self.eval_node(n) {
                        Completion::Normal(v) => v,
                        other => return other,
                    };
                }
                Completion::Normal(result)
            }
        }
    }

    /// Base and raw key of a property reference, with the base checked by
    /// §7.2.1 RequireObjectCoercible.
    fn eval_reference(&self, obj: &Node, key: &KeyNode) -> Result<(JsValue, JsValue), Completion> {
        let base = match self.eval_node(obj) {
            Completion::Normal(v) => v,
            other => return Err(other),
        };
        let key = match key {
            KeyNode::Named(name) => JsValue::String(name.clone()),
            KeyNode::Computed(expr) => match self.eval_node(expr) {
                Completion::Normal(v) => v,
                other => return Err(other),
            },
        };
        if base.is_nullish() {
            let msg = format!(
                "Cannot convert {base} to object (property '{}')",
                to_property_key(&key)
            );
            return Err(Completion::Throw(self.create_type_error(&msg)));
        }
        Ok((base, key))
    }

    pub(crate) fn create_error(&self, name: &str, msg: &str) -> JsValue {
        let mut data = JsObjectData::new();
        data.class_name = name.to_string();
        data.prototype = self.error_prototype.clone();
        data.insert_value("message".to_string(), JsValue::string(msg));
        data.insert_value("name".to_string(), JsValue::string(name));
        JsValue::Object(JsObject::new(data))
    }

    pub(crate) fn create_type_error(&self, msg: &str) -> JsValue {
        self.create_error("TypeError", msg)
    }
}

fn lower_literal(lit: &Literal) -> Result<JsValue, CompileError> {
    Ok(match lit {
        Literal::Undefined => JsValue::Undefined,
        Literal::Null => JsValue::Null,
        Literal::Boolean(b) => JsValue::Boolean(*b),
        Literal::Number(n) => JsValue::Number(*n),
        Literal::String(s) => JsValue::string(s),
        Literal::BigInt(text) => {
            let value = text
                .parse::<num_bigint::BigInt>()
                .map_err(|_| CompileError::InvalidBigInt(text.clone()))?;
            JsValue::BigInt(JsBigInt { value })
        }
    })
}

/// `base[key]` for a non-nullish base.
fn get_value(base: &JsValue, key: &PropertyKey) -> JsValue {
    match Operand::of(base) {
        Operand::Ordinary(obj) | Operand::ArrayLike(obj) => {
            obj.data.borrow().get_property(&key.to_storage_key())
        }
        Operand::String(s) => match key {
            PropertyKey::Index(index) => s
                .code_units
                .get(*index as usize)
                .map_or(JsValue::Undefined, |&unit| {
                    JsValue::String(JsString {
                        code_units: vec![unit],
                    })
                }),
            _ if key.is_named("length") => JsValue::Number(s.len() as f64),
            _ => JsValue::Undefined,
        },
        Operand::Foreign(obj) => interop::get_own_property(obj, key)
            .and_then(|desc| desc.value)
            .unwrap_or(JsValue::Undefined),
        Operand::Numeric | Operand::Symbol | Operand::Other => JsValue::Undefined,
    }
}

/// `"Name: message"` for an error object created by the interpreter, the
/// display string for anything else.
pub fn error_message(thrown: &JsValue) -> String {
    if let JsValue::Object(o) = thrown {
        let data = o.data.borrow();
        let name = data.get_property("name");
        let message = data.get_property("message");
        if let (JsValue::String(name), JsValue::String(message)) = (name, message) {
            return format!("{name}: {message}");
        }
    }
    thrown.to_string()
}
