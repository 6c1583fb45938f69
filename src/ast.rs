/// AST node types for the `delete` front end.
/// Only the expression forms that can reach a delete site are modeled.
use bitflags::bitflags;
use std::sync::Arc;

/// Source range of a node, in byte offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct IdentFlags: u16 {
        const PROPERTY_NAME = 1 << 0;
        const INITIALIZED_HERE = 1 << 1;
        const FUNCTION = 1 << 2;
        const NEW_TARGET = 1 << 3;
        const DECLARED_HERE = 1 << 4;
        const THIS = 1 << 5;
        const SUPER = 1 << 6;
        /// `super(...)` call target; always set together with `SUPER`.
        const DIRECT_SUPER = 1 << 7;
        const REST_PARAMETER = 1 << 8;
        const CATCH_PARAMETER = 1 << 9;
        const IMPORT_META = 1 << 10;
        const ARGUMENTS = 1 << 11;
        const APPLY_ARGUMENTS = 1 << 12;
        const PRIVATE = 1 << 13;
        /// `#x in obj`.
        const PRIVATE_IN_CHECK = 1 << 14;
    }
}

/// An identifier occurrence. Immutable: the `with_*` setters return a new
/// node that shares the name with this one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentNode {
    pub span: Span,
    name: Arc<str>,
    flags: IdentFlags,
}

macro_rules! ident_flag {
    ($($is:ident, $with:ident => $flag:expr;)*) => {
        $(
            pub fn $is(&self) -> bool {
                self.flags.contains($flag)
            }

            pub fn $with(&self) -> IdentNode {
                self.with_flags($flag)
            }
        )*
    };
}

impl IdentNode {
    pub fn new(span: Span, name: &str) -> Self {
        Self {
            span,
            name: Arc::from(name),
            flags: IdentFlags::empty(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> IdentFlags {
        self.flags
    }

    pub fn shares_name_with(&self, other: &IdentNode) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }

    /// This node with `flags` added.
    pub fn with_flags(&self, flags: IdentFlags) -> IdentNode {
        IdentNode {
            span: self.span,
            name: Arc::clone(&self.name),
            flags: self.flags | flags,
        }
    }

    ident_flag! {
        is_property_name, with_property_name => IdentFlags::PROPERTY_NAME;
        is_initialized_here, with_initialized_here => IdentFlags::INITIALIZED_HERE;
        is_function, with_function => IdentFlags::FUNCTION;
        is_new_target, with_new_target => IdentFlags::NEW_TARGET;
        is_declared_here, with_declared_here => IdentFlags::DECLARED_HERE;
        is_this, with_this => IdentFlags::THIS;
        is_super, with_super => IdentFlags::SUPER;
        is_direct_super, with_direct_super => IdentFlags::SUPER.union(IdentFlags::DIRECT_SUPER);
        is_rest_parameter, with_rest_parameter => IdentFlags::REST_PARAMETER;
        is_catch_parameter, with_catch_parameter => IdentFlags::CATCH_PARAMETER;
        is_import_meta, with_import_meta => IdentFlags::IMPORT_META;
        is_arguments, with_arguments => IdentFlags::ARGUMENTS;
        is_apply_arguments, with_apply_arguments => IdentFlags::APPLY_ARGUMENTS;
        is_private, with_private => IdentFlags::PRIVATE;
        is_private_in_check, with_private_in_check => IdentFlags::PRIVATE_IN_CHECK;
    }

    /// Compiler-generated names start with `:`.
    pub fn is_internal(&self) -> bool {
        self.name.starts_with(':')
    }

    pub fn is_meta_property(&self) -> bool {
        self.flags
            .intersects(IdentFlags::NEW_TARGET | IdentFlags::IMPORT_META)
    }

    /// Whether the name is a syntactically valid IdentifierName.
    pub fn is_identifier_name(&self) -> bool {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(c) if c == '$' || c == '_' || unicode_ident::is_xid_start(c) => {
                chars.all(|c| {
                    c == '$'
                        || c == '\u{200C}'
                        || c == '\u{200D}'
                        || unicode_ident::is_xid_continue(c)
                })
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(IdentNode),
    Member(Box<Expression>, MemberProperty),
    Delete(Box<Expression>),
    Sequence(Vec<Expression>),
}

#[derive(Clone, Debug)]
pub enum MemberProperty {
    Dot(IdentNode),
    Computed(Box<Expression>),
    Private(IdentNode),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt(String),
}

impl Expression {
    pub fn ident(name: &str) -> Self {
        Expression::Identifier(IdentNode::new(Span::default(), name))
    }

    pub fn dot(object: Expression, name: &str) -> Self {
        let prop = IdentNode::new(Span::default(), name).with_property_name();
        Expression::Member(Box::new(object), MemberProperty::Dot(prop))
    }

    pub fn index(object: Expression, key: Expression) -> Self {
        Expression::Member(Box::new(object), MemberProperty::Computed(Box::new(key)))
    }

    pub fn delete(operand: Expression) -> Self {
        Expression::Delete(Box::new(operand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_share_name() {
        let x = IdentNode::new(Span::new(4, 5), "x");
        let y = x.with_property_name();
        assert!(y.is_property_name());
        assert!(!x.is_property_name());
        assert!(x.shares_name_with(&y));
        assert_eq!(y.span, x.span);
        assert_eq!(y.name(), "x");
    }

    #[test]
    fn flags_accumulate() {
        let id = IdentNode::new(Span::default(), "a")
            .with_rest_parameter()
            .with_catch_parameter();
        assert!(id.is_rest_parameter() && id.is_catch_parameter());
        assert!(!id.is_this());
        assert_eq!(
            id.flags(),
            IdentFlags::REST_PARAMETER | IdentFlags::CATCH_PARAMETER
        );
    }

    #[test]
    fn direct_super_implies_super() {
        let id = IdentNode::new(Span::default(), "super").with_direct_super();
        assert!(id.is_super());
        assert!(id.is_direct_super());
    }

    #[test]
    fn meta_properties() {
        let plain = IdentNode::new(Span::default(), "target");
        assert!(!plain.is_meta_property());
        assert!(plain.with_new_target().is_meta_property());
        assert!(plain.with_import_meta().is_meta_property());
    }

    #[test]
    fn internal_and_identifier_names() {
        assert!(IdentNode::new(Span::default(), ":this").is_internal());
        assert!(!IdentNode::new(Span::default(), ":this").is_identifier_name());
        assert!(IdentNode::new(Span::default(), "$_ñ1").is_identifier_name());
        assert!(!IdentNode::new(Span::default(), "1a").is_identifier_name());
        assert!(!IdentNode::new(Span::default(), "").is_identifier_name());
    }
}
