use crate::ast::Expression;
use crate::config::ContextOptions;
use crate::interop;
use crate::specialize::{SiteArena, SiteId, SiteState};
use crate::types::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod types;
pub use types::*;

mod helpers;
pub use helpers::*;
mod delete;
pub use delete::{
    DeleteConfig, DeleteError, DeleteSpecialization, delete_uncached, has_own_property,
};
mod eval;
pub use eval::{CompileError, Script, error_message};

pub struct Interpreter {
    options: ContextOptions,
    /// Shared with every delete site; setting it makes the next operation
    /// on any site fail with [`DeleteError::Interrupted`].
    interrupt: Arc<AtomicBool>,
    sites: SiteArena<DeleteSpecialization>,
    globals: FxHashMap<String, JsValue>,
    error_prototype: Option<JsObject>,
}

impl Interpreter {
    pub fn new(options: ContextOptions) -> Self {
        let mut error_proto = JsObjectData::new();
        error_proto.class_name = "Error".to_string();
        error_proto.insert_value("name".to_string(), JsValue::string("Error"));
        error_proto.insert_value("message".to_string(), JsValue::string(""));

        let mut globals = FxHashMap::default();
        for (name, value) in [
            ("undefined", JsValue::Undefined),
            ("NaN", JsValue::Number(f64::NAN)),
            ("Infinity", JsValue::Number(f64::INFINITY)),
        ] {
            globals.insert(name.to_string(), value);
        }

        Self {
            options,
            interrupt: Arc::new(AtomicBool::new(false)),
            sites: SiteArena::new(),
            globals,
            error_prototype: Some(JsObject::new(error_proto)),
        }
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn define_global(&mut self, name: &str, value: JsValue) {
        self.globals.insert(name.to_string(), value);
    }

    /// Lower `expr`, allocating one execution site per property delete.
    pub fn compile(&mut self, expr: &Expression, strict: bool) -> Result<Script, CompileError> {
        let root = self.lower(expr, strict)?;
        Ok(Script { root, strict })
    }

    pub fn evaluate(&self, script: &Script) -> Completion {
        self.eval_node(&script.root)
    }

    /// Compile and evaluate in one step.
    pub fn run(&mut self, expr: &Expression, strict: bool) -> Result<Completion, CompileError> {
        let script = self.compile(expr, strict)?;
        Ok(self.evaluate(&script))
    }

    pub fn sites(&self) -> &SiteArena<DeleteSpecialization> {
        &self.sites
    }

    pub fn site_state(&self, id: SiteId) -> Option<Arc<SiteState<DeleteSpecialization>>> {
        self.sites.get(id).map(|site| site.state())
    }

    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn clear_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ContextOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Literal, MemberProperty, Span};
    use crate::interop::host::HostList;
    use crate::specialize::OperandShape;

    fn str_lit(s: &str) -> Expression {
        Expression::Literal(Literal::String(s.to_string()))
    }

    fn num_lit(n: f64) -> Expression {
        Expression::Literal(Literal::Number(n))
    }

    fn delete_member(obj: &str, key: Expression) -> Expression {
        Expression::delete(Expression::index(Expression::ident(obj), key))
    }

    fn thrown_message(completion: Completion) -> String {
        match completion {
            Completion::Throw(v) => error_message(&v),
            Completion::Normal(v) => panic!("expected throw, got {v}"),
        }
    }

    fn normal_bool(completion: Completion) -> bool {
        match completion {
            Completion::Normal(JsValue::Boolean(b)) => b,
            other => panic!("expected boolean, got {other:?}"),
        }
    }

    fn interp_with_o() -> (Interpreter, JsObject) {
        let mut data = JsObjectData::new();
        data.insert_property(
            "x".to_string(),
            PropertyDescriptor::data(JsValue::Number(1.0), false, true, false),
        );
        data.insert_value("z".to_string(), JsValue::Number(3.0));
        let obj = JsObject::new(data);
        let mut interp = Interpreter::default();
        interp.define_global("o", JsValue::Object(obj.clone()));
        (interp, obj)
    }

    #[test]
    fn delete_non_configurable() {
        let (mut interp, _) = interp_with_o();
        let expr = Expression::delete(Expression::dot(Expression::ident("o"), "x"));
        let msg = thrown_message(interp.run(&expr, true).unwrap());
        assert_eq!(msg, "TypeError: Cannot delete non-configurable property 'x'");
        assert!(!normal_bool(interp.run(&expr, false).unwrap()));
        let absent = Expression::delete(Expression::dot(Expression::ident("o"), "y"));
        assert!(normal_bool(interp.run(&absent, false).unwrap()));
    }

    #[test]
    fn member_read_after_delete() {
        let (mut interp, obj) = interp_with_o();
        let read = Expression::dot(Expression::ident("o"), "z");
        assert!(matches!(
            interp.run(&read, false).unwrap(),
            Completion::Normal(JsValue::Number(n)) if n == 3.0
        ));
        let del = Expression::delete(Expression::dot(Expression::ident("o"), "z"));
        assert!(normal_bool(interp.run(&del, true).unwrap()));
        assert!(!obj.data.borrow().has_own_property("z"));
        assert!(matches!(
            interp.run(&read, false).unwrap(),
            Completion::Normal(JsValue::Undefined)
        ));
    }

    #[test]
    fn one_site_per_delete_expression() {
        let (mut interp, _) = interp_with_o();
        let expr = Expression::Sequence(vec![
            delete_member("o", str_lit("a")),
            delete_member("o", num_lit(1.0)),
            Expression::dot(Expression::ident("o"), "z"),
        ]);
        let script = interp.compile(&expr, false).unwrap();
        assert_eq!(interp.sites().len(), 2);
        assert!(!interp.evaluate(&script).is_abrupt());
        for (_, site) in interp.sites().iter() {
            assert_eq!(site.state().entries(), &[DeleteSpecialization::OrdinaryObject]);
        }
    }

    #[test]
    fn site_reused_across_evaluations() {
        let mut interp = Interpreter::new(ContextOptions::default().with_polymorphism_limit(2));
        interp.define_global("t", JsValue::string("abc"));
        let expr = delete_member("t", str_lit("length"));
        let script = interp.compile(&expr, false).unwrap();
        let id = interp.sites().iter().map(|(id, _)| id).next().unwrap();
        for value in [
            JsValue::string("abc"),
            JsValue::Number(1.0),
            JsValue::Boolean(true),
        ] {
            interp.define_global("t", value);
            assert!(!interp.evaluate(&script).is_abrupt());
        }
        let state = interp.site_state(id).unwrap();
        assert!(state.is_generalized());
        assert!(state.entries().is_empty());
    }

    #[test]
    fn nullish_base_is_type_error() {
        let mut interp = Interpreter::default();
        let expr = Expression::delete(Expression::dot(
            Expression::Literal(Literal::Null),
            "x",
        ));
        let msg = thrown_message(interp.run(&expr, false).unwrap());
        assert_eq!(msg, "TypeError: Cannot convert null to object (property 'x')");
        let expr = delete_member("undefined", str_lit("x"));
        assert!(thrown_message(interp.run(&expr, false).unwrap()).starts_with("TypeError"));
    }

    #[test]
    fn unresolvable_reference() {
        let mut interp = Interpreter::default();
        let msg = thrown_message(interp.run(&delete_member("nope", num_lit(0.0)), false).unwrap());
        assert_eq!(msg, "ReferenceError: nope is not defined");
    }

    #[test]
    fn identifier_deletes() {
        let (mut interp, _) = interp_with_o();
        let del_o = Expression::delete(Expression::ident("o"));
        assert_eq!(
            interp.compile(&del_o, true).unwrap_err(),
            CompileError::StrictIdentifierDelete("o".to_string())
        );
        assert!(!normal_bool(interp.run(&del_o, false).unwrap()));
        let del_free = Expression::delete(Expression::ident("free"));
        assert!(normal_bool(interp.run(&del_free, false).unwrap()));
    }

    #[test]
    fn private_fields_rejected() {
        let mut interp = Interpreter::default();
        let expr = Expression::delete(Expression::Member(
            Box::new(Expression::ident("o")),
            MemberProperty::Private(
                crate::ast::IdentNode::new(Span::default(), "secret").with_private(),
            ),
        ));
        assert_eq!(
            interp.compile(&expr, false).unwrap_err(),
            CompileError::PrivateFieldDelete("secret".to_string())
        );
    }

    #[test]
    fn delete_of_value_is_true() {
        let mut interp = Interpreter::default();
        assert!(normal_bool(interp.run(&Expression::delete(num_lit(1.0)), true).unwrap()));
        assert!(interp.sites().is_empty());
        let bad = Expression::delete(Expression::Literal(Literal::BigInt("12x".to_string())));
        assert!(matches!(
            interp.compile(&bad, false),
            Err(CompileError::InvalidBigInt(_))
        ));
    }

    #[test]
    fn interrupt_throws_from_site() {
        let (mut interp, _) = interp_with_o();
        let script = interp
            .compile(&Expression::delete(Expression::dot(Expression::ident("o"), "z")), false)
            .unwrap();
        interp.interrupt_handle().store(true, Ordering::Relaxed);
        assert_eq!(
            thrown_message(interp.evaluate(&script)),
            "TypeError: Execution interrupted"
        );
        interp.clear_interrupt();
        assert!(normal_bool(interp.evaluate(&script)));
    }

    #[test]
    fn foreign_reads_and_deletes() {
        let mut interp = Interpreter::default();
        let list = HostList::new(vec![JsValue::Number(7.0)]);
        interp.define_global("l", JsValue::Foreign(ForeignRef::new(list)));
        let read = Expression::index(Expression::ident("l"), num_lit(0.0));
        assert!(matches!(
            interp.run(&read, false).unwrap(),
            Completion::Normal(JsValue::Number(n)) if n == 7.0
        ));
        assert!(!normal_bool(interp.run(&delete_member("l", num_lit(0.0)), false).unwrap()));
        let id = interp.sites().iter().map(|(id, _)| id).last().unwrap();
        assert_eq!(
            interp.site_state(id).unwrap().entries(),
            &[DeleteSpecialization::ForeignElement]
        );
        assert_eq!(
            crate::specialize::classify(&JsValue::Foreign(ForeignRef::new(HostList::new(vec![])))),
            OperandShape::ForeignObject
        );
    }

    #[test]
    fn string_reads() {
        let mut interp = Interpreter::default();
        interp.define_global("s", JsValue::string("hé"));
        let read = Expression::index(Expression::ident("s"), num_lit(1.0));
        match interp.run(&read, false).unwrap() {
            Completion::Normal(JsValue::String(s)) => assert!(s.eq_str("é")),
            other => panic!("unexpected {other:?}"),
        }
        let len = Expression::dot(Expression::ident("s"), "length");
        assert!(matches!(
            interp.run(&len, false).unwrap(),
            Completion::Normal(JsValue::Number(n)) if n == 2.0
        ));
    }
}
