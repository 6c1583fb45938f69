use clap::{Parser, ValueEnum};
use jsnode::ast::{Expression, Literal};
use jsnode::interop::host::{HostList, HostMap, HostRecord};
use jsnode::interpreter::{
    CompileError, JsObjectData, PropertyDescriptor, Script, error_message,
};
use jsnode::types::{ForeignRef, JsObject, JsSymbol};
use jsnode::{Completion, ContextOptions, Interpreter, JsValue};
use std::fmt;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsnode", version, about = "Self-specializing delete-property sites")]
struct Cli {
    /// Scenario to run
    #[arg(value_enum)]
    scenario: Scenario,

    /// Compile the scenario as strict mode code
    #[arg(long)]
    strict: bool,

    /// Specializations a site may hold before it generalizes
    #[arg(long, value_name = "N")]
    polymorphism_limit: Option<usize>,

    /// Treat foreign hash entries as deletable properties
    #[arg(long)]
    foreign_hash_properties: bool,

    /// Log site transitions (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Delete a non-configurable and an absent property
    Example,
    /// Drive one site through more shapes than its limit
    Megamorphic,
    /// Delete through the foreign capability protocol
    Foreign,
}

enum ScenarioError {
    Compile(CompileError),
    Uncaught(String),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Compile(err) => write!(f, "SyntaxError: {err}"),
            ScenarioError::Uncaught(msg) => write!(f, "Uncaught {msg}"),
        }
    }
}

impl From<CompileError> for ScenarioError {
    fn from(err: CompileError) -> Self {
        ScenarioError::Compile(err)
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "jsnode=debug",
        _ => "jsnode=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_options(cli: &Cli) -> ContextOptions {
    let mut options = ContextOptions::from_env();
    if let Some(limit) = cli.polymorphism_limit {
        options = options.with_polymorphism_limit(limit);
    }
    if cli.foreign_hash_properties {
        options = options.with_foreign_hash_properties(true);
    }
    options
}

fn evaluate(interp: &Interpreter, label: &str, script: &Script) -> Result<JsValue, ScenarioError> {
    match interp.evaluate(script) {
        Completion::Normal(value) => {
            println!("{label} => {value}");
            Ok(value)
        }
        Completion::Throw(thrown) => Err(ScenarioError::Uncaught(error_message(&thrown))),
    }
}

fn run(
    interp: &mut Interpreter,
    label: &str,
    expr: &Expression,
    strict: bool,
) -> Result<JsValue, ScenarioError> {
    let script = interp.compile(expr, strict)?;
    evaluate(interp, label, &script)
}

fn example(interp: &mut Interpreter, strict: bool) -> Result<(), ScenarioError> {
    let mut data = JsObjectData::new();
    data.insert_property(
        "x".to_string(),
        PropertyDescriptor::data(JsValue::Number(1.0), true, true, false),
    );
    interp.define_global("o", JsValue::Object(JsObject::new(data)));

    let o = || Expression::ident("o");
    run(interp, "delete o.y", &Expression::delete(Expression::dot(o(), "y")), strict)?;
    run(interp, "delete o.x", &Expression::delete(Expression::dot(o(), "x")), strict)?;
    Ok(())
}

fn megamorphic(interp: &mut Interpreter, strict: bool) -> Result<(), ScenarioError> {
    let expr = Expression::delete(Expression::index(
        Expression::ident("t"),
        Expression::ident("k"),
    ));
    let script = interp.compile(&expr, strict)?;
    let mut record = JsObjectData::new();
    record.insert_value("a".to_string(), JsValue::Null);

    let operands = [
        ("object", JsValue::Object(JsObject::new(record)), JsValue::string("a")),
        (
            "array",
            JsValue::Object(JsObject::new(JsObjectData::new_array(vec![JsValue::Null]))),
            JsValue::Number(0.0),
        ),
        ("string", JsValue::string("abc"), JsValue::string("foo")),
        ("number", JsValue::Number(42.0), JsValue::string("x")),
        ("symbol", JsValue::Symbol(JsSymbol::new(Some("s"))), JsValue::string("x")),
        ("boolean", JsValue::Boolean(true), JsValue::string("x")),
        (
            "foreign",
            JsValue::Foreign(ForeignRef::new(HostList::new(vec![JsValue::Null]))),
            JsValue::Number(5.0),
        ),
    ];
    for (name, target, key) in operands {
        interp.define_global("t", target);
        interp.define_global("k", key);
        evaluate(interp, &format!("delete t[k] ({name})"), &script)?;
        for (id, site) in interp.sites().iter() {
            let state = site.state();
            if state.is_generalized() {
                println!("  site {} generalized (v{})", id.index(), state.version());
            } else {
                println!("  site {} {:?} (v{})", id.index(), state.entries(), state.version());
            }
        }
    }
    Ok(())
}

fn foreign(interp: &mut Interpreter, strict: bool) -> Result<(), ScenarioError> {
    let map = HostMap::new()
        .with_entry("a", JsValue::Number(1.0))
        .with_entry("b", JsValue::Number(2.0));
    let record = HostRecord::new()
        .with_member("tmp", JsValue::Null, true)
        .with_member("id", JsValue::Number(7.0), false);
    let list = HostList::new(vec![JsValue::Boolean(true), JsValue::Boolean(false)]);
    interp.define_global("m", JsValue::Foreign(ForeignRef::new(map)));
    interp.define_global("r", JsValue::Foreign(ForeignRef::new(record)));
    interp.define_global("l", JsValue::Foreign(ForeignRef::new(list)));

    let del = |obj: &str, key: Expression| {
        Expression::delete(Expression::index(Expression::ident(obj), key))
    };
    let s = |text: &str| Expression::Literal(Literal::String(text.to_string()));
    let n = |value: f64| Expression::Literal(Literal::Number(value));

    run(interp, "delete m.a", &del("m", s("a")), strict)?;
    run(interp, "delete m.zz", &del("m", s("zz")), strict)?;
    run(interp, "delete r.tmp", &del("r", s("tmp")), strict)?;
    run(interp, "delete l[9]", &del("l", n(9.0)), strict)?;
    run(interp, "delete l[0]", &del("l", n(0.0)), strict)?;
    run(interp, "delete r.id", &del("r", s("id")), strict)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = resolve_options(&cli);
    tracing::debug!(?options, scenario = ?cli.scenario, strict = cli.strict, "starting");
    let mut interp = Interpreter::new(options);

    let result = match cli.scenario {
        Scenario::Example => example(&mut interp, cli.strict),
        Scenario::Megamorphic => megamorphic(&mut interp, cli.strict),
        Scenario::Foreign => foreign(&mut interp, cli.strict),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
    }
}
