// ABOUTME: Tests for the filter registry contract and the default filters

use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use stencil::{
    compile, render, CompileOptions, FilterRegistry, Output, RenderError, RenderOptions, Value,
};

fn render_str(source: &str, root: IndexMap<String, Value>) -> Result<String, RenderError> {
    render_with(source, root, &FilterRegistry::with_defaults())
}

fn render_with(
    source: &str,
    root: IndexMap<String, Value>,
    registry: &FilterRegistry,
) -> Result<String, RenderError> {
    let nodes = compile(source, &CompileOptions::default()).expect("template should compile");
    render(&nodes, registry, root, &RenderOptions::default()).map(Output::into_string)
}

fn root(entries: &[(&str, Value)]) -> IndexMap<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ============================================================================
// Registry contract
// ============================================================================

static PROBE_CALLS: AtomicUsize = AtomicUsize::new(0);

fn probe(args: &[Value]) -> Result<Value, String> {
    PROBE_CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(args.first().cloned().unwrap_or(Value::Nil))
}

#[test]
fn test_short_circuit_observed_through_a_recording_filter() {
    let mut registry = FilterRegistry::with_defaults();
    registry.register("probe", probe);

    PROBE_CALLS.store(0, Ordering::SeqCst);
    let out = render_with("{{ false and probe(1) }}", IndexMap::new(), &registry);
    assert_eq!(out, Ok("false".into()));
    assert_eq!(PROBE_CALLS.load(Ordering::SeqCst), 0, "rhs of `false and` ran");

    let out = render_with("{{ true or probe(1) }}", IndexMap::new(), &registry);
    assert_eq!(out, Ok("true".into()));
    assert_eq!(PROBE_CALLS.load(Ordering::SeqCst), 0, "rhs of `true or` ran");

    // Sanity check that the probe does record when it is reached
    let out = render_with("{{ true and probe(1) }}", IndexMap::new(), &registry);
    assert_eq!(out, Ok("true".into()));
    assert_eq!(PROBE_CALLS.load(Ordering::SeqCst), 1);
}

static ORDER_LOG: AtomicUsize = AtomicUsize::new(0);

fn order_mark(args: &[Value]) -> Result<Value, String> {
    // Appends the subject digit to a base-10 log, proving call order
    if let Some(Value::Int(n)) = args.first() {
        let prev = ORDER_LOG.load(Ordering::SeqCst);
        ORDER_LOG.store(prev * 10 + *n as usize, Ordering::SeqCst);
    }
    Ok(args.first().cloned().unwrap_or(Value::Nil))
}

#[test]
fn test_arguments_evaluate_left_to_right() {
    let mut registry = FilterRegistry::with_defaults();
    registry.register("mark", order_mark);

    ORDER_LOG.store(0, Ordering::SeqCst);
    let out = render_with(
        "{{ plus(mark(1) * 0, plus(mark(2) * 0, mark(3) * 0)) }}",
        IndexMap::new(),
        &registry,
    );
    assert_eq!(out, Ok("0".into()));
    assert_eq!(ORDER_LOG.load(Ordering::SeqCst), 123);
}

#[test]
fn test_filter_error_wraps_detail() {
    match render_str("{{ 5 | upcase }}", IndexMap::new()) {
        Err(RenderError::FilterError { name, detail }) => {
            assert_eq!(name, "upcase");
            assert!(detail.contains("expected string"), "detail: {}", detail);
        }
        other => panic!("expected FilterError, got {:?}", other),
    }
}

#[test]
fn test_empty_registry_knows_nothing() {
    let registry = FilterRegistry::empty();
    assert_eq!(
        render_with("{{ 1 | upcase }}", IndexMap::new(), &registry),
        Err(RenderError::UnknownFilter("upcase".into()))
    );
}

// ============================================================================
// Pipe / call equivalence across the default set
// ============================================================================

#[test]
fn test_pipe_equivalence_for_every_unary_filter() {
    let ctx = root(&[
        ("s", Value::String("  Ada  ".into())),
        ("xs", Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)])),
        ("f", Value::Float(2.5)),
    ]);
    let cases = [
        ("s | trim", "trim(s)"),
        ("s | upcase", "upcase(s)"),
        ("s | downcase", "downcase(s)"),
        ("xs | size", "size(xs)"),
        ("xs | first", "first(xs)"),
        ("xs | last", "last(xs)"),
        ("xs | reverse", "reverse(xs)"),
        ("xs | sort", "sort(xs)"),
        ("f | round", "round(f)"),
        ("f | floor", "floor(f)"),
        ("f | ceil", "ceil(f)"),
    ];
    for (piped, called) in cases {
        let a = render_str(&format!("{{{{ {} }}}}", piped), ctx.clone());
        let b = render_str(&format!("{{{{ {} }}}}", called), ctx.clone());
        assert_eq!(a, b, "{} vs {}", piped, called);
        assert!(a.is_ok(), "{} failed: {:?}", piped, a);
    }
}

// ============================================================================
// Default filter behaviour through templates
// ============================================================================

#[test]
fn test_string_filters() {
    let ctx = root(&[("name", Value::String("grace hopper".into()))]);
    assert_eq!(
        render_str("{{ name | capitalize }}", ctx.clone()),
        Ok("Grace hopper".into())
    );
    assert_eq!(
        render_str("{{ name | replace(\" \", \"_\") }}", ctx.clone()),
        Ok("grace_hopper".into())
    );
    assert_eq!(
        render_str("{{ name | split(\" \") | last | upcase }}", ctx.clone()),
        Ok("HOPPER".into())
    );
    assert_eq!(
        render_str("{{ name | truncate(5) }}", ctx.clone()),
        Ok("grace...".into())
    );
    assert_eq!(
        render_str("{{ name | prepend(\"cdr \") | append(\"!\") }}", ctx),
        Ok("cdr grace hopper!".into())
    );
}

#[test]
fn test_number_filters() {
    assert_eq!(render_str("{{ 0 - 7 | abs }}", IndexMap::new()), Ok("7".into()));
    assert_eq!(render_str("{{ 2.7 | round }}", IndexMap::new()), Ok("3".into()));
    assert_eq!(
        render_str("{{ 3.14159 | round(2) }}", IndexMap::new()),
        Ok("3.14".into())
    );
    assert_eq!(
        render_str("{{ 10 | plus(5) | minus(3) | times(2) | modulo(5) }}", IndexMap::new()),
        Ok("4".into())
    );
}

#[test]
fn test_list_filters() {
    let ctx = root(&[(
        "tags",
        Value::List(vec![
            Value::String("b".into()),
            Value::String("a".into()),
            Value::Nil,
            Value::String("a".into()),
        ]),
    )]);
    assert_eq!(
        render_str("{{ tags | compact | uniq | sort | join(\",\") }}", ctx.clone()),
        Ok("a,b".into())
    );
    assert_eq!(render_str("{{ tags | size }}", ctx), Ok("4".into()));
    assert_eq!(
        render_str("{{ nickname | default(\"anonymous\") }}", IndexMap::new()),
        Ok("anonymous".into())
    );
}

#[test]
fn test_filters_in_conditions_and_loops() {
    let ctx = root(&[(
        "words",
        Value::List(vec![
            Value::String("tea".into()),
            Value::String("chai".into()),
        ]),
    )]);
    assert_eq!(
        render_str(
            "{% if words | size > 1 %}{% for w in words | sort %}{{ w }} {% endfor %}{% endif %}",
            ctx
        ),
        Ok("chai tea ".into())
    );
}
