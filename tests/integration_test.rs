use edgeroute::query::{ArgType, StaticType};
use edgeroute::{
    compile, evaluate, Bindings, BuiltinRegistry, CompileError, Compiler, Expression, Message,
    QueryValue, Router, RouterConfig, Signature,
};
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn test_lower_condition_end_to_end() {
    let ast = Expression::eq(
        Expression::call("lower", vec![Expression::field("properties.color")]),
        Expression::literal("red"),
    );
    let compiled = compile(&ast).unwrap();

    let cases = vec![
        (Bindings::new().with("properties.color", "RED"), true),
        (Bindings::new().with("properties.color", "red"), true),
        (Bindings::new().with("properties.color", "Blue"), false),
        (Bindings::new().with("properties.color", 42), false),
        (Bindings::new().with("properties.color", QueryValue::Null), false),
        (Bindings::new(), false),
    ];

    for (bindings, expected) in cases {
        assert_eq!(evaluate(&compiled, &bindings), expected, "{:?}", bindings);
    }
}

#[test]
fn test_compile_time_overload_errors() {
    let compiler = Compiler::default();

    assert!(matches!(
        compiler.compile_condition("lower(true) = 'true'"),
        Err(CompileError::NoMatchingOverload { .. })
    ));
    assert!(matches!(
        compiler.compile_condition("lower() = ''"),
        Err(CompileError::ArgumentCount { actual: 0, .. })
    ));
    assert!(matches!(
        compiler.compile_condition("no_such_fn(1)"),
        Err(CompileError::UnknownFunction { .. })
    ));
    assert!(matches!(
        compiler.compile_condition("lower(properties.a"),
        Err(CompileError::Parse(_))
    ));
}

#[test]
fn test_custom_builtin_registration() {
    fn double(args: &[QueryValue]) -> QueryValue {
        match args {
            [QueryValue::Number(n)] => QueryValue::number(n * 2.0),
            _ => QueryValue::Undefined,
        }
    }

    let mut registry = BuiltinRegistry::with_standard_library();
    registry.register(
        "double",
        Signature::new(&[ArgType::Number], StaticType::Number),
        double,
    );
    let compiler = Compiler::new(Arc::new(registry));

    let compiled = compiler
        .compile_condition("double(properties.n) = 8 AND lower('X') = 'x'")
        .unwrap();

    assert!(compiled.matches(&Bindings::new().with("properties.n", 4)));
    assert!(!compiled.matches(&Bindings::new().with("properties.n", "4")));
    assert!(!compiled.matches(&Bindings::new()));
}

#[test]
fn test_concurrent_evaluation_matches_sequential() {
    let compiled = Arc::new(
        Compiler::default()
            .compile_condition(
                "lower(properties.color) = 'red' AND (properties.level > 3 OR $body.urgent)",
            )
            .unwrap(),
    );

    let colors = ["RED", "red", "Red", "blue", "GREEN"];
    let mut rng = rand::thread_rng();
    let messages: Vec<Bindings> = (0..400)
        .map(|_| {
            let mut bindings = Bindings::new();
            if rng.gen_bool(0.9) {
                bindings.insert("properties.color", colors[rng.gen_range(0..colors.len())]);
            }
            if rng.gen_bool(0.7) {
                bindings.insert("properties.level", rng.gen_range(0..8i32));
            }
            if rng.gen_bool(0.5) {
                bindings.insert("$body.urgent", rng.gen_bool(0.5));
            }
            bindings
        })
        .collect();

    let expected: Vec<bool> = messages.iter().map(|m| evaluate(&compiled, m)).collect();
    let messages = Arc::new(messages);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let compiled = Arc::clone(&compiled);
            let messages = Arc::clone(&messages);
            thread::spawn(move || {
                messages
                    .iter()
                    .map(|m| evaluate(&compiled, m))
                    .collect::<Vec<bool>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_router_with_messages() {
    let config = RouterConfig::from_json(
        r#"{
            "routes": [
                {"name": "alerts", "condition": "$body.temp > 30 || properties.alarm = 'on'", "endpoint": "alerts"},
                {"name": "devices", "condition": "starts_with($connectionDeviceId, 'sensor')", "endpoint": "telemetry"},
                {"name": "fallback", "condition": "NOT is_defined($body.temp)", "endpoint": "telemetry"}
            ]
        }"#,
    )
    .unwrap();
    let router = config.build_router(Compiler::default()).unwrap();

    let hot = Message::new()
        .with_system_property("connectionDeviceId", "sensor-1")
        .with_body(json!({"temp": 41}));
    assert_eq!(router.route(&hot.bindings()), vec!["alerts", "telemetry"]);

    let bare = Message::new().with_system_property("connectionDeviceId", "sensor-2");
    assert_eq!(router.route(&bare.bindings()), vec!["telemetry"]);

    let other = Message::new()
        .with_property("alarm", "off")
        .with_body(json!({"temp": 12}));
    assert!(router.route(&other.bindings()).is_empty());
}

#[test]
fn test_route_while_reloading() {
    let router = Router::default();
    router.add_route("base", "properties.kind = 'a'", "a").unwrap();

    let bindings = Bindings::new().with("properties.kind", "a");

    let writer = {
        let router = router.clone();
        thread::spawn(move || {
            for i in 0..200 {
                let name = format!("extra-{}", i % 10);
                router
                    .add_route(&name, "properties.kind = 'b'", "b")
                    .unwrap();
                router.remove_route(&name);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let router = router.clone();
            let bindings = bindings.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(router.route(&bindings), vec!["a"]);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(router.route_names(), vec!["base"]);
}
