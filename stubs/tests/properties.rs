mod common;

use common::build;
use common::java_registry;
use proptest::prelude::*;
use stubindex_stubs::StubSerializer;
use stubindex_stubs::java;
use tokio_util::sync::CancellationToken;

const KEYWORDS: &[&str] = &[
    "int", "void", "class", "enum", "package", "import", "public", "static", "final", "new",
    "return", "default", "interface", "record", "this", "super", "if", "for", "do", "try",
    "char", "long", "byte", "case", "goto", "const", "else", "while", "catch", "throw", "break",
    "native", "assert", "float", "short", "double", "boolean", "switch", "throws", "true",
    "false", "null", "extends", "private", "yield", "var", "module", "open", "to", "with",
    "finally", "sealed", "permits", "when", "exports", "opens", "uses",
];

fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,6}".prop_filter("keyword", |s| !KEYWORDS.contains(&s.as_str()))
}

fn arb_type_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,6}"
}

fn arb_annotation() -> impl Strategy<Value = String> {
    (
        arb_type_name(),
        prop::collection::vec((arb_ident(), 0..100i32), 0..3),
        any::<bool>(),
    )
        .prop_map(|(name, pairs, bare)| {
            if bare {
                format!("@{name}(1)")
            } else if pairs.is_empty() {
                format!("@{name}")
            } else {
                let args: Vec<String> = pairs.iter().map(|(k, v)| format!("{k} = {v}")).collect();
                format!("@{name}({})", args.join(", "))
            }
        })
}

fn arb_qualified() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_ident(), 1..4).prop_map(|segments| segments.join("."))
}

fn arb_modifiers() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "",
        "public ",
        "private ",
        "protected static ",
        "static final ",
        "public abstract ",
    ])
}

fn arb_type_parameters() -> impl Strategy<Value = String> {
    prop::collection::vec((arb_type_name(), prop::option::of(arb_type_name())), 0..3).prop_map(
        |params| {
            if params.is_empty() {
                return String::new();
            }
            let params: Vec<String> = params
                .iter()
                .map(|(name, bound)| match bound {
                    Some(bound) => format!("{name} extends {bound}"),
                    None => name.clone(),
                })
                .collect();
            format!("<{}>", params.join(", "))
        },
    )
}

fn arb_type_list(keyword: &'static str) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_type_name(), 0..3).prop_map(move |types| {
        if types.is_empty() {
            String::new()
        } else {
            format!(" {keyword} {}", types.join(", "))
        }
    })
}

fn arb_import() -> impl Strategy<Value = String> {
    (arb_qualified(), arb_type_name(), any::<bool>(), any::<bool>()).prop_map(
        |(package, name, is_static, on_demand)| match (is_static, on_demand) {
            (false, false) => format!("import {package}.{name};"),
            (false, true) => format!("import {package}.*;"),
            (true, false) => format!("import static {package}.{name}.member;"),
            (true, true) => format!("import static {package}.{name}.*;"),
        },
    )
}

fn arb_field() -> impl Strategy<Value = String> {
    (
        prop::option::of(arb_annotation()),
        arb_modifiers(),
        prop::collection::vec(arb_ident(), 1..3),
        prop::option::of(0..1000i32),
    )
        .prop_map(|(annotation, modifiers, names, init)| {
            let declarators: Vec<String> = names
                .iter()
                .enumerate()
                .map(|(i, name)| match init {
                    Some(value) => format!("{name}{i} = {value}"),
                    None => format!("{name}{i}"),
                })
                .collect();
            format!(
                "{} {modifiers}int {};",
                annotation.unwrap_or_default(),
                declarators.join(", ")
            )
        })
}

fn arb_method() -> impl Strategy<Value = String> {
    (
        prop::option::of(arb_annotation()),
        arb_modifiers(),
        arb_type_parameters(),
        arb_ident(),
        prop::collection::vec(arb_ident(), 0..3),
        any::<bool>(),
        arb_type_list("throws"),
        any::<bool>(),
    )
        .prop_map(
            |(annotation, modifiers, type_params, name, params, varargs, throws, local_class)| {
                let mut params: Vec<String> = params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("String {p}{i}"))
                    .collect();
                if varargs {
                    params.push("int... rest".to_string());
                }
                let body = if local_class {
                    "{ class Local { int hidden; } }"
                } else {
                    "{ }"
                };
                format!(
                    "{} {modifiers}{type_params} void {name}({}){throws} {body}",
                    annotation.unwrap_or_default(),
                    params.join(", ")
                )
            },
        )
}

fn arb_constructor() -> impl Strategy<Value = String> {
    (arb_type_name(), prop::collection::vec(arb_ident(), 0..2)).prop_map(|(name, params)| {
        let params: Vec<String> = params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("long {p}{i}"))
            .collect();
        format!("{name}({}) {{ this.x = 1; }}", params.join(", "))
    })
}

fn arb_member(depth: u32) -> BoxedStrategy<String> {
    let plain = prop_oneof![arb_field(), arb_method(), arb_constructor()];
    if depth == 0 {
        plain.boxed()
    } else {
        prop_oneof![3 => plain, 1 => arb_type_declaration(depth - 1)].boxed()
    }
}

fn arb_members(depth: u32) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_member(depth), 0..4).prop_map(|members| members.join("\n"))
}

fn arb_class(depth: u32) -> impl Strategy<Value = String> {
    (
        prop::option::of(arb_annotation()),
        arb_modifiers(),
        arb_type_name(),
        arb_type_parameters(),
        prop::option::of(arb_type_name()),
        arb_type_list("implements"),
        arb_members(depth),
    )
        .prop_map(|(annotation, modifiers, name, type_params, parent, implements, members)| {
            let extends = parent.map(|p| format!(" extends {p}")).unwrap_or_default();
            format!(
                "{}\n{modifiers}class {name}{type_params}{extends}{implements} {{\n{members}\n}}",
                annotation.unwrap_or_default()
            )
        })
}

fn arb_interface() -> impl Strategy<Value = String> {
    (
        arb_type_name(),
        arb_type_parameters(),
        arb_type_list("extends"),
        prop::collection::vec((arb_ident(), any::<bool>()), 0..3),
    )
        .prop_map(|(name, type_params, extends, methods)| {
            let methods: Vec<String> = methods
                .iter()
                .map(|(m, default)| {
                    if *default {
                        format!("default int {m}() {{ return 0; }}")
                    } else {
                        format!("String {m}(int a) throws Exception;")
                    }
                })
                .collect();
            format!(
                "interface {name}{type_params}{extends} {{\n{}\n}}",
                methods.join("\n")
            )
        })
}

fn arb_enum(depth: u32) -> impl Strategy<Value = String> {
    (
        arb_type_name(),
        prop::collection::vec((arb_type_name(), prop::option::of(0..10i32)), 0..4),
        arb_type_list("implements"),
        arb_members(depth),
    )
        .prop_map(|(name, constants, implements, members)| {
            let constants: Vec<String> = constants
                .iter()
                .enumerate()
                .map(|(i, (c, arg))| match arg {
                    Some(arg) => format!("{}{i}({arg})", c.to_uppercase()),
                    None => format!("{}{i}", c.to_uppercase()),
                })
                .collect();
            format!(
                "enum {name}{implements} {{\n{};\n{members}\n}}",
                constants.join(", ")
            )
        })
}

fn arb_record() -> impl Strategy<Value = String> {
    (
        arb_type_name(),
        arb_type_parameters(),
        prop::collection::vec(arb_ident(), 0..3),
        arb_type_list("implements"),
    )
        .prop_map(|(name, type_params, components, implements)| {
            let components: Vec<String> = components
                .iter()
                .enumerate()
                .map(|(i, c)| format!("int {c}{i}"))
                .collect();
            format!(
                "record {name}{type_params}({}){implements} {{ }}",
                components.join(", ")
            )
        })
}

fn arb_annotation_type() -> impl Strategy<Value = String> {
    (
        arb_type_name(),
        prop::collection::vec((arb_ident(), prop::option::of(0..10i32)), 0..3),
    )
        .prop_map(|(name, methods)| {
            let methods: Vec<String> = methods
                .iter()
                .map(|(m, default)| match default {
                    Some(value) => format!("int {m}() default {value};"),
                    None => format!("String[] {m}();"),
                })
                .collect();
            format!("@interface {name} {{\n{}\n}}", methods.join("\n"))
        })
}

fn arb_type_declaration(depth: u32) -> BoxedStrategy<String> {
    prop_oneof![
        3 => arb_class(depth),
        1 => arb_interface(),
        1 => arb_enum(depth),
        1 => arb_record(),
        1 => arb_annotation_type(),
    ]
    .boxed()
}

fn arb_compilation_unit() -> impl Strategy<Value = String> {
    (
        prop::option::of(arb_qualified()),
        prop::collection::vec(arb_import(), 0..4),
        prop::collection::vec(arb_type_declaration(2), 1..3),
    )
        .prop_map(|(package, imports, types)| {
            let mut source = String::new();
            if let Some(package) = package {
                source.push_str(&format!("package {package};\n"));
            }
            for import in imports {
                source.push_str(&import);
                source.push('\n');
            }
            source.push_str(&types.join("\n"));
            source.push('\n');
            source
        })
}

fn arb_module_info() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        arb_qualified(),
        prop::collection::vec(
            (0..5u8, arb_qualified(), prop::collection::vec(arb_qualified(), 0..3)),
            0..5,
        ),
    )
        .prop_map(|(open, name, directives)| {
            let directives: Vec<String> = directives
                .iter()
                .map(|(kind, target, extra)| {
                    let joined = extra.join(", ");
                    match (*kind, extra.is_empty()) {
                        (0, _) => format!("requires transitive {target};"),
                        (1, true) => format!("exports {target};"),
                        (1, false) => format!("exports {target} to {joined};"),
                        (2, true) => format!("opens {target};"),
                        (2, false) => format!("opens {target} to {joined};"),
                        (3, _) => format!("uses {target};"),
                        (_, true) => format!("provides {target} with {target}Impl;"),
                        (_, false) => format!("provides {target} with {joined};"),
                    }
                })
                .collect();
            let open = if open { "open " } else { "" };
            format!("{open}module {name} {{\n{}\n}}\n", directives.join("\n"))
        })
}

fn arb_source() -> impl Strategy<Value = String> {
    prop_oneof![4 => arb_compilation_unit(), 1 => arb_module_info()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Deserializing what was serialized gives back the built tree.
    #[test]
    fn prop_round_trip(source in arb_source()) {
        let registry = java_registry();
        let serializer = StubSerializer::new(registry.clone());
        let token = CancellationToken::new();
        let tree = build(&registry, &source);

        let bytes = serializer.serialize(&tree, &token).unwrap();
        let decoded = serializer.deserialize(&bytes, java::JAVA_STUB_VERSION, &token).unwrap();
        prop_assert_eq!(&decoded, &tree);
        prop_assert_eq!(decoded.debug_dump(), tree.debug_dump());
    }

    /// Equal trees serialize to equal bytes, also after a round trip.
    #[test]
    fn prop_serialization_is_deterministic(source in arb_source()) {
        let registry = java_registry();
        let serializer = StubSerializer::new(registry.clone());
        let token = CancellationToken::new();

        let first = serializer.serialize(&build(&registry, &source), &token).unwrap();
        let second = serializer.serialize(&build(&registry, &source), &token).unwrap();
        prop_assert_eq!(&first, &second);

        let decoded = serializer.deserialize(&first, java::JAVA_STUB_VERSION, &token).unwrap();
        prop_assert_eq!(serializer.serialize(&decoded, &token).unwrap(), first);
    }

    /// Index contributions do not depend on where the tree came from.
    #[test]
    fn prop_index_matches_after_round_trip(source in arb_source()) {
        let registry = java_registry();
        let serializer = StubSerializer::new(registry.clone());
        let token = CancellationToken::new();
        let tree = build(&registry, &source);

        let (bytes, built) = serializer.serialize_with_index(&tree, &token).unwrap();
        let decoded = serializer.deserialize(&bytes, java::JAVA_STUB_VERSION, &token).unwrap();
        let (_, reloaded) = serializer.serialize_with_index(&decoded, &token).unwrap();
        prop_assert_eq!(&reloaded, &built);
        prop_assert_eq!(serializer.index_only(&decoded, &token).unwrap(), built);
    }
}
