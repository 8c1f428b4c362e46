#![allow(dead_code)]

use std::sync::Arc;
use stubindex_ast::java::parse_java;
use stubindex_stubs::ElementTypeRegistry;
use stubindex_stubs::StubTree;
use stubindex_stubs::StubTreeBuilder;
use stubindex_stubs::java;
use stubindex_stubs::stub::StubRef;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness; `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn java_registry() -> Arc<ElementTypeRegistry> {
    Arc::new(java::registry().unwrap())
}

pub fn build(registry: &Arc<ElementTypeRegistry>, source: &str) -> StubTree {
    let parsed = parse_java(source, &CancellationToken::new()).unwrap();
    StubTreeBuilder::new(Arc::clone(registry))
        .build(&parsed, &CancellationToken::new())
        .unwrap()
}

/// Stubs of one element type, in preorder.
pub fn stubs_named<'a>(tree: &'a StubTree, debug_name: &str) -> Vec<StubRef<'a>> {
    tree.iter()
        .filter(|s| s.element_type().debug_name() == debug_name)
        .collect()
}

pub fn names(stubs: &[StubRef<'_>]) -> Vec<Option<String>> {
    stubs
        .iter()
        .map(|s| s.payload().name().map(|n| n.to_string()))
        .collect()
}
