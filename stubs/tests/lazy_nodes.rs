mod common;

use common::build;
use common::init_tracing;
use common::java_registry;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::Barrier;
use stubindex_ast::Language;
use stubindex_ast::LanguageRegistry;
use stubindex_ast::SyntaxKind;
use stubindex_stubs::FileState;
use stubindex_stubs::StubBasedFile;
use stubindex_stubs::lazy::SourceReparser;
use tokio_util::sync::CancellationToken;

const SOURCE: &str = "package p;\n\nclass Worker {\n    int count = 0;\n    void run() { count++; }\n}\n";

fn open() -> Arc<StubBasedFile> {
    let registry = java_registry();
    let tree = build(&registry, SOURCE);
    let reparser = SourceReparser::new(
        Arc::new(LanguageRegistry::new()),
        Language::Java,
        Arc::from(SOURCE),
    );
    Arc::new(StubBasedFile::new(Arc::new(tree), Box::new(reparser)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_readers_share_handles_and_parse_once() {
    init_tracing();
    let file = open();
    let barrier = Arc::new(Barrier::new(2));

    let reader = |file: Arc<StubBasedFile>, barrier: Arc<Barrier>, needs_text: bool| {
        tokio::task::spawn_blocking(move || {
            barrier.wait();
            let first = file.root().unwrap().children().unwrap()[0].clone();
            if needs_text {
                first.text(&CancellationToken::new()).unwrap();
            }
            first
        })
    };

    let a = reader(Arc::clone(&file), Arc::clone(&barrier), true);
    let b = reader(Arc::clone(&file), Arc::clone(&barrier), true);
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(file.state(), FileState::Parsed);
    assert_eq!(file.reparse_count(), 1);
    assert!(Arc::ptr_eq(&a, &file.root().unwrap().children().unwrap()[0]));
}

#[test]
fn identity_attributes_do_not_parse() {
    let file = open();
    let root = file.root().unwrap();
    let names: Vec<_> = root
        .children()
        .unwrap()
        .iter()
        .map(|n| (n.kind(), n.name().map(str::to_string)))
        .collect();
    assert_eq!(
        names,
        vec![
            (SyntaxKind::PackageStatement, Some("p".to_string())),
            (SyntaxKind::Class, Some("Worker".to_string())),
        ]
    );
    assert_eq!(file.state(), FileState::StubOnly);
    assert_eq!(file.reparse_count(), 0);
}

#[test]
fn text_queries_bind_to_parse_nodes() {
    let file = open();
    let class = file.root().unwrap().children().unwrap()[1].clone();
    let members = class.children().unwrap();
    let field = members
        .iter()
        .find(|n| n.kind() == SyntaxKind::Field)
        .unwrap();

    let token = CancellationToken::new();
    assert_eq!(field.text(&token).unwrap(), "int count = 0;");
    let method = members
        .iter()
        .find(|n| n.kind() == SyntaxKind::Method)
        .unwrap();
    assert!(method.syntax_children(&token).unwrap().contains(&SyntaxKind::CodeBlock));
    assert_eq!(file.reparse_count(), 1);
}
