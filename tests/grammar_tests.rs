mod common;

use common::{TestResult, canonical, init_logging, tree};
use xpgram::xpath31::ast::{Axis, NodeTest, PathOp, StepAxis};
use xpgram::{GrammarBuilder, Node, ParseError, SyntaxKind, outline};

#[test]
fn test_book_title_path_structure() -> TestResult {
    init_logging();
    let root = tree("//book[1]/title");
    let Node::Expr(items) = &*root else {
        panic!("expected Expr root, got {root:?}");
    };
    assert_eq!(items.len(), 1);
    let Node::Path(path) = &*items[0] else {
        panic!("expected path, got {:?}", items[0]);
    };
    assert_eq!(path.leading, PathOp::DoubleSlash);
    let relative = path.relative.as_ref().ok_or("missing relative path")?;
    let Node::RelativePath(chain) = &**relative else {
        panic!("expected relative path, got {relative:?}");
    };
    let Node::AxisStep(book) = &*chain.first else {
        panic!("expected step, got {:?}", chain.first);
    };
    assert_eq!(book.effective_axis(), Axis::Child);
    assert!(matches!(book.test, NodeTest::Name(_)));
    assert_eq!(book.predicates.len(), 1);
    assert_eq!(chain.rest.len(), 1);
    assert_eq!(chain.rest[0].0, PathOp::Slash);

    assert_eq!(
        outline(&root),
        "Expr\n  PathExpr\n    RelativePathExpr\n      AxisStep\n        Expr\n          IntegerLiteral 1\n      AxisStep title\n"
    );
    Ok(())
}

#[test]
fn test_canonical_rendering() {
    init_logging();
    let cases = [
        ("1+2*3", "1 + 2 * 3"),
        ("//book[1]/title", "//book[1]/title"),
        ("for $b in //book return $b/@price", "for $b in //book return $b/@price"),
        ("some $x in (1,2) satisfies $x=2", "some $x in (1, 2) satisfies $x = 2"),
        ("$a||'b'", "$a || \"b\""),
        ("a union b except c", "a union b except c"),
        ("-(-1)", "-(-1)"),
        ("$m?*", "$m?*"),
        ("ancestor::div[@class='x']", "ancestor::div[@class = \"x\"]"),
        ("$x treat as node()+", "$x treat as node()+"),
        ("$x castable as xs:date?", "$x castable as xs:date?"),
        ("map{1:'one',2:'two'}", "map{1 : \"one\", 2 : \"two\"}"),
        ("a!b!c", "a ! b ! c"),
    ];
    for (source, expected) in cases {
        assert_eq!(canonical(source), expected, "rendering {source:?}");
    }
}

#[test]
fn test_parse_reports_unconsumed_position() -> TestResult {
    let grammar = GrammarBuilder::new().build()?;
    let (node, next) = grammar.parse("1 + 2 )")?;
    assert_eq!(node.to_string(), "1 + 2");
    let tokens = grammar.tokenize("1 + 2 )")?;
    let rest: Vec<&str> = tokens[next..].iter().map(|t| t.as_str()).collect();
    assert_eq!(rest, vec![" ", ")"]);
    Ok(())
}

#[test]
fn test_trailing_tokens_are_error_51() -> TestResult {
    let grammar = GrammarBuilder::new().build()?;
    let err = grammar.parse_all("1 2").unwrap_err();
    assert_eq!(err.code(), "trailing-tokens");
    let xpgram::XpgramError::Parse(inner) = &err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert!(matches!(inner, ParseError::TrailingTokens { .. }));
    assert_eq!(inner.error_number(), Some(51));
    assert_eq!(err.diagnostic().position, Some(2));
    Ok(())
}

#[test]
fn test_errors_carry_stable_codes() {
    let grammar = xpgram::Grammar::default();
    let code = |source: &str| grammar.parse_all(source).unwrap_err().code();
    assert_eq!(code("'open"), "tokenize-strlit");
    assert_eq!(code("1 +"), "parse-token");
    assert_eq!(code("Q{a{b}c"), "value-invalid-braced-uri");
    assert_eq!(code(""), "parse-token");
    assert_eq!(code("1e400"), "value-non-finite");
}

#[test]
fn test_depth_limit_from_builder() -> TestResult {
    let shallow = GrammarBuilder::new().with_max_depth(8).build()?;
    let nested = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    assert_eq!(shallow.parse_all(&nested).unwrap_err().code(), "parse-depth");

    let deep = GrammarBuilder::new().build()?;
    assert_eq!(deep.parse_all(&nested)?.kind(), SyntaxKind::Expr);
    Ok(())
}

#[test]
fn test_abbreviated_attribute_axis() {
    let root = tree("@id");
    let Node::Expr(items) = &*root else {
        panic!("expected Expr root");
    };
    let Node::AxisStep(step) = &*items[0] else {
        panic!("expected step, got {:?}", items[0]);
    };
    assert_eq!(step.axis, Some(StepAxis::At));
    assert_eq!(step.effective_axis(), Axis::Attribute);
}
