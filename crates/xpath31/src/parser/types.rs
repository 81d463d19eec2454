use crate::ast::{
    ArrayTest, AttributeTest, DocumentElement, EQName, ElementTest, FunctionTest, ItemType, KindTest,
    MapTest, NameOrWildcard, Occurrence, Operator, PITarget, SequenceType, SingleType,
};
use crate::chars::starts_name;
use crate::combinator::{Parsed, separated, trailing_unary};
use crate::input::Input;
use crate::registry;

use super::names::{eq_name, nc_name};
use super::primary::string_literal;

pub(crate) fn sequence_type(input: &Input, pos: usize) -> Parsed<SequenceType> {
    let at = input.skip_space(pos);
    if input.get(at) == Some("empty-sequence") && input.at(at + 1, "(") {
        let next = input.expect(at + 1, "(", "EmptySequenceType")?;
        let next = input.expect(next, ")", "EmptySequenceType")?;
        return Ok((SequenceType::Empty, next));
    }
    let (item, next) = item_type(input, at)?;
    match input.peek(next).and_then(Occurrence::from_token) {
        Some(occurrence) => Ok((
            SequenceType::with_occurrence(item, occurrence),
            input.skip_space(next) + 1,
        )),
        None => Ok((SequenceType::item(item), next)),
    }
}

pub(crate) fn item_type(input: &Input, pos: usize) -> Parsed<ItemType> {
    let at = input.skip_space(pos);
    let _depth = input.enter(at)?;
    let call = input.at(at + 1, "(");
    match input.get(at) {
        Some("item") if call => {
            let next = input.expect(at + 1, "(", "ItemType")?;
            let next = input.expect(next, ")", "ItemType")?;
            Ok((ItemType::Any, next))
        }
        Some("function") if call => {
            let (test, next) = function_test(input, at)?;
            Ok((ItemType::Function(test), next))
        }
        Some("map") if call => {
            let (test, next) = map_test(input, at)?;
            Ok((ItemType::Map(test), next))
        }
        Some("array") if call => {
            let (test, next) = array_test(input, at)?;
            Ok((ItemType::Array(test), next))
        }
        Some(keyword) if call && registry::is_kind_test(keyword) => {
            let (test, next) = registry::kind_test(input, at)?;
            Ok((ItemType::Kind(test), next))
        }
        Some("(") => input.enclosed(at, || {
            let (inner, next) = item_type(input, at + 1)?;
            let next = input.expect(next, ")", "ParenthesizedItemType")?;
            Ok((ItemType::Parenthesized(Box::new(inner)), next))
        }),
        _ => {
            let (name, next) = eq_name(input, at)?;
            Ok((ItemType::Atomic(name), next))
        }
    }
}

/// `keyword(` then `*)` for the catch-all form, or `body` then `)`.
fn wildcard_or<T>(
    input: &Input,
    pos: usize,
    keyword: &str,
    any: T,
    body: impl FnOnce(usize) -> Parsed<T>,
) -> Parsed<T> {
    let next = input.expect(pos, keyword, keyword)?;
    let open = input.skip_space(next);
    let next = input.expect(next, "(", keyword)?;
    input.enclosed(open, || {
        let (value, next) = if input.at(next, "*") {
            (any, input.skip_space(next) + 1)
        } else {
            body(next)?
        };
        let next = input.expect(next, ")", keyword)?;
        Ok((value, next))
    })
}

fn function_test(input: &Input, pos: usize) -> Parsed<FunctionTest> {
    let (params, next) = wildcard_or(input, pos, "function", None, |next| {
        let (params, next) = separated(input, next, ")", sequence_type)?;
        Ok((Some(params), next))
    })?;
    let Some(params) = params else {
        return Ok((FunctionTest::Any, next));
    };
    let next = input.expect(next, "as", "TypedFunctionTest")?;
    let (result, next) = sequence_type(input, next)?;
    let test = FunctionTest::Typed {
        params,
        result: Box::new(result),
    };
    Ok((test, next))
}

fn map_test(input: &Input, pos: usize) -> Parsed<MapTest> {
    wildcard_or(input, pos, "map", MapTest::Any, |next| {
        let (key, next) = eq_name(input, next)?;
        let next = input.expect(next, ",", "TypedMapTest")?;
        let (value, next) = sequence_type(input, next)?;
        Ok((
            MapTest::Typed {
                key,
                value: Box::new(value),
            },
            next,
        ))
    })
}

fn array_test(input: &Input, pos: usize) -> Parsed<ArrayTest> {
    wildcard_or(input, pos, "array", ArrayTest::Any, |next| {
        let (member, next) = sequence_type(input, next)?;
        Ok((ArrayTest::Typed(Box::new(member)), next))
    })
}

pub(crate) fn single_type(input: &Input, pos: usize) -> Parsed<SingleType> {
    let ((name, optional), next) = trailing_unary(input, pos, "?", eq_name)?;
    Ok((SingleType { name, optional }, next))
}

/// `keyword(` body `)`, with end-of-input errors reported at the parenthesis.
fn kind_call<T>(
    input: &Input,
    pos: usize,
    keyword: &str,
    body: impl FnOnce(usize) -> Parsed<T>,
) -> Parsed<T> {
    let next = input.expect(pos, keyword, keyword)?;
    let open = input.skip_space(next);
    let next = input.expect(next, "(", keyword)?;
    input.enclosed(open, || {
        let (value, next) = body(next)?;
        let next = input.expect(next, ")", keyword)?;
        Ok((value, next))
    })
}

fn empty_kind(input: &Input, pos: usize, keyword: &str, test: KindTest) -> Parsed<KindTest> {
    kind_call(input, pos, keyword, |next| Ok((test, next)))
}

fn name_or_wildcard(input: &Input, pos: usize) -> Parsed<NameOrWildcard> {
    let at = input.skip_space(pos);
    if input.get(at) == Some("*") {
        return Ok((NameOrWildcard::Wildcard, at + 1));
    }
    let (name, next) = eq_name(input, at)?;
    Ok((NameOrWildcard::Name(name), next))
}

fn element_body(input: &Input, pos: usize) -> Parsed<ElementTest> {
    let mut test = ElementTest::default();
    if input.at(pos, ")") {
        return Ok((test, pos));
    }
    let (name, mut next) = name_or_wildcard(input, pos)?;
    test.name = Some(name);
    if input.at(next, ",") {
        let ((type_name, nillable), after) =
            trailing_unary(input, input.skip_space(next) + 1, "?", eq_name)?;
        test.type_name = Some(type_name);
        test.nillable = nillable;
        next = after;
    }
    Ok((test, next))
}

fn element_test_of(input: &Input, pos: usize) -> Parsed<ElementTest> {
    kind_call(input, pos, "element", |next| element_body(input, next))
}

pub(crate) fn element_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    let (test, next) = element_test_of(input, pos)?;
    Ok((KindTest::Element(test), next))
}

pub(crate) fn attribute_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    kind_call(input, pos, "attribute", |next| {
        let mut test = AttributeTest::default();
        if input.at(next, ")") {
            return Ok((KindTest::Attribute(test), next));
        }
        let (name, mut next) = name_or_wildcard(input, next)?;
        test.name = Some(name);
        if input.at(next, ",") {
            let (type_name, after) = eq_name(input, input.skip_space(next) + 1)?;
            test.type_name = Some(type_name);
            next = after;
        }
        Ok((KindTest::Attribute(test), next))
    })
}

fn schema_element_of(input: &Input, pos: usize) -> Parsed<EQName> {
    kind_call(input, pos, "schema-element", |next| eq_name(input, next))
}

pub(crate) fn schema_element_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    let (name, next) = schema_element_of(input, pos)?;
    Ok((KindTest::SchemaElement(name), next))
}

pub(crate) fn schema_attribute_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    let (name, next) = kind_call(input, pos, "schema-attribute", |next| eq_name(input, next))?;
    Ok((KindTest::SchemaAttribute(name), next))
}

pub(crate) fn document_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    kind_call(input, pos, "document-node", |next| {
        let at = input.skip_space(next);
        match input.get(at) {
            Some(")") => Ok((KindTest::Document(None), next)),
            Some("element") => {
                let (test, next) = element_test_of(input, at)?;
                Ok((KindTest::Document(Some(DocumentElement::Element(test))), next))
            }
            Some("schema-element") => {
                let (name, next) = schema_element_of(input, at)?;
                Ok((KindTest::Document(Some(DocumentElement::SchemaElement(name))), next))
            }
            _ => Err(input.unexpected(at, "ElementTest or SchemaElementTest")),
        }
    })
}

pub(crate) fn pi_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    kind_call(input, pos, "processing-instruction", |next| {
        let at = input.skip_space(next);
        match input.get(at) {
            Some(")") => Ok((KindTest::ProcessingInstruction(None), next)),
            Some("'" | "\"") => {
                let (literal, next) = string_literal(input, at)?;
                Ok((KindTest::ProcessingInstruction(Some(PITarget::Literal(literal))), next))
            }
            Some(token) if starts_name(token) => {
                let (name, next) = nc_name(input, at)?;
                Ok((KindTest::ProcessingInstruction(Some(PITarget::Name(name))), next))
            }
            _ => Err(input.unexpected(at, "NCName or StringLiteral")),
        }
    })
}

pub(crate) fn comment_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    empty_kind(input, pos, "comment", KindTest::Comment)
}

pub(crate) fn text_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    empty_kind(input, pos, "text", KindTest::Text)
}

pub(crate) fn namespace_node_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    empty_kind(input, pos, "namespace-node", KindTest::NamespaceNode)
}

pub(crate) fn any_kind_test(input: &Input, pos: usize) -> Parsed<KindTest> {
    empty_kind(input, pos, "node", KindTest::AnyKind)
}
