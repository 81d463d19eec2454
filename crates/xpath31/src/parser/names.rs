use xpgram_types::ValueError;

use crate::ast::{BracedUri, EQName, NCName, NameTest, NsWildcard, QName, UriQualifiedName};
use crate::chars::starts_name;
use crate::combinator::Parsed;
use crate::input::Input;

pub(crate) fn nc_name(input: &Input, pos: usize) -> Parsed<NCName> {
    let at = input.skip_space(pos);
    match input.get(at) {
        Some(token) if starts_name(token) => Ok((NCName::new(token), at + 1)),
        _ => Err(input.unexpected(at, "NCName")),
    }
}

/// An NCName that must follow the previous token directly.
fn adjacent_nc_name(input: &Input, at: usize, owner: &str) -> Parsed<NCName> {
    match input.get(at) {
        Some(token) if starts_name(token) => Ok((NCName::new(token), at + 1)),
        _ => Err(input.unexpected(at, format!("NCName of {owner}"))),
    }
}

fn starts_braced_uri(input: &Input, at: usize) -> bool {
    input.get(at) == Some("Q") && input.get(at + 1) == Some("{")
}

/// `Q{...}`; every token up to the closing brace is part of the URI.
pub(crate) fn braced_uri(input: &Input, pos: usize) -> Parsed<BracedUri> {
    let at = input.skip_space(pos);
    if !starts_braced_uri(input, at) {
        return Err(input.unexpected(at, "'Q{' of BracedURILiteral"));
    }
    let open = at + 1;
    input.enclosed(open, || {
        let mut uri = String::new();
        let mut next = open + 1;
        loop {
            match input.get(next) {
                Some("}") => return Ok((BracedUri { uri }, next + 1)),
                Some("{") => {
                    uri.push('{');
                    return Err(ValueError::InvalidBracedUri(uri).into());
                }
                Some(token) => uri.push_str(token),
                None => return Err(input.unexpected(next, "'}' of BracedURILiteral")),
            }
            next += 1;
        }
    })
}

/// `prefix:local`, `local` or `Q{uri}local`.
///
/// The prefix form is only taken when the colon and a name follow the
/// first name with no whitespace in between.
pub(crate) fn eq_name(input: &Input, pos: usize) -> Parsed<EQName> {
    let at = input.skip_space(pos);
    if starts_braced_uri(input, at) {
        let (uri, next) = braced_uri(input, at)?;
        let (local, next) = adjacent_nc_name(input, next, "URIQualifiedName")?;
        return Ok((EQName::UriQualified(UriQualifiedName { uri, local }), next));
    }
    let (first, next) = nc_name(input, at)?;
    if input.get(next) == Some(":")
        && let Some(local) = input.get(next + 1).filter(|t| starts_name(t))
    {
        let name = QName {
            prefix: Some(first),
            local: NCName::new(local),
        };
        return Ok((EQName::QName(name), next + 2));
    }
    let name = QName {
        prefix: None,
        local: first,
    };
    Ok((EQName::QName(name), next))
}

/// An EQName or one of the wildcard forms.
pub(crate) fn name_test(input: &Input, pos: usize) -> Parsed<NameTest> {
    let at = input.skip_space(pos);
    match input.get(at) {
        Some("*") => {
            if input.get(at + 1) == Some(":")
                && let Some(local) = input.get(at + 2).filter(|t| starts_name(t))
            {
                return Ok((NameTest::Ns(NsWildcard::Local(NCName::new(local))), at + 3));
            }
            Ok((NameTest::Wildcard, at + 1))
        }
        _ if starts_braced_uri(input, at) => {
            let (uri, next) = braced_uri(input, at)?;
            if input.get(next) == Some("*") {
                return Ok((NameTest::Ns(NsWildcard::Uri(uri)), next + 1));
            }
            let (local, next) = adjacent_nc_name(input, next, "URIQualifiedName")?;
            let name = EQName::UriQualified(UriQualifiedName { uri, local });
            Ok((NameTest::Name(name), next))
        }
        Some(prefix)
            if starts_name(prefix)
                && input.get(at + 1) == Some(":")
                && input.get(at + 2) == Some("*") =>
        {
            Ok((NameTest::Ns(NsWildcard::Prefix(NCName::new(prefix))), at + 3))
        }
        _ => {
            let (name, next) = eq_name(input, at)?;
            Ok((NameTest::Name(name), next))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::input::ParseOptions;
    use crate::lexer::tokenize;

    fn input(source: &str) -> Input {
        Input::new(tokenize(source).unwrap(), ParseOptions::default())
    }

    #[test]
    fn test_prefixed_and_local_names() {
        let (name, next) = eq_name(&input("fn:concat"), 0).unwrap();
        assert_eq!(name, EQName::prefixed("fn", "concat"));
        assert_eq!(next, 3);

        let (name, next) = eq_name(&input("a : b"), 0).unwrap();
        assert_eq!(name, EQName::local("a"));
        assert_eq!(next, 1);
    }

    #[test]
    fn test_uri_qualified_name() {
        let (name, next) = eq_name(&input("Q{http://example.com/ns}item"), 0).unwrap();
        assert_eq!(name.uri(), Some("http://example.com/ns"));
        assert_eq!(name.local_name(), "item");
        assert_eq!(next, 10);
    }

    #[test]
    fn test_braced_uri_rejects_nested_brace() {
        let err = eq_name(&input("Q{a{b}c"), 0).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Value(ValueError::InvalidBracedUri(_))
        ));
        assert_eq!(err.code(), "value-invalid-braced-uri");
    }

    #[test]
    fn test_unclosed_braced_uri_points_at_brace() {
        let err = eq_name(&input("Q{abc"), 0).unwrap_err();
        assert_eq!(err.position(), Some(1));
    }

    #[test]
    fn test_name_test_wildcards() {
        assert_eq!(name_test(&input("*"), 0).unwrap(), (NameTest::Wildcard, 1));
        assert_eq!(
            name_test(&input("*:item"), 0).unwrap().0,
            NameTest::Ns(NsWildcard::Local(NCName::new("item")))
        );
        assert_eq!(
            name_test(&input("xs:*"), 0).unwrap().0,
            NameTest::Ns(NsWildcard::Prefix(NCName::new("xs")))
        );
        assert_eq!(
            name_test(&input("Q{urn:x}*"), 0).unwrap().0,
            NameTest::Ns(NsWildcard::Uri(BracedUri {
                uri: "urn:x".to_string()
            }))
        );
        assert_eq!(
            name_test(&input("book"), 0).unwrap().0,
            NameTest::Name(EQName::local("book"))
        );
    }

    #[test]
    fn test_name_requires_name_start() {
        assert!(nc_name(&input("42"), 0).is_err());
        assert!(eq_name(&input(""), 0).is_err());
    }
}
