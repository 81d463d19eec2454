mod common;

use common::{TestResult, tree};
use xpgram::{Biggie, Decie, GrammarBuilder, Node};

fn dec(text: &str) -> Decie {
    text.parse().unwrap()
}

#[test]
fn test_integer_literals_are_exact() -> TestResult {
    let source = "123456789012345678901234567890";
    let root = tree(source);
    let Node::Expr(items) = &*root else {
        panic!("expected Expr root");
    };
    let Node::Integer(value) = &*items[0] else {
        panic!("expected integer, got {:?}", items[0]);
    };
    assert_eq!(value.to_string(), source);
    assert_eq!(*value, source.parse::<Biggie>()?);
    Ok(())
}

#[test]
fn test_big_integer_arithmetic() -> TestResult {
    let a: Biggie = "99999999999999999999".parse()?;
    let one = Biggie::one();
    assert_eq!(a.add(&one).to_string(), "100000000000000000000");
    assert_eq!(a.sub(&a), Biggie::zero());
    assert_eq!(Biggie::from(-7).idiv(&Biggie::from(2))?, Biggie::from(-3));
    assert_eq!(Biggie::from(-7).modulo(&Biggie::from(2))?, Biggie::from(-1));
    assert_eq!(Biggie::from(1000).ilog10()?, Biggie::from(3));
    assert_eq!(Biggie::from(5).idiv(&Biggie::zero()).unwrap_err().code(), "value-division-by-zero");
    Ok(())
}

#[test]
fn test_decimal_arithmetic_keeps_scale() -> TestResult {
    assert_eq!(dec("1.10").add(&dec("2.205")).to_string(), "3.305");
    assert_eq!(dec("1.5").mul(&dec("1.5"))?.to_string(), "2.25");
    assert_eq!(dec("0.3").sub(&dec("0.1")), dec("0.2"));
    assert_eq!(dec("2.50"), dec("2.5"));
    assert_eq!(dec("7").to_string(), "7.0");
    Ok(())
}

#[test]
fn test_decimal_rounding() -> TestResult {
    assert_eq!(dec("2.5").round(0)?.to_string(), "3.0");
    assert_eq!(dec("-2.5").round(0)?.to_string(), "-2.0");
    assert_eq!(dec("1234.5").round(-2)?.to_string(), "1200.0");
    assert_eq!(dec("-1.2").floor().to_string(), "-2.0");
    assert_eq!(dec("-1.2").ceil().to_string(), "-1.0");
    assert_eq!(dec("3.14159").to_fixed(2)?, "3.14");
    Ok(())
}

#[test]
fn test_division_precision_comes_from_builder() -> TestResult {
    let two = GrammarBuilder::new().with_division_precision(2).build()?;
    assert_eq!(two.divide(&dec("2"), &dec("3"))?.to_string(), "0.66");

    let default = GrammarBuilder::new().build()?;
    let third = default.divide(&dec("1"), &dec("3"))?;
    assert_eq!(third.scale(), xpgram::DEFAULT_DIVISION_PRECISION);
    assert_eq!(
        default.divide(&dec("1"), &Decie::zero()).unwrap_err().code(),
        "value-division-by-zero"
    );
    Ok(())
}

#[test]
fn test_decimal_literal_in_tree() {
    let root = tree("0.125 * 8");
    assert_eq!(root.to_string(), "0.125 * 8");
}
