//! Canonical prefix-call text, e.g. `add(x1, mul(x2, 1))`.

use crate::engines::generation::ast::ExprTree;
use crate::error::ParseError;
use crate::functions::PrimitiveSet;
use crate::types::{AstNode, Number};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{pair, preceded, tuple},
    IResult,
};

/// Canonical text of a node. Stable: equal trees always render equally.
pub fn render(node: &AstNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &AstNode, out: &mut String) {
    match node {
        AstNode::Call { function, args } => {
            out.push_str(function);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(arg, out);
            }
            out.push(')');
        }
        AstNode::Var(name) => out.push_str(name),
        AstNode::Const(number) => out.push_str(&number.to_string()),
    }
}

/// Calls may nest at most this deep; anything deeper is rejected before it
/// can exhaust the stack.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Reads canonical text and checks it against the primitive set.
pub fn parse(text: &str, pset: &PrimitiveSet) -> Result<ExprTree, ParseError> {
    let (rest, root) = parse_node(text, 0).map_err(|e| syntax_error(text, e))?;
    let rest = rest.trim_start();
    if !rest.is_empty() {
        return Err(ParseError::Syntax {
            offset: text.len() - rest.len(),
            message: "unexpected trailing input".to_string(),
        });
    }
    pset.check(&root)?;
    Ok(ExprTree::new(root))
}

fn parse_node(input: &str, depth: usize) -> IResult<&str, AstNode> {
    preceded(multispace0, alt((parse_literal, |i| parse_named(i, depth))))(input)
}

fn parse_literal(input: &str) -> IResult<&str, AstNode> {
    let (rest, token) = recognize(pair(opt(char('-')), unsigned_literal))(input)?;
    match Number::parse_token(token) {
        Some(number) => Ok((rest, AstNode::Const(number))),
        None => Err(nom::Err::Failure(Error::new(input, ErrorKind::Float))),
    }
}

fn parse_named(input: &str, depth: usize) -> IResult<&str, AstNode> {
    let (input, name) = identifier(input)?;
    let Ok((input, _)) = open_paren(input) else {
        return Ok((input, AstNode::Var(name.to_string())));
    };
    let depth = nested(input, depth)?;
    let (input, args) = separated_list0(comma, |i| parse_node(i, depth))(input)?;
    let (input, _) = close_paren(input)?;
    Ok((
        input,
        AstNode::Call {
            function: name.to_string(),
            args,
        },
    ))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Digits with an optional fraction and exponent: `3`, `0.5`, `.25`, `1e-3`.
pub(crate) fn unsigned_literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(input)
}

pub(crate) fn open_paren(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char('('))(input)
}

pub(crate) fn close_paren(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char(')'))(input)
}

pub(crate) fn comma(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char(','))(input)
}

/// One level deeper, or a hard failure once `MAX_NESTING_DEPTH` is reached.
pub(crate) fn nested(input: &str, depth: usize) -> Result<usize, nom::Err<Error<&str>>> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok(depth + 1)
}

/// Byte offset and message for a failed parse of `text`.
pub(crate) fn describe_failure(text: &str, err: nom::Err<Error<&str>>) -> (usize, String) {
    let e = match err {
        nom::Err::Incomplete(_) => return (text.len(), "unexpected end of input".to_string()),
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
    };
    let offset = text.len() - e.input.len();
    let message = match e.code {
        ErrorKind::TooLarge => format!("nesting deeper than {} levels", MAX_NESTING_DEPTH),
        ErrorKind::Float => "invalid numeric literal".to_string(),
        _ if e.input.trim().is_empty() => "unexpected end of input".to_string(),
        code => format!("unexpected input ({})", code.description()),
    };
    (offset, message)
}

fn syntax_error(text: &str, err: nom::Err<Error<&str>>) -> ParseError {
    let (offset, message) = describe_failure(text, err);
    ParseError::Syntax { offset, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let pset = PrimitiveSet::standard();
        let tree = parse("add(x1, mul(x2, 1))", &pset).unwrap();
        assert_eq!(
            tree.root,
            AstNode::call(
                "add",
                vec![
                    AstNode::var("x1"),
                    AstNode::call("mul", vec![AstNode::var("x2"), AstNode::int(1)]),
                ],
            )
        );
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_parse_negative_and_float_literals() {
        let pset = PrimitiveSet::standard();
        let tree = parse("sub(-1, protect_div(0.37, 1e-3))", &pset).unwrap();
        assert_eq!(tree.render(), "sub(-1, protect_div(0.37, 0.001))");
        assert_eq!(parse("0", &pset).unwrap().root, AstNode::int(0));
    }

    #[test]
    fn test_render_is_parse_inverse() {
        let pset = PrimitiveSet::standard();
        for text in [
            "x1",
            "-1",
            "0.5",
            "1.0",
            "neg(square(x1))",
            "protect_sqrt(cos(sin(sub(x2, -1))))",
            "add(mul(x1, x2), protect_div(x1, 0.06))",
        ] {
            let tree = parse(text, &pset).unwrap();
            assert_eq!(tree.render(), text);
            assert_eq!(parse(&tree.render(), &pset).unwrap(), tree);
        }
    }

    #[test]
    fn test_parse_errors() {
        let pset = PrimitiveSet::standard();
        assert!(matches!(parse("pow(x1, 2)", &pset), Err(ParseError::UnknownOperator(_))));
        assert!(matches!(
            parse("add(x1)", &pset),
            Err(ParseError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(parse("sin", &pset), Err(ParseError::ArityMismatch { .. })));
        assert!(matches!(parse("x3", &pset), Err(ParseError::UnknownTerminal(_))));
        assert!(matches!(parse("add(x1, x2", &pset), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("add(x1, x2))", &pset), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("", &pset), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("x1 + x2", &pset), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("add(x1, )", &pset), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("1e999", &pset), Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let pset = PrimitiveSet::standard();
        let deep = format!("{}x1{}", "neg(".repeat(200_000), ")".repeat(200_000));
        match parse(&deep, &pset) {
            Err(ParseError::Syntax { offset, message }) => {
                assert_eq!(offset, 4 * (MAX_NESTING_DEPTH + 1));
                assert!(message.contains("nesting"));
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }

        let limit = MAX_NESTING_DEPTH;
        let deepest = format!("{}x1{}", "neg(".repeat(limit), ")".repeat(limit));
        assert_eq!(parse(&deepest, &pset).unwrap().height(), limit);
    }
}
