//! Ordinary math notation (`x1 + x2 * sqrt(x1)`), the text exchanged with the LLM.

use crate::engines::generation::{ast::ExprTree, codec};
use crate::error::ConversionError;
use crate::functions::{
    traits::{InfixForm, POWER_PRECEDENCE, UNARY_PRECEDENCE},
    PrimitiveSet,
};
use crate::types::{AstNode, Number};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::{map, not},
    error::{Error, ErrorKind},
    multi::{fold_many0, separated_list0},
    sequence::{pair, preceded, terminated},
    IResult,
};

/// Infix function names understood on input, with their canonical aliases.
const FUNCTION_ALIASES: &[(&str, &str)] = &[
    ("sqrt", "protect_sqrt"),
    ("sin", "sin"),
    ("cos", "cos"),
    ("exp", "exp"),
    ("log", "log"),
    ("square", "square"),
];

const ATOM_PRECEDENCE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "protect_div",
            BinaryOp::Pow => "pow",
        }
    }
}

/// Syntax tree of infix text, before any mapping onto primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum InfixExpr {
    Number(Number),
    Name(String),
    Neg(Box<InfixExpr>),
    Binary {
        op: BinaryOp,
        lhs: Box<InfixExpr>,
        rhs: Box<InfixExpr>,
    },
    Call {
        name: String,
        args: Vec<InfixExpr>,
    },
}

/// Longer infix text is rejected outright. Operator chains fold into
/// left-leaning trees whose height grows with the text, so this bounds how
/// deep every later walk over a parsed expression can go.
pub const MAX_INFIX_LEN: usize = 2048;

/// Grammar switches plus the current nesting depth.
#[derive(Debug, Clone, Copy)]
struct Level {
    caret_power: bool,
    depth: usize,
}

impl Level {
    fn nested<'a>(self, input: &'a str) -> Result<Level, nom::Err<Error<&'a str>>> {
        Ok(Level {
            depth: codec::nested(input, self.depth)?,
            ..self
        })
    }
}

/// Parses infix text with Python-style precedence: `**` binds tighter than
/// unary minus and associates to the right.
///
/// `caret_power` reads `^` as `**`, the way symbolic-math input usually does.
pub fn parse_infix(text: &str, caret_power: bool) -> Result<InfixExpr, ConversionError> {
    if text.len() > MAX_INFIX_LEN {
        return Err(ConversionError::Unsupported {
            offset: MAX_INFIX_LEN,
            message: format!("expression longer than {} bytes", MAX_INFIX_LEN),
        });
    }

    let level = Level {
        caret_power,
        depth: 0,
    };
    let (rest, expr) = parse_expr(text, level).map_err(|e| {
        let (offset, message) = codec::describe_failure(text, e);
        ConversionError::Unsupported { offset, message }
    })?;

    let rest = rest.trim_start();
    if !rest.is_empty() {
        return Err(ConversionError::Unsupported {
            offset: text.len() - rest.len(),
            message: "unexpected trailing input".to_string(),
        });
    }
    Ok(expr)
}

fn parse_number(input: &str) -> IResult<&str, InfixExpr> {
    let (rest, literal) = codec::unsigned_literal(input)?;
    match Number::parse_token(literal) {
        Some(number) => Ok((rest, InfixExpr::Number(number))),
        None => Err(nom::Err::Failure(Error::new(input, ErrorKind::Float))),
    }
}

fn parse_name_or_call(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    let (input, name) = codec::identifier(input)?;
    let Ok((input, _)) = codec::open_paren(input) else {
        return Ok((input, InfixExpr::Name(name.to_string())));
    };
    let inner = level.nested(input)?;
    let (input, args) = separated_list0(codec::comma, |i| parse_expr(i, inner))(input)?;
    let (input, _) = codec::close_paren(input)?;
    Ok((
        input,
        InfixExpr::Call {
            name: name.to_string(),
            args,
        },
    ))
}

fn parse_parens(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    let (input, _) = codec::open_paren(input)?;
    let inner = level.nested(input)?;
    let (input, expr) = parse_expr(input, inner)?;
    let (input, _) = codec::close_paren(input)?;
    Ok((input, expr))
}

fn parse_atom(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    preceded(
        multispace0,
        alt((
            parse_number,
            |i| parse_name_or_call(i, level),
            |i| parse_parens(i, level),
        )),
    )(input)
}

fn power_operator(input: &str, caret_power: bool) -> IResult<&str, &str> {
    if caret_power {
        preceded(multispace0, alt((tag("**"), tag("^"))))(input)
    } else {
        preceded(multispace0, tag("**"))(input)
    }
}

/// `atom ** unary`; recursing through unary makes `**` right-associative and
/// lets the exponent carry its own sign.
fn parse_power(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    let (input, base) = parse_atom(input, level)?;
    let Ok((after, _)) = power_operator(input, level.caret_power) else {
        return Ok((input, base));
    };
    let inner = level.nested(after)?;
    let (input, exponent) = parse_unary(after, inner)?;
    Ok((
        input,
        InfixExpr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        },
    ))
}

fn minus(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char('-'))(input)
}

fn parse_unary(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    let Ok((after, _)) = minus(input) else {
        return parse_power(input, level);
    };
    let inner = level.nested(after)?;
    let (input, operand) = parse_unary(after, inner)?;
    Ok((input, InfixExpr::Neg(Box::new(operand))))
}

/// `*` and `/`, refusing the first character of `**` and `//`.
fn product_operator(input: &str) -> IResult<&str, BinaryOp> {
    preceded(
        multispace0,
        alt((
            map(terminated(char('*'), not(char('*'))), |_| BinaryOp::Mul),
            map(terminated(char('/'), not(char('/'))), |_| BinaryOp::Div),
        )),
    )(input)
}

fn sum_operator(input: &str) -> IResult<&str, BinaryOp> {
    preceded(
        multispace0,
        alt((
            map(char('+'), |_| BinaryOp::Add),
            map(char('-'), |_| BinaryOp::Sub),
        )),
    )(input)
}

fn fold_binary(lhs: InfixExpr, (op, rhs): (BinaryOp, InfixExpr)) -> InfixExpr {
    InfixExpr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn parse_term(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    let (input, init) = parse_unary(input, level)?;
    fold_many0(
        pair(product_operator, |i| parse_unary(i, level)),
        move || init.clone(),
        fold_binary,
    )(input)
}

fn parse_expr(input: &str, level: Level) -> IResult<&str, InfixExpr> {
    let (input, init) = parse_term(input, level)?;
    fold_many0(
        pair(sum_operator, |i| parse_term(i, level)),
        move || init.clone(),
        fold_binary,
    )(input)
}

/// Converts infix text into canonical prefix-call text.
///
/// Only the mapping is checked here; whether the result fits the primitive
/// set is decided later by the canonical parser (`**` becomes `pow(..)`,
/// which that parser rejects).
pub fn infix_to_canonical(expr: &str) -> Result<String, ConversionError> {
    let parsed = parse_infix(expr, false)?;
    let mut out = String::new();
    write_canonical(&parsed, &mut out)?;
    Ok(out)
}

fn write_canonical(expr: &InfixExpr, out: &mut String) -> Result<(), ConversionError> {
    match expr {
        InfixExpr::Number(n) => out.push_str(&n.to_string()),
        InfixExpr::Name(name) => out.push_str(name),
        InfixExpr::Neg(inner) => {
            out.push_str("neg(");
            write_canonical(inner, out)?;
            out.push(')');
        }
        InfixExpr::Binary { op, lhs, rhs } => {
            out.push_str(op.canonical_name());
            out.push('(');
            write_canonical(lhs, out)?;
            out.push_str(", ");
            write_canonical(rhs, out)?;
            out.push(')');
        }
        InfixExpr::Call { name, args } => {
            let alias = FUNCTION_ALIASES
                .iter()
                .find(|(infix, _)| *infix == name.as_str())
                .map(|(_, canonical)| *canonical)
                .ok_or_else(|| ConversionError::UnknownFunction(name.clone()))?;
            out.push_str(alias);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(arg, out)?;
            }
            out.push(')');
        }
    }
    Ok(())
}

struct Rendered {
    text: String,
    precedence: u8,
    leading_minus: bool,
}

/// Infix text of a tree with the fewest parentheses that keep its structure.
pub fn canonical_to_infix(tree: &ExprTree, pset: &PrimitiveSet) -> String {
    render_infix(tree.as_node(), pset).text
}

fn render_infix(node: &AstNode, pset: &PrimitiveSet) -> Rendered {
    match node {
        AstNode::Var(name) => Rendered {
            text: name.clone(),
            precedence: ATOM_PRECEDENCE,
            leading_minus: false,
        },
        AstNode::Const(n) => Rendered {
            text: n.to_string(),
            precedence: ATOM_PRECEDENCE,
            leading_minus: n.is_negative(),
        },
        AstNode::Call { function, args } => {
            let children: Vec<Rendered> = args.iter().map(|a| render_infix(a, pset)).collect();
            let form = pset.get_primitive(function).map(|p| p.infix());

            match (form, children.as_slice()) {
                (Some(InfixForm::Binary { symbol, precedence }), [lhs, rhs]) => {
                    let is_power = precedence == POWER_PRECEDENCE;
                    let lhs_parens = if is_power {
                        lhs.precedence <= precedence || lhs.leading_minus
                    } else {
                        lhs.precedence < precedence
                    };
                    let rhs_parens = if is_power {
                        rhs.precedence < precedence
                    } else {
                        rhs.precedence <= precedence
                    };
                    Rendered {
                        text: format!(
                            "{} {} {}",
                            wrap(&lhs.text, lhs_parens),
                            symbol,
                            wrap(&rhs.text, rhs_parens)
                        ),
                        precedence,
                        leading_minus: lhs.leading_minus && !lhs_parens,
                    }
                }
                (Some(InfixForm::Prefix { symbol }), [operand]) => {
                    let parens = operand.precedence < UNARY_PRECEDENCE || operand.leading_minus;
                    Rendered {
                        text: format!("{}{}", symbol, wrap(&operand.text, parens)),
                        precedence: UNARY_PRECEDENCE,
                        leading_minus: true,
                    }
                }
                (Some(InfixForm::Function { name }), _) => function_call(name, &children),
                _ => function_call(function, &children),
            }
        }
    }
}

fn function_call(name: &str, children: &[Rendered]) -> Rendered {
    let args: Vec<&str> = children.iter().map(|c| c.text.as_str()).collect();
    Rendered {
        text: format!("{}({})", name, args.join(", ")),
        precedence: ATOM_PRECEDENCE,
        leading_minus: false,
    }
}

fn wrap(text: &str, parens: bool) -> String {
    if parens {
        format!("({})", text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infix_to_canonical_mapping() {
        assert_eq!(
            infix_to_canonical("x1 + x2 * sqrt(x1)").unwrap(),
            "add(x1, mul(x2, protect_sqrt(x1)))"
        );
        assert_eq!(infix_to_canonical("x1 / x2 - 1").unwrap(), "sub(protect_div(x1, x2), 1)");
        assert_eq!(infix_to_canonical("-x1").unwrap(), "neg(x1)");
        assert_eq!(infix_to_canonical("x1 - -1").unwrap(), "sub(x1, neg(1))");
        assert_eq!(infix_to_canonical("square(cos(x2))").unwrap(), "square(cos(x2))");
        assert_eq!(infix_to_canonical("0.5 * x1").unwrap(), "mul(0.5, x1)");
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        assert_eq!(infix_to_canonical("-x1 ** 2").unwrap(), "neg(pow(x1, 2))");
        assert_eq!(infix_to_canonical("2 ** 3 ** x1").unwrap(), "pow(2, pow(3, x1))");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(infix_to_canonical("x1 - x2 - 1").unwrap(), "sub(sub(x1, x2), 1)");
        assert_eq!(
            infix_to_canonical("x1 / x2 / x1").unwrap(),
            "protect_div(protect_div(x1, x2), x1)"
        );
    }

    #[test]
    fn test_conversion_errors() {
        assert!(matches!(
            infix_to_canonical("tan(x1)"),
            Err(ConversionError::UnknownFunction(_))
        ));
        assert!(matches!(
            infix_to_canonical("x1 +"),
            Err(ConversionError::Unsupported { .. })
        ));
        assert!(matches!(
            infix_to_canonical("1/x1/x1/)"),
            Err(ConversionError::Unsupported { .. })
        ));
        assert!(matches!(
            infix_to_canonical("x1 % 2"),
            Err(ConversionError::Unsupported { .. })
        ));
        assert!(infix_to_canonical("x1 ^ 2").is_err());
        assert!(infix_to_canonical("x1 // 2").is_err());
        assert!(infix_to_canonical("+x1").is_err());
        assert!(infix_to_canonical("sin(x1,)").is_err());
    }

    #[test]
    fn test_caret_is_power_only_when_enabled() {
        let caret = parse_infix("x1 ^ 2", true).unwrap();
        assert_eq!(caret, parse_infix("x1 ** 2", false).unwrap());
        assert!(parse_infix("x1 ^ 2", false).is_err());
    }

    #[test]
    fn test_calls_and_whitespace() {
        assert_eq!(infix_to_canonical("  cos ( x1 )  ").unwrap(), "cos(x1)");
        assert_eq!(
            infix_to_canonical("exp(x1)*log(x2)").unwrap(),
            "mul(exp(x1), log(x2))"
        );
        assert_eq!(infix_to_canonical("2 ** -1").unwrap(), "pow(2, neg(1))");
        assert_eq!(infix_to_canonical("1e-3 + .5").unwrap(), "add(0.001, 0.5)");
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let deep = format!("{}x1{}", "(".repeat(5_000), ")".repeat(5_000));
        assert!(matches!(
            parse_infix(&deep, false),
            Err(ConversionError::Unsupported { .. })
        ));

        let limit = codec::MAX_NESTING_DEPTH;
        let too_deep = format!("{}x1{}", "(".repeat(limit + 1), ")".repeat(limit + 1));
        assert!(too_deep.len() < MAX_INFIX_LEN);
        assert!(matches!(
            parse_infix(&too_deep, false),
            Err(ConversionError::Unsupported { offset, .. }) if offset == limit + 1
        ));

        let nested = format!("{}x1{}", "(".repeat(limit), ")".repeat(limit));
        assert_eq!(parse_infix(&nested, false).unwrap(), InfixExpr::Name("x1".to_string()));

        let minus_chain = format!("{}x1", "-".repeat(limit + 1));
        match parse_infix(&minus_chain, false) {
            Err(ConversionError::Unsupported { message, .. }) => assert!(message.contains("nesting")),
            other => panic!("expected a nesting error, got {:?}", other),
        }
    }

    #[test]
    fn test_long_text_is_rejected() {
        let long = vec!["x1"; MAX_INFIX_LEN].join(" + ");
        assert!(matches!(
            parse_infix(&long, false),
            Err(ConversionError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_canonical_to_infix_parenthesization() {
        let pset = PrimitiveSet::standard();
        let cases = [
            ("add(x1, mul(x2, protect_sqrt(x1)))", "x1 + x2 * sqrt(x1)"),
            ("mul(add(x1, x2), x1)", "(x1 + x2) * x1"),
            ("sub(x1, sub(x2, 1))", "x1 - (x2 - 1)"),
            ("sub(sub(x1, x2), 1)", "x1 - x2 - 1"),
            ("neg(add(x1, 1))", "-(x1 + 1)"),
            ("neg(neg(x1))", "-(-x1)"),
            ("square(sin(x2))", "square(sin(x2))"),
            ("protect_div(x1, mul(x2, -1))", "x1 / (x2 * -1)"),
        ];
        for (canonical, expected) in cases {
            let tree = ExprTree::parse(canonical, &pset).unwrap();
            assert_eq!(canonical_to_infix(&tree, &pset), expected);
        }
    }

    #[test]
    fn test_infix_round_trip_preserves_structure() {
        let pset = PrimitiveSet::standard();
        for canonical in [
            "add(x1, add(x2, 1))",
            "mul(x1, protect_div(x2, x1))",
            "sub(neg(x1), cos(sub(x2, 0.25)))",
        ] {
            let tree = ExprTree::parse(canonical, &pset).unwrap();
            let infix = canonical_to_infix(&tree, &pset);
            assert_eq!(infix_to_canonical(&infix).unwrap(), canonical);
        }
    }
}
