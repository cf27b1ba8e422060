//! Pulling expressions out of free-form model answers.
//!
//! Each extractor first tries the answer as strict JSON, then falls back to
//! pattern matching for near-JSON output. Every extracted expression must
//! pass the validity check before it is returned.

use crate::engines::validation::check_expression;
use crate::error::ValidationFailure;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
static EXPRESSIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"expressions"\s*:\s*\[(.*?)\]"#).expect("valid regex"));
static BRACED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^\}]+)\}").expect("valid regex"));
static LIST_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid regex"));
static NEW_EXPRESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"new_expression"\s*:\s*"(.*?)""#).expect("valid regex"));

#[derive(Deserialize)]
struct GenerationReply {
    expression: String,
}

#[derive(Deserialize)]
struct CrossoverReply {
    expressions: Vec<String>,
}

#[derive(Deserialize)]
struct MutationReply {
    new_expression: String,
}

/// Strip markdown code blocks from a response.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn clean(response: &str) -> String {
    strip_code_fences(response).replace(['\n', '\r'], "")
}

/// `text` as JSON, or else the outermost `{...}` inside it as JSON.
fn parse_json<T: for<'de> Deserialize<'de>>(text: &str) -> Option<T> {
    serde_json::from_str(text).ok().or_else(|| {
        JSON_OBJECT_RE
            .find(text)
            .and_then(|m| serde_json::from_str(m.as_str()).ok())
    })
}

fn validated(expression: &str) -> Result<String, ValidationFailure> {
    let expression = expression.trim();
    check_expression(expression)?;
    Ok(expression.to_string())
}

/// `{"expression": ...}` from a generation answer.
pub fn extract_generation(response: &str) -> Result<String, ValidationFailure> {
    let object = JSON_OBJECT_RE
        .find(response)
        .ok_or_else(|| ValidationFailure::MalformedResponse("no JSON object".to_string()))?;

    let reply: GenerationReply = serde_json::from_str(object.as_str())
        .map_err(|e| ValidationFailure::MalformedResponse(e.to_string()))?;

    validated(&reply.expression)
}

fn lenient_expression_list(text: &str) -> Result<Vec<String>, ValidationFailure> {
    let inner = EXPRESSIONS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| ValidationFailure::MalformedResponse("no \"expressions\" list".to_string()))?
        .as_str();

    let braced: Vec<String> = BRACED_RE
        .captures_iter(inner)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().replace('"', ""))
        .collect();
    if !braced.is_empty() {
        return Ok(braced);
    }

    Ok(LIST_SEPARATOR_RE
        .split(inner)
        .map(|part| part.trim().replace(['"', '{', '}'], ""))
        .collect())
}

/// The two children of a crossover answer.
pub fn extract_crossover(response: &str) -> Result<[String; 2], ValidationFailure> {
    let cleaned = clean(response);
    let children = match parse_json::<CrossoverReply>(&cleaned) {
        Some(reply) => reply.expressions,
        None => lenient_expression_list(&cleaned)?,
    };

    match children.as_slice() {
        [first, second] => Ok([validated(first)?, validated(second)?]),
        _ => Err(ValidationFailure::WrongCount {
            expected: 2,
            actual: children.len(),
        }),
    }
}

/// The rewritten expression of a mutation answer.
pub fn extract_mutation(response: &str) -> Result<String, ValidationFailure> {
    let cleaned = clean(response);
    let expression = match parse_json::<MutationReply>(&cleaned) {
        Some(reply) => reply.new_expression,
        None => NEW_EXPRESSION_RE
            .captures(&cleaned)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().replace('"', ""))
            .ok_or_else(|| {
                ValidationFailure::MalformedResponse("no \"new_expression\" field".to_string())
            })?,
    };

    validated(&expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
    }

    #[test]
    fn test_generation() {
        assert_eq!(
            extract_generation("Sure!\n{\"expression\": \"x1 * sin(x2)\"}\n").unwrap(),
            "x1 * sin(x2)"
        );
        assert!(matches!(
            extract_generation("no json here"),
            Err(ValidationFailure::MalformedResponse(_))
        ));
        assert!(extract_generation("{\"expression\": \"1/0\"}").is_err());
        assert!(extract_generation("{\"expr\": \"x1\"}").is_err());
    }

    #[test]
    fn test_crossover_strict_and_fenced() {
        let children =
            extract_crossover("```json\n{\"expressions\": [\"x1 + 1\", \"x2 * x1\"]}\n```").unwrap();
        assert_eq!(children, ["x1 + 1".to_string(), "x2 * x1".to_string()]);
    }

    #[test]
    fn test_crossover_near_json() {
        // a trailing comma leaves an empty third entry
        let err =
            extract_crossover("{\"expressions\": [\"x1 + 1\", \"cos(x2)\",]").unwrap_err();
        assert!(matches!(err, ValidationFailure::WrongCount { actual: 3, .. }));

        let children = extract_crossover("\"expressions\": [\"x1 - x2\", \"sqrt(x1)\"] done").unwrap();
        assert_eq!(children, ["x1 - x2".to_string(), "sqrt(x1)".to_string()]);
    }

    #[test]
    fn test_crossover_wrong_count() {
        assert!(matches!(
            extract_crossover("{\"expressions\": [\"x1\"]}"),
            Err(ValidationFailure::WrongCount { expected: 2, actual: 1 })
        ));
        assert!(extract_crossover("{\"expressions\": [\"x1\", \"(\"]}").is_err());
        assert!(extract_crossover("{{{not json").is_err());
    }

    #[test]
    fn test_mutation() {
        assert_eq!(extract_mutation("{\"new_expression\": \"sqrt(-5)\"}").unwrap(), "sqrt(-5)");
        assert_eq!(
            extract_mutation("```json\n{\"new_expression\": \"x1 + x2\",}\n```").unwrap(),
            "x1 + x2"
        );
        assert!(matches!(
            extract_mutation("{\"new_expression\": \"1/x1/x1/)\"}"),
            Err(ValidationFailure::Unparsable(_))
        ));
    }
}
