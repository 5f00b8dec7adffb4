//! Nom-based parser for MiniSpec plan source
//!
//! The grammar is deliberately terse; every token the model emits costs
//! output budget, so statements are `;` separated, arguments `,` separated,
//! and blocks `{}` delimited with no keywords anywhere:
//!
//! ```text
//! program    := statement (";" statement)*
//! statement  := assign | call | conditional | loop | return
//! assign     := varname "=" call
//! call       := abbrev ("," arg)*
//! conditional:= "?" comparison block
//! loop       := integer block
//! return     := "->" literal
//! block      := "{" program "}"
//! comparison := operand cmp-op operand
//! operand    := varname | literal
//! varname    := "_" digit+
//! ```
//!
//! Whitespace is insignificant. Boolean literals are case-insensitive.
//! Parsing is total: a malformed construct anywhere aborts with a
//! [`ParseError`] carrying the offset, offending fragment, and the expected
//! construct, detailed enough to feed straight back to the model.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{all_consuming, cut, map, map_res, not, opt, recognize, value},
    error::{
        context, convert_error, ContextError, FromExternalError, ParseError as NomParseError,
        VerboseError, VerboseErrorKind,
    },
    multi::{many0, separated_list0},
    sequence::{pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

use crate::ast::*;

// ============================================================================
// Public API
// ============================================================================

/// Structured syntax failure with enough context for model feedback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("syntax error at offset {offset}: expected {expected} near '{fragment}'")]
pub struct ParseError {
    /// Byte offset into the source where parsing failed.
    pub offset: usize,
    /// The offending fragment (truncated), or `<end of plan>`.
    pub fragment: String,
    /// What the parser expected at the failure point.
    pub expected: String,
    /// Full multi-line trace, for logs.
    pub message: String,
}

/// Parse a complete plan from source text.
///
/// Pure function: never executes anything, never partially succeeds.
pub fn parse_plan(text: &str) -> Result<Plan, ParseError> {
    match all_consuming(program::<VerboseError<&str>>)(text) {
        Ok((_, statements)) => Ok(Plan {
            statements,
            source: text.to_string(),
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(ParseError::from_verbose(text, &e))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError {
            offset: text.len(),
            fragment: "<end of plan>".to_string(),
            expected: "more input".to_string(),
            message: "incomplete input".to_string(),
        }),
    }
}

impl ParseError {
    fn from_verbose(input: &str, e: &VerboseError<&str>) -> Self {
        // The first entry is the innermost failure point.
        let (offset, fragment, innermost) = match e.errors.first() {
            Some((remaining, kind)) => {
                let offset = input.len() - remaining.len();
                let fragment = if remaining.is_empty() {
                    "<end of plan>".to_string()
                } else {
                    remaining.chars().take(24).collect()
                };
                (offset, fragment, Some(kind))
            }
            None => (input.len(), "<end of plan>".to_string(), None),
        };

        // Prefer the nearest human-readable context label; fall back to the
        // raw nom expectation.
        let expected = e
            .errors
            .iter()
            .find_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(label) => Some((*label).to_string()),
                _ => None,
            })
            .or_else(|| {
                innermost.map(|kind| match kind {
                    VerboseErrorKind::Char(c) => format!("'{}'", c),
                    VerboseErrorKind::Nom(nom::error::ErrorKind::Eof) => {
                        "end of plan or ';'".to_string()
                    }
                    VerboseErrorKind::Nom(k) => k.description().to_string(),
                    VerboseErrorKind::Context(label) => (*label).to_string(),
                })
            })
            .unwrap_or_else(|| "a statement".to_string());

        ParseError {
            offset,
            fragment,
            expected,
            message: convert_error(input, e.clone()),
        }
    }
}

// ============================================================================
// Program structure
// ============================================================================

fn program<'a, E: NomParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Statement>, E> {
    let (input, _) = multispace0(input)?;
    let (input, statements) =
        separated_list0(preceded(multispace0, char(';')), statement)(input)?;
    // Trailing separator is permitted.
    let (input, _) = opt(preceded(multispace0, char(';')))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, statements))
}

fn statement<'a, E: NomParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Statement, E> {
    let (input, _) = multispace0(input)?;
    alt((
        return_stmt,
        loop_stmt,
        conditional_stmt,
        assign_stmt,
        map(skill_call, Statement::Call),
    ))(input)
}

fn return_stmt<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Statement, E> {
    let (input, _) = tag("->")(input)?;
    let (input, lit) = cut(context(
        "return value",
        preceded(multispace0, literal),
    ))(input)?;
    Ok((input, Statement::Return(lit)))
}

fn loop_stmt<'a, E: NomParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Statement, E> {
    let (input, count) = map_res(digit1, str::parse::<u32>)(input)?;
    let (input, body) = cut(context("loop body", block))(input)?;
    Ok((input, Statement::Loop { count, body }))
}

fn conditional_stmt<'a, E: NomParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Statement, E> {
    let (input, _) = char('?')(input)?;
    let (input, cond) = cut(context("comparison", preceded(multispace0, comparison)))(input)?;
    let (input, body) = cut(context("conditional body", block))(input)?;
    Ok((input, Statement::Conditional { cond, body }))
}

fn assign_stmt<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Statement, E> {
    let (input, var) = varname(input)?;
    let (input, _) = preceded(multispace0, char('='))(input)?;
    let (input, call) = cut(context(
        "skill call",
        preceded(multispace0, skill_call),
    ))(input)?;
    Ok((input, Statement::Assign { var, call }))
}

fn block<'a, E: NomParseError<&'a str> + ContextError<&'a str> + FromExternalError<&'a str, std::num::ParseIntError>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Statement>, E> {
    let (input, _) = preceded(multispace0, char('{'))(input)?;
    let (input, statements) = program(input)?;
    let (input, _) = cut(context("closing brace", char('}')))(input)?;
    Ok((input, statements))
}

// ============================================================================
// Skill calls
// ============================================================================

fn skill_call<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, SkillCall, E> {
    let (input, abbrev) = abbreviation(input)?;
    let (input, args) = many0(preceded(
        preceded(multispace0, char(',')),
        cut(context("skill argument", preceded(multispace0, argument))),
    ))(input)?;
    Ok((input, SkillCall { abbrev, args }))
}

fn abbreviation<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_"))))))(input)
        .map(|(rest, matched)| (rest, matched.to_string()))
}

/// Argument position: any operand, plus bare words as string shorthand.
///
/// Models routinely emit `s,apple` rather than `s,'apple'`; the language
/// accepts the unquoted form to keep plans short.
fn argument<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Operand, E> {
    alt((operand, bare_word))(input)
}

fn bare_word<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Operand, E> {
    let (input, word) = recognize(pair(
        alpha1,
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == ' '),
    ))(input)?;
    Ok((
        input,
        Operand::Literal(Literal::Str(word.trim_end().to_string())),
    ))
}

// ============================================================================
// Comparisons
// ============================================================================

fn comparison<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Comparison, E> {
    let (input, lhs) = operand(input)?;
    let (input, op) = preceded(multispace0, cmp_op)(input)?;
    let (input, rhs) = cut(context("comparison operand", preceded(multispace0, operand)))(input)?;
    Ok((input, Comparison { lhs, op, rhs }))
}

fn cmp_op<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, CmpOp, E> {
    // Two-character operators first.
    alt((
        value(CmpOp::Eq, tag("==")),
        value(CmpOp::Ne, tag("!=")),
        value(CmpOp::Ge, tag(">=")),
        value(CmpOp::Le, tag("<=")),
        value(CmpOp::Gt, tag(">")),
        value(CmpOp::Lt, tag("<")),
    ))(input)
}

fn operand<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Operand, E> {
    alt((
        map(literal, Operand::Literal),
        map(varname, Operand::Var),
    ))(input)
}

// ============================================================================
// Literals and names
// ============================================================================

fn literal<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Literal, E> {
    alt((
        map(boolean_literal, Literal::Bool),
        number_literal,
        string_literal,
    ))(input)
}

fn boolean_literal<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, bool, E> {
    // The guard keeps `Truex` or `true_positive` from parsing as a boolean
    // followed by garbage.
    terminated(
        alt((
            value(true, tag_no_case("true")),
            value(false, tag_no_case("false")),
        )),
        not(alt((alphanumeric1, tag("_")))),
    )(input)
}

fn number_literal<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Literal, E> {
    let (remaining, num_str) = recognize(nom::sequence::tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;

    match num_str.parse::<f64>() {
        Ok(n) => Ok((remaining, Literal::Number(n))),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn string_literal<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Literal, E> {
    let (input, _) = char('\'')(input)?;
    let (input, s) = take_while(|c| c != '\'')(input)?;
    let (input, _) = cut(context("closing quote", char('\'')))(input)?;
    Ok((input, Literal::Str(s.to_string())))
}

fn varname<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    recognize(pair(char('_'), digit1))(input).map(|(rest, matched)| (rest, matched.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_call() {
        let plan = parse_plan("mf,30").unwrap();
        assert_eq!(plan.statements.len(), 1);
        assert_eq!(
            plan.statements[0],
            Statement::Call(SkillCall {
                abbrev: "mf".to_string(),
                args: vec![Operand::Literal(Literal::Number(30.0))],
            })
        );
    }

    #[test]
    fn test_assignment_with_bare_word() {
        let plan = parse_plan("_1=s,apple").unwrap();
        assert_eq!(
            plan.statements[0],
            Statement::Assign {
                var: "_1".to_string(),
                call: SkillCall {
                    abbrev: "s".to_string(),
                    args: vec![Operand::Literal(Literal::Str("apple".to_string()))],
                },
            }
        );
    }

    #[test]
    fn test_quoted_string_argument() {
        let plan = parse_plan("l,'found it'").unwrap();
        assert_eq!(
            plan.statements[0],
            Statement::Call(SkillCall {
                abbrev: "l".to_string(),
                args: vec![Operand::Literal(Literal::Str("found it".to_string()))],
            })
        );
    }

    #[test]
    fn test_conditional_plan() {
        let plan = parse_plan("_1=s,apple;?_1==True{o,apple;a}").unwrap();
        assert_eq!(plan.statements.len(), 2);
        match &plan.statements[1] {
            Statement::Conditional { cond, body } => {
                assert_eq!(cond.lhs, Operand::Var("_1".to_string()));
                assert_eq!(cond.op, CmpOp::Eq);
                assert_eq!(cond.rhs, Operand::Literal(Literal::Bool(true)));
                assert_eq!(body.len(), 2);
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_loop_with_return() {
        let plan = parse_plan("8{ ?_1==True{ ->True } }").unwrap();
        match &plan.statements[0] {
            Statement::Loop { count, body } => {
                assert_eq!(*count, 8);
                match &body[0] {
                    Statement::Conditional { body, .. } => {
                        assert_eq!(body[0], Statement::Return(Literal::Bool(true)));
                    }
                    other => panic!("expected conditional, got {:?}", other),
                }
            }
            other => panic!("expected loop, got {:?}", other),
        }
    }

    #[test]
    fn test_case_insensitive_booleans() {
        let plan = parse_plan("?_1!=false{->TRUE}").unwrap();
        match &plan.statements[0] {
            Statement::Conditional { cond, body } => {
                assert_eq!(cond.rhs, Operand::Literal(Literal::Bool(false)));
                assert_eq!(body[0], Statement::Return(Literal::Bool(true)));
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_all_comparison_operators() {
        for (src, op) in [
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            (">", CmpOp::Gt),
            ("<", CmpOp::Lt),
            (">=", CmpOp::Ge),
            ("<=", CmpOp::Le),
        ] {
            let plan = parse_plan(&format!("?_1{}5{{a}}", src)).unwrap();
            match &plan.statements[0] {
                Statement::Conditional { cond, .. } => assert_eq!(cond.op, op),
                other => panic!("expected conditional, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_negative_and_decimal_numbers() {
        let plan = parse_plan("tc,-90;mf,0.5").unwrap();
        match (&plan.statements[0], &plan.statements[1]) {
            (Statement::Call(a), Statement::Call(b)) => {
                assert_eq!(a.args[0], Operand::Literal(Literal::Number(-90.0)));
                assert_eq!(b.args[0], Operand::Literal(Literal::Number(0.5)));
            }
            other => panic!("expected two calls, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_argument() {
        let plan = parse_plan("g,_2").unwrap();
        match &plan.statements[0] {
            Statement::Call(call) => assert_eq!(call.args[0], Operand::Var("_2".to_string())),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_separator_and_whitespace() {
        let plan = parse_plan("  tc,90 ; mf,30 ; ").unwrap();
        assert_eq!(plan.statements.len(), 2);
    }

    #[test]
    fn test_empty_plan() {
        let plan = parse_plan("").unwrap();
        assert!(plan.statements.is_empty());
    }

    #[test]
    fn test_missing_closing_brace() {
        let err = parse_plan("8{_1=q,'x'").unwrap_err();
        assert!(err.offset > 0);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse_plan("l,'oops").unwrap_err();
        assert_eq!(err.expected, "closing quote");
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_plan("###").is_err());
        assert!(parse_plan("_1=").is_err());
        assert!(parse_plan("?{a}").is_err());
        assert!(parse_plan("->").is_err());
    }

    #[test]
    fn test_round_trip() {
        for src in [
            "_1=s,apple;?_1==True{o,apple;a}",
            "8{ ?_1==True{ ->True } }",
            "3{ l,'x' }",
            "tc,-90;mf,0.5;->False",
            "?_1>=2{g,_1}",
        ] {
            let first = parse_plan(src).unwrap();
            let rendered = first.to_source();
            let second = parse_plan(&rendered).unwrap();
            assert_eq!(first.statements, second.statements, "source: {}", src);
        }
    }
}
