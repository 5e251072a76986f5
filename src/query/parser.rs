use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{char, multispace0};
use nom::combinator::map;
use nom::multi::many0;
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser as NomParser};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::normalize;
use crate::core::error::{Error, Result};
use crate::query::ast::{ParsedQuery, QueryFlags, QueryNode};

/// Query parser for the boolean surface syntax:
/// `&` AND, `|` OR, `!` prefix NOT, parentheses, `"…"` phrases, `*` wildcards,
/// implicit AND between adjacent atoms. Precedence: NOT > AND > OR.
///
/// A line may start with flags: `-s[k]`, `-p[k]`, `-a`, `-q`.
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        QueryParser
    }

    /// Parse a full query line and run the analysis pass over its leaves.
    pub fn parse(&self, line: &str, analyzer: &Analyzer) -> Result<ParsedQuery> {
        let (flags, rest) = split_flags(line)?;
        let raw = parse_expression(rest)?;
        let root = analyze_tree(raw, analyzer)?;
        Ok(ParsedQuery { flags, root })
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip leading `-s[k] -p[k] -a -q` flags off a query line. A `-`-prefixed
/// token that is not in the flag grammar is a user error.
fn split_flags(line: &str) -> Result<(QueryFlags, &str)> {
    let mut flags = QueryFlags::default();
    let mut rest = line.trim_start();
    while let Some(stripped) = rest.strip_prefix('-') {
        let end = stripped
            .find(char::is_whitespace)
            .unwrap_or(stripped.len());
        let token = &stripped[..end];
        match parse_flag(token) {
            Some(flag) => match flag {
                Flag::Spelling(k) => flags.spelling = Some(k),
                Flag::Phonetic(k) => flags.phonetic = Some(k),
                Flag::Auto => flags.auto_correct = true,
                Flag::Quit => flags.quit = true,
            },
            None => {
                return Err(Error::malformed_query(format!("unknown flag -{}", token)));
            }
        }
        rest = stripped[end..].trim_start();
    }
    Ok((flags, rest))
}

enum Flag {
    Spelling(u32),
    Phonetic(u32),
    Auto,
    Quit,
}

fn parse_flag(token: &str) -> Option<Flag> {
    match token {
        "a" => return Some(Flag::Auto),
        "q" => return Some(Flag::Quit),
        _ => {}
    }
    let (letter, digits) = token.split_at(1.min(token.len()));
    let k = if digits.is_empty() {
        0
    } else {
        digits.parse::<u32>().ok()?
    };
    match letter {
        "s" => Some(Flag::Spelling(k)),
        "p" => Some(Flag::Phonetic(k)),
        _ => None,
    }
}

/// Parse the boolean expression; the whole input must be consumed.
fn parse_expression(input: &str) -> Result<QueryNode> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(QueryNode::Empty);
    }
    match or_expr(trimmed) {
        Ok((rest, node)) if rest.trim().is_empty() => Ok(node),
        Ok((rest, _)) => Err(Error::malformed_query(format!(
            "unexpected trailing input: {:?}",
            rest.trim()
        ))),
        Err(err) => Err(Error::malformed_query(err.to_string())),
    }
}

fn or_expr(input: &str) -> IResult<&str, QueryNode> {
    let (input, first) = and_expr(input)?;
    let (input, mut rest) = many0(preceded(
        delimited(multispace0, char('|'), multispace0),
        and_expr,
    ))
    .parse(input)?;
    if rest.is_empty() {
        Ok((input, first))
    } else {
        let mut children = Vec::with_capacity(rest.len() + 1);
        children.push(first);
        children.append(&mut rest);
        Ok((input, QueryNode::Or(children)))
    }
}

fn and_expr(input: &str) -> IResult<&str, QueryNode> {
    let (mut input, first) = unary(input)?;
    let mut children = vec![first];
    loop {
        // explicit `&`
        if let Ok((rest, node)) = preceded(
            delimited(multispace0, char('&'), multispace0),
            unary,
        )
        .parse(input)
        {
            children.push(node);
            input = rest;
            continue;
        }
        // implicit AND between adjacent atoms
        if let Ok((rest, node)) = unary.parse(input) {
            children.push(node);
            input = rest;
            continue;
        }
        break;
    }
    if children.len() == 1 {
        Ok((input, children.pop().expect("one child")))
    } else {
        Ok((input, QueryNode::And(children)))
    }
}

fn unary(input: &str) -> IResult<&str, QueryNode> {
    preceded(
        multispace0,
        alt((
            map(preceded(char('!'), unary), |node| {
                QueryNode::Not(Box::new(node))
            }),
            delimited(char('('), or_expr, preceded(multispace0, char(')'))),
            phrase,
            map(word, |w: &str| QueryNode::Term(w.to_string())),
        )),
    )
    .parse(input)
}

fn phrase(input: &str) -> IResult<&str, QueryNode> {
    let (rest, inner) =
        delimited(char('"'), take_while(|c| c != '"'), char('"')).parse(input)?;
    let words: Vec<String> = inner.split_whitespace().map(String::from).collect();
    if words.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((rest, QueryNode::Phrase(words)))
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        !c.is_whitespace() && !matches!(c, '&' | '|' | '!' | '(' | ')' | '"')
    })
    .parse(input)
}

/// Post-parse analysis: normalize and stem term and phrase leaves, keep
/// wildcard leaves un-stemmed, drop tokens that normalize away.
fn analyze_tree(node: QueryNode, analyzer: &Analyzer) -> Result<QueryNode> {
    Ok(match node {
        QueryNode::Term(raw) => match normalize(&raw, true) {
            None => QueryNode::Empty,
            Some(token) if token.contains('*') => QueryNode::Wildcard(token),
            Some(token) if analyzer.is_stop_word(&token) => QueryNode::Empty,
            Some(token) => QueryNode::Term(analyzer.stem(&token)),
        },
        QueryNode::Phrase(words) => {
            let tokens: Vec<String> = words
                .iter()
                .filter_map(|w| normalize(w, false))
                .filter(|t| !analyzer.is_stop_word(t))
                .map(|t| analyzer.stem(&t))
                .collect();
            if tokens.is_empty() {
                QueryNode::Empty
            } else {
                QueryNode::Phrase(tokens)
            }
        }
        QueryNode::And(children) => QueryNode::And(
            children
                .into_iter()
                .map(|c| analyze_tree(c, analyzer))
                .collect::<Result<_>>()?,
        ),
        QueryNode::Or(children) => QueryNode::Or(
            children
                .into_iter()
                .map(|c| analyze_tree(c, analyzer))
                .collect::<Result<_>>()?,
        ),
        QueryNode::Not(child) => QueryNode::Not(Box::new(analyze_tree(*child, analyzer)?)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::error::ErrorKind;

    fn analyzer() -> Analyzer {
        Analyzer::from_config(&Config::default())
    }

    fn parse(line: &str) -> Result<ParsedQuery> {
        QueryParser::new().parse(line, &analyzer())
    }

    #[test]
    fn implicit_and_between_atoms() {
        let query = parse("space jam").unwrap();
        assert_eq!(
            query.root,
            QueryNode::And(vec![
                QueryNode::Term("space".into()),
                QueryNode::Term("jam".into())
            ])
        );
    }

    #[test]
    fn precedence_not_over_and_over_or() {
        let query = parse("!space & jam | sandlot").unwrap();
        assert_eq!(
            query.root,
            QueryNode::Or(vec![
                QueryNode::And(vec![
                    QueryNode::Not(Box::new(QueryNode::Term("space".into()))),
                    QueryNode::Term("jam".into()),
                ]),
                QueryNode::Term("sandlot".into()),
            ])
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        let query = parse("space & (jam | sandlot)").unwrap();
        assert_eq!(
            query.root,
            QueryNode::And(vec![
                QueryNode::Term("space".into()),
                QueryNode::Or(vec![
                    QueryNode::Term("jam".into()),
                    QueryNode::Term("sandlot".into()),
                ]),
            ])
        );
    }

    #[test]
    fn phrases_and_wildcards() {
        let query = parse("\"space jam\" sp*e").unwrap();
        assert_eq!(
            query.root,
            QueryNode::And(vec![
                QueryNode::Phrase(vec!["space".into(), "jam".into()]),
                QueryNode::Wildcard("sp*e".into()),
            ])
        );
    }

    #[test]
    fn terms_are_stemmed_but_wildcards_are_not() {
        let query = parse("movies mov*es").unwrap();
        assert_eq!(
            query.root,
            QueryNode::And(vec![
                QueryNode::Term("movi".into()),
                QueryNode::Wildcard("mov*es".into()),
            ])
        );
    }

    #[test]
    fn flags_prefix_the_line() {
        let query = parse("-s2 -p -a spack").unwrap();
        assert_eq!(query.flags.spelling, Some(2));
        assert_eq!(query.flags.phonetic, Some(0));
        assert!(query.flags.auto_correct);
        assert!(!query.flags.quit);
        assert_eq!(query.root, QueryNode::Term("spack".into()));

        let quit = parse("-q").unwrap();
        assert!(quit.flags.quit);
        assert!(quit.root.is_empty());
    }

    #[test]
    fn malformed_queries_are_rejected() {
        for line in ["\"space jam", "(space & jam", "space ) jam", "\"\"", "-z foo"] {
            let err = parse(line).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedQuery, "line {:?}", line);
        }
    }

    #[test]
    fn double_negation_parses() {
        let query = parse("!!space").unwrap();
        assert_eq!(
            query.root,
            QueryNode::Not(Box::new(QueryNode::Not(Box::new(QueryNode::Term(
                "space".into()
            )))))
        );
    }
}
