//! GML provider for probabilistic networks.
//!
//! Parses the GML subset the sampling pipeline consumes: one `graph` block
//! containing `node` blocks with an `id` key and `edge` blocks with
//! `source`, `target`, and `probability` keys. Unknown keys inside a block
//! are skipped (including nested sub-blocks), so files carrying extra
//! attributes such as `label` or layout hints still load. Edges must
//! reference declared node ids.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use granita_core::{GraphError, LabeledNetwork, NetworkBuilder};
use thiserror::Error;

/// Errors raised while reading a GML network.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GmlError {
    /// The file could not be opened or read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The tokenizer met a character it cannot interpret.
    #[error("line {line}: unexpected character `{found}`")]
    UnexpectedCharacter {
        /// One-based line number of the character.
        line: usize,
        /// The offending character.
        found: char,
    },
    /// The parser met a token it cannot interpret at this position.
    #[error("line {line}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        /// One-based line number of the token.
        line: usize,
        /// What the parser was looking for.
        expected: &'static str,
        /// The token actually found.
        found: String,
    },
    /// The input ended inside an open block.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// A required key was missing from a block.
    #[error("line {line}: {block} block is missing its `{key}` key")]
    MissingKey {
        /// One-based line number where the block closed.
        line: usize,
        /// The block kind (`node` or `edge`).
        block: &'static str,
        /// The missing key.
        key: &'static str,
    },
    /// An edge referenced an undeclared node id.
    #[error("line {line}: edge references undeclared node `{id}`")]
    UnknownNode {
        /// One-based line number of the edge block.
        line: usize,
        /// The undeclared id.
        id: String,
    },
    /// A record was rejected by graph validation.
    #[error("line {line}: {source}")]
    Graph {
        /// One-based line number of the record.
        line: usize,
        /// Underlying validation failure.
        #[source]
        source: GraphError,
    },
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Key(String),
    Number(f64),
    Text(String),
    Open,
    Close,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Key(word) => word.clone(),
            Self::Number(value) => value.to_string(),
            Self::Text(text) => format!("\"{text}\""),
            Self::Open => "[".to_owned(),
            Self::Close => "]".to_owned(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, GmlError> {
    let mut tokens = Vec::new();
    let mut line = 1_usize;
    let mut chars = input.chars().peekable();
    while let Some(&next) = chars.peek() {
        match next {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                // Comment runs to end of line.
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '[' => {
                tokens.push((Token::Open, line));
                chars.next();
            }
            ']' => {
                tokens.push((Token::Close, line));
                chars.next();
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\n') => {
                            text.push('\n');
                            line += 1;
                        }
                        Some(c) => text.push(c),
                        None => {
                            return Err(GmlError::UnexpectedEnd {
                                expected: "closing quote",
                            });
                        }
                    }
                }
                tokens.push((Token::Text(text), line));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = literal.parse().map_err(|_| GmlError::UnexpectedToken {
                    line,
                    expected: "a numeric literal",
                    found: literal.clone(),
                })?;
                tokens.push((Token::Number(value), line));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Key(word), line));
            }
            found => {
                return Err(GmlError::UnexpectedCharacter { line, found });
            }
        }
    }
    Ok(tokens)
}

/// Loader for probabilistic GML networks.
pub struct GmlProvider;

impl GmlProvider {
    /// Reads a probabilistic network from a GML file.
    ///
    /// # Errors
    /// Returns [`GmlError::Io`] when the file cannot be read and the parsing
    /// errors of [`GmlProvider::from_str`] otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<LabeledNetwork, GmlError> {
        let path = path.as_ref();
        let mut input = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut input))
            .map_err(|source| GmlError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_str(&input)
    }

    /// Parses a probabilistic network from GML text.
    ///
    /// # Errors
    /// Returns the tokenizer and parser errors described on [`GmlError`].
    ///
    /// # Examples
    /// ```
    /// use granita_providers_gml::GmlProvider;
    ///
    /// let input = r#"
    /// graph [
    ///   node [ id 1 ]
    ///   node [ id 2 ]
    ///   edge [ source 1 target 2 probability 0.8 ]
    /// ]
    /// "#;
    /// let network = GmlProvider::from_str(input).expect("GML is well formed");
    /// assert_eq!(network.graph().node_count(), 2);
    /// assert_eq!(network.graph().edge_count(), 1);
    /// ```
    #[expect(
        clippy::should_implement_trait,
        reason = "fallible parse with a custom error type, not FromStr"
    )]
    pub fn from_str(input: &str) -> Result<LabeledNetwork, GmlError> {
        let tokens = tokenize(input)?;
        Parser::new(&tokens).parse()
    }
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    at: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [(Token, usize)]) -> Self {
        Self { tokens, at: 0 }
    }

    fn peek(&self) -> Option<&'a (Token, usize)> {
        self.tokens.get(self.at)
    }

    fn next(&mut self, expected: &'static str) -> Result<&'a (Token, usize), GmlError> {
        let token = self
            .tokens
            .get(self.at)
            .ok_or(GmlError::UnexpectedEnd { expected })?;
        self.at += 1;
        Ok(token)
    }

    fn expect_open(&mut self, expected: &'static str) -> Result<(), GmlError> {
        match self.next(expected)? {
            (Token::Open, _) => Ok(()),
            (token, line) => Err(GmlError::UnexpectedToken {
                line: *line,
                expected,
                found: token.describe(),
            }),
        }
    }

    fn parse(mut self) -> Result<LabeledNetwork, GmlError> {
        // Find the top-level `graph` block; keys before it are skipped.
        loop {
            match self.next("a `graph` block")? {
                (Token::Key(word), _) if word == "graph" => break,
                (Token::Key(_), _) => self.skip_value()?,
                (token, line) => {
                    return Err(GmlError::UnexpectedToken {
                        line: *line,
                        expected: "a `graph` block",
                        found: token.describe(),
                    });
                }
            }
        }
        self.expect_open("`[` after `graph`")?;

        let mut builder = NetworkBuilder::new();
        let mut declared: Vec<String> = Vec::new();
        loop {
            match self.next("a `node`, `edge`, or `]`")? {
                (Token::Close, _) => break,
                (Token::Key(word), line) if word == "node" => {
                    let id = self.parse_node_block()?;
                    declared.push(id.clone());
                    builder
                        .declare_node(&id)
                        .map_err(|source| GmlError::Graph {
                            line: *line,
                            source,
                        })?;
                }
                (Token::Key(word), line) if word == "edge" => {
                    let edge = self.parse_edge_block()?;
                    for id in [&edge.source, &edge.target] {
                        if !declared.contains(id) {
                            return Err(GmlError::UnknownNode {
                                line: *line,
                                id: id.clone(),
                            });
                        }
                    }
                    builder
                        .add_edge(&edge.source, &edge.target, edge.probability)
                        .map_err(|source| GmlError::Graph {
                            line: *line,
                            source,
                        })?;
                }
                (Token::Key(_), _) => self.skip_value()?,
                (token, line) => {
                    return Err(GmlError::UnexpectedToken {
                        line: *line,
                        expected: "a `node`, `edge`, or `]`",
                        found: token.describe(),
                    });
                }
            }
        }
        Ok(builder.finish())
    }

    fn parse_node_block(&mut self) -> Result<String, GmlError> {
        self.expect_open("`[` after `node`")?;
        let mut id = None;
        let close_line = self.parse_block("node", |key, value, _| {
            if key == "id" {
                id = Some(value.describe_plain());
            }
        })?;
        id.ok_or(GmlError::MissingKey {
            line: close_line,
            block: "node",
            key: "id",
        })
    }

    fn parse_edge_block(&mut self) -> Result<EdgeRecord, GmlError> {
        self.expect_open("`[` after `edge`")?;
        let mut source = None;
        let mut target = None;
        let mut probability = None;
        let close_line = self.parse_block("edge", |key, value, _| match key {
            "source" => source = Some(value.describe_plain()),
            "target" => target = Some(value.describe_plain()),
            "probability" => probability = value.as_number(),
            _ => {}
        })?;
        let missing = |key| GmlError::MissingKey {
            line: close_line,
            block: "edge",
            key,
        };
        Ok(EdgeRecord {
            source: source.ok_or_else(|| missing("source"))?,
            target: target.ok_or_else(|| missing("target"))?,
            probability: probability.ok_or_else(|| missing("probability"))?,
        })
    }

    /// Consumes `key value` pairs until the closing bracket, handing each
    /// scalar value to `visit`; nested blocks are skipped wholesale.
    fn parse_block(
        &mut self,
        block: &'static str,
        mut visit: impl FnMut(&str, &ScalarValue, usize),
    ) -> Result<usize, GmlError> {
        loop {
            match self.next("a key or `]`")? {
                (Token::Close, line) => return Ok(*line),
                (Token::Key(key), line) => match self.peek() {
                    Some((Token::Open, _)) => self.skip_value()?,
                    Some((Token::Number(value), _)) => {
                        visit(key, &ScalarValue::Number(*value), *line);
                        self.at += 1;
                    }
                    Some((Token::Text(text), _)) => {
                        visit(key, &ScalarValue::Text(text.clone()), *line);
                        self.at += 1;
                    }
                    Some((token, at)) => {
                        return Err(GmlError::UnexpectedToken {
                            line: *at,
                            expected: "a value",
                            found: token.describe(),
                        });
                    }
                    None => {
                        return Err(GmlError::UnexpectedEnd {
                            expected: "a value",
                        });
                    }
                },
                (token, line) => {
                    return Err(GmlError::UnexpectedToken {
                        line: *line,
                        expected: block,
                        found: token.describe(),
                    });
                }
            }
        }
    }

    /// Skips one value: a scalar, or a bracketed block with nesting.
    fn skip_value(&mut self) -> Result<(), GmlError> {
        match self.next("a value")? {
            (Token::Open, _) => {
                let mut depth = 1_usize;
                while depth > 0 {
                    match self.next("`]`")? {
                        (Token::Open, _) => depth += 1,
                        (Token::Close, _) => depth -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            (Token::Number(_) | Token::Text(_) | Token::Key(_), _) => Ok(()),
            (Token::Close, line) => Err(GmlError::UnexpectedToken {
                line: *line,
                expected: "a value",
                found: "]".to_owned(),
            }),
        }
    }
}

struct EdgeRecord {
    source: String,
    target: String,
    probability: f64,
}

enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Renders the value as a node identifier: integers print without a
    /// trailing fraction so `id 1` and `source 1` agree.
    fn describe_plain(&self) -> String {
        match self {
            Self::Number(value) => {
                if value.fract() == 0.0 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            Self::Text(text) => text.clone(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    const FOUR_CYCLE: &str = r#"
graph [
  directed 0
  node [ id 1 label "one" ]
  node [ id 2 label "two" ]
  node [ id 3 ]
  node [ id 4 ]
  edge [ source 1 target 2 probability 0.9 ]
  edge [ source 2 target 3 probability 0.9 ]
  edge [ source 3 target 4 probability 0.9 ]
  edge [ source 4 target 1 probability 0.9 ]
]
"#;

    #[test]
    fn parses_the_four_cycle_fixture() {
        let network = GmlProvider::from_str(FOUR_CYCLE).expect("GML is well formed");
        assert_eq!(network.graph().node_count(), 4);
        assert_eq!(network.graph().edge_count(), 4);
        assert_eq!(network.label(0), Some("1"));
        for edge in network.graph().edges() {
            assert!((edge.probability() - 0.9).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn skips_unknown_keys_and_nested_blocks() {
        let input = r#"
Creator "granita"
graph [
  comment "layout follows"
  layout [ engine "spring" iterations 50 ]
  node [ id 1 graphics [ x 0.5 y 1.5 ] ]
  node [ id 2 ]
  edge [ source 1 target 2 probability 0.4 weight 3 ]
]
"#;
        let network = GmlProvider::from_str(input).expect("GML is well formed");
        assert_eq!(network.graph().node_count(), 2);
        assert_eq!(network.graph().edge_count(), 1);
    }

    #[test]
    fn rejects_edges_referencing_undeclared_nodes() {
        let input = "graph [ node [ id 1 ] edge [ source 1 target 9 probability 0.5 ] ]";
        let err = GmlProvider::from_str(input).expect_err("unknown node must fail");
        assert!(matches!(err, GmlError::UnknownNode { id, .. } if id == "9"));
    }

    #[rstest]
    #[case("graph [ node [ label \"x\" ] ]", "id")]
    #[case("graph [ node [ id 1 ] node [ id 2 ] edge [ source 1 target 2 ] ]", "probability")]
    #[case("graph [ node [ id 1 ] node [ id 2 ] edge [ target 2 probability 0.5 ] ]", "source")]
    fn rejects_blocks_missing_required_keys(#[case] input: &str, #[case] key: &str) {
        let err = GmlProvider::from_str(input).expect_err("missing key must fail");
        assert!(matches!(err, GmlError::MissingKey { key: at, .. } if at == key));
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let input = "graph [ node [ id 1 ] node [ id 1 ] ]";
        let err = GmlProvider::from_str(input).expect_err("duplicate id must fail");
        assert!(matches!(err, GmlError::Graph { .. }));
    }

    #[test]
    fn rejects_truncated_input() {
        let err = GmlProvider::from_str("graph [ node [ id 1 ]").expect_err("truncation fails");
        assert!(matches!(err, GmlError::UnexpectedEnd { .. }));
    }

    #[test]
    fn from_path_round_trips_a_temporary_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile is available");
        write!(file, "{FOUR_CYCLE}").expect("write succeeds");
        let network = GmlProvider::from_path(file.path()).expect("file is well formed");
        assert_eq!(network.graph().edge_count(), 4);
    }
}
