//! Probabilistic edge-list provider.
//!
//! Parses whitespace-separated `source target probability` lines into a
//! [`LabeledNetwork`]. Lines starting with `#` and blank lines are skipped;
//! node labels are interned in first-seen order. Malformed records are
//! rejected with the offending line number, and graph-level validation
//! (self-loops, duplicates, probability range) surfaces through the core's
//! [`GraphError`].

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use granita_core::{GraphError, LabeledNetwork, NetworkBuilder};
use thiserror::Error;

/// Errors raised while reading a probabilistic edge list.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EdgeListError {
    /// The file could not be opened or read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A record did not have exactly three fields.
    #[error("line {line}: expected `source target probability`, got `{content}`")]
    MalformedRecord {
        /// One-based line number of the record.
        line: usize,
        /// The offending line content.
        content: String,
    },
    /// The probability field did not parse as a float.
    #[error("line {line}: `{value}` is not a valid probability")]
    InvalidProbability {
        /// One-based line number of the record.
        line: usize,
        /// The unparseable field.
        value: String,
    },
    /// The record was rejected by graph validation.
    #[error("line {line}: {source}")]
    Graph {
        /// One-based line number of the record.
        line: usize,
        /// Underlying validation failure.
        #[source]
        source: GraphError,
    },
}

/// Loader for whitespace-separated probabilistic edge lists.
pub struct EdgeListProvider;

impl EdgeListProvider {
    /// Reads a probabilistic edge list from a file.
    ///
    /// # Errors
    /// Returns [`EdgeListError::Io`] when the file cannot be read and the
    /// parsing errors of [`EdgeListProvider::from_reader`] otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<LabeledNetwork, EdgeListError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EdgeListError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|error| match error {
            EdgeListError::Io { source, .. } => EdgeListError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Reads a probabilistic edge list from any buffered reader.
    ///
    /// # Errors
    /// Returns [`EdgeListError::MalformedRecord`] for lines without exactly
    /// three fields, [`EdgeListError::InvalidProbability`] for unparseable
    /// probabilities, and [`EdgeListError::Graph`] for records the core
    /// rejects.
    ///
    /// # Examples
    /// ```
    /// use granita_providers_edgelist::EdgeListProvider;
    ///
    /// let data = "# comment\na b 0.9\nb c 0.5\n";
    /// let network = EdgeListProvider::from_reader(data.as_bytes())
    ///     .expect("edge list is well formed");
    /// assert_eq!(network.graph().node_count(), 3);
    /// assert_eq!(network.graph().edge_count(), 2);
    /// ```
    pub fn from_reader(reader: impl BufRead) -> Result<LabeledNetwork, EdgeListError> {
        let mut builder = NetworkBuilder::new();
        for (at, record) in reader.lines().enumerate() {
            let line = at + 1;
            let record = record.map_err(|source| EdgeListError::Io {
                path: PathBuf::new(),
                source,
            })?;
            let content = record.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = content.split_whitespace().collect();
            let [source, target, probability] = fields.as_slice() else {
                return Err(EdgeListError::MalformedRecord {
                    line,
                    content: content.to_owned(),
                });
            };
            let probability: f64 =
                probability
                    .parse()
                    .map_err(|_| EdgeListError::InvalidProbability {
                        line,
                        value: (*probability).to_owned(),
                    })?;
            builder
                .add_edge(source, target, probability)
                .map_err(|source| EdgeListError::Graph { line, source })?;
        }
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    #[test]
    fn parses_labels_and_probabilities() {
        let data = "alice bob 0.75\nbob carol 1.0\n";
        let network = EdgeListProvider::from_reader(data.as_bytes()).expect("well formed");
        assert_eq!(network.labels(), ["alice", "bob", "carol"]);
        let edges = network.graph().edges();
        assert_eq!(edges.len(), 2);
        assert!((edges[0].probability() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let data = "# header\n\n  \na b 0.5\n# trailing\n";
        let network = EdgeListProvider::from_reader(data.as_bytes()).expect("well formed");
        assert_eq!(network.graph().edge_count(), 1);
    }

    #[rstest]
    #[case("a b\n", 1)]
    #[case("a b 0.5 extra\n", 1)]
    #[case("a b 0.5\nc d\n", 2)]
    fn rejects_malformed_records_with_line_numbers(#[case] data: &str, #[case] line: usize) {
        let err = EdgeListProvider::from_reader(data.as_bytes()).expect_err("record must fail");
        assert!(matches!(
            err,
            EdgeListError::MalformedRecord { line: at, .. } if at == line
        ));
    }

    #[test]
    fn rejects_unparseable_probabilities() {
        let err = EdgeListProvider::from_reader("a b high\n".as_bytes())
            .expect_err("probability must fail");
        assert!(matches!(err, EdgeListError::InvalidProbability { line: 1, .. }));
    }

    #[rstest]
    #[case("a a 0.5\n")]
    #[case("a b 0.0\n")]
    #[case("a b 0.5\nb a 0.6\n")]
    fn surfaces_graph_validation_failures(#[case] data: &str) {
        let err = EdgeListProvider::from_reader(data.as_bytes()).expect_err("record must fail");
        assert!(matches!(err, EdgeListError::Graph { .. }));
    }

    #[test]
    fn from_path_round_trips_a_temporary_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile is available");
        write!(file, "x y 0.9\ny z 0.8\n").expect("write succeeds");
        let network = EdgeListProvider::from_path(file.path()).expect("file is well formed");
        assert_eq!(network.graph().node_count(), 3);
    }

    #[test]
    fn from_path_reports_missing_files() {
        let err = EdgeListProvider::from_path("/nonexistent/granita-edges.txt")
            .expect_err("missing file must fail");
        assert!(matches!(err, EdgeListError::Io { .. }));
    }
}
