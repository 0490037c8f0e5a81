use crate::error::IngestError;
use crate::utils::*;
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::fmt;
use std::path::Path;
pub mod bode_plot;
pub mod error;
pub mod figure;
pub mod three_phase;
pub mod utils;
pub mod waveform;

// constants
pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
pub const DEFAULT_COMMENT: char = '#';

/// What to do with the columns after the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnPolicy {
    /// Keep the first two columns and ignore the others.
    #[default]
    Truncate,
    /// A header with more than two labels is a shape error,
    /// data rows with more than two fields are skipped.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub comment: char,
    pub columns: ColumnPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            comment: DEFAULT_COMMENT,
            columns: ColumnPolicy::Truncate,
        }
    }
}

/// Why a data row was left out.
#[derive(Debug, Clone, PartialEq)]
enum Skip {
    TooFewColumns(usize),
    TooManyColumns(usize),
    NotNumeric(crate::error::CoerceError),
    Unreadable(String),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Skip::TooFewColumns(n) => write!(f, "expected 2 columns, found {}", n),
            Skip::TooManyColumns(n) => write!(f, "expected 2 columns, found {} (strict columns)", n),
            Skip::NotNumeric(e) => write!(f, "{}", e),
            Skip::Unreadable(e) => write!(f, "could not read row: {}", e),
        }
    }
}

/// The main struct for a two-column csv file, e.g., frequency and magnitude.
/// The rows are stored by column, x and y always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Dataset {
    /// Initiate an empty Dataset with the given capacity for the x and y vectors.
    pub fn new(name: &str, x_label: &str, y_label: &str, capacity: usize) -> Dataset {
        Dataset {
            name: name.to_owned(),
            x_label: x_label.to_owned(),
            y_label: y_label.to_owned(),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    /// Initiate a Dataset from a csv file.
    /// The name is the file stem, the labels come from the header line.
    /// Rows that are not two numbers are skipped and reported,
    /// only file-level problems are returned as errors.
    pub fn from_csv<P>(fin: P, opts: &IngestOptions) -> Result<Dataset, IngestError>
    where
        P: AsRef<Path>,
    {
        let path = fin.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
            path: path.to_owned(),
            source,
        })?;
        Dataset::parse_str(path, &text, opts)
    }

    /// Parse the csv text, the path is only used for the name and the messages.
    pub fn parse_str(path: &Path, text: &str, opts: &IngestOptions) -> Result<Dataset, IngestError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let is_comment = |l: &str| l.trim_start().starts_with(opts.comment);

        // content lines with their 1-based line number
        let content: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty() && !is_comment(*l))
            .map(|(i, l)| (i + 1, l))
            .take(SNIFF_SAMPLE_LINES)
            .collect();
        let (header_line, header) = match content.first() {
            Some(&(n, l)) => (n, l),
            None => {
                return Err(IngestError::Empty {
                    path: path.to_owned(),
                })
            }
        };

        let sample: Vec<&str> = content.iter().map(|(_, l)| *l).collect();
        let delimiter = match detect_delimiter(&sample) {
            Some(d) => d,
            None if has_no_candidate(header) => {
                return Err(IngestError::ColumnShape {
                    path: path.to_owned(),
                    line: header_line,
                    found: 1,
                })
            }
            None => {
                return Err(IngestError::Delimiter {
                    path: path.to_owned(),
                    line: header_line,
                    header: header.trim().to_owned(),
                })
            }
        };
        debug!(
            "{}: using {} delimiter",
            path.display(),
            delimiter_name(delimiter)
        );

        // blank out the comments, keeping the line numbers, so quotes in them are harmless
        let cleaned: String = text
            .lines()
            .map(|l| if is_comment(l) { "" } else { l })
            .collect::<Vec<&str>>()
            .join("\n");
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(cleaned.as_bytes());

        let mut dataset: Option<Dataset> = None;
        let mut skipped: Vec<(usize, Skip)> = Vec::new();
        let mut last_line = 0usize;

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    let skip = Skip::Unreadable(e.to_string());
                    warn!("{}: skipping row after line {}: {}", path.display(), last_line, skip);
                    skipped.push((last_line + 1, skip));
                    continue;
                }
            };
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(last_line + 1);
            last_line = line;

            // runs of spaces are a single separator
            let fields: Vec<&str> = record
                .iter()
                .filter(|f| delimiter != b' ' || !f.is_empty())
                .collect();
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }

            let ds = match dataset.as_mut() {
                Some(ds) => ds,
                None => {
                    dataset = Some(Dataset::from_header(path, line, &fields, opts)?);
                    continue;
                }
            };

            match parse_row(&fields, opts.columns) {
                Ok((x, y)) => {
                    ds.x.push(x);
                    ds.y.push(y);
                }
                Err(skip) => {
                    warn!("{}: skipping line {}: {}", path.display(), line, skip);
                    skipped.push((line, skip));
                }
            }
        }

        let dataset = match dataset {
            Some(ds) => ds,
            None => {
                return Err(IngestError::Empty {
                    path: path.to_owned(),
                })
            }
        };

        if dataset.is_empty() {
            // a single-column file is a shape problem, not just a lack of data
            let short = skipped
                .iter()
                .all(|(_, s)| matches!(s, Skip::TooFewColumns(_)));
            return match skipped.first() {
                Some((line, Skip::TooFewColumns(found))) if short => Err(IngestError::ColumnShape {
                    path: path.to_owned(),
                    line: *line,
                    found: *found,
                }),
                _ => Err(IngestError::NoUsableData {
                    path: path.to_owned(),
                    skipped: skipped.len(),
                }),
            };
        }

        if !skipped.is_empty() {
            info!(
                "{}: read {} rows, skipped {}",
                path.display(),
                dataset.len(),
                skipped.len()
            );
        }
        if let Some((xmin, xmax)) = min_and_max(dataset.x.iter()) {
            debug!(
                "{}: {} from {} to {}",
                dataset.name, dataset.x_label, xmin, xmax
            );
        }
        Ok(dataset)
    }

    /// Build the empty Dataset from the header fields, validating the number of labels.
    fn from_header(
        path: &Path,
        line: usize,
        fields: &[&str],
        opts: &IngestOptions,
    ) -> Result<Dataset, IngestError> {
        let labels: Vec<&str> = fields
            .iter()
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
            .collect();
        let shape_err = IngestError::ColumnShape {
            path: path.to_owned(),
            line,
            found: labels.len(),
        };
        if labels.len() < 2 {
            return Err(shape_err);
        }
        if labels.len() > 2 {
            match opts.columns {
                ColumnPolicy::Strict => return Err(shape_err),
                ColumnPolicy::Truncate => info!(
                    "{}: found {} columns, keeping {} and {}",
                    path.display(),
                    labels.len(),
                    labels[0],
                    labels[1]
                ),
            }
        }
        Ok(Dataset::new(&file_stem(path), labels[0], labels[1], 1000))
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Coerce the first two fields of a data row.
fn parse_row(fields: &[&str], columns: ColumnPolicy) -> Result<(f64, f64), Skip> {
    if fields.len() < 2 {
        return Err(Skip::TooFewColumns(fields.len()));
    }
    // trailing delimiters do not count as columns, as for the header
    let significant = fields
        .iter()
        .rposition(|f| !f.is_empty())
        .map_or(0, |i| i + 1)
        .max(2);
    if significant > 2 && columns == ColumnPolicy::Strict {
        return Err(Skip::TooManyColumns(significant));
    }
    let x = coerce_f64(fields[0]).map_err(Skip::NotNumeric)?;
    let y = coerce_f64(fields[1]).map_err(Skip::NotNumeric)?;
    Ok((x, y))
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} ({} rows)", self.name, self.len())?;
        writeln!(f, "{},{}", self.x_label, self.y_label)?;
        for (x, y) in self.rows() {
            writeln!(f, "{},{}", x, y)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    // run tests with:
    // cargo test -- --nocapture
    // to see the Display of the datasets

    fn parse(name: &str, text: &str) -> Result<Dataset, IngestError> {
        Dataset::parse_str(&PathBuf::from(name), text, &IngestOptions::default())
    }

    #[test]
    fn well_formed_comma() {
        let ds = parse("a.csv", "freq,mag\n10,-1.5\n100,-3\n1000,-20.25\n").unwrap();
        println!("{}", ds);
        assert_eq!(ds.name, "a");
        assert_eq!((ds.x_label.as_str(), ds.y_label.as_str()), ("freq", "mag"));
        assert_eq!(ds.x, vec![10., 100., 1000.]);
        assert_eq!(ds.y, vec![-1.5, -3., -20.25]);
    }

    #[test]
    fn all_delimiters_give_the_same_content() {
        let comma = parse("d.csv", "freq,mag\n10,-1.5\n100,-3\n").unwrap();
        for d in ["\t", ";", " "] {
            let text = format!("freq{d}mag\n10{d}-1.5\n100{d}-3\n");
            let ds = parse("d.csv", &text).unwrap();
            assert_eq!(ds, comma, "delimiter {:?}", d);
        }
    }

    #[test]
    fn comments_and_blank_lines_are_excluded() {
        let text = "\n# exported by the analyzer\nfreq,mag\n\n10,1\n  # mid comment\n   \n20,2\n#,\n30,3\n\n";
        let ds = parse("c.csv", text).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.x, vec![10., 20., 30.]);
    }

    #[test]
    fn custom_comment_marker() {
        let opts = IngestOptions {
            comment: '%',
            ..IngestOptions::default()
        };
        let ds = Dataset::parse_str(Path::new("p.csv"), "% note\nf,m\n1,2\n% x\n3,4\n", &opts).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn decimal_comma_with_semicolon() {
        let ds = parse("eu.csv", "Frequenz;Betrag\n1,5;-0,25\n10;-3,5\n").unwrap();
        assert_eq!(ds.x, vec![1.5, 10.]);
        assert_eq!(ds.y, vec![-0.25, -3.5]);
    }

    #[test]
    fn quoted_labels_bom_and_crlf() {
        let ds = parse("q.csv", "\u{feff}\"Frequency (Hz)\",\"Magnitude (dB)\"\r\n1,2\r\n3,4\r\n").unwrap();
        assert_eq!(ds.x_label, "Frequency (Hz)");
        assert_eq!(ds.y_label, "Magnitude (dB)");
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let ds = parse("s.csv", "freq,mag\n1,2\nabc,3\n4\n5,6\n").unwrap();
        assert_eq!(ds.x, vec![1., 5.]);
        assert_eq!(ds.y, vec![2., 6.]);
    }

    #[test]
    fn empty_cells_are_nan() {
        let ds = parse("n.csv", "freq,mag\n1,\n2,3\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.y[0].is_nan());
    }

    #[test]
    fn extra_columns_truncated_by_default() {
        let ds = parse("t.csv", "freq,mag,phase\n1,2,90\n3,4,45\n").unwrap();
        assert_eq!((ds.x_label.as_str(), ds.y_label.as_str()), ("freq", "mag"));
        assert_eq!(ds.y, vec![2., 4.]);
    }

    #[test]
    fn extra_columns_rejected_when_strict() {
        let opts = IngestOptions {
            columns: ColumnPolicy::Strict,
            ..IngestOptions::default()
        };
        let err = Dataset::parse_str(Path::new("t.csv"), "freq,mag,phase\n1,2,90\n", &opts).unwrap_err();
        assert!(matches!(err, IngestError::ColumnShape { line: 1, found: 3, .. }));
        let ds = Dataset::parse_str(Path::new("t.csv"), "freq,mag\n1,2,90\n3,4\n", &opts).unwrap();
        assert_eq!(ds.x, vec![3.]);
    }

    #[test]
    fn strict_columns_ignore_trailing_delimiters() {
        let opts = IngestOptions {
            columns: ColumnPolicy::Strict,
            ..IngestOptions::default()
        };
        let ds = Dataset::parse_str(Path::new("t.csv"), "freq,mag,\n10,-3,\n100,-6,\n1000,\n", &opts).unwrap();
        assert_eq!(ds.x, vec![10., 100., 1000.]);
        assert_eq!(ds.y[..2], [-3., -6.]);
        assert!(ds.y[2].is_nan());
    }

    #[test]
    fn one_column_is_a_shape_error() {
        let err = parse("mono.csv", "freq\n1\n2\n").unwrap_err();
        assert!(matches!(err, IngestError::ColumnShape { line: 1, found: 1, .. }));
        assert!(err.to_string().contains("mono.csv"));

        let err = parse("mono.csv", "freq,mag\n1\n2\n").unwrap_err();
        assert!(matches!(err, IngestError::ColumnShape { line: 2, found: 1, .. }));
    }

    #[test]
    fn no_usable_data_is_distinct() {
        let err = parse("nodata.csv", "freq,mag\nx,y\nfoo,bar\n").unwrap_err();
        assert!(matches!(err, IngestError::NoUsableData { skipped: 2, .. }));
        assert!(err.to_string().contains("nodata.csv"));

        let err = parse("header_only.csv", "freq,mag\n# nothing\n").unwrap_err();
        assert!(matches!(err, IngestError::NoUsableData { skipped: 0, .. }));
    }

    #[test]
    fn empty_and_undetectable() {
        assert!(matches!(parse("e.csv", "\n  \n# only comments\n"), Err(IngestError::Empty { .. })));
        let err = parse("u.csv", "freq,\n1,\n").unwrap_err();
        assert!(matches!(err, IngestError::Delimiter { line: 1, .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Dataset::from_csv("./test/does_not_exist.csv", &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
    }

    #[test]
    fn from_csv_fixtures() {
        let opts = IngestOptions::default();
        let comma = Dataset::from_csv("./test/bode_comma.csv", &opts).unwrap();
        let eu = Dataset::from_csv("./test/bode_semicolon.csv", &opts).unwrap();
        println!("{}", comma);
        assert_eq!(comma.len(), 5);
        assert_eq!(comma.x, eu.x);
        assert_eq!(comma.y, eu.y);
        assert_eq!(eu.name, "bode_semicolon");

        let err = Dataset::from_csv("./test/one_column.csv", &opts).unwrap_err();
        assert!(matches!(err, IngestError::ColumnShape { .. }));
    }
}
