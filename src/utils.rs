use crate::error::CoerceError;
use chrono::prelude::*;
use log::LevelFilter;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Candidate delimiters, in order of preference for the fallback.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b' '];

/// Number of content lines used to sniff the delimiter.
pub const SNIFF_SAMPLE_LINES: usize = 5;

/// Outcome of the delimiter sniffing over a sample of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sniffed {
    Found(u8),
    Ambiguous(Vec<u8>),
    NotFound,
}

/// A candidate is consistent when it appears the same, non-zero, number of times
/// on every line of the sample.
/// One consistent candidate is a match, more than one is ambiguous.
pub fn sniff_delimiter(sample: &[&str]) -> Sniffed {
    let consistent: Vec<u8> = CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .filter(|d| {
            let mut counts = sample
                .iter()
                .map(|l| l.trim().bytes().filter(|b| b == d).count());
            match counts.next() {
                Some(first) if first > 0 => counts.all(|c| c == first),
                _ => false,
            }
        })
        .collect();
    match consistent.len() {
        0 => Sniffed::NotFound,
        1 => Sniffed::Found(consistent[0]),
        _ => Sniffed::Ambiguous(consistent),
    }
}

/// Split a line on the delimiter, trimming the fields and dropping the empty ones.
pub fn split_fields(line: &str, delimiter: u8) -> Vec<&str> {
    line.split(delimiter as char)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect()
}

/// First candidate that splits the header into at least two fields.
pub fn fallback_delimiter(header: &str) -> Option<u8> {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .find(|&d| split_fields(header, d).len() >= 2)
}

/// Sniff first, then fall back to the ordered candidates tested on the header.
/// The sample is expected to start with the header line.
pub fn detect_delimiter(sample: &[&str]) -> Option<u8> {
    let header = sample.first()?;
    match sniff_delimiter(sample) {
        Sniffed::Found(d) if split_fields(header, d).len() >= 2 => Some(d),
        sniffed => {
            log::debug!("sniffing gave {:?}, testing the header with the fallbacks", sniffed);
            fallback_delimiter(header)
        }
    }
}

/// True when the line contains none of the candidate delimiters.
pub fn has_no_candidate(line: &str) -> bool {
    !line.trim().bytes().any(|b| CANDIDATE_DELIMITERS.contains(&b))
}

pub fn delimiter_name(d: u8) -> &'static str {
    match d {
        b',' => "comma",
        b';' => "semicolon",
        b'\t' => "tab",
        b' ' => "space",
        _ => "other",
    }
}

/// One attempt of the numeric coercion chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Period,
    DecimalComma,
}

/// The attempts, in the order they are tried.
pub const COERCION_CHAIN: [Coercion; 2] = [Coercion::Period, Coercion::DecimalComma];

impl Coercion {
    pub fn attempt(self, cell: &str) -> Option<f64> {
        match self {
            Coercion::Period => cell.parse::<f64>().ok(),
            // a single comma and no period, otherwise it could be a thousands separator
            Coercion::DecimalComma => {
                if cell.matches(',').count() == 1 && !cell.contains('.') {
                    cell.replace(',', ".").parse::<f64>().ok()
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Coercion::Period => write!(f, "period decimal"),
            Coercion::DecimalComma => write!(f, "comma decimal"),
        }
    }
}

/// Coerce a csv cell to f64 trying the chain in order.
/// An empty cell is a missing value and gives NAN.
pub fn coerce_f64(cell: &str) -> Result<f64, CoerceError> {
    let c = cell.trim();
    if c.is_empty() {
        return Ok(f64::NAN);
    }
    COERCION_CHAIN
        .iter()
        .find_map(|attempt| attempt.attempt(c))
        .ok_or_else(|| CoerceError {
            cell: c.to_owned(),
            tried: COERCION_CHAIN.to_vec(),
        })
}

/// List the csv files in the directory, sorted by name.
pub fn discover_csv<P>(dir: P) -> io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Name used for the traces and the derived output files.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("unnamed"))
}

/// Min and max ignoring NAN, None when there are no finite values.
pub fn min_and_max<'a, I>(s: I) -> Option<(f64, f64)>
where
    I: Iterator<Item = &'a f64>,
{
    s.filter(|v| !v.is_nan()).fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

/// Diagnostics go to stdout, with a local timestamp.
/// The level is only controlled by the verbose flag, the environment is not read.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let res = env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
    if let Err(e) = res {
        println!("logger already initialized: {}", e);
    }
}
