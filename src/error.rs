use crate::utils::Coercion;
use std::path::PathBuf;
use thiserror::Error;

/// File-level failures of the csv ingestion.
/// Row-level problems are not errors, the rows are skipped and reported.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{}: could not read file: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: file is empty or only whitespace and comments", .path.display())]
    Empty { path: PathBuf },

    #[error("{}: could not detect the delimiter of the header line {line}: {header:?}", .path.display())]
    Delimiter {
        path: PathBuf,
        line: usize,
        header: String,
    },

    #[error("{}: expected 2 columns (x, y) at line {line}, found {found}", .path.display())]
    ColumnShape {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    #[error("{}: no usable data, all {skipped} data rows were skipped", .path.display())]
    NoUsableData { path: PathBuf, skipped: usize },
}

/// Failures of the html rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no valid traces to plot, {} not written", .0.display())]
    NoTraces(PathBuf),

    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A cell that none of the numeric coercions could parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not coerce {cell:?} to a number, tried {}", join_coercions(.tried))]
pub struct CoerceError {
    pub cell: String,
    pub tried: Vec<Coercion>,
}

fn join_coercions(tried: &[Coercion]) -> String {
    tried
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<String>>()
        .join(" and ")
}
