use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhyloError {
    #[error("field at line {line} is {len} bytes long (max {max})")]
    FieldTooLong { line: u64, len: usize, max: usize },

    #[error("input ended before the header line")]
    MissingHeader,

    #[error("header at line {line} declares {count} taxa (max {max})")]
    TooManyTaxa { line: u64, count: usize, max: usize },

    #[error("malformed header at line {line}: {msg}")]
    MalformedHeader { line: u64, msg: &'static str },

    #[error("taxon '{name}' declared twice in header at line {line}")]
    DuplicateTaxon { line: u64, name: String },

    #[error("taxon name '{name}' at line {line} is reserved for an internal node")]
    ReservedTaxonName { line: u64, name: String },

    #[error("row at line {line} is named '{found}', expected '{expected}'")]
    TaxonNameMismatch {
        line: u64,
        expected: String,
        found: String,
    },

    #[error("invalid distance '{field}' at line {line}, column {column}")]
    InvalidNumber {
        line: u64,
        column: usize,
        field: String,
    },

    #[error("row at line {line} has {found} distance fields, expected {expected}")]
    RowFieldCountMismatch {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("non-zero diagonal entry for taxon '{name}': {value}")]
    NonZeroDiagonal { name: String, value: f64 },

    #[error("matrix is not symmetric: D({a},{b}) = {ab} but D({b},{a}) = {ba}")]
    AsymmetricMatrix {
        a: String,
        b: String,
        ab: f64,
        ba: f64,
    },

    #[error("input ended after {found} of {expected} matrix rows")]
    TruncatedInput { expected: usize, found: usize },

    #[error("tree for {taxa} taxa needs {needed} nodes (max {max})")]
    NodeCapacityExceeded {
        taxa: usize,
        needed: usize,
        max: usize,
    },

    #[error("tree has already been built for this table")]
    TreeAlreadyBuilt,

    #[error("outlier '{name}' is not a taxon")]
    OutlierNotFound { name: String },

    #[error("csv read error at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type PhyloResult<T> = Result<T, PhyloError>;

