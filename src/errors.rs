//! Error types produced while configuring, analysing or optimising a structure.
//!
//! Configuration problems ([`ModelError`], [`BankError`], [`SectionTableError`])
//! and numerical failures ([`AnalysisError`]) are returned to the caller
//! immediately. Running out of feasible stock or out of search budget is not an
//! error; it is reported as part of a [`Plan`](crate::Plan).

use std::path::PathBuf;

use thiserror::Error;

/// Error returned when a structure cannot be built from the supplied geometry.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    /// Returned when no members are supplied.
    #[error("a structure needs at least one member")]
    NoMembers,
    /// Returned when fewer than two distinct support points are supplied.
    #[error("at least two distinct supports are required (found {found})")]
    InsufficientSupports {
        /// Number of distinct support points that were supplied.
        found: usize,
    },
    /// Returned when a profile name is missing from the section table.
    #[error("profile '{0}' is not in the section table")]
    UnknownProfile(String),
    /// Returned when a member spans zero distance.
    #[error("member {0} has zero length")]
    ZeroLengthMember(usize),
    /// Returned when a member of a planar model leaves the XZ plane.
    #[error("member {0} is not parallel to the XZ plane of a planar model")]
    OutOfPlane(usize),
    /// Returned when a member index does not exist.
    #[error("member {0} does not exist in this structure")]
    UnknownMember(usize),
    /// Returned when the material of a member is not physically meaningful.
    #[error("member {member} has invalid material: {reason}")]
    InvalidMaterial {
        /// Index of the offending member.
        member: usize,
        /// Description of the rejected value.
        reason: String,
    },
}

/// Error returned when a structural analysis fails.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when the stiffness matrix cannot be factorised.
    #[error("stiffness matrix is singular; check supports and connectivity")]
    SingularStiffness,
    /// Returned when a line load targets a member that does not exist.
    #[error("line load targets unknown member {0}")]
    UnknownLoadedMember(usize),
    /// Returned when a load direction or projection axis has zero length.
    #[error("load direction must be a non-zero vector")]
    ZeroLoadDirection,
}

/// Error returned by [`MaterialBank`](crate::MaterialBank) construction and cuts.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BankError {
    /// Returned when a stock index is not part of the bank.
    #[error("stock element {0} does not exist in this bank")]
    UnknownStock(usize),
    /// Returned when a piece that already serves a member is cut again.
    #[error("stock element {0} is already in use")]
    AlreadyInUse(usize),
    /// Returned when a cut asks for more length than the piece has.
    #[error("stock element {stock} has {available} mm but {requested} mm was requested")]
    InsufficientLength {
        /// Index of the stock element.
        stock: usize,
        /// Length currently held by the element.
        available: f64,
        /// Length the cut asked for.
        requested: f64,
    },
    /// Returned when a negative length is supplied.
    #[error("lengths must not be negative (received {0})")]
    NegativeLength(f64),
    /// Returned when a stock profile is missing from the section table.
    #[error("profile '{0}' is not in the section table")]
    UnknownProfile(String),
    /// Returned when parallel construction lists differ in length.
    #[error("parallel lists differ in length: {profiles} profiles, {quantities} quantities, {lengths} lengths")]
    MismatchedLists {
        /// Number of profile names.
        profiles: usize,
        /// Number of quantities.
        quantities: usize,
        /// Number of lengths.
        lengths: usize,
    },
    /// Returned when a compact `<qty>x<profile>x<length>` command is malformed.
    #[error("invalid stock command '{command}': {reason}")]
    InvalidCommand {
        /// The rejected command text.
        command: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Error returned while reading a section property table.
#[derive(Debug, Error)]
pub enum SectionTableError {
    /// Returned when a row does not have the five expected fields.
    #[error("line {line}: expected 5 comma separated fields, found {found}")]
    FieldCount {
        /// One-based line number.
        line: usize,
        /// Number of fields on the line.
        found: usize,
    },
    /// Returned when a numeric field does not parse.
    #[error("line {line}: '{value}' is not a number")]
    InvalidNumber {
        /// One-based line number.
        line: usize,
        /// Offending field.
        value: String,
    },
    /// Returned when a property is zero or negative.
    #[error("line {line}: section properties of '{name}' must be positive")]
    NonPositive {
        /// One-based line number.
        line: usize,
        /// Profile name on that line.
        name: String,
    },
    /// Returned when the resource cannot be read.
    #[error("failed to read section table {path}: {source}")]
    Io {
        /// Location of the resource.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// Any error the crate can return.
#[derive(Debug, Error)]
pub enum Error {
    /// Structure configuration error.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Numerical failure during analysis.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Material bank configuration or bookkeeping error.
    #[error(transparent)]
    Bank(#[from] BankError),
    /// Section table error.
    #[error(transparent)]
    Sections(#[from] SectionTableError),
}
