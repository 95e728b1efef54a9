//! Error types for the configuration pipeline
//!
//! Every error is raised where it is detected and propagated up to `main`, which is the only
//! place errors are printed.
//!

use camino::Utf8PathBuf;
use simple_error::SimpleError;
use thiserror::Error;

/// Failures found while checking the sample alignment files and auxiliary file lists of a run
///
#[derive(Debug, Error)]
pub enum SampleSetError {
    #[error("{}", cardinality_message(role, option, *found, *min, *max))]
    RoleCardinality {
        role: String,
        option: String,
        found: usize,
        min: usize,
        max: Option<usize>,
    },

    #[error("No {role} sample BAM/CRAM files specified")]
    EmptyRole { role: String },

    #[error("Can't find specified {label} file: '{path}'")]
    FileNotFound { label: String, path: Utf8PathBuf },

    #[error("Can't find expected {label} index file for '{path}', checked: {expected}")]
    MissingIndex {
        label: String,
        path: Utf8PathBuf,
        expected: String,
    },

    #[error("Unsupported {role} alignment file format, expected BAM or CRAM extension: '{path}'")]
    UnsupportedFormat { role: String, path: Utf8PathBuf },

    #[error("Unable to read header of {role} alignment file '{path}': {reason}")]
    UnreadableHeader {
        role: String,
        path: Utf8PathBuf,
        reason: String,
    },

    #[error(
        "Reference contigs of {role} alignment file '{path}' do not match those of {other_role} file '{other_path}'"
    )]
    ReferenceMismatch {
        role: String,
        path: Utf8PathBuf,
        other_role: String,
        other_path: Utf8PathBuf,
    },
}

fn cardinality_message(
    role: &str,
    option: &str,
    found: usize,
    min: usize,
    max: Option<usize>,
) -> String {
    let expected = match max {
        Some(max) if max == min => format!("{min}"),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    let plural = if max == Some(1) { "" } else { "s" };
    format!(
        "Must specify {expected} {role} sample BAM/CRAM file{plural} (--{option}), but {found} given"
    )
}

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("Invalid command-line setting: {0}")]
    OptionParse(String),

    #[error("Invalid sample input: {0}")]
    SampleSet(#[from] SampleSetError),

    #[error("Can't create run directory '{dir}': {source}")]
    DirectoryNotWritable {
        dir: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to write run configuration file '{path}': {source}")]
    ConfigWrite {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to read run configuration from '{path}': {reason}")]
    ConfigRead { path: Utf8PathBuf, reason: String },
}

impl ConfigureError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            Self::OptionParse(_) => exitcode::USAGE,
            Self::SampleSet(_) => exitcode::DATAERR,
            Self::DirectoryNotWritable { .. } => exitcode::CANTCREAT,
            Self::ConfigWrite { .. } | Self::ConfigRead { .. } => exitcode::IOERR,
        }
    }
}

impl From<SimpleError> for ConfigureError {
    fn from(err: SimpleError) -> Self {
        Self::OptionParse(err.to_string())
    }
}
