//! Validation of a single sample alignment file
//!
//! Only the header of each alignment file is read. The file body is left for the execution
//! engine.
//!

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use log::{debug, warn};
use rust_htslib::bam::{self, Read};
use strum::Display;

use crate::errors::SampleSetError;
use crate::genome_ref_utils::{ContigSignature, get_bam_header_contigs};

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AlignmentFormat {
    Bam,
    Cram,
}

impl AlignmentFormat {
    /// Infer alignment format from the filename extension
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        match path.extension()?.to_ascii_lowercase().as_str() {
            "bam" => Some(Self::Bam),
            "cram" => Some(Self::Cram),
            _ => None,
        }
    }

    /// Index filenames accepted for an alignment file of this format, in order of preference
    pub fn index_candidates(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        let ext_list: &[&str] = match self {
            Self::Bam => &["bai", "csi"],
            Self::Cram => &["crai"],
        };
        let mut candidates = Vec::new();
        for ext in ext_list {
            candidates.push(Utf8PathBuf::from(format!("{path}.{ext}")));
            if *ext != "csi" {
                candidates.push(path.with_extension(ext));
            }
        }
        candidates
    }
}

/// A sample alignment file which has passed validation
#[derive(Clone, Debug, PartialEq)]
pub struct SampleFileRef {
    /// Absolute path to the alignment file
    pub path: Utf8PathBuf,

    /// Sample role label, such as "tumor" or "parent"
    pub role: String,

    pub format: AlignmentFormat,
    pub index_path: Utf8PathBuf,
    pub sample_name: String,
    pub contig_signature: ContigSignature,
}

/// Find the first existing index file for an alignment file
fn find_index_path(
    path: &Utf8Path,
    format: AlignmentFormat,
    role: &str,
) -> Result<Utf8PathBuf, SampleSetError> {
    let candidates = format.index_candidates(path);
    match candidates.iter().find(|x| x.is_file()) {
        Some(x) => Ok(x.clone()),
        None => Err(SampleSetError::MissingIndex {
            label: format!("{role} sample {format}"),
            path: path.to_path_buf(),
            expected: candidates.iter().map(|x| format!("'{x}'")).join(", "),
        }),
    }
}

/// Get the read group sample name from a header
///
/// Returns None if there are no read groups with a sample name.
///
fn get_sample_name(header: &bam::HeaderView, path: &Utf8Path) -> Option<String> {
    let header_map = bam::Header::from_template(header).to_hashmap();
    let sample_names = header_map
        .get("RG")
        .map(|rg_list| {
            rg_list
                .iter()
                .filter_map(|rg| rg.get("SM").cloned())
                .unique()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if sample_names.len() > 1 {
        warn!(
            "Alignment file '{path}' has multiple read group sample names ({}), using the first: '{}'",
            sample_names.join(", "),
            sample_names[0]
        );
    }
    sample_names.into_iter().next()
}

/// Make a path absolute against the given working directory, without touching the filesystem
pub fn absolute_path(path: &Utf8Path, working_dir: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

/// Validate a sample alignment file and extract its identifying metadata
///
/// * `path` - alignment file path, relative paths are made absolute against the current working
///   directory without resolving symlinks
/// * `role` - sample role label, used in all error messages
///
pub fn validate_sample_file(path: &Utf8Path, role: &str) -> Result<SampleFileRef, SampleSetError> {
    let not_found = || SampleSetError::FileNotFound {
        label: format!("{role} sample alignment"),
        path: path.to_path_buf(),
    };
    let path = &std::path::absolute(path)
        .ok()
        .and_then(|x| Utf8PathBuf::from_path_buf(x).ok())
        .ok_or_else(not_found)?;

    if !path.is_file() {
        return Err(SampleSetError::FileNotFound {
            label: format!("{role} sample alignment"),
            path: path.to_path_buf(),
        });
    }

    let Some(format) = AlignmentFormat::from_path(path) else {
        return Err(SampleSetError::UnsupportedFormat {
            role: role.to_string(),
            path: path.to_path_buf(),
        });
    };

    let index_path = find_index_path(path, format, role)?;

    let unreadable = |reason: String| SampleSetError::UnreadableHeader {
        role: role.to_string(),
        path: path.to_path_buf(),
        reason,
    };

    let reader = bam::Reader::from_path(path).map_err(|e| unreadable(e.to_string()))?;
    let header = reader.header();

    let contigs = get_bam_header_contigs(header);
    if contigs.is_empty() {
        return Err(unreadable(
            "no reference sequence (@SQ) records found, input may be unmapped".to_string(),
        ));
    }
    let contig_signature = ContigSignature::from_contigs(&contigs);

    let sample_name = match get_sample_name(header, path) {
        Some(x) => x,
        None => {
            let x = path.file_stem().unwrap_or(path.as_str()).to_string();
            warn!(
                "No read group sample name found in {role} alignment file '{path}', using filename stem '{x}'"
            );
            x
        }
    };

    debug!("Validated {role} alignment file '{path}' with index '{index_path}'");

    Ok(SampleFileRef {
        path: path.to_path_buf(),
        role: role.to_string(),
        format,
        index_path,
        sample_name,
        contig_signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{TEST_CONTIGS, write_test_bam, write_test_file};

    #[test]
    fn test_alignment_format() {
        assert_eq!(
            AlignmentFormat::from_path(Utf8Path::new("/a/b.BAM")),
            Some(AlignmentFormat::Bam)
        );
        assert_eq!(
            AlignmentFormat::from_path(Utf8Path::new("b.cram")),
            Some(AlignmentFormat::Cram)
        );
        assert_eq!(AlignmentFormat::from_path(Utf8Path::new("b.sam")), None);
        assert_eq!(AlignmentFormat::from_path(Utf8Path::new("bam")), None);

        let candidates = AlignmentFormat::Cram.index_candidates(Utf8Path::new("/a/b.cram"));
        assert_eq!(
            candidates,
            vec![
                Utf8PathBuf::from("/a/b.cram.crai"),
                Utf8PathBuf::from("/a/b.crai")
            ]
        );
    }

    #[test]
    fn test_absolute_path() {
        let cwd = Utf8Path::new("/run/here");
        assert_eq!(
            absolute_path(Utf8Path::new("x/y.bam"), cwd),
            Utf8PathBuf::from("/run/here/x/y.bam")
        );
        assert_eq!(
            absolute_path(Utf8Path::new("/x/y.bam"), cwd),
            Utf8PathBuf::from("/x/y.bam")
        );
    }

    #[test]
    fn test_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_test_bam(dir.path(), "tumor.bam", TEST_CONTIGS, Some("TUMOR1"), true);
        let file_ref = validate_sample_file(&bam, "tumor").unwrap();
        assert_eq!(file_ref.sample_name, "TUMOR1");
        assert_eq!(file_ref.format, AlignmentFormat::Bam);
        assert_eq!(file_ref.index_path, Utf8PathBuf::from(format!("{bam}.bai")));
        assert_eq!(file_ref.role, "tumor");
    }

    #[test]
    fn test_sample_name_from_stem() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_test_bam(dir.path(), "NA12878.bam", TEST_CONTIGS, None, true);
        let file_ref = validate_sample_file(&bam, "proband").unwrap();
        assert_eq!(file_ref.sample_name, "NA12878");
    }

    #[test]
    fn test_not_there() {
        let rc = validate_sample_file(Utf8Path::new("/not/there.bam"), "normal");
        assert!(matches!(rc, Err(SampleSetError::FileNotFound { .. })));

        match validate_sample_file(Utf8Path::new("not_there.bam"), "normal") {
            Err(SampleSetError::FileNotFound { path, .. }) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("not_there.bam"));
            }
            _ => panic!("Expected file not found error"),
        }
    }

    #[test]
    fn test_relative_path_made_absolute() {
        let dir = tempfile::tempdir_in(".").unwrap();
        assert!(dir.path().is_relative());
        let bam = write_test_bam(dir.path(), "normal.bam", TEST_CONTIGS, Some("N"), true);
        assert!(bam.is_relative());

        let file_ref = validate_sample_file(&bam, "normal").unwrap();
        assert!(file_ref.path.is_absolute());
        let dir_name = dir.path().file_name().unwrap().to_str().unwrap();
        assert!(file_ref.path.ends_with(Utf8Path::new(dir_name).join("normal.bam")));
        assert!(file_ref.index_path.is_absolute());
    }

    #[test]
    fn test_no_index() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_test_bam(dir.path(), "normal.bam", TEST_CONTIGS, Some("N"), false);
        let rc = validate_sample_file(&bam, "normal");
        match rc {
            Err(SampleSetError::MissingIndex { path, .. }) => assert_eq!(path, bam),
            _ => panic!("Expected missing index error"),
        }
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let sam = write_test_file(dir.path(), "normal.sam");
        let rc = validate_sample_file(&sam, "normal");
        assert!(matches!(rc, Err(SampleSetError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_unreadable_header() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_test_file(dir.path(), "empty.bam");
        write_test_file(dir.path(), "empty.bam.bai");
        let rc = validate_sample_file(&bam, "normal");
        assert!(matches!(rc, Err(SampleSetError::UnreadableHeader { .. })));
    }

    #[test]
    fn test_unmapped() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_test_bam(dir.path(), "unmapped.bam", &[], Some("U"), true);
        let rc = validate_sample_file(&bam, "normal");
        assert!(matches!(rc, Err(SampleSetError::UnreadableHeader { .. })));
    }
}
