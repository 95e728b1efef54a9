//! Checks for optional auxiliary file lists, such as noise or indel candidate VCFs
//!

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;

use crate::errors::SampleSetError;

fn tabix_index_candidates(path: &Utf8Path) -> Vec<Utf8PathBuf> {
    ["tbi", "csi"]
        .iter()
        .map(|ext| Utf8PathBuf::from(format!("{path}.{ext}")))
        .collect()
}

/// Check that every file in the list exists and has a tabix index
///
/// An empty list is always valid. The first offending path is reported.
///
/// * `label` - describes the file list in error messages
///
pub fn check_tabix_indexed(paths: &[Utf8PathBuf], label: &str) -> Result<(), SampleSetError> {
    for path in paths {
        if !path.is_file() {
            return Err(SampleSetError::FileNotFound {
                label: label.to_string(),
                path: path.clone(),
            });
        }
        let candidates = tabix_index_candidates(path);
        if !candidates.iter().any(|x| x.is_file()) {
            return Err(SampleSetError::MissingIndex {
                label: label.to_string(),
                path: path.clone(),
                expected: candidates.iter().map(|x| format!("'{x}'")).join(", "),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{write_test_file, write_test_tabix_file};

    #[test]
    fn test_empty_list() {
        assert!(check_tabix_indexed(&[], "noise vcf").is_ok());
    }

    #[test]
    fn test_indexed_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_test_tabix_file(dir.path(), "a.vcf.gz", true);
        let b = write_test_file(dir.path(), "b.vcf.gz");
        write_test_file(dir.path(), "b.vcf.gz.csi");
        assert!(check_tabix_indexed(&[a, b], "noise vcf").is_ok());
    }

    #[test]
    fn test_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_test_tabix_file(dir.path(), "a.vcf.gz", true);
        let b = write_test_tabix_file(dir.path(), "b.vcf.gz", false);
        let c = write_test_tabix_file(dir.path(), "c.vcf.gz", false);
        match check_tabix_indexed(&[a, b.clone(), c], "noise vcf") {
            Err(SampleSetError::MissingIndex { label, path, .. }) => {
                assert_eq!(label, "noise vcf");
                assert_eq!(path, b);
            }
            _ => panic!("Expected missing index error"),
        }
    }

    #[test]
    fn test_missing_file() {
        let rc = check_tabix_indexed(&[Utf8PathBuf::from("/not/there.vcf.gz")], "noise vcf");
        assert!(matches!(rc, Err(SampleSetError::FileNotFound { .. })));
    }
}
