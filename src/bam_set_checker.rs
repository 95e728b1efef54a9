//! Consistency checks over the full set of sample alignment files in a run
//!

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};

use crate::errors::SampleSetError;
use crate::genome_ref_utils::{ContigSignature, get_fasta_index_contigs, get_fasta_index_path};
use crate::sample_file::{SampleFileRef, validate_sample_file};

/// Alignment files appended for one sample role
struct RoleFiles {
    role: String,
    paths: Vec<Utf8PathBuf>,
    allow_empty: bool,
}

/// All validated sample files of a run, grouped by role in append order
#[derive(Debug)]
pub struct CheckedSampleSet {
    pub role_files: Vec<(String, Vec<SampleFileRef>)>,

    /// Shared by the reference and every sample file
    pub reference_signature: ContigSignature,
}

/// Accumulates alignment files by sample role, then checks them as a set
///
/// Files are checked role by role in the order the roles were appended, and the first failure
/// is reported.
///
#[derive(Default)]
pub struct BamSetChecker {
    roles: Vec<RoleFiles>,
}

impl BamSetChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add alignment files for a sample role
    ///
    /// Files appended under an existing role extend that role's list.
    ///
    pub fn append_files(&mut self, paths: &[Utf8PathBuf], role: &str, allow_empty: bool) {
        if let Some(x) = self.roles.iter_mut().find(|x| x.role == role) {
            x.paths.extend(paths.iter().cloned());
            x.allow_empty &= allow_empty;
        } else {
            self.roles.push(RoleFiles {
                role: role.to_string(),
                paths: paths.to_vec(),
                allow_empty,
            });
        }
    }

    /// Check all appended files for existence, indexing and a consistent reference genome
    ///
    /// * `external_tool_path` - alignment toolkit binary which the execution engine will run
    /// * `reference_fasta` - reference genome which all alignment files must match
    ///
    pub fn check(
        &self,
        external_tool_path: &Utf8Path,
        reference_fasta: &Utf8Path,
    ) -> Result<CheckedSampleSet, SampleSetError> {
        if let Some(x) = self.roles.iter().find(|x| !x.allow_empty && x.paths.is_empty()) {
            return Err(SampleSetError::EmptyRole {
                role: x.role.clone(),
            });
        }

        if !external_tool_path.is_file() {
            return Err(SampleSetError::FileNotFound {
                label: "external tool".to_string(),
                path: external_tool_path.to_path_buf(),
            });
        }

        let reference_signature = get_reference_signature(reference_fasta)?;

        // Track the first validated file to name it in mismatch errors:
        let mut first_file: Option<(String, Utf8PathBuf)> = None;
        let mut path_roles: HashMap<Utf8PathBuf, String> = HashMap::new();

        let mut role_files = Vec::new();
        for role_entry in self.roles.iter() {
            let role = role_entry.role.as_str();
            let mut file_refs = Vec::new();
            for path in role_entry.paths.iter() {
                let file_ref = validate_sample_file(path, role)?;

                if file_ref.contig_signature != reference_signature {
                    let (other_role, other_path) = match &first_file {
                        Some((r, p)) => (r.clone(), p.clone()),
                        None => ("reference".to_string(), reference_fasta.to_path_buf()),
                    };
                    return Err(SampleSetError::ReferenceMismatch {
                        role: role.to_string(),
                        path: path.clone(),
                        other_role,
                        other_path,
                    });
                }

                if let Some(previous_role) = path_roles.get(path) {
                    warn!(
                        "Alignment file '{path}' is specified for both the {previous_role} and {role} sample roles"
                    );
                } else {
                    path_roles.insert(path.clone(), role.to_string());
                }

                info!(
                    "Found {role} sample '{}' in alignment file '{path}'",
                    file_ref.sample_name
                );

                if first_file.is_none() {
                    first_file = Some((role.to_string(), path.clone()));
                }
                file_refs.push(file_ref);
            }
            role_files.push((role.to_string(), file_refs));
        }

        Ok(CheckedSampleSet {
            role_files,
            reference_signature,
        })
    }
}

/// Get the contig signature of a reference fasta from its faidx index
fn get_reference_signature(reference_fasta: &Utf8Path) -> Result<ContigSignature, SampleSetError> {
    if !reference_fasta.is_file() {
        return Err(SampleSetError::FileNotFound {
            label: "reference genome fasta".to_string(),
            path: reference_fasta.to_path_buf(),
        });
    }
    let fai_path = get_fasta_index_path(reference_fasta);
    if !fai_path.is_file() {
        return Err(SampleSetError::MissingIndex {
            label: "reference genome fasta".to_string(),
            path: reference_fasta.to_path_buf(),
            expected: format!("'{fai_path}'"),
        });
    }
    let contigs =
        get_fasta_index_contigs(&fai_path).map_err(|e| SampleSetError::UnreadableHeader {
            role: "reference".to_string(),
            path: fai_path.clone(),
            reason: e.to_string(),
        })?;
    Ok(ContigSignature::from_contigs(&contigs))
}
