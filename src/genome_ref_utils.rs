//! Reference-contig signatures of alignment files and reference genomes
//!
//! A signature summarizes the ordered contig name/length dictionary of a reference, so that
//! alignment files produced against different references can be detected from headers alone.
//!

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{ReaderBuilder, Trim};
use rust_htslib::bam::HeaderView;
use simple_error::{SimpleResult, bail};

pub struct ContigInfo {
    pub label: String,
    pub length: u64,
}

/// Digest of an ordered contig dictionary
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContigSignature(String);

impl ContigSignature {
    pub fn from_contigs(contigs: &[ContigInfo]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for contig in contigs {
            hasher.update(contig.label.as_bytes());
            hasher.update(b"\t");
            hasher.update(contig.length.to_string().as_bytes());
            hasher.update(b"\n");
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn from_digest(digest: &str) -> Self {
        Self(digest.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContigSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get contig list from the `@SQ` records of an alignment file header
pub fn get_bam_header_contigs(header: &HeaderView) -> Vec<ContigInfo> {
    (0..header.target_count())
        .map(|tid| ContigInfo {
            label: String::from_utf8_lossy(header.tid2name(tid)).to_string(),
            length: header.target_len(tid).unwrap_or(0),
        })
        .collect()
}

/// Expected samtools faidx index path for a reference fasta
pub fn get_fasta_index_path(fasta_path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{fasta_path}.fai"))
}

/// Get contig list from a samtools faidx index file
///
/// Only the first two columns of the index (contig name and length) are used.
///
pub fn get_fasta_index_contigs(fai_path: &Utf8Path) -> SimpleResult<Vec<ContigInfo>> {
    let mut rdr = match ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(b'\t')
        .from_path(fai_path)
    {
        Ok(x) => x,
        Err(e) => bail!("Unable to open reference fasta index file '{fai_path}': {e}"),
    };

    let mut contigs = Vec::new();
    for (line_index, result) in rdr.records().enumerate() {
        let line_no = line_index + 1;
        let record = match result {
            Ok(x) => x,
            Err(e) => bail!("Failed to parse line {line_no} of fasta index file '{fai_path}': {e}"),
        };
        let (Some(label), Some(length)) = (record.get(0), record.get(1)) else {
            bail!("Missing contig name or length on line {line_no} of fasta index file '{fai_path}'");
        };
        let Ok(length) = length.parse::<u64>() else {
            bail!("Invalid contig length '{length}' on line {line_no} of fasta index file '{fai_path}'");
        };
        contigs.push(ContigInfo {
            label: label.to_string(),
            length,
        });
    }

    if contigs.is_empty() {
        bail!("No contigs found in fasta index file '{fai_path}'");
    }
    Ok(contigs)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{TEST_CONTIGS, write_test_fasta};

    fn to_contigs(x: &[(&str, u64)]) -> Vec<ContigInfo> {
        x.iter()
            .map(|(label, length)| ContigInfo {
                label: label.to_string(),
                length: *length,
            })
            .collect()
    }

    #[test]
    fn test_signature_depends_on_order_and_length() {
        let a = ContigSignature::from_contigs(&to_contigs(&[("chr1", 100), ("chr2", 50)]));
        let b = ContigSignature::from_contigs(&to_contigs(&[("chr1", 100), ("chr2", 50)]));
        let c = ContigSignature::from_contigs(&to_contigs(&[("chr2", 50), ("chr1", 100)]));
        let d = ContigSignature::from_contigs(&to_contigs(&[("chr1", 100), ("chr2", 51)]));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_get_fasta_index_contigs() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = write_test_fasta(dir.path(), "ref.fa", TEST_CONTIGS);
        let contigs = get_fasta_index_contigs(&get_fasta_index_path(&fasta)).unwrap();
        assert_eq!(contigs.len(), TEST_CONTIGS.len());
        assert_eq!(contigs[0].label, TEST_CONTIGS[0].0);
        assert_eq!(contigs[0].length, TEST_CONTIGS[0].1);
    }

    #[test]
    fn test_bad_fasta_index() {
        let dir = tempfile::tempdir().unwrap();
        let fai = Utf8PathBuf::from_path_buf(dir.path().join("bad.fa.fai")).unwrap();
        std::fs::write(&fai, "chr1\tnot_a_length\t6\t60\t61\n").unwrap();
        assert!(get_fasta_index_contigs(&fai).is_err());

        std::fs::write(&fai, "").unwrap();
        assert!(get_fasta_index_contigs(&fai).is_err());
    }
}
