//! Fixture files shared by unit tests
//!

use std::path::Path;

use camino::Utf8PathBuf;
use rust_htslib::bam::{self, Header, header::HeaderRecord};

pub const TEST_CONTIGS: &[(&str, u64)] = &[("chr1", 5000), ("chr2", 3000), ("chrM", 16569)];

/// Same contig names as TEST_CONTIGS with a different length for chr2
pub const OTHER_CONTIGS: &[(&str, u64)] = &[("chr1", 5000), ("chr2", 3100), ("chrM", 16569)];

fn to_utf8_path(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
}

/// Write a reference fasta and its faidx index
///
/// The fasta sequence content is a placeholder, only the index is read by the configuration checks.
///
pub fn write_test_fasta(dir: &Path, name: &str, contigs: &[(&str, u64)]) -> Utf8PathBuf {
    let fasta_path = to_utf8_path(&dir.join(name));
    let mut fasta = String::new();
    let mut fai = String::new();
    for (label, length) in contigs {
        fasta.push_str(&format!(">{label}\nACGTN\n"));
        fai.push_str(&format!("{label}\t{length}\t0\t60\t61\n"));
    }
    std::fs::write(&fasta_path, fasta).unwrap();
    std::fs::write(format!("{fasta_path}.fai"), fai).unwrap();
    fasta_path
}

/// Write a header-only BAM file
///
/// * `sample_name` - written as the SM tag of a single read group, if given
/// * `index` - if true an empty placeholder `.bai` file is written next to the BAM
///
pub fn write_test_bam(
    dir: &Path,
    name: &str,
    contigs: &[(&str, u64)],
    sample_name: Option<&str>,
    index: bool,
) -> Utf8PathBuf {
    let bam_path = to_utf8_path(&dir.join(name));

    let mut header = Header::new();
    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", "1.6").push_tag(b"SO", "coordinate");
    header.push_record(&hd);
    for (label, length) in contigs {
        let mut sq = HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", *label).push_tag(b"LN", *length);
        header.push_record(&sq);
    }
    if let Some(sample_name) = sample_name {
        let mut rg = HeaderRecord::new(b"RG");
        rg.push_tag(b"ID", "rg1").push_tag(b"SM", sample_name);
        header.push_record(&rg);
    }

    {
        let _writer = bam::Writer::from_path(&bam_path, &header, bam::Format::Bam).unwrap();
    }

    if index {
        std::fs::write(format!("{bam_path}.bai"), b"").unwrap();
    }
    bam_path
}

/// Write a placeholder bgzipped VCF, optionally with a placeholder tabix index
pub fn write_test_tabix_file(dir: &Path, name: &str, index: bool) -> Utf8PathBuf {
    let path = to_utf8_path(&dir.join(name));
    std::fs::write(&path, b"").unwrap();
    if index {
        std::fs::write(format!("{path}.tbi"), b"").unwrap();
    }
    path
}

/// Write an empty placeholder file
pub fn write_test_file(dir: &Path, name: &str) -> Utf8PathBuf {
    let path = to_utf8_path(&dir.join(name));
    std::fs::write(&path, b"").unwrap();
    path
}
