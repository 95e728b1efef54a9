//! The validated run configuration and its persisted form
//!
//! The persisted configuration is a set of flat named sections. The primary section holds every
//! option read by the execution engine, and is sufficient with the sample file info section to
//! reconstruct the validated configuration without the original command line.
//!

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use simple_error::{SimpleResult, bail};

use crate::config_value::{ConfigSection, ConfigSections, ConfigValue, RawOptionSet, take};
use crate::errors::ConfigureError;
use crate::genome_ref_utils::ContigSignature;
use crate::globals::PROGRAM_VERSION;
use crate::os_utils::write_file_atomic;
use crate::pipeline_variant::{PipelineVariantSpec, keys};
use crate::sample_file::{AlignmentFormat, SampleFileRef};

/// Section holding metadata derived from the sample alignment files
pub const SAMPLE_FILE_INFO_SECTION: &str = "sampleFileInfo";

const REFERENCE_CONTIG_SIGNATURE_KEY: &str = "referenceContigSignature";

fn index_list_key(role: &str) -> String {
    format!("{role}IndexList")
}

fn sample_name_list_key(role: &str) -> String {
    format!("{role}SampleNameList")
}

/// Options shared by all pipeline variants
#[derive(Clone, Debug, PartialEq)]
pub struct BaseOptions {
    pub reference_fasta: Utf8PathBuf,
    pub run_dir: Utf8PathBuf,
    pub samtools_bin: Utf8PathBuf,
    pub scan_size_mb: u32,
    pub region_list: Vec<String>,
    pub indel_candidates_list: Vec<Utf8PathBuf>,
    pub is_write_callable_region: bool,
    pub variant_scoring_model_file: Option<Utf8PathBuf>,
    pub indel_error_models_file: Option<Utf8PathBuf>,
    pub indel_error_model_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SampleRoleFiles {
    pub role: String,

    /// Key of the alignment file list in the primary section
    pub list_key: String,

    pub files: Vec<SampleFileRef>,
}

/// A fully merged and checked run configuration
///
/// This is only constructed by the options validator, or by reloading a persisted configuration.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedConfig {
    pub primary_section_name: String,
    pub base: BaseOptions,
    pub sample_sets: Vec<SampleRoleFiles>,
    pub reference_signature: ContigSignature,

    /// Variant-specific options and execution engine parameters
    pub variant_options: BTreeMap<String, ConfigValue>,

    /// Config file sections passed through to the execution engine
    pub aux_sections: ConfigSections,
}

fn path_list(paths: &[Utf8PathBuf]) -> ConfigValue {
    ConfigValue::List(paths.iter().map(|x| x.to_string()).collect())
}

/// Convert the validated configuration into its persisted section form
///
pub fn serialize(config: &ValidatedConfig) -> ConfigSections {
    let base = &config.base;

    let mut primary = ConfigSection::new();
    let mut set = |key: &str, value: ConfigValue| {
        primary.insert(key.to_string(), value);
    };
    set(keys::REFERENCE_FASTA, base.reference_fasta.to_string().into());
    set(keys::RUN_DIR, base.run_dir.to_string().into());
    set(keys::SAMTOOLS_BIN, base.samtools_bin.to_string().into());
    set(keys::SCAN_SIZE_MB, ConfigValue::Int(base.scan_size_mb as i64));
    set(keys::REGION_LIST, base.region_list.clone().into());
    set(
        keys::INDEL_CANDIDATES_LIST,
        path_list(&base.indel_candidates_list),
    );
    set(
        keys::IS_WRITE_CALLABLE_REGION,
        base.is_write_callable_region.into(),
    );
    if let Some(x) = &base.variant_scoring_model_file {
        set(keys::VARIANT_SCORING_MODEL_FILE, x.to_string().into());
    }
    if let Some(x) = &base.indel_error_models_file {
        set(keys::INDEL_ERROR_MODELS_FILE, x.to_string().into());
    }
    if let Some(x) = &base.indel_error_model_name {
        set(keys::INDEL_ERROR_MODEL_NAME, x.clone().into());
    }

    let mut sample_info = ConfigSection::new();
    sample_info.insert(
        REFERENCE_CONTIG_SIGNATURE_KEY.to_string(),
        config.reference_signature.to_string().into(),
    );

    for sample_set in config.sample_sets.iter() {
        let paths = sample_set
            .files
            .iter()
            .map(|x| x.path.clone())
            .collect::<Vec<_>>();
        set(&sample_set.list_key, path_list(&paths));

        let index_paths = sample_set
            .files
            .iter()
            .map(|x| x.index_path.clone())
            .collect::<Vec<_>>();
        sample_info.insert(index_list_key(&sample_set.role), path_list(&index_paths));
        sample_info.insert(
            sample_name_list_key(&sample_set.role),
            ConfigValue::List(
                sample_set
                    .files
                    .iter()
                    .map(|x| x.sample_name.clone())
                    .collect(),
            ),
        );
    }

    for (key, value) in config.variant_options.iter() {
        set(key, value.clone());
    }
    set(keys::WORKFLOW_VERSION, PROGRAM_VERSION.into());

    let mut sections = config.aux_sections.clone();
    sections.insert(config.primary_section_name.clone(), primary);
    sections.insert(SAMPLE_FILE_INFO_SECTION.to_string(), sample_info);
    sections
}

fn take_required_text(options: &mut RawOptionSet, key: &str) -> SimpleResult<String> {
    match take::text(options, key)? {
        Some(x) => Ok(x),
        None => bail!("Missing required key '{key}'"),
    }
}

fn take_path_list(options: &mut RawOptionSet, key: &str) -> SimpleResult<Vec<Utf8PathBuf>> {
    Ok(take::list(options, key)?
        .unwrap_or_default()
        .into_iter()
        .map(Utf8PathBuf::from)
        .collect())
}

impl ValidatedConfig {
    /// Reconstruct a configuration from its persisted section form
    ///
    pub fn from_sections(
        sections: &ConfigSections,
        variant: &PipelineVariantSpec,
    ) -> SimpleResult<Self> {
        let primary_section_name = variant.primary_section_name;
        let Some(primary) = sections.get(primary_section_name) else {
            bail!("Missing primary section '{primary_section_name}'");
        };
        let Some(sample_info) = sections.get(SAMPLE_FILE_INFO_SECTION) else {
            bail!("Missing section '{SAMPLE_FILE_INFO_SECTION}'");
        };

        let mut primary = primary.clone();
        primary.remove(keys::WORKFLOW_VERSION);

        let scan_size_mb = match take::int(&mut primary, keys::SCAN_SIZE_MB)? {
            Some(x) => match u32::try_from(x) {
                Ok(x) => x,
                Err(_) => bail!("Invalid scan size: {x}"),
            },
            None => bail!("Missing required key '{}'", keys::SCAN_SIZE_MB),
        };

        let base = BaseOptions {
            reference_fasta: take_required_text(&mut primary, keys::REFERENCE_FASTA)?.into(),
            run_dir: take_required_text(&mut primary, keys::RUN_DIR)?.into(),
            samtools_bin: take_required_text(&mut primary, keys::SAMTOOLS_BIN)?.into(),
            scan_size_mb,
            region_list: take::list(&mut primary, keys::REGION_LIST)?.unwrap_or_default(),
            indel_candidates_list: take_path_list(&mut primary, keys::INDEL_CANDIDATES_LIST)?,
            is_write_callable_region: take::flag(&mut primary, keys::IS_WRITE_CALLABLE_REGION)?
                .unwrap_or(false),
            variant_scoring_model_file: take::text(&mut primary, keys::VARIANT_SCORING_MODEL_FILE)?
                .map(Utf8PathBuf::from),
            indel_error_models_file: take::text(&mut primary, keys::INDEL_ERROR_MODELS_FILE)?
                .map(Utf8PathBuf::from),
            indel_error_model_name: take::text(&mut primary, keys::INDEL_ERROR_MODEL_NAME)?,
        };

        let mut sample_info = sample_info.clone();
        let reference_signature = ContigSignature::from_digest(&take_required_text(
            &mut sample_info,
            REFERENCE_CONTIG_SIGNATURE_KEY,
        )?);

        let mut sample_sets = Vec::new();
        for role_spec in variant.roles {
            let role = role_spec.label;
            let paths = take_path_list(&mut primary, role_spec.list_key)?;
            let index_paths = take_path_list(&mut sample_info, &index_list_key(role))?;
            let sample_names =
                take::list(&mut sample_info, &sample_name_list_key(role))?.unwrap_or_default();
            if index_paths.len() != paths.len() || sample_names.len() != paths.len() {
                bail!("Inconsistent sample file info for {role} alignment files");
            }

            let mut files = Vec::new();
            for ((path, index_path), sample_name) in
                paths.into_iter().zip(index_paths).zip(sample_names)
            {
                let Some(format) = AlignmentFormat::from_path(&path) else {
                    bail!("Unsupported {role} alignment file format: '{path}'");
                };
                files.push(SampleFileRef {
                    path,
                    role: role.to_string(),
                    format,
                    index_path,
                    sample_name,
                    contig_signature: reference_signature.clone(),
                });
            }
            sample_sets.push(SampleRoleFiles {
                role: role.to_string(),
                list_key: role_spec.list_key.to_string(),
                files,
            });
        }

        let aux_sections = sections
            .iter()
            .filter(|(name, _)| {
                name.as_str() != primary_section_name && name.as_str() != SAMPLE_FILE_INFO_SECTION
            })
            .map(|(name, section)| (name.clone(), section.clone()))
            .collect();

        Ok(Self {
            primary_section_name: primary_section_name.to_string(),
            base,
            sample_sets,
            reference_signature,
            variant_options: primary,
            aux_sections,
        })
    }
}

/// Write config sections to a json file, atomically replacing any existing file
///
pub fn persist_config_sections(
    sections: &ConfigSections,
    target: &Utf8Path,
) -> Result<(), ConfigureError> {
    info!("Writing run configuration to file: '{target}'");

    write_file_atomic(target, None, |writer| {
        serde_json::to_writer_pretty(&mut *writer, sections)?;
        writeln!(writer)
    })
    .map_err(|source| ConfigureError::ConfigWrite {
        path: target.to_path_buf(),
        source,
    })
}

pub fn read_config_sections(path: &Utf8Path) -> Result<ConfigSections, ConfigureError> {
    let file = File::open(path).map_err(|e| ConfigureError::ConfigRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ConfigureError::ConfigRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::genome_ref_utils::ContigInfo;
    use crate::pipeline_variant::{DENOVO_VARIANT, NOISE_VCF_LIST, SOMATIC_VARIANT};

    fn get_signature() -> ContigSignature {
        ContigSignature::from_contigs(&[ContigInfo {
            label: "chr1".to_string(),
            length: 1000,
        }])
    }

    fn get_file_ref(path: &str, role: &str, sample_name: &str) -> SampleFileRef {
        SampleFileRef {
            path: path.into(),
            role: role.to_string(),
            format: AlignmentFormat::from_path(Utf8Path::new(path)).unwrap(),
            index_path: format!("{path}.bai").into(),
            sample_name: sample_name.to_string(),
            contig_signature: get_signature(),
        }
    }

    fn get_somatic_config() -> ValidatedConfig {
        let mut variant_options = BTreeMap::new();
        variant_options.insert(
            NOISE_VCF_LIST.to_string(),
            ConfigValue::List(vec!["/data/noise.vcf.gz".to_string()]),
        );
        variant_options.insert("minTier2Mapq".to_string(), ConfigValue::Int(0));
        variant_options.insert("minMapq".to_string(), ConfigValue::Int(20));
        variant_options.insert("ssnvNoise".to_string(), ConfigValue::Float(1e-9));
        variant_options.insert(
            "ssnvPrior".to_string(),
            ConfigValue::Float(0.9222222222222223),
        );

        let mut aux_sections = ConfigSections::new();
        let mut pyflow = ConfigSection::new();
        pyflow.insert("mode".to_string(), "local".into());
        aux_sections.insert("pyflow".to_string(), pyflow);

        ValidatedConfig {
            primary_section_name: "strelka".to_string(),
            base: BaseOptions {
                reference_fasta: "/data/ref.fa".into(),
                run_dir: "/runs/x".into(),
                samtools_bin: "/opt/libexec/samtools".into(),
                scan_size_mb: 12,
                region_list: vec!["chr1:100-200".to_string()],
                indel_candidates_list: Vec::new(),
                is_write_callable_region: true,
                variant_scoring_model_file: Some("/opt/share/config/model.json".into()),
                indel_error_models_file: None,
                indel_error_model_name: Some("Binom".to_string()),
            },
            sample_sets: vec![
                SampleRoleFiles {
                    role: "normal".to_string(),
                    list_key: "normalBamList".to_string(),
                    files: vec![get_file_ref("/data/normal.bam", "normal", "N1")],
                },
                SampleRoleFiles {
                    role: "tumor".to_string(),
                    list_key: "tumorBamList".to_string(),
                    files: vec![get_file_ref("/data/tumor.cram", "tumor", "T1")],
                },
            ],
            reference_signature: get_signature(),
            variant_options,
            aux_sections,
        }
    }

    #[test]
    fn test_serialize_layout() {
        let config = get_somatic_config();
        let sections = serialize(&config);

        assert_eq!(
            sections.keys().collect::<Vec<_>>(),
            vec!["pyflow", "sampleFileInfo", "strelka"]
        );
        let primary = &sections["strelka"];
        assert_eq!(
            primary["tumorBamList"],
            ConfigValue::List(vec!["/data/tumor.cram".to_string()])
        );
        assert_eq!(primary["minMapq"], ConfigValue::Int(20));
        assert_eq!(primary[keys::WORKFLOW_VERSION], ConfigValue::from(PROGRAM_VERSION));
        assert!(!primary.contains_key(keys::INDEL_ERROR_MODELS_FILE));

        let sample_info = &sections[SAMPLE_FILE_INFO_SECTION];
        assert_eq!(
            sample_info["normalSampleNameList"],
            ConfigValue::List(vec!["N1".to_string()])
        );
    }

    #[test]
    fn test_round_trip_through_file() {
        let config = get_somatic_config();
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("config.json")).unwrap();

        persist_config_sections(&serialize(&config), &path).unwrap();
        let sections = read_config_sections(&path).unwrap();
        let config2 = ValidatedConfig::from_sections(&sections, &SOMATIC_VARIANT).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_workflow_version_not_overridden() {
        let mut config = get_somatic_config();
        config
            .variant_options
            .insert(keys::WORKFLOW_VERSION.to_string(), "0.0.1".into());
        let sections = serialize(&config);
        assert_eq!(
            sections["strelka"][keys::WORKFLOW_VERSION],
            ConfigValue::from(PROGRAM_VERSION)
        );
    }

    #[test]
    fn test_from_sections_errors() {
        let config = get_somatic_config();
        let sections = serialize(&config);

        // Wrong variant for these sections:
        assert!(ValidatedConfig::from_sections(&sections, &DENOVO_VARIANT).is_err());

        let mut bad_sections = sections.clone();
        bad_sections
            .get_mut(SAMPLE_FILE_INFO_SECTION)
            .unwrap()
            .remove("tumorIndexList");
        assert!(ValidatedConfig::from_sections(&bad_sections, &SOMATIC_VARIANT).is_err());

        let mut bad_sections = sections;
        bad_sections.remove(SAMPLE_FILE_INFO_SECTION);
        assert!(ValidatedConfig::from_sections(&bad_sections, &SOMATIC_VARIANT).is_err());
    }

    #[test]
    fn test_concurrent_persist_never_exposes_partial_file() {
        let mut config = get_somatic_config();
        // Make the file large enough that a non-atomic write would be observable:
        config.base.region_list = (0..20000).map(|i| format!("chr1:{i}-{}", i + 1)).collect();
        let sections = serialize(&config);

        let dir = tempfile::tempdir().unwrap();
        let target = Utf8PathBuf::from_path_buf(dir.path().join("config.json")).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        persist_config_sections(&sections, &target).unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..200 {
                    if target.exists() {
                        let reloaded = read_config_sections(&target).unwrap();
                        assert_eq!(reloaded, sections);
                    }
                }
            });
        });

        assert_eq!(read_config_sections(&target).unwrap(), sections);
    }
}
