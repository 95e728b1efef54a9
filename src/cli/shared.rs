use camino::Utf8PathBuf;
use clap::Args;
use simple_error::{SimpleResult, bail};

use super::utils::check_optional_filename;
use crate::config_value::{ConfigValue, RawOptionSet};
use crate::pipeline_variant::keys;

#[derive(Args)]
pub struct SharedSettings {
    /// Genome reference in FASTA format, with a samtools faidx index (required)
    #[arg(long = "referenceFasta", global = true, value_name = "FILE")]
    pub reference_fasta: Option<Utf8PathBuf>,

    /// Directory for the workflow run script and all workflow output. Defaults to a
    /// pipeline-specific directory name under the current working directory.
    #[arg(long = "runDir", global = true, value_name = "DIR")]
    pub run_dir: Option<Utf8PathBuf>,

    /// Config file in TOML format, overriding the template config defaults
    ///
    /// Options are read from the section named for the pipeline ('strelka' or 'inovo'). Other
    /// sections are copied to the run configuration as-is.
    ///
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Samtools binary used by the workflow. Defaults to the copy bundled with the installation.
    #[arg(long = "samtoolsBin", global = true, value_name = "FILE")]
    pub samtools_bin: Option<Utf8PathBuf>,

    /// Size of the genome segments processed by each workflow task, in megabases
    #[arg(long = "scanSizeMb", global = true, value_name = "INT")]
    pub scan_size_mb: Option<u32>,

    /// Limit analysis to a region of the genome, given as 'chrom[:start[-end]]' with 1-indexed
    /// inclusive coordinates. Can be specified multiple times.
    #[arg(long, global = true, value_name = "REGION")]
    pub region: Vec<String>,

    /// Candidate indels in tabix-indexed VCF format, to be added to those found in the alignment
    /// files. Can be specified multiple times.
    #[arg(long = "indelCandidates", global = true, value_name = "FILE")]
    pub indel_candidates: Vec<Utf8PathBuf>,

    #[arg(hide = true, long = "variantScoringModelFile", global = true)]
    pub variant_scoring_model_file: Option<Utf8PathBuf>,

    #[arg(hide = true, long = "indelErrorModelsFile", global = true)]
    pub indel_error_models_file: Option<Utf8PathBuf>,

    /// Turn on extra debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override the installation directory for template configs and model files
    #[arg(hide = true, long = "installConfigDir", global = true)]
    pub install_config_dir: Option<Utf8PathBuf>,

    /// Override the installation directory for workflow execution engine modules
    #[arg(hide = true, long = "installWorkflowDir", global = true)]
    pub install_workflow_dir: Option<Utf8PathBuf>,
}

impl SharedSettings {
    /// Add all shared options given on the command-line to `options`
    ///
    /// Options which are not given are left out, so that they can be filled in from defaults.
    ///
    pub fn add_raw_options(&self, options: &mut RawOptionSet) {
        let mut set_path = |key: &str, value: &Option<Utf8PathBuf>| {
            if let Some(x) = value {
                options.insert(key.to_string(), x.to_string().into());
            }
        };
        set_path(keys::REFERENCE_FASTA, &self.reference_fasta);
        set_path(keys::RUN_DIR, &self.run_dir);
        set_path(keys::SAMTOOLS_BIN, &self.samtools_bin);
        set_path(
            keys::VARIANT_SCORING_MODEL_FILE,
            &self.variant_scoring_model_file,
        );
        set_path(keys::INDEL_ERROR_MODELS_FILE, &self.indel_error_models_file);

        if let Some(x) = self.scan_size_mb {
            options.insert(keys::SCAN_SIZE_MB.to_string(), ConfigValue::Int(x as i64));
        }
        if !self.region.is_empty() {
            options.insert(keys::REGION_LIST.to_string(), self.region.clone().into());
        }
        if !self.indel_candidates.is_empty() {
            options.insert(
                keys::INDEL_CANDIDATES_LIST.to_string(),
                super::path_list_value(&self.indel_candidates),
            );
        }
    }
}

pub fn validate_shared_settings(settings: &SharedSettings) -> SimpleResult<()> {
    if settings.scan_size_mb == Some(0) {
        bail!("--scanSizeMb argument must be greater than 0");
    }
    check_optional_filename(settings.config.as_deref(), "config")?;
    Ok(())
}
