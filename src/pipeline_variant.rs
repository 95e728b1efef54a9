//! Static description of each supported pipeline variant
//!
//! All variation between the somatic and de-novo workflows is expressed as data here, and the
//! shared validator is parameterized on one of these values.
//!

use strum::Display;

/// Option keys shared by all pipeline variants
///
/// These names are part of the persisted configuration schema read by the execution engine.
///
pub mod keys {
    pub const REFERENCE_FASTA: &str = "referenceFasta";
    pub const RUN_DIR: &str = "runDir";
    pub const SAMTOOLS_BIN: &str = "samtoolsBin";
    pub const SCAN_SIZE_MB: &str = "scanSizeMb";
    pub const REGION_LIST: &str = "regionStrList";
    pub const INDEL_CANDIDATES_LIST: &str = "indelCandidatesList";
    pub const IS_WRITE_CALLABLE_REGION: &str = "isWriteCallableRegion";
    pub const VARIANT_SCORING_MODEL_FILE: &str = "variantScoringModelFile";
    pub const INDEL_ERROR_MODELS_FILE: &str = "indelErrorModelsFile";
    pub const INDEL_ERROR_MODEL_NAME: &str = "indelErrorModelName";
    pub const WORKFLOW_VERSION: &str = "workflowVersion";

    pub const BASE_OPTION_KEYS: &[&str] = &[
        REFERENCE_FASTA,
        RUN_DIR,
        SAMTOOLS_BIN,
        SCAN_SIZE_MB,
        REGION_LIST,
        INDEL_CANDIDATES_LIST,
        IS_WRITE_CALLABLE_REGION,
        VARIANT_SCORING_MODEL_FILE,
        INDEL_ERROR_MODELS_FILE,
        INDEL_ERROR_MODEL_NAME,
    ];
}

pub const DEFAULT_SCAN_SIZE_MB: i64 = 12;

#[derive(Clone, Copy, Debug, Display, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum PipelineVariant {
    Somatic,
    Denovo,
}

/// A named sample slot of a pipeline variant, with its cardinality bounds
#[derive(Debug)]
pub struct RoleSpec {
    pub label: &'static str,

    /// Key of the alignment file list in the primary config section
    pub list_key: &'static str,

    /// Command-line option used to supply files for this role
    pub cli_option: &'static str,

    pub min_count: usize,

    /// No upper bound if None
    pub max_count: Option<usize>,
}

impl RoleSpec {
    pub fn allow_empty(&self) -> bool {
        self.min_count == 0
    }

    pub fn accepts_count(&self, count: usize) -> bool {
        count >= self.min_count && self.max_count.is_none_or(|max| count <= max)
    }
}

#[derive(Debug)]
pub enum FieldKind {
    Flag,

    /// Non-negative integer
    Count,

    /// List of bgzipped files, each requiring a tabix index
    TabixFileList,
}

#[derive(Debug)]
pub enum FieldDefault {
    None,
    Flag(bool),
    Count(i64),
}

/// A variant-specific option beyond the shared base options
#[derive(Debug)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,

    /// Used to describe the field in error messages
    pub label: &'static str,
}

#[derive(Debug)]
pub struct PipelineVariantSpec {
    pub variant: PipelineVariant,

    /// Workflow description used in the command-line help and log
    pub description: &'static str,

    /// Section of the persisted configuration holding this variant's options
    pub primary_section_name: &'static str,

    /// Sample roles, in the order their files are checked
    pub roles: &'static [RoleSpec],

    pub extra_fields: &'static [FieldSpec],

    pub default_run_dir: &'static str,

    /// Default model files, relative to the installation config directory
    pub default_variant_scoring_model_file: Option<&'static str>,
    pub default_indel_error_models_file: Option<&'static str>,
    pub default_indel_error_model_name: Option<&'static str>,

    /// Template config filename, relative to the installation config directory
    pub template_config_filename: &'static str,

    /// Execution engine module filename, relative to the installation workflow directory
    pub engine_module_filename: &'static str,
    pub engine_class_name: &'static str,
}

impl PipelineVariantSpec {
    pub fn get(variant: PipelineVariant) -> &'static Self {
        match variant {
            PipelineVariant::Somatic => &SOMATIC_VARIANT,
            PipelineVariant::Denovo => &DENOVO_VARIANT,
        }
    }

    pub fn extra_field(&self, key: &str) -> Option<&FieldSpec> {
        self.extra_fields.iter().find(|x| x.key == key)
    }

    /// True if key is an option this variant defines, as opposed to an engine parameter
    /// supplied only by config files
    pub fn is_known_key(&self, key: &str) -> bool {
        keys::BASE_OPTION_KEYS.contains(&key)
            || self.roles.iter().any(|x| x.list_key == key)
            || self.extra_field(key).is_some()
    }
}

pub const NOISE_VCF_LIST: &str = "noiseVcfList";
pub const IS_INDEL_EMPIRICAL_SCORING: &str = "isStrelkaIndelEmpiricalScoring";

pub static SOMATIC_VARIANT: PipelineVariantSpec = PipelineVariantSpec {
    variant: PipelineVariant::Somatic,
    description: "Configures the Strelka somatic small variant calling pipeline. \
        You must specify an alignment file (BAM or CRAM) for each of a pair of samples.",
    primary_section_name: "strelka",
    roles: &[
        RoleSpec {
            label: "normal",
            list_key: "normalBamList",
            cli_option: "normalBam",
            min_count: 1,
            max_count: Some(1),
        },
        RoleSpec {
            label: "tumor",
            list_key: "tumorBamList",
            cli_option: "tumorBam",
            min_count: 1,
            max_count: Some(1),
        },
    ],
    extra_fields: &[
        FieldSpec {
            key: NOISE_VCF_LIST,
            kind: FieldKind::TabixFileList,
            default: FieldDefault::None,
            label: "noise vcf",
        },
        FieldSpec {
            key: IS_INDEL_EMPIRICAL_SCORING,
            kind: FieldKind::Flag,
            default: FieldDefault::Flag(false),
            label: "indel empirical scoring",
        },
        FieldSpec {
            key: "minTier2Mapq",
            kind: FieldKind::Count,
            default: FieldDefault::Count(0),
            label: "tier2 minimum mapping quality",
        },
    ],
    default_run_dir: "StrelkaWorkflow",
    default_variant_scoring_model_file: Some("somaticVariantScoringModels.json"),
    default_indel_error_models_file: Some("indelErrorModels.json"),
    default_indel_error_model_name: Some("Binom"),
    template_config_filename: "configureStrelkaWorkflow.toml",
    engine_module_filename: "strelkaWorkflow.py",
    engine_class_name: "StrelkaWorkflow",
};

pub static DENOVO_VARIANT: PipelineVariantSpec = PipelineVariantSpec {
    variant: PipelineVariant::Denovo,
    description: "Configures the Inovo de-novo small variant calling pipeline. \
        You must specify alignment files (BAM or CRAM) for the proband and additional related samples.",
    primary_section_name: "inovo",
    roles: &[
        RoleSpec {
            label: "proband",
            list_key: "probandBamList",
            cli_option: "probandAlignmnet",
            min_count: 1,
            max_count: Some(1),
        },
        RoleSpec {
            label: "parent",
            list_key: "parentBamList",
            cli_option: "parentAlignment",
            min_count: 2,
            max_count: Some(2),
        },
        RoleSpec {
            label: "sibling",
            list_key: "siblingBamList",
            cli_option: "siblingAlignment",
            min_count: 0,
            max_count: None,
        },
    ],
    extra_fields: &[],
    default_run_dir: "InovoWorkflow",
    default_variant_scoring_model_file: None,
    default_indel_error_models_file: None,
    default_indel_error_model_name: None,
    template_config_filename: "configureDenovoWorkflow.toml",
    engine_module_filename: "inovoWorkflow.py",
    engine_class_name: "InovoWorkflow",
};
