//! Validation of workflow options into a complete run configuration
//!
//! Validation proceeds through a fixed series of states, each represented by its own type:
//!
//! ```text
//! RawInput -> SanitizedOptions -> StructurallyCheckedOptions -> ValidatedConfig
//! ```
//!
//! Any transition may fail with a single error, and no partial configuration is ever returned.
//!

use std::collections::BTreeMap;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use regex::Regex;
use simple_error::{SimpleResult, bail};

use crate::aux_file_list::check_tabix_indexed;
use crate::bam_set_checker::{BamSetChecker, CheckedSampleSet};
use crate::cli::check_required_filename;
use crate::config_value::{ConfigSections, ConfigValue, RawOptionSet, take};
use crate::errors::{ConfigureError, SampleSetError};
use crate::option_defaults::OptionDefaults;
use crate::os_utils::ensure_dir;
use crate::pipeline_variant::{FieldKind, PipelineVariantSpec, RoleSpec, keys};
use crate::run_config::{BaseOptions, SampleRoleFiles, ValidatedConfig};
use crate::sample_file::absolute_path;

/// Validates options for one pipeline variant against a fixed set of defaults
///
pub struct WorkflowOptionsValidator {
    variant: &'static PipelineVariantSpec,
    defaults: OptionDefaults,

    /// All relative paths are resolved against this directory
    working_dir: Utf8PathBuf,
}

impl WorkflowOptionsValidator {
    pub fn new(
        variant: &'static PipelineVariantSpec,
        defaults: OptionDefaults,
        working_dir: Utf8PathBuf,
    ) -> Self {
        Self {
            variant,
            defaults,
            working_dir,
        }
    }

    /// Run the full validation sequence
    ///
    /// * `cli_options` - options given explicitly on the command line, these take precedence over
    ///   all defaults
    ///
    pub fn validate(&self, cli_options: RawOptionSet) -> Result<ValidatedConfig, ConfigureError> {
        RawInput {
            validator: self,
            cli_options,
        }
        .sanitize()?
        .check_structure()?
        .finalize()
    }
}

pub struct RawInput<'a> {
    validator: &'a WorkflowOptionsValidator,
    cli_options: RawOptionSet,
}

/// Options with every field typed and cleaned up, but no cross-field or file checks yet
pub struct SanitizedOptions {
    variant: &'static PipelineVariantSpec,
    base: BaseOptions,
    role_paths: Vec<(&'static RoleSpec, Vec<Utf8PathBuf>)>,

    /// Auxiliary file lists requiring a tabix index, with a label for each
    tabix_file_lists: Vec<(&'static str, Vec<Utf8PathBuf>)>,

    variant_options: BTreeMap<String, ConfigValue>,
    aux_sections: ConfigSections,
}

/// Options which have passed all sample set and auxiliary file checks
pub struct StructurallyCheckedOptions {
    sanitized: SanitizedOptions,
    sample_set: CheckedSampleSet,
}

/// Trim entries, drop empty entries and make all paths absolute
fn groom_path_list(values: Vec<String>, working_dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    values
        .iter()
        .map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .map(|x| absolute_path(Utf8Path::new(x), working_dir))
        .collect()
}

fn groom_optional_path(value: Option<String>, working_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| absolute_path(Utf8Path::new(x), working_dir))
}

static REGION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^\s:]+)(?::(\d+)(?:-(\d+))?)?$").unwrap());

/// Check region format 'chrom[:start[-end]]' with 1-indexed, inclusive coordinates
fn check_region(region: &str) -> SimpleResult<()> {
    let Some(caps) = REGION_REGEX.captures(region) else {
        bail!("Invalid region format '{region}', expected 'chrom[:start[-end]]'");
    };
    let parse_pos = |i: usize| caps.get(i).map(|x| x.as_str().parse::<u64>());
    match (parse_pos(2), parse_pos(3)) {
        (Some(Err(_)), _) | (_, Some(Err(_))) => {
            bail!("Invalid region coordinates in '{region}'")
        }
        (Some(Ok(0)), _) => bail!("Region start must be 1 or greater in '{region}'"),
        (Some(Ok(start)), Some(Ok(end))) if end < start => {
            bail!("Region end precedes start in '{region}'")
        }
        _ => Ok(()),
    }
}

impl RawInput<'_> {
    /// Merge command-line values over defaults, then type and clean up each field
    ///
    pub fn sanitize(self) -> Result<SanitizedOptions, ConfigureError> {
        let validator = self.validator;
        let variant = validator.variant;
        let wd = validator.working_dir.as_path();

        let mut options = validator.defaults.options.clone();
        options.extend(self.cli_options);

        if let Some(key) = options.keys().find(|key| {
            !(variant.is_known_key(key) || validator.defaults.engine_param_keys.contains(*key))
        }) {
            return Err(ConfigureError::OptionParse(format!(
                "Unknown option '{key}' for the {} workflow",
                variant.variant
            )));
        }

        let Some(reference_fasta) = groom_optional_path(
            take::text(&mut options, keys::REFERENCE_FASTA)?,
            wd,
        ) else {
            return Err(ConfigureError::OptionParse(
                "Must specify reference genome fasta file (--referenceFasta)".to_string(),
            ));
        };

        let Some(run_dir) = groom_optional_path(take::text(&mut options, keys::RUN_DIR)?, wd)
        else {
            return Err(ConfigureError::OptionParse(
                "Must specify run directory (--runDir)".to_string(),
            ));
        };

        let Some(samtools_bin) =
            groom_optional_path(take::text(&mut options, keys::SAMTOOLS_BIN)?, wd)
        else {
            return Err(ConfigureError::OptionParse(
                "Must specify samtools binary (--samtoolsBin)".to_string(),
            ));
        };

        let scan_size_mb = match take::int(&mut options, keys::SCAN_SIZE_MB)? {
            Some(x) if x > 0 && x <= u32::MAX as i64 => x as u32,
            Some(x) => {
                return Err(ConfigureError::OptionParse(format!(
                    "--scanSizeMb argument must be greater than 0, found {x}"
                )));
            }
            None => {
                return Err(ConfigureError::OptionParse(
                    "Must specify scan size (--scanSizeMb)".to_string(),
                ));
            }
        };

        let region_list = take::list(&mut options, keys::REGION_LIST)?
            .unwrap_or_default()
            .into_iter()
            .map(|x| x.trim().to_string())
            .filter(|x| !x.is_empty())
            .collect::<Vec<_>>();
        for region in region_list.iter() {
            check_region(region)?;
        }

        let indel_candidates_list = groom_path_list(
            take::list(&mut options, keys::INDEL_CANDIDATES_LIST)?.unwrap_or_default(),
            wd,
        );

        let base = BaseOptions {
            reference_fasta,
            run_dir,
            samtools_bin,
            scan_size_mb,
            region_list,
            indel_candidates_list: indel_candidates_list.clone(),
            is_write_callable_region: take::flag(&mut options, keys::IS_WRITE_CALLABLE_REGION)?
                .unwrap_or(false),
            variant_scoring_model_file: groom_optional_path(
                take::text(&mut options, keys::VARIANT_SCORING_MODEL_FILE)?,
                wd,
            ),
            indel_error_models_file: groom_optional_path(
                take::text(&mut options, keys::INDEL_ERROR_MODELS_FILE)?,
                wd,
            ),
            indel_error_model_name: take::text(&mut options, keys::INDEL_ERROR_MODEL_NAME)?,
        };

        let mut role_paths = Vec::new();
        for role in variant.roles {
            let paths = groom_path_list(
                take::list(&mut options, role.list_key)?.unwrap_or_default(),
                wd,
            );
            role_paths.push((role, paths));
        }

        let mut tabix_file_lists = vec![("indel candidates vcf", indel_candidates_list)];
        let mut variant_options = BTreeMap::new();
        for field in variant.extra_fields {
            let value = match field.kind {
                FieldKind::Flag => Some(ConfigValue::Flag(
                    take::flag(&mut options, field.key)?.unwrap_or(false),
                )),
                FieldKind::Count => match take::int(&mut options, field.key)? {
                    Some(x) if x < 0 => {
                        return Err(ConfigureError::OptionParse(format!(
                            "Option '{}' must be 0 or greater, found {x}",
                            field.key
                        )));
                    }
                    x => x.map(ConfigValue::Int),
                },
                FieldKind::TabixFileList => {
                    let paths = groom_path_list(
                        take::list(&mut options, field.key)?.unwrap_or_default(),
                        wd,
                    );
                    let value = ConfigValue::List(paths.iter().map(|x| x.to_string()).collect());
                    tabix_file_lists.push((field.label, paths));
                    Some(value)
                }
            };
            if let Some(value) = value {
                variant_options.insert(field.key.to_string(), value);
            }
        }

        // Everything left is a template engine parameter:
        variant_options.extend(options);

        Ok(SanitizedOptions {
            variant,
            base,
            role_paths,
            tabix_file_lists,
            variant_options,
            aux_sections: validator.defaults.aux_sections.clone(),
        })
    }
}

impl SanitizedOptions {
    /// Check sample role cardinality, then the sample alignment files and auxiliary file lists
    ///
    /// Role cardinality is checked for every role before any file is accessed.
    ///
    pub fn check_structure(self) -> Result<StructurallyCheckedOptions, ConfigureError> {
        for (role, paths) in self.role_paths.iter() {
            if !role.accepts_count(paths.len()) {
                return Err(SampleSetError::RoleCardinality {
                    role: role.label.to_string(),
                    option: role.cli_option.to_string(),
                    found: paths.len(),
                    min: role.min_count,
                    max: role.max_count,
                }
                .into());
            }
        }

        let mut checker = BamSetChecker::new();
        for (role, paths) in self.role_paths.iter() {
            checker.append_files(paths, role.label, role.allow_empty());
        }
        let sample_set = checker.check(&self.base.samtools_bin, &self.base.reference_fasta)?;

        for (label, paths) in self.tabix_file_lists.iter() {
            check_tabix_indexed(paths, label)?;
        }

        Ok(StructurallyCheckedOptions {
            sanitized: self,
            sample_set,
        })
    }
}

impl StructurallyCheckedOptions {
    /// Check model files, create the run directory and freeze the configuration
    ///
    pub fn finalize(self) -> Result<ValidatedConfig, ConfigureError> {
        let StructurallyCheckedOptions {
            sanitized,
            sample_set,
        } = self;
        let base = sanitized.base;

        if let Some(x) = &base.variant_scoring_model_file {
            check_required_filename(x.as_str(), "variant scoring model")?;
        }
        if let Some(x) = &base.indel_error_models_file {
            check_required_filename(x.as_str(), "indel error models")?;
        }

        ensure_dir(&base.run_dir)?;

        let CheckedSampleSet {
            role_files,
            reference_signature,
        } = sample_set;

        let sample_sets = sanitized
            .role_paths
            .iter()
            .zip(role_files)
            .map(|((role, _), (_, files))| SampleRoleFiles {
                role: role.label.to_string(),
                list_key: role.list_key.to_string(),
                files,
            })
            .collect();

        info!(
            "Validated {} workflow configuration with run directory '{}'",
            sanitized.variant.variant, base.run_dir
        );

        Ok(ValidatedConfig {
            primary_section_name: sanitized.variant.primary_section_name.to_string(),
            base,
            sample_sets,
            reference_signature,
            variant_options: sanitized.variant_options,
            aux_sections: sanitized.aux_sections,
        })
    }
}
