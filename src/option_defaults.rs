//! Baseline option values for a pipeline variant
//!
//! Defaults are merged from three sources, lowest precedence first:
//! 1. built-in defaults from the variant description
//! 2. the variant's template config file in the installation config directory
//! 3. an optional user config file given on the command line
//!
//! Command-line values are merged over the result later, by the options validator. No file named
//! by a default value is checked here, so that the user can override it first.
//!

use std::collections::BTreeSet;

use camino::Utf8Path;
use log::{debug, info};

use crate::config_value::{ConfigSection, ConfigSections, ConfigValue, RawOptionSet};
use crate::errors::ConfigureError;
use crate::install_layout::InstallLayout;
use crate::pipeline_variant::{
    DEFAULT_SCAN_SIZE_MB, FieldDefault, PipelineVariantSpec, keys,
};
use crate::run_config::SAMPLE_FILE_INFO_SECTION;

pub struct OptionDefaults {
    pub options: RawOptionSet,

    /// Keys from the template config which are not options of the variant
    ///
    /// These are execution engine parameters, passed through to the run configuration as-is.
    pub engine_param_keys: BTreeSet<String>,

    /// Template and user config sections other than the primary section
    pub aux_sections: ConfigSections,
}

pub fn get_builtin_defaults(
    variant: &PipelineVariantSpec,
    layout: &InstallLayout,
) -> RawOptionSet {
    let mut options = RawOptionSet::new();
    let mut set = |key: &str, value: ConfigValue| {
        options.insert(key.to_string(), value);
    };

    set(keys::RUN_DIR, variant.default_run_dir.into());
    set(
        keys::SAMTOOLS_BIN,
        layout.libexec_dir.join("samtools").to_string().into(),
    );
    set(keys::SCAN_SIZE_MB, ConfigValue::Int(DEFAULT_SCAN_SIZE_MB));
    set(keys::IS_WRITE_CALLABLE_REGION, false.into());
    if let Some(x) = variant.default_variant_scoring_model_file {
        set(
            keys::VARIANT_SCORING_MODEL_FILE,
            layout.config_dir.join(x).to_string().into(),
        );
    }
    if let Some(x) = variant.default_indel_error_models_file {
        set(
            keys::INDEL_ERROR_MODELS_FILE,
            layout.config_dir.join(x).to_string().into(),
        );
    }
    if let Some(x) = variant.default_indel_error_model_name {
        set(keys::INDEL_ERROR_MODEL_NAME, x.into());
    }

    for field in variant.extra_fields {
        match field.default {
            FieldDefault::None => {}
            FieldDefault::Flag(x) => set(field.key, x.into()),
            FieldDefault::Count(x) => set(field.key, ConfigValue::Int(x)),
        }
    }
    options
}

/// Read a TOML config file into config sections
///
/// Each top-level table becomes one section.
///
pub fn read_config_file(path: &Utf8Path) -> Result<ConfigSections, ConfigureError> {
    let config_error = |msg: String| ConfigureError::OptionParse(msg);

    let contents = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("Unable to read config file '{path}': {e}")))?;
    let table: toml::Table = toml::from_str(&contents)
        .map_err(|e| config_error(format!("Unable to parse config file '{path}': {e}")))?;

    let mut sections = ConfigSections::new();
    for (section_name, value) in table.iter() {
        let toml::Value::Table(section_table) = value else {
            return Err(config_error(format!(
                "Config file '{path}' has key '{section_name}' outside of any section"
            )));
        };
        if section_name == SAMPLE_FILE_INFO_SECTION {
            return Err(config_error(format!(
                "Config file '{path}' uses reserved section name '{section_name}'"
            )));
        }
        let mut section = ConfigSection::new();
        for (key, value) in section_table.iter() {
            let value = ConfigValue::from_toml(key, value)
                .map_err(|e| config_error(format!("In config file '{path}': {e}")))?;
            section.insert(key.clone(), value);
        }
        sections.insert(section_name.clone(), section);
    }
    Ok(sections)
}

/// Keys which only this program may write into the primary section
fn check_reserved_keys(
    primary: &ConfigSection,
    path: &Utf8Path,
    section_name: &str,
) -> Result<(), ConfigureError> {
    if primary.contains_key(keys::WORKFLOW_VERSION) {
        return Err(ConfigureError::OptionParse(format!(
            "Config file '{path}' sets reserved key '{}' in section '{section_name}'",
            keys::WORKFLOW_VERSION
        )));
    }
    Ok(())
}

fn merge_aux_sections(aux_sections: &mut ConfigSections, sections: ConfigSections) {
    for (name, section) in sections {
        aux_sections.entry(name).or_default().extend(section);
    }
}

/// Build the baseline option set for a pipeline variant
///
/// * `user_config` - optional config file supplied by the user, which must exist if given
///
pub fn resolve_defaults(
    variant: &PipelineVariantSpec,
    layout: &InstallLayout,
    user_config: Option<&Utf8Path>,
) -> Result<OptionDefaults, ConfigureError> {
    let mut defaults = OptionDefaults {
        options: get_builtin_defaults(variant, layout),
        engine_param_keys: BTreeSet::new(),
        aux_sections: ConfigSections::new(),
    };

    let template_path = layout.config_dir.join(variant.template_config_filename);
    if template_path.is_file() {
        info!("Reading template config file: '{template_path}'");
        let mut sections = read_config_file(&template_path)?;
        if let Some(primary) = sections.remove(variant.primary_section_name) {
            check_reserved_keys(&primary, &template_path, variant.primary_section_name)?;
            for (key, value) in primary {
                if !variant.is_known_key(&key) {
                    defaults.engine_param_keys.insert(key.clone());
                }
                defaults.options.insert(key, value);
            }
        }
        merge_aux_sections(&mut defaults.aux_sections, sections);
    } else {
        debug!("No template config file found at '{template_path}', using built-in defaults");
    }

    if let Some(user_config) = user_config {
        info!("Reading user config file: '{user_config}'");
        let mut sections = read_config_file(user_config)?;
        if let Some(primary) = sections.remove(variant.primary_section_name) {
            check_reserved_keys(&primary, user_config, variant.primary_section_name)?;
            for (key, value) in primary {
                if !(variant.is_known_key(&key) || defaults.engine_param_keys.contains(&key)) {
                    return Err(ConfigureError::OptionParse(format!(
                        "Unknown option '{key}' in section '{}' of config file '{user_config}'",
                        variant.primary_section_name
                    )));
                }
                defaults.options.insert(key, value);
            }
        }
        merge_aux_sections(&mut defaults.aux_sections, sections);
    }

    Ok(defaults)
}
