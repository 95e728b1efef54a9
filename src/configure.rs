//! Top-level configuration of a single workflow run
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};

use crate::cli::Settings;
use crate::config_value::ConfigSections;
use crate::errors::ConfigureError;
use crate::filenames::{RUN_CONFIG_FILENAME, RUN_SCRIPT_FILENAME};
use crate::install_layout::InstallLayout;
use crate::option_defaults::resolve_defaults;
use crate::pipeline_variant::PipelineVariantSpec;
use crate::run_config::{ValidatedConfig, read_config_sections, serialize};
use crate::run_script::{EngineEntryPoint, emit_run_script};
use crate::workflow_options::WorkflowOptionsValidator;

fn get_install_layout(settings: &Settings) -> Result<InstallLayout, ConfigureError> {
    let mut layout = InstallLayout::from_exe_location()?;
    if let Some(x) = &settings.shared.install_config_dir {
        layout.config_dir = x.clone();
    }
    if let Some(x) = &settings.shared.install_workflow_dir {
        layout.workflow_dir = x.clone();
    }
    debug!("Install layout: {layout:?}");
    Ok(layout)
}

fn get_working_dir() -> Result<Utf8PathBuf, ConfigureError> {
    let cwd = std::env::current_dir().map_err(|e| {
        ConfigureError::OptionParse(format!("Unable to read current working directory: {e}"))
    })?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|x| {
        ConfigureError::OptionParse(format!(
            "Current working directory is not valid UTF-8: '{}'",
            x.display()
        ))
    })
}

/// Check that a configuration survives conversion to sections and back unchanged
fn check_config_round_trip(
    config: &ValidatedConfig,
    sections: &ConfigSections,
    variant: &PipelineVariantSpec,
    config_path: &Utf8Path,
) -> Result<(), ConfigureError> {
    let mismatch = |reason: String| ConfigureError::ConfigRead {
        path: config_path.to_path_buf(),
        reason,
    };
    match ValidatedConfig::from_sections(sections, variant) {
        Ok(x) if &x == config => Ok(()),
        Ok(_) => Err(mismatch(
            "Persisted configuration does not match the validated configuration".to_string(),
        )),
        Err(e) => Err(mismatch(e.to_string())),
    }
}

/// Remove the run script and its configuration after a failed run setup
fn remove_run_files(run_dir: &Utf8Path) {
    for filename in [RUN_SCRIPT_FILENAME, RUN_CONFIG_FILENAME] {
        let path = run_dir.join(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Unable to remove '{path}': {e}"),
        }
    }
}

/// Validate all options and write the workflow run script with its configuration
///
/// Returns the path of the run script. On error no run script or configuration file is left in
/// the run directory.
///
pub fn run_configure(settings: &Settings) -> Result<Utf8PathBuf, ConfigureError> {
    let variant = settings.variant();
    info!("Configuring {} workflow", variant.variant);

    let layout = get_install_layout(settings)?;
    let defaults = resolve_defaults(variant, &layout, settings.shared.config.as_deref())?;

    let validator = WorkflowOptionsValidator::new(variant, defaults, get_working_dir()?);
    let config = validator.validate(settings.get_raw_options())?;

    let run_dir = &config.base.run_dir;
    let run_script = run_dir.join(RUN_SCRIPT_FILENAME);
    let config_path = run_dir.join(RUN_CONFIG_FILENAME);

    let sections = serialize(&config);
    check_config_round_trip(&config, &sections, variant, &config_path)?;

    let engine = EngineEntryPoint {
        module_path: &layout.workflow_dir.join(variant.engine_module_filename),
        class_name: variant.engine_class_name,
    };
    let rc = emit_run_script(&run_script, &engine, variant.primary_section_name, &sections)
        .and_then(|_| {
            // Check that the workflow will read the same configuration which was validated:
            let sections = read_config_sections(&config_path)?;
            check_config_round_trip(&config, &sections, variant, &config_path)
        });
    if let Err(e) = rc {
        remove_run_files(run_dir);
        return Err(e);
    }

    Ok(run_script)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    use crate::config_value::ConfigValue;
    use crate::pipeline_variant::{SOMATIC_VARIANT, keys};
    use crate::test_utils::{TEST_CONTIGS, write_test_bam, write_test_fasta, write_test_file};

    struct Fixture {
        _dir: tempfile::TempDir,
        base: Utf8PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            for sub in ["config", "workflow"] {
                std::fs::create_dir_all(base.join(sub)).unwrap();
            }
            write_test_file(base.as_std_path(), "samtools");
            write_test_fasta(base.as_std_path(), "ref.fa", TEST_CONTIGS);
            for name in ["normal.bam", "tumor.bam"] {
                write_test_bam(base.as_std_path(), name, TEST_CONTIGS, Some(name), true);
            }
            Self { _dir: dir, base }
        }

        fn somatic_settings(&self, extra_args: &[&str]) -> Settings {
            let b = &self.base;
            let mut args = vec![
                "starka-configure".to_string(),
                "--installConfigDir".to_string(),
                b.join("config").to_string(),
                "--installWorkflowDir".to_string(),
                b.join("workflow").to_string(),
                "--samtoolsBin".to_string(),
                b.join("samtools").to_string(),
                "--referenceFasta".to_string(),
                b.join("ref.fa").to_string(),
                "--runDir".to_string(),
                b.join("run").to_string(),
                "somatic".to_string(),
                "--normalBam".to_string(),
                b.join("normal.bam").to_string(),
                "--tumorBam".to_string(),
                b.join("tumor.bam").to_string(),
            ];
            args.extend(extra_args.iter().map(|x| x.to_string()));
            Settings::try_parse_from(args).unwrap()
        }
    }

    #[test]
    fn test_run_configure() {
        let f = Fixture::new();
        std::fs::write(
            f.base.join("config").join(SOMATIC_VARIANT.template_config_filename),
            "[strelka]\nssnvPrior = 0.9222222222222223\n\n[pyflow]\nmode = \"local\"\n",
        )
        .unwrap();

        // The default model files aren't installed in this layout:
        let settings = f.somatic_settings(&[]);
        assert!(matches!(
            run_configure(&settings),
            Err(ConfigureError::OptionParse(_))
        ));

        let model = write_test_file(f.base.as_std_path(), "model.json");
        let settings = f.somatic_settings(&[
            "--variantScoringModelFile",
            model.as_str(),
            "--indelErrorModelsFile",
            model.as_str(),
        ]);
        let run_script = run_configure(&settings).unwrap();
        assert_eq!(run_script, f.base.join("run").join(RUN_SCRIPT_FILENAME));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&run_script).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        let config_path = f.base.join("run").join(RUN_CONFIG_FILENAME);
        let sections = read_config_sections(&config_path).unwrap();
        assert_eq!(
            sections["strelka"]["ssnvPrior"],
            ConfigValue::Float(0.9222222222222223)
        );
        assert_eq!(sections["pyflow"]["mode"], ConfigValue::from("local"));
    }

    #[test]
    fn test_check_config_round_trip_and_cleanup() {
        let f = Fixture::new();
        let model = write_test_file(f.base.as_std_path(), "model.json");
        let settings = f.somatic_settings(&[
            "--variantScoringModelFile",
            model.as_str(),
            "--indelErrorModelsFile",
            model.as_str(),
        ]);
        let run_script = run_configure(&settings).unwrap();
        let run_dir = run_script.parent().unwrap();
        let config_path = run_dir.join(RUN_CONFIG_FILENAME);

        let sections = read_config_sections(&config_path).unwrap();
        let mut config = ValidatedConfig::from_sections(&sections, &SOMATIC_VARIANT).unwrap();
        assert!(
            check_config_round_trip(&config, &sections, &SOMATIC_VARIANT, &config_path).is_ok()
        );

        // A value which can't survive the round trip:
        config
            .variant_options
            .insert(keys::WORKFLOW_VERSION.to_string(), "0.0.1".into());
        let sections = serialize(&config);
        assert!(matches!(
            check_config_round_trip(&config, &sections, &SOMATIC_VARIANT, &config_path),
            Err(ConfigureError::ConfigRead { .. })
        ));

        remove_run_files(run_dir);
        assert!(!run_script.exists());
        assert!(!config_path.exists());
        assert!(run_dir.is_dir());

        // Removing files which don't exist is not an error:
        remove_run_files(run_dir);
    }
}
