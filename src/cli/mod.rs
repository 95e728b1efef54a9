mod denovo;
mod shared;
mod somatic;
mod utils;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use simple_error::SimpleResult;

pub use self::denovo::DenovoSettings;
use self::shared::validate_shared_settings;
pub use self::shared::SharedSettings;
pub use self::somatic::SomaticSettings;
pub use self::utils::check_required_filename;
use crate::config_value::{ConfigValue, RawOptionSet};
use crate::pipeline_variant::{DENOVO_VARIANT, PipelineVariant, PipelineVariantSpec, SOMATIC_VARIANT};

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = SOMATIC_VARIANT.description)]
    Somatic(SomaticSettings),

    #[command(about = DENOVO_VARIANT.description)]
    Denovo(DenovoSettings),
}

#[derive(Parser)]
#[command(
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true)]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn variant(&self) -> &'static PipelineVariantSpec {
        PipelineVariantSpec::get(match &self.command {
            Commands::Somatic(_) => PipelineVariant::Somatic,
            Commands::Denovo(_) => PipelineVariant::Denovo,
        })
    }

    /// All options given on the command-line, keyed by their config option names
    pub fn get_raw_options(&self) -> RawOptionSet {
        let mut options = RawOptionSet::new();
        self.shared.add_raw_options(&mut options);
        match &self.command {
            Commands::Somatic(x) => x.add_raw_options(&mut options),
            Commands::Denovo(x) => x.add_raw_options(&mut options),
        }
        options
    }
}

fn path_list_value(paths: &[Utf8PathBuf]) -> ConfigValue {
    ConfigValue::List(paths.iter().map(|x| x.to_string()).collect())
}

/// Add a sample role file list, if any files were given for the role
fn add_role_files(options: &mut RawOptionSet, list_key: &str, paths: &[Utf8PathBuf]) {
    if !paths.is_empty() {
        options.insert(list_key.to_string(), path_list_value(paths));
    }
}

/// Validate settings which can't be checked by clap
///
/// Assumes no logger has been configured yet
///
pub fn validate_settings_impl(settings: &Settings) -> SimpleResult<()> {
    validate_shared_settings(&settings.shared)
}

/// Validate settings, exiting with a usage error if any are invalid
///
pub fn validate_settings(settings: Settings) -> Settings {
    if let Err(msg) = validate_settings_impl(&settings) {
        eprintln!("Invalid command-line setting: {msg}");
        std::process::exit(exitcode::USAGE);
    }
    settings
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
