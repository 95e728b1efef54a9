use camino::Utf8PathBuf;
use clap::Args;

use crate::config_value::{ConfigValue, RawOptionSet};
use crate::pipeline_variant::{IS_INDEL_EMPIRICAL_SCORING, NOISE_VCF_LIST, SOMATIC_VARIANT, keys};

#[derive(Args)]
pub struct SomaticSettings {
    /// Normal sample alignment file in BAM or CRAM format (required)
    #[arg(long = "normalBam", value_name = "FILE")]
    pub normal_bam: Vec<Utf8PathBuf>,

    /// Tumor sample alignment file in BAM or CRAM format (required)
    #[arg(long = "tumorBam", visible_alias = "tumourBam", value_name = "FILE")]
    pub tumor_bam: Vec<Utf8PathBuf>,

    /// Noise panel in tabix-indexed VCF format, used to filter recurrent sequencing artifacts.
    /// Can be specified multiple times.
    #[arg(long = "noiseVcf", value_name = "FILE")]
    pub noise_vcf: Vec<Utf8PathBuf>,

    /// Write a BED file of all regions with sufficient depth to call somatic variants
    #[arg(long = "isWriteCallableRegion")]
    pub is_write_callable_region: bool,

    /// Use the empirical scoring model for somatic indels
    #[arg(hide = true, long = "enable-indel-empirical-scoring")]
    pub enable_indel_empirical_scoring: bool,
}

impl SomaticSettings {
    pub fn add_raw_options(&self, options: &mut RawOptionSet) {
        let roles = &SOMATIC_VARIANT.roles;
        super::add_role_files(options, roles[0].list_key, &self.normal_bam);
        super::add_role_files(options, roles[1].list_key, &self.tumor_bam);

        if !self.noise_vcf.is_empty() {
            options.insert(
                NOISE_VCF_LIST.to_string(),
                super::path_list_value(&self.noise_vcf),
            );
        }
        if self.is_write_callable_region {
            options.insert(
                keys::IS_WRITE_CALLABLE_REGION.to_string(),
                ConfigValue::Flag(true),
            );
        }
        if self.enable_indel_empirical_scoring {
            options.insert(
                IS_INDEL_EMPIRICAL_SCORING.to_string(),
                ConfigValue::Flag(true),
            );
        }
    }
}
