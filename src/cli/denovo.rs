use camino::Utf8PathBuf;
use clap::Args;

use crate::config_value::RawOptionSet;
use crate::pipeline_variant::DENOVO_VARIANT;

#[derive(Args)]
pub struct DenovoSettings {
    /// Proband sample alignment file in BAM or CRAM format (required)
    #[arg(long = "probandAlignmnet", value_name = "FILE")]
    pub proband_alignment: Vec<Utf8PathBuf>,

    /// Parent sample alignment file in BAM or CRAM format. Must be specified exactly twice.
    #[arg(long = "parentAlignment", value_name = "FILE")]
    pub parent_alignment: Vec<Utf8PathBuf>,

    /// Sibling sample alignment file in BAM or CRAM format. Can be specified multiple times.
    #[arg(long = "siblingAlignment", value_name = "FILE")]
    pub sibling_alignment: Vec<Utf8PathBuf>,
}

impl DenovoSettings {
    pub fn add_raw_options(&self, options: &mut RawOptionSet) {
        let roles = &DENOVO_VARIANT.roles;
        super::add_role_files(options, roles[0].list_key, &self.proband_alignment);
        super::add_role_files(options, roles[1].list_key, &self.parent_alignment);
        super::add_role_files(options, roles[2].list_key, &self.sibling_alignment);
    }
}
