mod aux_file_list;
mod bam_set_checker;
mod cli;
mod config_value;
mod configure;
mod errors;
mod filenames;
mod genome_ref_utils;
mod globals;
mod install_layout;
mod logger;
mod option_defaults;
mod os_utils;
mod pipeline_variant;
mod run_config;
mod run_script;
mod sample_file;
mod workflow_options;

#[cfg(test)]
mod test_utils;

use std::process;

use log::info;

use crate::configure::run_configure;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_logger;

fn main() {
    let settings = cli::validate_settings(cli::parse_settings());

    if let Err(err) = setup_logger(settings.shared.debug) {
        eprintln!("Unable to setup logger: {err}");
        process::exit(exitcode::SOFTWARE);
    }

    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    match run_configure(&settings) {
        Ok(run_script) => {
            info!("{PROGRAM_NAME} completed");
            println!(
                "Successfully created workflow run script.\n\
                To execute the workflow, run the following script and set appropriate options:\n\n\
                {run_script}"
            );
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(err.exit_code());
        }
    }
}
