//! Writes the executable script used to launch a configured workflow run
//!

use std::io::Write;

use camino::Utf8Path;
use log::info;

use crate::config_value::ConfigSections;
use crate::errors::ConfigureError;
use crate::filenames::RUN_CONFIG_FILENAME;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::os_utils::{ensure_dir, write_file_atomic};
use crate::run_config::persist_config_sections;

/// Details of the execution engine entry point called by the run script
pub struct EngineEntryPoint<'a> {
    /// Python module file providing the workflow class
    pub module_path: &'a Utf8Path,
    pub class_name: &'a str,
}

/// Quote a string as a python literal
///
/// JSON string syntax is a subset of python string literal syntax.
fn python_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn get_run_script_content(
    engine: &EngineEntryPoint,
    primary_section_name: &str,
) -> Result<String, String> {
    let Some(workflow_dir) = engine.module_path.parent() else {
        return Err(format!(
            "Can't find directory of workflow module '{}'",
            engine.module_path
        ));
    };
    let Some(module_name) = engine.module_path.file_stem() else {
        return Err(format!(
            "Can't find name of workflow module '{}'",
            engine.module_path
        ));
    };

    Ok(format!(
        r#"#!/usr/bin/env python3
#
# Run script generated by {PROGRAM_NAME} {PROGRAM_VERSION}
#
# Run with '--help' to list workflow execution options.
#

import json
import os
import sys

scriptDir = os.path.abspath(os.path.dirname(__file__))
sys.path.append({workflow_dir})

from {module_name} import {class_name}


def main():
    configPath = os.path.join(scriptDir, {config_filename})
    with open(configPath) as configFile:
        sections = json.load(configFile)

    wflow = {class_name}(sections[{primary_section_name}], sections)
    retval = wflow.run(sys.argv[1:])
    sys.exit(retval)


if __name__ == "__main__":
    main()
"#,
        workflow_dir = python_str(workflow_dir.as_str()),
        class_name = engine.class_name,
        config_filename = python_str(RUN_CONFIG_FILENAME),
        primary_section_name = python_str(primary_section_name),
    ))
}

/// Write the run configuration and the executable run script which reads it
///
/// The configuration is written to `RUN_CONFIG_FILENAME` in the same directory as the script. The
/// script is written last, so that it never exists without its configuration.
///
/// * `target` - path of the run script, its parent directory is created if needed
/// * `primary_section_name` - name of the config section passed to the workflow as its options
///
pub fn emit_run_script(
    target: &Utf8Path,
    engine: &EngineEntryPoint,
    primary_section_name: &str,
    sections: &ConfigSections,
) -> Result<(), ConfigureError> {
    let script_error = |source: std::io::Error| ConfigureError::ConfigWrite {
        path: target.to_path_buf(),
        source,
    };

    let content = get_run_script_content(engine, primary_section_name)
        .map_err(|msg| script_error(std::io::Error::other(msg)))?;

    let run_dir = match target.parent() {
        Some(x) if !x.as_str().is_empty() => x,
        _ => Utf8Path::new("."),
    };
    ensure_dir(run_dir)?;

    persist_config_sections(sections, &run_dir.join(RUN_CONFIG_FILENAME))?;

    info!("Writing workflow run script: '{target}'");
    write_file_atomic(target, Some(0o755), |writer| {
        writer.write_all(content.as_bytes())
    })
    .map_err(script_error)
}
