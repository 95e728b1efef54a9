use const_format::concatcp;

pub const RUN_SCRIPT_FILENAME: &str = "runWorkflow.py";

/// Persisted run configuration, written next to the run script
pub const RUN_CONFIG_FILENAME: &str = concatcp!(RUN_SCRIPT_FILENAME, ".config.json");
