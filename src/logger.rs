//! Methods specific to the program logger
//!

use crate::globals::PROGRAM_NAME;

/// Setup the default logger to write to stderr
///
/// Stdout is left free for the run script path printed on success.
///
/// # Arguments
/// * `debug` - If true use debug log level, and info level otherwise
///
pub fn setup_logger(debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}
