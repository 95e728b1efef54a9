pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

/// Global program version
///
/// This is recorded in every persisted run configuration
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
