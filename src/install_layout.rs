//! Locations of files shipped with the installation
//!

use camino::{Utf8Path, Utf8PathBuf};
use simple_error::{SimpleResult, bail};

/// Installation directories, relative to an install prefix:
///
/// ```text
/// <prefix>/bin           this program
/// <prefix>/libexec       bundled tools (samtools)
/// <prefix>/share/config  template configs and model files
/// <prefix>/lib/python    workflow execution engine modules
/// ```
///
#[derive(Clone, Debug)]
pub struct InstallLayout {
    pub config_dir: Utf8PathBuf,
    pub workflow_dir: Utf8PathBuf,
    pub libexec_dir: Utf8PathBuf,
}

impl InstallLayout {
    pub fn from_prefix(prefix: &Utf8Path) -> Self {
        Self {
            config_dir: prefix.join("share").join("config"),
            workflow_dir: prefix.join("lib").join("python"),
            libexec_dir: prefix.join("libexec"),
        }
    }

    /// Find the install prefix from the location of the running executable
    pub fn from_exe_location() -> SimpleResult<Self> {
        let exe = match std::env::current_exe().and_then(|x| x.canonicalize()) {
            Ok(x) => x,
            Err(e) => bail!("Unable to locate the running executable: {e}"),
        };
        let exe = match Utf8PathBuf::from_path_buf(exe) {
            Ok(x) => x,
            Err(x) => bail!("Executable path is not valid UTF-8: '{}'", x.display()),
        };
        let Some(prefix) = exe.parent().and_then(|x| x.parent()) else {
            bail!("Unable to find installation prefix from executable path '{exe}'");
        };
        Ok(Self::from_prefix(prefix))
    }
}
