use utils::{DEFAULT_ROOT_DEVICE, ROOT_DEVICE_NAME_ATTEMPTS};

/// Recovery command line arguments.
/// Meant to be flattened into the arguments of the binary which runs the recovery.
#[derive(Debug, Clone, clap::Args)]
pub struct RecoverArgs {
    /// Name of the root disk device added to an imported instance which has none.
    /// When taken, a numbered suffix is appended, eg: root0, root1...
    #[clap(long, env = "RECOVER_ROOT_DEVICE", default_value = DEFAULT_ROOT_DEVICE)]
    pub root_device_name: String,
}

/// Recovery configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverConfig {
    root_device_name: String,
}

impl Default for RecoverConfig {
    fn default() -> Self {
        Self {
            root_device_name: DEFAULT_ROOT_DEVICE.to_string(),
        }
    }
}

impl From<&RecoverArgs> for RecoverConfig {
    fn from(args: &RecoverArgs) -> Self {
        Self::default().with_root_device_name(&args.root_device_name)
    }
}

impl RecoverConfig {
    /// Use the given name for added root disk devices, keeping the default if empty.
    #[must_use]
    pub fn with_root_device_name(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.root_device_name = name.to_string();
        }
        self
    }
    /// Get the name of added root disk devices.
    pub fn root_device_name(&self) -> &str {
        &self.root_device_name
    }
    /// The names which may be given to an added root disk device, in order of preference.
    pub(crate) fn root_device_candidates(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.root_device_name.clone()).chain(
            (0..ROOT_DEVICE_NAME_ATTEMPTS).map(|i| format!("{}{i}", self.root_device_name)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        recover: RecoverArgs,
    }

    #[test]
    fn root_device_name_args() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(RecoverConfig::from(&cli.recover), RecoverConfig::default());

        let cli = Cli::parse_from(["test", "--root-device-name", "rootfs"]);
        let config = RecoverConfig::from(&cli.recover);
        assert_eq!(config.root_device_name(), "rootfs");
        let candidates = config.root_device_candidates().collect::<Vec<_>>();
        assert_eq!(candidates.len(), ROOT_DEVICE_NAME_ATTEMPTS + 1);
        assert_eq!(&candidates[..3], ["rootfs", "rootfs0", "rootfs1"]);
    }
}
