/// Various common constants used by the recovery components.

/// Delimiter between an instance name and its snapshot name in a snapshot record name.
/// Example: `c1/snap0`.
pub const SNAPSHOT_DELIMITER: &str = "/";

/// The project which owns profiles for projects without their own profile feature.
pub const DEFAULT_PROJECT: &str = "default";

/// Project config key which, when "true", makes the project own its profiles.
pub const PROJECT_FEATURE_PROFILES: &str = "features.profiles";

/// Default name given to a root disk device added during an import.
pub const DEFAULT_ROOT_DEVICE: &str = "root";

/// How many numbered alternatives (root0, root1..) are tried when the root device name is taken.
pub const ROOT_DEVICE_NAME_ATTEMPTS: usize = 100;

/// Instance config key holding the image the instance was created from.
pub const BASE_IMAGE_CONFIG_KEY: &str = "volatile.base_image";

/// Root disk config key with the instance's volume size.
pub const ROOT_DISK_SIZE: &str = "size";

/// Root disk config key with the instance's state volume size.
pub const ROOT_DISK_STATE_SIZE: &str = "size.state";

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Internal api path of the recovery validation scan.
pub const RECOVER_VALIDATE_PATH: &str = "recover/validate";

/// Internal api path of the recovery import.
pub const RECOVER_IMPORT_PATH: &str = "recover/import";
