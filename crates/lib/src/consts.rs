//! Crate-wide constants.

/// Application name used for per-user directories.
pub const APP_NAME: &str = "cairokit";

/// Environment variable overriding the work directory root.
pub const ROOT_ENV: &str = "CAIROKIT_ROOT";

/// Upstream package name.
pub const PACKAGE_NAME: &str = "cairo";

/// Default upstream version built when the profile does not pin one.
pub const DEFAULT_VERSION: &str = "1.15.14";

/// Default location of upstream release archives.
pub const DEFAULT_BASE_URL: &str = "https://www.cairographics.org/snapshots";

/// Normalized name of the extracted source tree inside the work directory.
pub const SOURCE_SUBFOLDER: &str = "source_subfolder";

/// Name of the manifest written at the package root.
pub const MANIFEST_FILENAME: &str = "cairokit-manifest.json";

/// Name of the applied-patch ledger kept at the source tree root.
pub const PATCH_LEDGER_FILENAME: &str = ".cairokit-patches.json";

/// Include namespace headers are installed under.
pub const INCLUDE_NAMESPACE: &str = "cairo";

/// Length of truncated object hashes.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;
