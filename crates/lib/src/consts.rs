//! Application-wide constants and defaults.

pub const APP_NAME: &str = "stacktmpl";

/// Metadata service reachable from inside a Rancher-managed container.
pub const DEFAULT_METADATA_URL: &str = "http://rancher-metadata.rancher.internal";

/// API version prefix appended to the metadata URL.
pub const DEFAULT_METADATA_PREFIX: &str = "2016-07-29";

pub const DEFAULT_TEMPLATES_GLOB: &str = "/etc/stacktmpl/*.yml";

/// Long-poll window for version changes, in seconds.
pub const DEFAULT_REFRESH_SECS: u64 = 300;

pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 5;

/// First delay between connect attempts; doubles after every failure.
pub const CONNECT_INITIAL_DELAY_SECS: u64 = 1;

/// Timeout for plain metadata requests.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Version sentinel used before the first change is observed.
pub const INIT_VERSION: &str = "init";

/// Permissions applied to rendered destination files.
#[cfg(unix)]
pub const DESTINATION_MODE: u32 = 0o644;
