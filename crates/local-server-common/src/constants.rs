//! System-wide constants and default paths.

use std::path::{Path, PathBuf};

/// Project configuration file, relative to the project root.
pub const PROJECT_CONFIG_FILE: &str = "composer.json";

/// Generated compose document, relative to the project root.
pub const COMPOSE_FILE: &str = "vendor/docker-compose.yml";

/// Marker holding the last hostname the environment was started with.
pub const HOST_MARKER_FILE: &str = "vendor/host";

/// Directory holding the static service config files (php.ini, kibana.yml, ...).
pub const CONFIG_DIR: &str = "vendor/altis/local-server/docker";

/// Compose file for the shared reverse proxy, relative to the config dir.
pub const PROXY_COMPOSE_FILE: &str = "proxy.yml";

/// Default top level domain for project hostnames.
pub const DEFAULT_TLD: &str = "altis.dev";

/// Name of the shared, externally managed proxy network.
pub const PROXY_NETWORK: &str = "proxy";

/// Name of the per-project default network.
pub const DEFAULT_NETWORK: &str = "default";

/// Memory limit applied to services without an explicit one.
pub const DEFAULT_MEM_LIMIT: &str = "1g";

/// Memory limit for the search service.
pub const DEFAULT_ES_MEM_LIMIT: &str = "1g";

/// Environment variable overriding [`DEFAULT_MEM_LIMIT`].
pub const MEM_LIMIT_ENV: &str = "LOCAL_SERVER_MEM_LIMIT";

/// Environment variable overriding [`DEFAULT_ES_MEM_LIMIT`].
pub const ES_MEM_LIMIT_ENV: &str = "ES_MEM_LIMIT";

/// Mount point of the application code inside runtime containers.
pub const APP_MOUNT_TARGET: &str = "/usr/src/app";

/// Named volume used for synchronized file sharing.
pub const SYNC_VOLUME: &str = "app";

/// Shared credentials for the local database.
pub const DB_CREDENTIAL: &str = "wordpress";

/// Access key for the local object storage.
pub const S3_ACCESS_KEY: &str = "admin";

/// Secret key for the local object storage.
pub const S3_SECRET_KEY: &str = "password";

/// Region reported by the local object storage.
pub const S3_REGION: &str = "us-east-1";

/// Routing priority of the catch-all site router.
pub const SITE_ROUTER_PRIORITY: u32 = 1;

/// Routing priority of path-scoped auxiliary routers.
pub const AUXILIARY_ROUTER_PRIORITY: u32 = 10;

/// Binary name for the CLI.
pub const BIN_NAME: &str = "local-server";

/// Returns the absolute path of the generated compose document.
pub fn compose_file(root: &Path) -> PathBuf {
    root.join(COMPOSE_FILE)
}

/// Returns the absolute path of the static service config directory.
pub fn config_dir(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR)
}
