//! Starter configuration.

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Starter `livesync.toml`, mirroring the defaults plus two example rules.
pub const CONFIG_TEMPLATE: &str = r#"# livesync configuration

[serve]
interface = "127.0.0.1"
port = 3000              # proxy front-end port
ws_port = 35729          # live reload websocket port
proxy = "localhost:8080" # backend application
notify = false           # forward reaction notices to browsers

[watch]
roots = ["."]
ignored = ["node_modules", "tmp"]
events = ["change", "add", "unlink", "addDir", "unlinkDir"]
reload_delay = 100       # ms, minimum wait after the first event
reload_debounce = 250    # ms, quiet period after the last event
# max_wait = 1000        # ms, upper bound on any wait

[client]
heartbeat = 5000         # ms
timeout = 15000          # ms

[log]
level = "info"           # silent | info | debug
prefix = ""

# Stylesheets are re-injected without a page reload
[[rules]]
patterns = ["public/css/**/*.css"]
reaction = { kind = "scoped", scope = "*.css" }

# Everything else reloads the page
[[rules]]
patterns = ["templates/**/*.gohtml", "public/js/**/*.js"]
"#;

/// Write the starter config. Refuses to overwrite unless `force` is set.
pub fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "'{}' already exists.\nUse `livesync init --force` to overwrite it.",
            path.display()
        );
    }
    fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    Ok(())
}
