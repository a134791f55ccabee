//! Install command - resolve a version and export its environment

use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::env;
use crate::error::LeinupResult;
use crate::installer::{Installer, HOME_VAR};
use console::style;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> LeinupResult<()> {
    let mut config = config.clone();
    if args.no_smoke_test {
        config.install.smoke_test = false;
    }

    let installer = Installer::new(&config);
    let outcome = installer.setup(&args.version).await?;

    let exporter = env::detect_exporter();
    exporter.apply(&outcome.patch)?;

    let source = if outcome.cache_hit {
        "cache hit"
    } else {
        "downloaded"
    };
    println!(
        "{} leiningen {} ready ({})",
        style("✓").green(),
        args.version,
        source
    );
    println!("  {}={}", HOME_VAR, outcome.tool_home.display());
    println!("  PATH += {}", outcome.tool_home.join("bin").display());

    Ok(())
}
