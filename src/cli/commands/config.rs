//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::ConfigManager;
use crate::error::LeinupResult;
use console::style;

/// Execute the config command
///
/// Loads the config file only for `show`, so `init` can still repair a
/// broken one.
pub async fn execute(args: ConfigArgs, manager: &ConfigManager) -> LeinupResult<()> {
    match args.action {
        ConfigAction::Show => {
            let config = manager.load().await?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", manager.config_path().display());
            Ok(())
        }
        ConfigAction::Init { force } => {
            manager.init(force).await?;
            println!(
                "{} wrote {}",
                style("✓").green(),
                manager.config_path().display()
            );
            Ok(())
        }
    }
}
