use anyhow::{anyhow, Result};
use clible::{ClibleConfig, OutputFormat};

pub fn run(config: &ClibleConfig, config_file: Option<&str>, output_format: OutputFormat) -> Result<()> {
    match output_format {
        OutputFormat::Json | OutputFormat::JsonLine => println!(
            "{}",
            serde_json::to_string(config).map_err(|e| anyhow!("Failed to serialize: {}", e))?
        ),
        OutputFormat::JsonPretty => println!(
            "{}",
            serde_json::to_string_pretty(config)
                .map_err(|e| anyhow!("Failed to serialize: {}", e))?
        ),
        _ => {
            let config_file = config_file
                .map(|p| p.to_string())
                .unwrap_or_else(|| ClibleConfig::config_file_path().display().to_string());
            println!("Config File:        {}", config_file);
            println!("{}", config.summary());
        }
    }
    Ok(())
}
