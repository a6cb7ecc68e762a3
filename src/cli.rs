use clap::Parser;
use std::path::PathBuf;

/// Streaming conversational agent backend
#[derive(Parser, Debug, Clone)]
#[command(name = "colloquy", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "COLLOQUY_CONFIG", default_value = "colloquy.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "COLLOQUY_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "COLLOQUY_PORT")]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["colloquy"]);
        assert_eq!(cli.config, PathBuf::from("colloquy.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn overrides() {
        let cli = Cli::parse_from([
            "colloquy",
            "--config",
            "custom.toml",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.host, Some("0.0.0.0".to_string()));
        assert_eq!(cli.port, Some(8080));
    }
}
