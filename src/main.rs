use std::error::Error;
use clap::Parser;
use log::{debug, LevelFilter};
use rsa_stream::{Config, RunMode};

fn main() -> Result<(), Box<dyn Error>> {
    let mut config = Config::parse();
    // ciphertext on stdout must not be mixed with progress output
    if config.output == "stdout" && matches!(config.mode, RunMode::Encrypt | RunMode::Decrypt) {
        config.silent = true;
    }
    env_logger::builder()
        .filter_level(if config.silent { LevelFilter::Off } else { LevelFilter::Info })
        .parse_default_env()
        .init();
    debug!("Run args: {:?}", config);
    config.run()?;
    Ok(())
}
