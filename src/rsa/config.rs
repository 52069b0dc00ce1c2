use clap::{Parser, ValueEnum};
use lazy_static::lazy_static;
use crate::rsa::key_gen::ExponentPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Generate,
    Encrypt,
    Decrypt,
    Test,
}

lazy_static! {
    pub static ref CONFIG_DEF: Config = Config {
        mode: RunMode::Generate,
        key: String::from("mykey"),
        input: String::from("stdin"),
        output: String::from("stdout"),
        bits: 2048,
        exponent: ExponentPolicy::Fixed,
        rounds: 64,
        silent: false,
    };
}

#[derive(Debug, Clone, Parser)]
#[command(name = "rsa-stream", version, about = "Simple RSA generate / encrypt / decrypt tool")]
pub struct Config {
    #[arg(short, long, value_enum, default_value_t = CONFIG_DEF.mode, help = "Run mode")]
    pub mode: RunMode,
    #[arg(short, long, default_value = CONFIG_DEF.key.as_str(), help = "Key base name, generate/detect `key.pub' and `key.key'")]
    pub key: String,
    #[arg(short, long, default_value = CONFIG_DEF.input.as_str(), help = "Input filename")]
    pub input: String,
    #[arg(short, long, default_value = CONFIG_DEF.output.as_str(), help = "Output filename")]
    pub output: String,
    #[arg(short, long, default_value_t = CONFIG_DEF.bits, help = "Key size in bits, a multiple of 64")]
    pub bits: u64,
    #[arg(short, long, value_enum, default_value_t = CONFIG_DEF.exponent, help = "Public exponent search start")]
    pub exponent: ExponentPolicy,
    #[arg(long, default_value_t = CONFIG_DEF.rounds, help = "Random blocks checked in test mode")]
    pub rounds: usize,
    #[arg(short, long, help = "Disable log output and progress bars")]
    pub silent: bool,
}
