use crate::config::EditorConfig;
use crate::file::LineEnding;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Unix,
    Dos,
}

impl From<ModeArg> for LineEnding {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Unix => LineEnding::Unix,
            ModeArg::Dos => LineEnding::Dos,
        }
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "edcore")]
#[command(version = "0.1.0")]
#[command(about = "Inspect, convert and save text files through the edcore line store")]
pub struct CliArgs {
    /// File to open
    pub file: Option<PathBuf>,

    /// Config file (default: <config dir>/edcore/config.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Count columns by grapheme cluster and display width
    #[arg(long)]
    pub combining: bool,

    /// Convert line endings
    #[arg(long, short = 'm', value_enum)]
    pub mode: Option<ModeArg>,

    /// Save the file after conversion
    #[arg(long, short = 's')]
    pub save: bool,

    /// Print every line with its row number
    #[arg(long, short = 'l')]
    pub lines: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, mut config: EditorConfig) -> EditorConfig {
        if self.combining {
            config.unicode_combining = true;
        }
        config
    }
}

pub fn parse_args() -> Result<CliArgs, Box<dyn std::error::Error>> {
    Ok(CliArgs::parse())
}
