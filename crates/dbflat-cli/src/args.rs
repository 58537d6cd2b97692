//! Command-line argument model

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};
use dbflat_interchange::{DelimiterConfig, Verbosity};

use crate::escape::unescape;
use crate::settings::FormatSettings;

#[derive(Debug, Parser)]
#[command(
    name = "dbflat",
    version,
    about = "Export query results to delimited text files and load them back into tables",
    after_help = r#"EXAMPLES
  $ dbflat --database property.db export Configuration -o config.txt
  $ dbflat export Properties --top 500 --binary-format -o props.bin
  $ dbflat import config_copy -i config.txt --drop-existing
  $ dbflat import staging -i data.txt --column-separator '\t' --row-separator '\r\n'"#
)]
pub struct Cli {
    /// SQLite database file
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "DBFLAT_DATABASE",
        value_hint = ValueHint::FilePath
    )]
    pub database: Option<String>,

    /// Settings file, applied over ~/.dbflat.toml
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// silent, quiet, normal, detailed or debug
    #[arg(long, short = 'v', global = true, value_name = "LEVEL")]
    pub verbose: Option<Verbosity>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the rows of a predefined query as delimited text
    Export(ExportArgs),
    /// Load a delimited file into an existing table in one transaction
    Import(ImportArgs),
    /// Open the database and run a trivial query
    Check,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Configuration, Properties or Cama
    pub variant: String,

    /// Output file (created or truncated); standard output when omitted
    #[arg(short = 'o', long = "outfile", value_hint = ValueHint::FilePath)]
    pub outfile: Option<PathBuf>,

    /// Limit the number of leading records for variants that support it
    #[arg(long, value_name = "N")]
    pub top: Option<u64>,

    #[command(flatten)]
    pub format: FormatArgs,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Target table, optionally schema-qualified
    pub table: String,

    /// Input file
    #[arg(short = 'i', long = "infile", value_hint = ValueHint::FilePath)]
    pub infile: PathBuf,

    /// Delete existing rows before inserting, inside the same transaction
    #[arg(long)]
    pub drop_existing: bool,

    #[command(flatten)]
    pub format: FormatArgs,
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Use 0x1F/0x1E separators and write NULL as \N; overrides custom separators
    #[arg(long)]
    pub binary_format: bool,

    /// Column separator (escapes such as \t and \x1f allowed)
    #[arg(long, value_name = "SEP", value_parser = unescape)]
    pub column_separator: Option<String>,

    /// Row separator (escapes such as \n and \r\n allowed)
    #[arg(long, value_name = "SEP", value_parser = unescape)]
    pub row_separator: Option<String>,
}

impl FormatArgs {
    /// Flags first, then the settings file, then built-in defaults
    pub fn delimiters(&self, defaults: &FormatSettings) -> DelimiterConfig {
        DelimiterConfig::resolve(
            self.binary_format,
            self.column_separator
                .clone()
                .or_else(|| defaults.column_separator.clone()),
            self.row_separator
                .clone()
                .or_else(|| defaults.row_separator.clone()),
        )
    }
}
