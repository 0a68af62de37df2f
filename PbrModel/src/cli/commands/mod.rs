use clap::Subcommand;
use std::path::PathBuf;
use std::str::FromStr;

use crate::batch::BatchOperation;
use crate::sdr::{Revision, Variant, WriteOptions};

pub mod batch;
pub mod model;
pub mod texture;

/// Container variant argument
#[derive(Debug, Clone, Copy)]
pub struct VariantArg(pub Variant);

impl FromStr for VariantArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sdr" | "1" => Ok(VariantArg(Variant::Sdr)),
            "odr" | "2" => Ok(VariantArg(Variant::Odr)),
            "mdr" | "3" => Ok(VariantArg(Variant::Mdr)),
            _ => Err(format!("Invalid variant '{s}'. Valid values: sdr, odr, mdr")),
        }
    }
}

/// Batch operation argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchArg {
    Rebuild,
    Textures,
    Info,
}

impl FromStr for BatchArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rebuild" => Ok(BatchArg::Rebuild),
            "textures" | "png" => Ok(BatchArg::Textures),
            "info" | "json" => Ok(BatchArg::Info),
            _ => Err(format!("Invalid operation '{s}'. Valid values: rebuild, textures, info")),
        }
    }
}

/// Serializer options from the shared `--legacy` and `--variant` flags.
fn write_options(legacy: bool, variant: Option<VariantArg>) -> WriteOptions {
    let revision = if legacy { Revision::Legacy } else { Revision::Current };
    let options = WriteOptions::default().with_revision(revision);
    match variant {
        Some(VariantArg(variant)) => options.with_variant(variant),
        None => options,
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the structure of a model file
    Inspect {
        /// Model file (.sdr, .odr, .mdr)
        source: PathBuf,

        /// List every bone
        #[arg(short, long)]
        bones: bool,
    },

    /// Write a JSON summary of a model file
    Info {
        /// Model file
        source: PathBuf,

        /// Output JSON file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a model's textures as PNG
    Textures {
        /// Model file
        source: PathBuf,

        /// Output directory
        destination: PathBuf,
    },

    /// Replace one texture of a model with a PNG, keeping its encoding
    ReplaceTexture {
        /// Model file
        source: PathBuf,

        /// Texture index
        index: usize,

        /// Replacement image
        image: PathBuf,

        /// Output model file
        output: PathBuf,

        /// Write with the legacy layout revision
        #[arg(long)]
        legacy: bool,
    },

    /// Parse a model and serialize it again
    Rebuild {
        /// Model file
        source: PathBuf,

        /// Output model file
        output: PathBuf,

        /// Write with the legacy layout revision
        #[arg(long)]
        legacy: bool,

        /// Write as another variant (sdr, odr, mdr)
        #[arg(long)]
        variant: Option<VariantArg>,
    },

    /// Process every model under a directory in parallel
    Batch {
        /// Source directory
        source: PathBuf,

        /// Output directory
        destination: PathBuf,

        /// Operation (rebuild, textures, info)
        #[arg(short, long, default_value = "info")]
        operation: BatchArg,

        /// Write with the legacy layout revision (rebuild only)
        #[arg(long)]
        legacy: bool,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Inspect { source, bones } => model::inspect(source, *bones),
            Commands::Info { source, output } => model::info(source, output.as_deref()),
            Commands::Textures { source, destination } => texture::export(source, destination),
            Commands::ReplaceTexture {
                source,
                index,
                image,
                output,
                legacy,
            } => texture::replace(source, *index, image, output, write_options(*legacy, None)),
            Commands::Rebuild {
                source,
                output,
                legacy,
                variant,
            } => model::rebuild(source, output, write_options(*legacy, *variant)),
            Commands::Batch {
                source,
                destination,
                operation,
                legacy,
                quiet,
            } => {
                let operation = match operation {
                    BatchArg::Rebuild => BatchOperation::Rebuild(write_options(*legacy, None)),
                    BatchArg::Textures => BatchOperation::ExportTextures,
                    BatchArg::Info => BatchOperation::Info,
                };
                batch::run(source, destination, operation, *quiet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_arg() {
        assert!(matches!("ODR".parse::<VariantArg>(), Ok(VariantArg(Variant::Odr))));
        assert!("xdr".parse::<VariantArg>().is_err());
    }

    #[test]
    fn test_write_options_from_flags() {
        let options = write_options(true, Some(VariantArg(Variant::Mdr)));
        assert_eq!(options.revision, Revision::Legacy);
        assert_eq!(options.variant, Some(Variant::Mdr));
    }
}
