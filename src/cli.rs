use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate subtitles for a single media file
    Process {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to the file's own directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Spoken language of the source media
        #[arg(short, long, default_value = "en")]
        from_lang: String,

        /// Language to translate subtitles into
        #[arg(short, long, default_value = "en")]
        to_lang: String,

        /// Model precision tier (draft, base, balanced, cinema, max)
        #[arg(long, default_value = "balanced")]
        tier: String,

        /// Compute target (gpu, cpu)
        #[arg(long, default_value = "gpu")]
        compute: String,
    },

    /// Generate subtitles for every media file under a directory
    Batch {
        /// Input directory containing media files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory (defaults to each file's own directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Spoken language of the source media
        #[arg(short, long, default_value = "en")]
        from_lang: String,

        /// Language to translate subtitles into
        #[arg(short, long, default_value = "en")]
        to_lang: String,

        /// Model precision tier (draft, base, balanced, cinema, max)
        #[arg(long, default_value = "balanced")]
        tier: String,

        /// Compute target (gpu, cpu)
        #[arg(long, default_value = "gpu")]
        compute: String,
    },

    /// List model precision tiers
    Tiers,
}
