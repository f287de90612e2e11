use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "image-sources",
    version,
    about = "Fetch an image through a source and store it in the content cache",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Content cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Content cache budget in bytes.
    #[arg(long, value_name = "BYTES")]
    pub cache_max_size: Option<u64>,

    /// Time allowed for one fetch, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Prefix for storage blob addresses.
    #[arg(long, value_name = "URL", env = "IMAGE_SOURCES_STORAGE_URL")]
    pub storage_base_url: Option<String>,

    /// What to fetch.
    #[command(subcommand)]
    pub command: Command,
}

/// Source to build.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// An image at a web address.
    Url {
        /// Address to fetch.
        url: String,
        /// Box width to shrink into.
        #[arg(long)]
        width: Option<u32>,
        /// Box height to shrink into.
        #[arg(long)]
        height: Option<u32>,
    },
    /// A file served through the web-document proxy.
    Web {
        /// Address of the proxied file.
        url: String,
        /// Access hash issued with the location.
        #[arg(long, default_value_t = 0)]
        access_hash: u64,
        /// Box width to shrink into.
        #[arg(long)]
        width: Option<u32>,
        /// Box height to shrink into.
        #[arg(long)]
        height: Option<u32>,
    },
    /// A cloud storage blob.
    Storage {
        /// Storage cluster.
        dc_id: i32,
        /// Volume within the cluster.
        volume_id: u64,
        /// Identifier within the volume.
        #[arg(allow_negative_numbers = true)]
        local_id: i32,
        /// Access token, hex encoded.
        #[arg(long)]
        file_reference: Option<String>,
        /// Expected size in bytes.
        #[arg(long, default_value_t = 0)]
        size: u64,
    },
    /// A rendered map tile.
    Geo {
        /// Latitude in degrees.
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees.
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        /// Tile width in points.
        #[arg(long, default_value_t = 320)]
        width: u32,
        /// Tile height in points.
        #[arg(long, default_value_t = 240)]
        height: u32,
        /// Map zoom level.
        #[arg(long, default_value_t = 15)]
        zoom: u8,
        /// Pixel density multiplier.
        #[arg(long, default_value_t = 2)]
        scale: u8,
    },
    /// A file on disk.
    File {
        /// Path to the image.
        path: PathBuf,
    },
    /// Remove every entry from the content cache.
    ClearCache,
}
