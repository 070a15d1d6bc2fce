//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate a score or threshold (0.0-1.0)
fn parse_unit(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Value must be between 0 and 1, got {}", value));
    }
    Ok(value)
}

/// Automatic photobooth and client for the event backend
#[derive(Parser, Debug)]
#[command(name = "photobooth")]
#[command(version, about = "People-triggered photobooth and event backend client", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (default: $PHOTOBOOTH_API_BASE or http://localhost:8000)
    #[arg(long, global = true)]
    pub api_base: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch the camera and take a photo whenever people show up
    Booth(BoothArgs),
    /// List gallery images
    Gallery {
        /// Page size (1-500)
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Page offset
        #[arg(long, default_value = "0")]
        offset: u32,
    },
    /// Moderate captured photos
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Control the remote capture device
    Robot {
        #[command(subcommand)]
        action: RobotAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct BoothArgs {
    /// Directory of still images or http(s) snapshot URL
    #[arg(long, short)]
    pub source: Option<String>,

    /// Detection service base URL
    #[arg(long, short)]
    pub detector: Option<String>,

    /// Do not mirror frames
    #[arg(long)]
    pub no_mirror: bool,

    /// Write the annotated frame to this image file each cycle
    #[arg(long)]
    pub overlay: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AdminAction {
    /// List photos with scores, threshold and approved count
    List,
    /// Set the gallery threshold
    Threshold {
        #[arg(value_parser = parse_unit)]
        value: f64,
    },
    /// Override the score of a photo
    Score {
        id: String,
        #[arg(value_parser = parse_unit)]
        value: f64,
    },
    /// Delete a photo
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotAction {
    Start,
    Stop,
    Status,
    /// Capture a photo now
    Capture,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
