//! Command line interface for bezy-objects
//!
//! Opens a UFO as an observable object graph, either to print a summary or
//! to watch it for changes made by other programs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bezy-objects CLI arguments
///
/// Examples:
///   bezy-objects inspect MyFont.ufo                 # Summary of the whole font
///   bezy-objects inspect MyFont.ufo --glyph A -g B  # Include outline data for A and B
///   bezy-objects monitor MyFont.ufo --all           # Watch every resource for external edits
///   bezy-objects init-config                        # Write ~/.config/bezy/objects.json
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "bezy-objects",
    version,
    about = "Observable UFO font objects with external change detection"
)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,

    /// Reject duplicate observer registrations
    #[clap(long, global = true)]
    pub strict: bool,

    /// Log filter, e.g. "debug" or "bezy_objects=trace"
    #[clap(
        long = "log-filter",
        global = true,
        long_help = "Tracing filter directive. Overrides the config file and RUST_LOG. Examples: info, debug, bezy_objects::external=trace"
    )]
    pub log_filter: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print a JSON summary of a UFO
    Inspect {
        /// Path to a UFO directory
        ufo: PathBuf,

        /// Glyphs to load and describe (bounds, area, contours)
        #[clap(long = "glyph", short = 'g')]
        glyphs: Vec<String>,
    },

    /// Load resources, then test for external changes on every line read
    /// from stdin
    ///
    /// Input lines: empty or "check" tests and prints the report, "reload"
    /// reloads everything changed on disk that has no unsaved edits, "quit"
    /// exits.
    Monitor {
        /// Path to a UFO directory
        ufo: PathBuf,

        /// Glyphs to load and watch
        #[clap(long = "glyph", short = 'g')]
        glyphs: Vec<String>,

        /// Load every glyph and font level resource
        #[clap(long)]
        all: bool,
    },

    /// Write the default config file
    InitConfig,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    pub fn validate(&self) -> Result<(), String> {
        let ufo = match &self.command {
            Command::Inspect { ufo, .. } | Command::Monitor { ufo, .. } => ufo,
            Command::InitConfig => return Ok(()),
        };
        if !ufo.is_dir() {
            return Err(format!(
                "Not a UFO directory: {}\nMake sure the path is correct.",
                ufo.display()
            ));
        }
        if !ufo.join("metainfo.plist").exists() {
            return Err(format!(
                "Not a valid UFO directory: missing metainfo.plist in {}",
                ufo.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_monitor_with_global_flags() {
        let args = CliArgs::try_parse_from([
            "bezy-objects",
            "monitor",
            "Font.ufo",
            "-g",
            "A",
            "--glyph",
            "B",
            "--strict",
        ])
        .unwrap();
        assert!(args.strict);
        match args.command {
            Command::Monitor { glyphs, all, .. } => {
                assert_eq!(glyphs, vec!["A", "B"]);
                assert!(!all);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_ufo_fails_validation() {
        let args = CliArgs::try_parse_from(["bezy-objects", "inspect", "/nonexistent/Font.ufo"])
            .unwrap();
        assert!(args.validate().is_err());
        let init = CliArgs::try_parse_from(["bezy-objects", "init-config"]).unwrap();
        assert!(init.validate().is_ok());
    }
}
