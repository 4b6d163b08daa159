//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

// This is the CLI tool of CfgForge: build config archives from sheets, inspect the results.

use clap::{Parser, Subcommand};
use log::error;
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, TermLogger, TerminalMode};

use std::path::PathBuf;
use std::process::exit;

use cfgforge_lib::error::CfgLibError;

use crate::config::Config;

mod commands;
mod config;

/// Exit code of a failed build.
const EXIT_BUILD_ERROR: i32 = 1;

/// Exit code of a build that failed validation.
const EXIT_VALIDATION_ERROR: i32 = 2;

/// Exit code of an IO problem.
const EXIT_IO_ERROR: i32 = 3;

//---------------------------------------------------------------------------//
//                              CLI definition
//---------------------------------------------------------------------------//

#[derive(Parser)]
#[command(name = "cfgforge", version, about = "Build and inspect CfgForge game config archives.")]
struct Cli {

    /// Sets the level of verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {

    /// Builds a config archive from a build manifest.
    Build {

        /// Path of the build manifest (RON).
        #[arg(short, long, value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Path the archive is written to.
        #[arg(short, long, value_name = "ARCHIVE")]
        output: PathBuf,

        /// Path of a parent archive for an incremental build.
        #[arg(short, long, value_name = "PARENT")]
        parent: Option<PathBuf>,
    },

    /// Inspects existing archives.
    Archive {

        /// Path of the archive.
        #[arg(short, long, value_name = "ARCHIVE")]
        archive: PathBuf,

        #[command(subcommand)]
        command: ArchiveCommands,
    },
}

#[derive(Subcommand)]
enum ArchiveCommands {

    /// Lists the entries of the archive, nested ones included.
    List,

    /// Prints the metadata and version info of the archive.
    Inspect,
}

//---------------------------------------------------------------------------//
//                                  Main
//---------------------------------------------------------------------------//

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = CombinedLogger::init(vec![
        TermLogger::new(level, simplelog::Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
    ]);

    let config = Config { verbosity_level: cli.verbose };

    let result = match cli.command {
        Commands::Build { manifest, output, parent } => commands::build::build(&config, &manifest, &output, parent.as_deref()),
        Commands::Archive { archive, command } => match command {
            ArchiveCommands::List => commands::archive::list(&config, &archive),
            ArchiveCommands::Inspect => commands::archive::inspect(&config, &archive),
        },
    };

    match result {
        Ok(()) => exit(0),
        Err(error) => {
            let code = match error.downcast_ref::<CfgLibError>() {
                Some(CfgLibError::ValidationFailed(_)) => EXIT_VALIDATION_ERROR,
                Some(CfgLibError::IOError(_)) => EXIT_IO_ERROR,
                Some(_) => EXIT_BUILD_ERROR,
                None => if error.downcast_ref::<std::io::Error>().is_some() { EXIT_IO_ERROR } else { EXIT_BUILD_ERROR },
            };
            error!("{error:#}");
            eprintln!("{error:#}");
            exit(code);
        },
    }
}
