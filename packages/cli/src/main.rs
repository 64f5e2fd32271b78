#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for BDEW segment layout extraction.
//!
//! Reads a JSON dump of per-page table grids (one `null` or array of rows
//! per page, as produced by a pdfplumber-style `extract_table` pass) and
//! prints the parsed segment layout tables as JSON.

mod select;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bdew_mig::config::load_config;
use bdew_mig::index::{self, IndexLocator};
use bdew_mig::{MigError, PageSource};
use bdew_mig_models::{ExtractConfig, GridDocument, IndexEntry, SegmentTable};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::select::{TableSelection, select_tables};

#[derive(Parser)]
#[command(name = "bdew-mig", about = "BDEW message implementation guide table extraction")]
struct Cli {
    /// TOML file overriding the extraction heuristics
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the records of the segment layout tables
    Extract {
        /// JSON file with one table grid per page
        file: PathBuf,
        /// Which tables to print
        #[arg(long, value_enum, default_value = "first-last")]
        select: TableSelection,
        /// Also print extra header rows and notes blocks
        #[arg(long)]
        full: bool,
    },
    /// Print the table of contents and the resolved section range
    Index {
        /// JSON file with one table grid per page
        file: PathBuf,
    },
    /// Print the page span and row count of every stitched table
    Stitch {
        /// JSON file with one table grid per page
        file: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct IndexReport {
    entries: Vec<IndexEntry>,
    section: String,
    start: usize,
    stop: usize,
}

#[derive(Serialize)]
struct StitchReport {
    first_page: usize,
    last_page: usize,
    rows: usize,
}

/// Parses the table of contents once and resolves the section from it.
fn index_report(document: &GridDocument, config: &ExtractConfig) -> Result<IndexReport, MigError> {
    let index_grid = document.page_grid(0).ok_or(MigError::IndexPageMissing)?;
    let entries = IndexLocator::new(config)?.entries(&index_grid)?;
    let range = index::resolve_section(&entries, &config.section_title)?;

    Ok(IndexReport {
        entries,
        section: config.section_title.clone(),
        start: range.start,
        stop: range.stop_or(document.page_count()),
    })
}

fn load_document(path: &Path) -> Result<GridDocument, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let document: GridDocument = serde_json::from_reader(reader)?;

    log::info!("Loaded {} pages from {}", document.len(), path.display());

    Ok(document)
}

fn print_json(value: &impl Serialize, pretty: bool) -> Result<(), serde_json::Error> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ExtractConfig::default(),
    };

    match cli.command {
        Commands::Extract { file, select, full } => {
            let document = load_document(&file)?;
            let tables = bdew_mig::segment_layout_tables_with_config(&document, config)?;
            let selected: Vec<SegmentTable> = select_tables(tables, select)?;

            log::info!("Printing {} table(s)", selected.len());

            if full {
                print_json(&selected, cli.pretty)?;
            } else {
                let records: Vec<_> = selected.into_iter().map(|table| table.records).collect();
                print_json(&records, cli.pretty)?;
            }
        }
        Commands::Index { file } => {
            let document = load_document(&file)?;
            print_json(&index_report(&document, &config)?, cli.pretty)?;
        }
        Commands::Stitch { file } => {
            let document = load_document(&file)?;
            let reports = bdew_mig::stitch_pages_with_config(&document, &config)?
                .map(|table| {
                    table.map(|table| StitchReport {
                        first_page: table.first_page,
                        last_page: table.last_page,
                        rows: table.rows.len(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            print_json(&reports, cli.pretty)?;
        }
    }

    Ok(())
}
