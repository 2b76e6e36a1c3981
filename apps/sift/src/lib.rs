use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use sift_service::{AnalyzeRequest, RewriteRequest, SiftService, VariantRequest};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Print the document's chunks. Needs no network access.
	Chunk {
		#[arg(long, short = 'd', value_name = "FILE")]
		document: PathBuf,
	},
	/// Score every query against every chunk and assign queries to chunks.
	Analyze {
		#[arg(long, short = 'd', value_name = "FILE")]
		document: PathBuf,
		/// One query per line; blank lines and `#` comments are skipped.
		#[arg(long, short = 'q', value_name = "FILE")]
		queries: PathBuf,
		/// Manual override applied after the greedy pass, as `QUERY=CHUNK_INDEX`.
		#[arg(long = "reassign", value_name = "QUERY=INDEX")]
		reassign: Vec<String>,
	},
	/// Sort query variants into optimization opportunities, gaps, drift and out-of-scope.
	Categorize {
		#[arg(long, short = 'd', value_name = "FILE")]
		document: PathBuf,
		#[arg(long, short = 'p', value_name = "QUERY")]
		primary: String,
		#[arg(long, short = 'v', value_name = "FILE")]
		variants: PathBuf,
	},
	/// Rewrite one chunk toward a query and compare scores.
	Rewrite {
		#[arg(long, short = 'd', value_name = "FILE")]
		document: PathBuf,
		#[arg(long, value_name = "N")]
		chunk: usize,
		#[arg(long, short = 'q', value_name = "QUERY")]
		query: String,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sift_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let service = SiftService::new(config)?;
	let json = match args.command {
		Command::Chunk { document } => {
			let chunks = service.chunk(&read_document(&document)?)?;

			serde_json::to_string_pretty(&chunks)?
		},
		Command::Analyze { document, queries, reassign } => {
			let overrides: Vec<(String, usize)> =
				reassign.iter().map(|raw| parse_override(raw)).collect::<color_eyre::Result<_>>()?;
			let mut report = service
				.analyze(AnalyzeRequest {
					document: read_document(&document)?,
					queries: read_queries(&queries)?,
				})
				.await?;

			for (query, chunk_index) in overrides {
				if let Some(evicted) = report.reassign(&query, chunk_index)? {
					tracing::info!(
						query = %query,
						chunk_index,
						evicted = %evicted,
						"Manual reassignment evicted a query."
					);
				}
			}

			serde_json::to_string_pretty(&report)?
		},
		Command::Categorize { document, primary, variants } => {
			let report = service
				.categorize_variants(VariantRequest {
					document: read_document(&document)?,
					primary_query: primary,
					variants: read_queries(&variants)?,
				})
				.await?;

			serde_json::to_string_pretty(&report)?
		},
		Command::Rewrite { document, chunk, query } => {
			let outcome = service
				.rewrite_chunk(RewriteRequest {
					document: read_document(&document)?,
					chunk_index: chunk,
					query,
				})
				.await?;

			serde_json::to_string_pretty(&outcome)?
		},
	};

	println!("{json}");

	Ok(())
}

/// One query per line. Blank lines and lines starting with `#` are skipped.
pub fn parse_query_lines(raw: &str) -> Vec<String> {
	raw.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect()
}

/// `QUERY=INDEX`, split at the last `=` so queries may contain one.
pub fn parse_override(raw: &str) -> color_eyre::Result<(String, usize)> {
	let Some((query, index)) = raw.rsplit_once('=') else {
		return Err(eyre::eyre!("Reassignment {raw:?} must look like QUERY=INDEX."));
	};
	let query = query.trim();

	if query.is_empty() {
		return Err(eyre::eyre!("Reassignment {raw:?} has an empty query."));
	}

	let index = index
		.trim()
		.parse::<usize>()
		.map_err(|_| eyre::eyre!("Reassignment {raw:?} has a non-numeric chunk index."))?;

	Ok((query.to_string(), index))
}

fn read_document(path: &Path) -> color_eyre::Result<String> {
	fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read document at {}: {err}.", path.display()))
}

fn read_queries(path: &Path) -> color_eyre::Result<Vec<String>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read queries at {}: {err}.", path.display()))?;

	Ok(parse_query_lines(&raw))
}
