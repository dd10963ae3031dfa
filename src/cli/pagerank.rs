/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{num_threads_parser, top_k_parser, FloatVectorFormat, GlobalArgs, GranularityArgs};
use crate::graphs::{try_ingest_with_logging, IngestOptions, DEFAULT_QUEUE_CAPACITY};
use crate::rank::{PageRank, PageRankConfig, ProgressMailbox, RankReport};
use crate::thread_pool::TaskPool;
use crate::utils::mtx::MtxReader;
use anyhow::{Context, Result};
use clap::Parser;
use dsi_progress_logger::{concurrent_progress_logger, progress_logger, ProgressLog};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pagerank",
    about = "Compute PageRank using parallel Jacobi iteration.",
    long_about = None
)]
pub struct CliArgs {
    /// The graph, in coordinate format (a header line starting with the
    /// number of nodes, followed by one-based arcs, one per line; lines
    /// starting with '%' are comments).
    pub infile: PathBuf,

    #[arg(short = 'k', long, default_value_t = 3, value_parser = top_k_parser)]
    /// The number of highest-ranked nodes to print (the table is omitted if
    /// it exceeds the number of nodes).
    pub top_k: usize,

    #[arg(short = 'm', long, default_value_t = PageRankConfig::default().max_iter)]
    /// Maximum number of iterations.
    pub max_iter: usize,

    #[arg(short = 'd', long, alias = "alpha", default_value_t = PageRankConfig::default().alpha)]
    /// The damping factor (must be in the interval (0 . . 1)).
    pub damping: f64,

    #[arg(short = 'e', long, default_value_t = PageRankConfig::default().threshold)]
    /// The ℓ₁ error threshold to stop.
    pub threshold: f64,

    #[arg(
        short = 't',
        long,
        default_value_t = PageRankConfig::default().num_threads,
        value_parser = num_threads_parser
    )]
    /// The number of threads used for ingestion and for the iterations.
    pub num_threads: usize,

    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    /// The capacity of the queue between the reader and the ingestion
    /// threads.
    pub queue_capacity: usize,

    #[arg(short, long)]
    /// Where to store the rank vector.
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FloatVectorFormat::Ascii)]
    /// The output format for the rank vector.
    pub fmt: FloatVectorFormat,

    #[arg(long)]
    /// Decimal digits for text output formats.
    pub precision: Option<usize>,

    #[clap(flatten)]
    pub granularity: GranularityArgs,
}

pub fn main(global_args: GlobalArgs, args: CliArgs) -> Result<()> {
    let stdout = std::io::stdout();
    pagerank(global_args, args, &mut stdout.lock())
}

/// Reads the graph, computes PageRank, and writes the [report](RankReport)
/// on `out`.
pub fn pagerank(global_args: GlobalArgs, args: CliArgs, out: &mut impl Write) -> Result<()> {
    let config = PageRankConfig {
        alpha: args.damping,
        threshold: args.threshold,
        max_iter: args.max_iter,
        num_threads: args.num_threads,
    };
    config.validate()?;

    // Must happen before any other thread is spawned
    #[cfg(unix)]
    crate::signal::block_progress_signal().context("Could not block SIGUSR1")?;

    let mut reader = MtxReader::open(&args.infile)
        .with_context(|| format!("Could not read the graph at {}", args.infile.display()))?;
    let num_nodes = reader.num_nodes();
    log::info!(
        "Reading a graph with {} nodes from {}",
        num_nodes,
        args.infile.display()
    );

    let mut cpl = concurrent_progress_logger![];
    if let Some(log_interval) = global_args.log_interval {
        cpl.log_interval(log_interval);
    }

    let options = IngestOptions {
        num_threads: config.num_threads,
        queue_capacity: args.queue_capacity,
        ..Default::default()
    };
    let graph = try_ingest_with_logging(num_nodes, reader.arcs(), &options, &mut cpl)
        .with_context(|| format!("Could not ingest the graph at {}", args.infile.display()))?;
    if reader.num_discarded() > 0 {
        log::warn!("Skipped {} malformed lines", reader.num_discarded());
    }

    let pool = TaskPool::new(config.num_threads)?;
    let mailbox = ProgressMailbox::new();
    #[cfg(unix)]
    let listener = crate::signal::SignalListener::spawn(mailbox.clone())
        .context("Could not start the signal listener")?;

    let mut pl = progress_logger![];
    if let Some(log_interval) = global_args.log_interval {
        pl.log_interval(log_interval);
    }

    let mut pr = PageRank::new(&graph, &pool);
    config.configure(&mut pr)?;
    pr.granularity(args.granularity.granularity())
        .progress(Some(&mailbox));
    let result = pr.run_with_logging(&mut pl);

    #[cfg(unix)]
    listener.stop();
    pool.shutdown();

    write!(out, "{}", RankReport::new(&graph, &result, args.top_k))?;
    out.flush()?;

    if let Some(output) = &args.output {
        args.fmt.store(output, &result.rank, args.precision)?;
    }

    Ok(())
}
