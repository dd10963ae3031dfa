/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command-line interface of the `pagerank` binary.

use crate::utils::Granularity;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

pub mod pagerank;

/// Parses the number of threads used both for ingestion and for the
/// iterations.
pub fn num_threads_parser(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(num_threads) if num_threads > 0 => Ok(num_threads),
        Ok(_) => bail!("The number of threads must be positive"),
        Err(err) => Err(anyhow!("Invalid number of threads {:?}: {}", arg, err)),
    }
}

/// Parses the number of highest-ranked nodes shown in the report.
pub fn top_k_parser(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(top_k) if top_k > 0 => Ok(top_k),
        _ => bail!(
            "Invalid K value {:?}: the number of top nodes must be positive",
            arg
        ),
    }
}

/// Parses the interval between progress logs, either in a friendly format
/// (e.g., `10s`, `1m 30s`, `500ms`) or as an ISO 8601 duration (e.g., `PT10S`).
fn log_interval_parser(arg: &str) -> Result<Duration> {
    let duration = arg
        .parse::<jiff::SignedDuration>()
        .with_context(|| format!("Invalid log interval {:?}", arg))?;
    Duration::try_from(duration)
        .with_context(|| format!("Negative log interval {:?}", arg))
}

/// How the nodes are split into tasks in the map phase of each iteration.
#[derive(Args, Debug)]
pub struct GranularityArgs {
    #[arg(long, conflicts_with("node_granularity"))]
    /// Size each map task so that it sums up, tentatively, this many
    /// incoming arcs (advanced option).
    pub arc_granularity: Option<u64>,

    #[arg(long, conflicts_with("arc_granularity"))]
    /// Give each map task this many consecutive nodes (advanced option;
    /// default: one node per task).
    pub node_granularity: Option<usize>,
}

impl GranularityArgs {
    /// Returns the granularity of the map tasks; clap guarantees that at
    /// most one option is set.
    pub fn granularity(&self) -> Granularity {
        self.arc_granularity
            .map(Granularity::Arcs)
            .or(self.node_granularity.map(Granularity::Nodes))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
/// Formats for storing vectors of floats.
pub enum FloatVectorFormat {
    /// Java-compatible format: a sequence of big-endian doubles.
    Java,
    /// ASCII format, one float per line.
    Ascii,
    /// A JSON Array.
    Json,
}

impl FloatVectorFormat {
    /// Stores float values in the specified `path` using the format defined by
    /// `self`.
    ///
    /// If the result is a textual format, that is, ASCII or JSON, `precision`
    /// will be used to truncate the float values to the specified number of
    /// decimal digits. If `None`, the shortest representation that parses
    /// back to the same value is used.
    pub fn store(
        &self,
        path: impl AsRef<Path>,
        values: &[f64],
        precision: Option<usize>,
    ) -> Result<()> {
        let path_display = path.as_ref().display();
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create the directory of {}", path_display))?;
        }
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Could not create vector at {}", path_display))?;
        let mut file = BufWriter::new(file);

        match self {
            FloatVectorFormat::Java => {
                log::info!("Storing in Java format at {}", path_display);
                for value in values.iter() {
                    file.write_all(&value.to_be_bytes())
                        .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
            FloatVectorFormat::Ascii => {
                log::info!("Storing in ASCII format at {}", path_display);
                for value in values.iter() {
                    match precision {
                        None => writeln!(file, "{value}"),
                        Some(precision) => writeln!(file, "{value:.precision$}"),
                    }
                    .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
            }
            FloatVectorFormat::Json => {
                log::info!("Storing in JSON format at {}", path_display);
                write!(file, "[")?;
                for (i, value) in values.iter().enumerate() {
                    let sep = if i == 0 { "" } else { ", " };
                    match precision {
                        None => write!(file, "{sep}{value}"),
                        Some(precision) => write!(file, "{sep}{value:.precision$}"),
                    }
                    .with_context(|| format!("Could not write vector to {}", path_display))?;
                }
                write!(file, "]")?;
            }
        }

        file.flush()
            .with_context(|| format!("Could not write vector to {}", path_display))?;
        Ok(())
    }
}

/// Initializes `env_logger` with a format showing the wall-clock time (UTC),
/// the time elapsed since initialization, and the thread name.
///
/// The default level is `info`; use the `RUST_LOG` environment variable to
/// change it.
pub fn init_env_logger() -> Result<()> {
    let start = std::time::Instant::now();
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format(move |buf, record| {
        let elapsed = jiff::SignedDuration::from_millis(start.elapsed().as_millis() as i64);
        let style = buf.default_level_style(record.level());
        let thread = std::thread::current();
        writeln!(
            buf,
            "{} +{:#} {style}{:5}{style:#} [{}] {} - {}",
            jiff::Timestamp::now().strftime("%F %T%.3f"),
            elapsed,
            record.level(),
            thread.name().unwrap_or("?"),
            record.target(),
            record.args()
        )
    });
    builder.try_init()?;
    Ok(())
}

/// Formats a fatal error, with its chain of causes, on a single line.
pub fn diagnostic(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    #[arg(long, value_parser = log_interval_parser, global = true, display_order = 1000)]
    /// How often to log the progress of ingestion and iterations (e.g.,
    /// "30s", "2m", "1m 30s"; default: 10s).
    pub log_interval: Option<Duration>,
}

#[derive(Parser, Debug)]
#[command(name = "pagerank", version)]
/// Computes PageRank on a graph in coordinate format using a parallel Jacobi
/// iteration.
///
/// Sending SIGUSR1 to the process prints on standard error the current
/// iteration, the highest-ranked node, and its rank.
pub struct Cli {
    #[clap(flatten)]
    pub args: GlobalArgs,
    #[clap(flatten)]
    pub pagerank: pagerank::CliArgs,
}

/// Parses `args` (including the program name) and runs `pagerank`, writing
/// the report on standard output.
///
/// Invalid arguments make clap print a usage message and exit.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    pagerank::main(cli.args, cli.pagerank)
}
