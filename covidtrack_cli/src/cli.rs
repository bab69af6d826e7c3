use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use covidtrack::{
    aggregate::Alignment,
    config::Config,
    formatters::{
        CsvFormatter, JsonColumnsFormatter, JsonRecordsFormatter, OutputFormatter,
        OutputGenerator, ParquetFormatter,
    },
    metric::Metric,
    region::RegionCode,
    series::{ColumnKey, SeriesTable},
    table::CanonicalTable,
    views::{self, Scaling},
    Covidtrack,
};
use enum_dispatch::enum_dispatch;
use log::{debug, info};
use nonempty::NonEmpty;
use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum_macros::EnumString;

use crate::display::{display_refresh_summary, display_regions};
use crate::error::CovidtrackCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const DOWNLOADING_STRING: &str = "Downloading and rebuilding daily reports";

/// Defines the output formats we are able to produce data in.
#[derive(Clone, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    Csv,
    Json,
    JsonColumns,
    Parquet,
    Stdout,
}

impl OutputFormat {
    /// The file formatter for this format, or `None` when results are printed as a table.
    fn formatter(&self) -> Option<OutputFormatter> {
        match self {
            OutputFormat::Csv => Some(OutputFormatter::Csv(CsvFormatter)),
            OutputFormat::Json => Some(OutputFormatter::JsonRecords(JsonRecordsFormatter)),
            OutputFormat::JsonColumns => Some(OutputFormatter::JsonColumns(JsonColumnsFormatter)),
            OutputFormat::Parquet => Some(OutputFormatter::Parquet(ParquetFormatter)),
            OutputFormat::Stdout => None,
        }
    }
}

fn write_output<T, U>(
    output_generator: T,
    mut data: DataFrame,
    output_file: Option<U>,
) -> CovidtrackCliResult<()>
where
    T: OutputGenerator,
    U: AsRef<Path>,
{
    if let Some(output_file) = output_file {
        let mut f = File::create(output_file).context("Failed to write output")?;
        output_generator.save(&mut f, &mut data)?;
    } else {
        let mut stdout_lock = std::io::stdout().lock();
        output_generator.save(&mut stdout_lock, &mut data)?;
    };
    Ok(())
}

/// Output arguments shared by every command that produces a table.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(
        short = 'f',
        long,
        value_name = "csv|json|jsoncolumns|parquet|stdout",
        default_value = "stdout",
        help = "Output format for the results"
    )]
    output_format: OutputFormat,
    #[arg(short = 'o', long, help = "Output file to place the results")]
    output_file: Option<String>,
}

impl OutputArgs {
    fn write(&self, data: DataFrame) -> CovidtrackCliResult<()> {
        match self.output_format.formatter() {
            Some(formatter) => write_output(formatter, data, self.output_file.as_deref()),
            None => {
                println!("{data}");
                Ok(())
            }
        }
    }
}

/// Rolling mean decoration shared by the series commands.
#[derive(Args, Debug, Clone, Default)]
pub struct RollingArgs {
    #[arg(
        short = 'w',
        long = "window",
        value_delimiter = ',',
        help = "Add a rolling mean of every column for each of these window lengths, e.g. `7,20`"
    )]
    windows: Vec<usize>,
    #[arg(
        long,
        help = "Report each rolling mean at the start of its window instead of the end"
    )]
    lead: bool,
}

impl RollingArgs {
    fn decorate(&self, series: SeriesTable) -> CovidtrackCliResult<SeriesTable> {
        match NonEmpty::from_vec(self.windows.clone()) {
            Some(windows) => {
                let alignment = if self.lead {
                    Alignment::Start
                } else {
                    Alignment::End
                };
                let columns: Vec<ColumnKey> = series.keys().cloned().collect();
                Ok(series.with_rolling(&columns, &windows, alignment)?)
            }
            None => Ok(series),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScalingArgs {
    #[arg(
        long = "per-capita",
        help = "Scale each region per 1,000,000 residents before summing. Regions without a \
                population are left out"
    )]
    per_capita: bool,
}

impl From<&ScalingArgs> for Scaling {
    fn from(value: &ScalingArgs) -> Self {
        if value.per_capita {
            Scaling::PerMillion
        } else {
            Scaling::Raw
        }
    }
}

/// Fetch the feed and build the canonical table, with a progress spinner unless `quiet`.
async fn build_table(config: Config, quiet: bool) -> CovidtrackCliResult<Arc<CanonicalTable>> {
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            DOWNLOADING_STRING.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let covidtrack = Covidtrack::new_with_config(config)?;
    let table = covidtrack.rebuild_canonical_table().await;
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
    Ok(table?)
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    async fn run(&self, config: Config) -> CovidtrackCliResult<()>;
}

/// The `national` command outputs the daily total of a metric over all regions.
#[derive(Args, Debug)]
pub struct NationalCommand {
    #[arg(
        short = 'm',
        long,
        default_value = "positiveIncrease",
        help = "Metric to sum, e.g. `positiveIncrease` or `deathIncrease`"
    )]
    metric: Metric,
    #[command(flatten)]
    scaling: ScalingArgs,
    #[command(flatten)]
    rolling: RollingArgs,
    #[command(flatten)]
    output: OutputArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for NationalCommand {
    async fn run(&self, config: Config) -> CovidtrackCliResult<()> {
        info!("Running `national` subcommand");
        let table = build_table(config, self.quiet).await?;
        let series = views::national_daily_sum(&table, self.metric, (&self.scaling).into())?;
        let series = self.rolling.decorate(series)?;
        debug!("{} rows", series.len());
        self.output.write(series.to_dataframe()?)
    }
}

/// The `region` command outputs one region's metrics over time.
#[derive(Args, Debug)]
pub struct RegionCommand {
    #[arg(index = 1, help = "Two letter region code, e.g. `NY`")]
    region: RegionCode,
    #[arg(
        short = 'm',
        long = "metric",
        value_delimiter = ',',
        default_value = "positiveIncrease",
        help = "Metrics to output, e.g. `positiveIncrease,positivityRate`"
    )]
    metrics: Vec<Metric>,
    #[arg(long, help = "Only output dates on or after this one (YYYY-MM-DD)")]
    since: Option<NaiveDate>,
    #[command(flatten)]
    scaling: ScalingArgs,
    #[command(flatten)]
    rolling: RollingArgs,
    #[command(flatten)]
    output: OutputArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for RegionCommand {
    async fn run(&self, config: Config) -> CovidtrackCliResult<()> {
        info!("Running `region` subcommand");
        let table = build_table(config, self.quiet).await?;
        let series = views::region_series(
            &table,
            &self.region,
            &self.metrics,
            self.since,
            (&self.scaling).into(),
        )?;
        if series.is_empty() {
            info!("No data for {}", self.region);
        }
        let series = self.rolling.decorate(series)?;
        self.output.write(series.to_dataframe()?)
    }
}

/// The `category` command outputs a metric summed per region category, one column each.
#[derive(Args, Debug)]
pub struct CategoryCommand {
    #[arg(short = 'm', long, default_value = "positiveIncrease", help = "Metric to sum")]
    metric: Metric,
    #[arg(long, help = "Output running totals instead of daily sums")]
    cumulative: bool,
    #[command(flatten)]
    scaling: ScalingArgs,
    #[command(flatten)]
    rolling: RollingArgs,
    #[command(flatten)]
    output: OutputArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for CategoryCommand {
    async fn run(&self, config: Config) -> CovidtrackCliResult<()> {
        info!("Running `category` subcommand");
        let table = build_table(config, self.quiet).await?;
        let series = views::category_grouped_sum(
            &table,
            self.metric,
            (&self.scaling).into(),
            self.cumulative,
        )?;
        let series = self.rolling.decorate(series)?;
        self.output.write(series.to_dataframe()?)
    }
}

/// The `regions` command lists the region selector options.
#[derive(Args, Debug)]
pub struct RegionsCommand;

impl RunCommand for RegionsCommand {
    async fn run(&self, _config: Config) -> CovidtrackCliResult<()> {
        info!("Running `regions` subcommand");
        display_regions();
        Ok(())
    }
}

/// The `snapshot` command outputs the whole canonical table.
#[derive(Args, Debug)]
pub struct SnapshotCommand {
    #[command(flatten)]
    output: OutputArgs,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for SnapshotCommand {
    async fn run(&self, config: Config) -> CovidtrackCliResult<()> {
        info!("Running `snapshot` subcommand");
        let table = build_table(config, self.quiet).await?;
        self.output.write(table.to_dataframe()?)
    }
}

/// The `watch` command rebuilds the canonical table on a fixed interval.
#[derive(Args, Debug)]
pub struct WatchCommand {
    #[arg(
        long,
        help = "Seconds between refreshes. Defaults to `refresh_interval_secs` from the config"
    )]
    interval: Option<u64>,
    #[arg(long, help = "Stop after this many refreshes")]
    ticks: Option<usize>,
}

impl RunCommand for WatchCommand {
    async fn run(&self, config: Config) -> CovidtrackCliResult<()> {
        info!("Running `watch` subcommand");
        let period = self.interval.unwrap_or(config.refresh_interval_secs).max(1);
        let covidtrack = Covidtrack::new_with_config(config)?;
        let mut interval = tokio::time::interval(Duration::from_secs(period));
        let mut refreshes = 0;
        loop {
            interval.tick().await;
            // Failures are logged by the refresh itself and the previous table stays live.
            if let Ok(table) = covidtrack.rebuild_canonical_table().await {
                display_refresh_summary(&table);
            }
            refreshes += 1;
            if self.ticks.is_some_and(|ticks| refreshes >= ticks) {
                break;
            }
        }
        Ok(())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Covidtrack builds the daily Covid-19 series behind the dashboard charts", long_about = None, name="covidtrack")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress bar to stdout. Results and logs (when `RUST_LOG`\n\
            is set) will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// Commands contains the list of subcommands available for use in the CLI.
/// Each command implements the RunCommand trait and specifies the list
/// of required args for that command.
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// Daily totals of a metric over every region
    National(NationalCommand),
    /// One region's metrics over time
    Region(RegionCommand),
    /// Daily totals of a metric per region category
    Category(CategoryCommand),
    /// List the region selector options
    Regions(RegionsCommand),
    /// Output the whole canonical table
    Snapshot(SnapshotCommand),
    /// Rebuild the canonical table periodically
    Watch(WatchCommand),
}
