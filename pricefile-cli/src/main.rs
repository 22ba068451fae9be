//! pricefile CLI: inspect, resample, convert and batch-ingest OHLCV files.
//!
//! Commands:
//! - `inspect`: summary, first rows and quality issues of one file
//! - `resample`: aggregate a file into coarser bars (daily by default)
//! - `convert`: write the normalized table as CSV
//! - `batch`: ingest many files in parallel and report per-file status

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pricefile_core::data::{
    ingest, ingest_all, resample, write_csv, write_to, DateTimeLayout, Delimiter, Frequency,
    LayoutHint, QualityReport,
};
use pricefile_core::domain::{OhlcvRow, OhlcvTable};

#[derive(Parser)]
#[command(
    name = "pricefile",
    version,
    about = "Tolerant OHLCV price-file ingestion"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the summary, first rows and quality issues of a file.
    Inspect {
        path: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Number of rows to show.
        #[arg(long, default_value_t = 5)]
        head: usize,

        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Aggregate a file into coarser OHLCV bars.
    Resample {
        path: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Bucket size: 1min, 5T, 15min, 1h, 1D.
        #[arg(long, default_value = "1D")]
        every: Frequency,

        /// Write CSV here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the normalized table as CSV.
    Convert {
        path: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        #[arg(long)]
        output: PathBuf,

        /// Sort rows by timestamp before writing.
        #[arg(long, default_value_t = false)]
        sort: bool,
    },
    /// Ingest many files in parallel. Exits non-zero if any file fails.
    Batch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Layout overrides. Flags win over `--layout`.
#[derive(Args, Default)]
struct LayoutArgs {
    /// TOML file with a layout hint.
    #[arg(long)]
    layout: Option<PathBuf>,

    /// comma, tab, whitespace or a single character.
    #[arg(long)]
    delimiter: Option<Delimiter>,

    /// The file has no header row.
    #[arg(long, default_value_t = false)]
    no_header: bool,

    /// Comma-separated column names.
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Column holding date and time.
    #[arg(long, conflicts_with_all = ["date_column", "time_column"])]
    datetime_column: Option<String>,

    /// Column holding the date (use with --time-column).
    #[arg(long, requires = "time_column")]
    date_column: Option<String>,

    /// Column holding the time of day (use with --date-column).
    #[arg(long, requires = "date_column")]
    time_column: Option<String>,

    /// chrono format string for timestamps, e.g. "%Y%m%d %H%M%S".
    #[arg(long)]
    timestamp_format: Option<String>,
}

impl LayoutArgs {
    /// `None` when no layout option was given, so detection runs untouched.
    fn to_hint(&self) -> Result<Option<LayoutHint>> {
        let base = match &self.layout {
            Some(path) => LayoutHint::from_file(path)
                .with_context(|| format!("loading layout {}", path.display()))?,
            None => LayoutHint::new(),
        };

        let mut flags = LayoutHint::new();
        flags.delimiter = self.delimiter;
        if self.no_header {
            flags.has_header = Some(false);
        }
        flags.columns = self.columns.clone();
        flags.timestamp_format = self.timestamp_format.clone();
        flags.datetime = match (&self.datetime_column, &self.date_column, &self.time_column) {
            (Some(column), _, _) => Some(DateTimeLayout::Single {
                column: column.clone(),
            }),
            (None, Some(date), Some(time)) => Some(DateTimeLayout::Split {
                date: date.clone(),
                time: time.clone(),
            }),
            (None, None, None) => None,
            _ => bail!("--date-column and --time-column must be given together"),
        };

        let hint = base.overlay(flags);
        Ok((hint != LayoutHint::default()).then_some(hint))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect {
            path,
            layout,
            head,
            json,
        } => run_inspect(&path, &layout, head, json),
        Commands::Resample {
            path,
            layout,
            every,
            output,
        } => run_resample(&path, &layout, every, output.as_deref()),
        Commands::Convert {
            path,
            layout,
            output,
            sort,
        } => run_convert(&path, &layout, &output, sort),
        Commands::Batch { paths, layout } => run_batch(&paths, &layout),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(path: &Path, layout: &LayoutArgs) -> Result<OhlcvTable> {
    let hint = layout.to_hint()?;
    let table =
        ingest(path, hint.as_ref()).with_context(|| format!("ingesting {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = table.len(), "ingested");
    Ok(table)
}

fn run_inspect(path: &Path, layout: &LayoutArgs, head: usize, json: bool) -> Result<()> {
    let table = load(path, layout)?;
    let summary = table.summary();
    let report = QualityReport::inspect(&table);
    let fingerprint = table.fingerprint();

    if json {
        let doc = serde_json::json!({
            "path": path.display().to_string(),
            "summary": summary,
            "fingerprint": fingerprint.0,
            "quality": report,
            "head": table.head(head),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!();
    println!("=== {} ===", path.display());
    println!("Rows:        {}", summary.rows);
    match (summary.start, summary.end) {
        (Some(start), Some(end)) => println!("Range:       {start} to {end}"),
        _ => println!("Range:       (empty)"),
    }
    println!("Fields:      {}", summary.fields.join(", "));
    println!("Fingerprint: {fingerprint}");

    if head > 0 && !table.is_empty() {
        println!();
        println!("{}", summary.fields.join("\t"));
        for row in table.head(head) {
            println!("{}", format_row(row));
        }
    }

    println!();
    if report.is_clean() {
        println!("Quality: clean");
    } else {
        println!("--- Quality ---");
        for issue in &report.issues {
            let field = issue
                .field
                .as_deref()
                .map(|f| format!(" [{f}]"))
                .unwrap_or_default();
            println!(
                "{:<8} {}{}: {} row(s), first at row {}",
                issue.severity,
                issue.kind,
                field,
                issue.count,
                issue.first_row + 1
            );
        }
    }
    println!();
    Ok(())
}

fn run_resample(
    path: &Path,
    layout: &LayoutArgs,
    every: Frequency,
    output: Option<&Path>,
) -> Result<()> {
    let table = load(path, layout)?;
    let bars = resample(&table, every);
    tracing::info!(frequency = %every, bars = bars.len(), "resampled");

    match output {
        Some(out) => {
            write_csv(&bars, out).with_context(|| format!("writing {}", out.display()))?;
            println!("{} {every} bars written to {}", bars.len(), out.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_to(&bars, stdout.lock()).context("writing to stdout")?;
        }
    }
    Ok(())
}

fn run_convert(path: &Path, layout: &LayoutArgs, output: &Path, sort: bool) -> Result<()> {
    let mut table = load(path, layout)?;
    if sort {
        table.sort_by_timestamp();
    }
    write_csv(&table, output).with_context(|| format!("writing {}", output.display()))?;
    println!("{} rows written to {}", table.len(), output.display());
    Ok(())
}

fn run_batch(paths: &[PathBuf], layout: &LayoutArgs) -> Result<()> {
    let hint = layout.to_hint()?;
    let items = ingest_all(paths, hint.as_ref());

    let mut failed = 0usize;
    for item in &items {
        match &item.result {
            Ok(table) => {
                let range = table
                    .time_range()
                    .map(|(s, e)| format!("{s} to {e}"))
                    .unwrap_or_default();
                println!("ok    {} ({} rows, {range})", item.path.display(), table.len());
            }
            Err(err) => {
                failed += 1;
                println!("FAIL  {}: {err}", item.path.display());
            }
        }
    }

    println!();
    println!("{} file(s), {failed} failed", items.len());
    if failed > 0 {
        bail!("{failed} of {} file(s) failed to ingest", items.len());
    }
    Ok(())
}

fn format_row(row: &OhlcvRow) -> String {
    let mut cells = vec![
        row.timestamp.to_string(),
        row.open.to_string(),
        row.high.to_string(),
        row.low.to_string(),
        row.close.to_string(),
        row.volume.to_string(),
    ];
    cells.extend(row.extra.iter().map(|c| c.to_string()));
    cells.join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn layout_of(cli: Cli) -> LayoutArgs {
        match cli.command {
            Commands::Inspect { layout, .. }
            | Commands::Resample { layout, .. }
            | Commands::Convert { layout, .. }
            | Commands::Batch { layout, .. } => layout,
        }
    }

    #[test]
    fn no_flags_means_no_hint() {
        let layout = layout_of(parse(&["pricefile", "inspect", "a.csv"]));
        assert_eq!(layout.to_hint().unwrap(), None);
    }

    #[test]
    fn flags_build_a_hint() {
        let layout = layout_of(parse(&[
            "pricefile",
            "inspect",
            "a.txt",
            "--delimiter",
            "tab",
            "--no-header",
            "--columns",
            "Date,Time,Open,High,Low,Close,Volume",
            "--date-column",
            "Date",
            "--time-column",
            "Time",
        ]));
        let hint = layout.to_hint().unwrap().unwrap();
        assert_eq!(hint.delimiter, Some(Delimiter::Tab));
        assert_eq!(hint.has_header, Some(false));
        assert_eq!(hint.columns.as_ref().map(Vec::len), Some(7));
        assert_eq!(
            hint.datetime,
            Some(DateTimeLayout::Split {
                date: "Date".into(),
                time: "Time".into()
            })
        );
    }

    #[test]
    fn flags_override_layout_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("layout.toml");
        std::fs::write(&file, "delimiter = \"comma\"\ntimestamp_format = \"%Y%m%d\"\n").unwrap();
        let layout = layout_of(parse(&[
            "pricefile",
            "convert",
            "a.txt",
            "--output",
            "b.csv",
            "--layout",
            file.to_str().unwrap(),
            "--delimiter",
            ";",
        ]));
        let hint = layout.to_hint().unwrap().unwrap();
        assert_eq!(hint.delimiter, Some(Delimiter::Char(';')));
        assert_eq!(hint.timestamp_format.as_deref(), Some("%Y%m%d"));
    }

    #[test]
    fn half_a_split_timestamp_is_rejected() {
        assert!(Cli::try_parse_from(["pricefile", "inspect", "a.csv", "--date-column", "Date"])
            .is_err());
    }

    #[test]
    fn resample_frequency_parses() {
        match parse(&["pricefile", "resample", "a.csv", "--every", "15min"]).command {
            Commands::Resample { every, .. } => assert_eq!(every, Frequency::Minutes(15)),
            _ => panic!("expected resample"),
        }
    }

    #[test]
    fn end_to_end_convert() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(
            &input,
            "20240102 093000;1;2;0.5;1.5;10\n20240102 093100;1.5;2.5;1;2;20\n",
        )
        .unwrap();
        let output = dir.path().join("out.csv");
        let layout = LayoutArgs {
            delimiter: Some(Delimiter::Char(';')),
            no_header: true,
            timestamp_format: Some("%Y%m%d %H%M%S".into()),
            ..LayoutArgs::default()
        };
        run_convert(&input, &layout, &output, false).unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("DateTime,Open,High,Low,Close,Volume\n"));
        assert!(written.contains("2024-01-02 09:31:00,1.5,2.5,1,2,20"));
    }
}
