use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use labelgraph::{
    apply_label_column, label_graph, label_group, project, AxisValue, Figure, Frame, Label, LabelConfig, LabelResult,
    ScriptedSurface, Settings,
};
use labelgraph_persist::{SessionStore, SqliteSessionStore};
use serde_json::Value as Json;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "labelctl", version, about = "Label chart x-axis intervals and derive category columns")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Session whose label store is used
    #[arg(long = "session", global = true, default_value = "default")]
    session: String,

    /// SQLite session file (default: $LABELGRAPH_DB_PATH or ~/.labelgraph/session.db)
    #[arg(long = "db", global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Args, Debug)]
struct ChartArgs {
    /// Figure JSON (plotly-style `{"data": [...]}`); its axis is not indexed
    #[arg(long = "chart", conflicts_with = "frame")]
    chart: Option<PathBuf>,
    /// Frame JSON (`{"column": [...]}`) to plot as a line
    #[arg(long = "frame", requires = "x")]
    frame: Option<PathBuf>,
    /// Frame column for the x-axis
    #[arg(long = "x")]
    x: Option<String>,
    /// Frame column for the y-axis
    #[arg(long = "y", default_value = "y")]
    y: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render once against a recorded editor response and print the result
    Run {
        #[command(flatten)]
        chart: ChartArgs,
        /// Label config JSON (`{"categories": [...]}`)
        #[arg(long = "config")]
        config: Option<PathBuf>,
        /// Seed labels JSON (ignored with --group)
        #[arg(long = "labels")]
        labels: Option<PathBuf>,
        /// Editor response JSON; omitted means first render
        #[arg(long = "response")]
        response: Option<PathBuf>,
        /// Reconcile into this group of the session store
        #[arg(long = "group")]
        group: Option<String>,
        /// Widget key when not using a group
        #[arg(long = "key")]
        key: Option<String>,
        /// Name of the derived column when plotting a frame
        #[arg(long = "column", default_value = labelgraph::DEFAULT_OUTPUT_COLUMN)]
        column: String,
    },
    /// Print a group's labels from the session store
    Show {
        #[arg(long = "group")]
        group: Option<String>,
    },
    /// Print the per-sample category projection of labels onto a chart axis
    Project {
        #[command(flatten)]
        chart: ChartArgs,
        #[arg(long = "labels")]
        labels: PathBuf,
    },
    /// Emit a label with a fresh key (numbers or timestamps as bounds)
    NewLabel {
        #[arg(long = "category")]
        category: String,
        #[arg(long = "left")]
        left: String,
        #[arg(long = "right")]
        right: String,
    },
}

fn init_tracing() {
    let env = std::env::var("LABELGRAPH_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn read_json(path: &Path) -> Result<Json> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_labels(path: &Path) -> Result<Vec<Label>> {
    serde_json::from_value(read_json(path)?).with_context(|| format!("decoding labels in {}", path.display()))
}

/// The figure plus, when built from a frame, the frame and its x column.
fn load_chart(args: &ChartArgs) -> Result<(Figure, Option<(Frame, String)>)> {
    if let Some(path) = &args.chart {
        return Ok((Figure::from_json(read_json(path)?)?, None));
    }
    let (Some(path), Some(x)) = (&args.frame, &args.x) else {
        bail!("either --chart or --frame with --x is required");
    };
    let frame = Frame::from_json(&read_json(path)?).with_context(|| format!("decoding frame in {}", path.display()))?;
    let figure = Figure::line(&frame, x, &args.y)?;
    Ok((figure, Some((frame, x.clone()))))
}

fn open_sessions(db: Option<&str>) -> Result<SqliteSessionStore> {
    match db {
        Some(path) => SqliteSessionStore::open(path),
        None => SqliteSessionStore::open_default(),
    }
}

fn parse_bound(s: &str) -> Result<AxisValue> {
    if let Ok(n) = s.parse::<f64>() {
        return Ok(AxisValue::Number(n));
    }
    labelgraph::axis::parse_timestamp(s).map(AxisValue::Time).ok_or_else(|| anyhow!("not a number or timestamp: {}", s))
}

fn fmt_value(v: &AxisValue) -> String {
    match v {
        AxisValue::Number(n) => n.to_string(),
        AxisValue::Time(t) => t.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    }
}

fn print_labels(labels: &[Label]) {
    println!("{:<24} {:<12} {:<24} {}", "KEY", "CATEGORY", "LEFT", "RIGHT");
    for l in labels {
        println!("{:<24} {:<12} {:<24} {}", l.key, l.category, fmt_value(&l.left), fmt_value(&l.right));
    }
}

fn print_result(output: Output, res: &LabelResult, framed: Option<Json>) -> Result<()> {
    match output {
        Output::Human => {
            print_labels(&res.labels);
            if !res.selection.is_empty() {
                println!("selected: {}", res.selection.join(", "));
            }
            if !res.deleted.is_empty() {
                println!("deleted: {}", res.deleted.join(", "));
            }
            match &res.series {
                Some(series) => {
                    let covered = series.iter().filter(|c| c.is_some()).count();
                    println!("series: {}/{} samples labelled", covered, series.len());
                }
                None => println!("series: (none)"),
            }
        }
        Output::Json => {
            let mut v = serde_json::to_value(res)?;
            if let Some(frame) = framed {
                v["frame"] = frame;
            }
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { chart, config, labels, response, group, key, column } => {
            let (figure, framed) = load_chart(&chart)?;
            let config: LabelConfig = match &config {
                Some(path) => serde_json::from_value(read_json(path)?).context("decoding label config")?,
                None => LabelConfig::default(),
            };
            let response = response.as_deref().map(read_json).transpose()?;
            let mut surface = ScriptedSurface::new([response]);
            let settings = Settings::from_env();

            let res = match &group {
                Some(group) => {
                    if labels.is_some() {
                        warn!("--labels ignored; seeding from session store group");
                    }
                    let sessions = open_sessions(cli.db.as_deref())?;
                    let mut store = sessions.load(&cli.session)?;
                    let res = label_group(&mut surface, &mut store, group, &figure, &config, &settings)?;
                    sessions.save(&cli.session, &store)?;
                    info!(session = %cli.session, group = %group, stored = store.len(), "session saved");
                    res
                }
                None => {
                    let seed = labels.as_deref().map(read_labels).transpose()?;
                    label_graph(&mut surface, &figure, &config, seed.as_deref(), key.as_deref(), &settings)?
                }
            };

            let framed = match framed {
                Some((frame, x)) if cli.output == Output::Json => {
                    Some(apply_label_column(&frame, &res, &x, Some(&column))?.to_json())
                }
                _ => None,
            };
            print_result(cli.output, &res, framed)?;
        }
        Commands::Show { group } => {
            let sessions = open_sessions(cli.db.as_deref())?;
            let store = sessions.load(&cli.session)?;
            let groups: Vec<String> = match group {
                Some(g) => vec![g],
                None => store.groups().into_iter().map(str::to_string).collect(),
            };
            match cli.output {
                Output::Human => {
                    for g in &groups {
                        println!("[{}]", g);
                        print_labels(&store.get(g));
                    }
                }
                Output::Json => {
                    let mut out = serde_json::Map::new();
                    for g in &groups {
                        out.insert(g.clone(), serde_json::to_value(store.get(g))?);
                    }
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Project { chart, labels } => {
            let (figure, _) = load_chart(&chart)?;
            let labels = read_labels(&labels)?;
            let series = project(&labels, &figure.axis().values);
            match cli.output {
                Output::Human => {
                    for (v, c) in figure.axis().values.iter().zip(&series) {
                        println!("{:<24} {}", fmt_value(v), c.as_deref().unwrap_or("-"));
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&series)?),
            }
        }
        Commands::NewLabel { category, left, right } => {
            let label = Label::new(uuid::Uuid::new_v4().to_string(), category, parse_bound(&left)?, parse_bound(&right)?);
            match cli.output {
                Output::Human => print_labels(std::slice::from_ref(&label)),
                Output::Json => println!("{}", serde_json::to_string_pretty(&label)?),
            }
        }
    }
    Ok(())
}
