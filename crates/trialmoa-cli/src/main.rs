mod display;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use trialmoa_classify::{
    MechanismSelector, MemoryCache, Pipeline, PrecomputedSelector, ResultCache, RuleTable,
    VocabularySelector, select_primary,
};
use trialmoa_core::{PipelineConfig, RecordKind};
use trialmoa_store::{FileCache, ReportFormat, load_drugs, write_report};
use trialmoa_vocab::{BuildReport, IndexBuilder, VocabularyIndex, load_source};

#[derive(Parser, Debug)]
#[command(
    name = "trialmoa",
    version,
    about = "Classify clinical-trial drugs into mechanism-of-action super-groups"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the vocabulary index and print per-source statistics.
    Index {
        #[command(flatten)]
        vocab: VocabArgs,
    },
    /// Show the record a term resolves to, with its primary locator and label.
    Lookup {
        term: String,
        #[command(flatten)]
        vocab: VocabArgs,
        #[arg(long, env = "TRIALMOA_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the rule table in evaluation order.
    Rules {
        #[arg(long, env = "TRIALMOA_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Run the pipeline over a drug input file and write the corpus report.
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
struct VocabArgs {
    /// Descriptor source (MeSH XML or JSON lines). Required, repeatable.
    #[arg(long = "descriptors", required = true)]
    descriptors: Vec<PathBuf>,
    /// Supplemental-concept source (MeSH XML or JSON lines). Repeatable.
    #[arg(long = "supplementals")]
    supplementals: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[command(flatten)]
    vocab: VocabArgs,
    /// Pipeline config (branch priority and rule table). Built-in defaults if omitted.
    #[arg(long, env = "TRIALMOA_CONFIG")]
    config: Option<PathBuf>,
    /// Drug evidence JSON.
    #[arg(long)]
    drugs: PathBuf,
    /// Directory for cached per-drug results. No cache across runs if omitted.
    #[arg(long, env = "TRIALMOA_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
    #[arg(long, default_value = "trialmoa-out")]
    out_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
    #[arg(long, value_enum, default_value_t = SelectorKind::Precomputed)]
    selector: SelectorKind,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Parquet,
}

impl From<OutputFormat> for ReportFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Csv => ReportFormat::Csv,
            OutputFormat::Parquet => ReportFormat::Parquet,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SelectorKind {
    /// Use the `selection` field of each drug.
    Precomputed,
    /// Pick by vocabulary hierarchy alone.
    Vocabulary,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("trialmoa v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Index { vocab } => cmd_index(&vocab),
        Command::Lookup {
            term,
            vocab,
            config,
        } => cmd_lookup(&term, &vocab, config.as_deref()),
        Command::Rules { config } => cmd_rules(config.as_deref()),
        Command::Classify(args) => cmd_classify(&args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let config = PipelineConfig::default();
            config.validate().context("built-in config")?;
            Ok(config)
        }
    }
}

/// Parse every source and index those that load.
///
/// A source path that does not exist or has an unknown extension fails the
/// run. A source that fails to parse or clashes with an earlier one is
/// logged and left out; the build then fails only if nothing is usable.
fn build_index(vocab: &VocabArgs) -> anyhow::Result<(VocabularyIndex, BuildReport)> {
    let sources = vocab
        .descriptors
        .iter()
        .map(|p| (p, RecordKind::Descriptor))
        .chain(
            vocab
                .supplementals
                .iter()
                .map(|p| (p, RecordKind::Supplemental)),
        );

    let mut builder = IndexBuilder::new();
    for (path, kind) in sources {
        let batch = match load_source(path, kind) {
            Ok(batch) => batch,
            Err(err) if err.is_structural() => {
                return Err(err).with_context(|| {
                    format!("loading {} source {}", kind.as_str(), path.display())
                });
            }
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "vocabulary source unreadable");
                continue;
            }
        };
        if let Err(err) = builder.add_source(batch) {
            tracing::error!(path = %path.display(), %err, "vocabulary source rejected");
        }
    }
    builder.finish().context("building vocabulary index")
}

fn cmd_index(vocab: &VocabArgs) -> anyhow::Result<()> {
    let (index, report) = build_index(vocab)?;
    display::print_build_report(&report, &index);
    Ok(())
}

fn cmd_lookup(term: &str, vocab: &VocabArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let (index, _) = build_index(vocab)?;
    let pipeline = Pipeline::new(&index, &config).context("compiling config")?;

    let Some(record) = index.lookup(term) else {
        println!("No vocabulary record for '{term}'.");
        return Ok(());
    };
    let primary = select_primary(record, pipeline.priority());
    let classification = pipeline.classifier().explain(term, primary.as_deref());
    display::print_record_card(
        record,
        primary.as_deref(),
        &classification,
        pipeline.classifier().rules(),
    );
    Ok(())
}

fn cmd_rules(config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let rules = RuleTable::from_config(&config).context("compiling rule table")?;
    display::print_rules(&config.branch_priority, &rules);
    Ok(())
}

fn cmd_classify(args: &ClassifyArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let (index, _) = build_index(&args.vocab)?;
    let drugs = load_drugs(&args.drugs)
        .with_context(|| format!("loading drugs from {}", args.drugs.display()))?;
    let pipeline = Pipeline::new(&index, &config).context("compiling config")?;

    let selector: Box<dyn MechanismSelector + '_> = match args.selector {
        SelectorKind::Precomputed => {
            let selector = PrecomputedSelector::from_evidence(&drugs);
            if selector.is_empty() && !drugs.is_empty() {
                tracing::warn!("no drug carries a selection; every drug will be unresolved");
            }
            Box::new(selector)
        }
        SelectorKind::Vocabulary => Box::new(VocabularySelector::new(&index, pipeline.priority())),
    };
    let mut cache: Box<dyn ResultCache> = match &args.cache_dir {
        Some(dir) => Box::new(
            FileCache::open(dir)
                .with_context(|| format!("opening cache {}", dir.display()))?,
        ),
        None => Box::new(MemoryCache::new()),
    };

    let (report, stats) = pipeline
        .run(&drugs, selector.as_ref(), cache.as_mut())
        .context("running pipeline")?;
    let paths = write_report(&report, &args.out_dir, args.format.into())
        .with_context(|| format!("writing report to {}", args.out_dir.display()))?;

    display::print_frequencies(&report)?;
    display::print_run_summary(&stats, &paths);
    Ok(())
}
