//! Command-line interface for the Open English Wordnet graph library.
//!
//! Loads a wordnet from lexicographer YAML, WN-LMF XML or a binary snapshot,
//! then validates, converts or browses it.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{LevelFilter, debug, error, info};
use oewn_graph::{
    EscapeScheme, LoadOptions, PartOfSpeech, SenseIdx, SourceFormat, ValidationMode,
    ValidationOptions, WordnetModel,
    error::Result,
    progress::{ProgressCallback, ProgressUpdate},
    validate::{DEFAULT_ROOT_SYNSET, validate_with_progress},
    yaml,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Open English Wordnet graph tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Input format, detected from the path when omitted (yaml, xml, snapshot)
    #[arg(long, global = true)]
    format: Option<SourceFormat>,

    /// Escaping scheme for XML ids (dash, legacy)
    #[arg(long, global = true, default_value = "dash")]
    scheme: EscapeScheme,

    /// Do not add missing inverse relations after loading
    #[arg(long, global = true, default_value_t = false)]
    no_extend: bool,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the wordnet against every validation rule
    Validate {
        /// Source directory or file
        input: PathBuf,
        /// Report every violation instead of stopping at the first
        #[arg(long, default_value_t = false)]
        collect_all: bool,
        /// Also require inverses of involutive relation types
        #[arg(long, default_value_t = false)]
        strict_symmetry: bool,
        /// Synset allowed to have no hypernym
        #[arg(long, default_value = DEFAULT_ROOT_SYNSET)]
        root: String,
    },
    /// Convert between YAML, XML and snapshot
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Output format, detected from the output path when omitted
        #[arg(long)]
        to: Option<SourceFormat>,
    },
    /// Write a binary snapshot for fast reloading
    Snapshot { input: PathBuf, output: PathBuf },
    /// Show the senses, synsets and relations of a lemma
    Browse {
        input: PathBuf,
        lemma: String,
        /// Optional part of speech filter (n, v, a, r, s)
        pos: Option<PartOfSpeech>,
    },
    /// Add collocation relations from a YAML file of sense key pairs
    Inject {
        input: PathBuf,
        collocations: PathBuf,
        output: PathBuf,
        /// Also add the reverse edge of every pair
        #[arg(long, default_value_t = false)]
        two_ways: bool,
        #[arg(long)]
        to: Option<SourceFormat>,
    },
    /// Print entry, synset, sense and relation counts
    Info { input: PathBuf },
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Renders loader and validator progress as one bar per stage.
fn create_progress_callback(
    multi_progress: MultiProgress,
    progress_bars: Arc<Mutex<HashMap<String, ProgressBar>>>,
) -> ProgressCallback {
    Box::new(move |update: ProgressUpdate| {
        let Ok(mut bars) = progress_bars.lock() else {
            return true;
        };

        if update.current_item == 0 && !bars.contains_key(&update.stage_description) {
            let pb = multi_progress.add(ProgressBar::new(update.total_items.unwrap_or(0)));
            let style_template = if update.total_items.is_some() {
                "{prefix:>12.cyan.bold} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({percent}%) {msg}"
            } else {
                "{prefix:>12.cyan.bold} [{elapsed_precise}] {spinner} {msg}"
            };

            pb.set_style(
                ProgressStyle::default_bar()
                    .template(style_template)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            pb.set_prefix(update.stage_description.clone());
            pb.set_message(update.message.unwrap_or_default());
            pb.enable_steady_tick(Duration::from_millis(100));
            bars.insert(update.stage_description.clone(), pb);
        } else if let Some(pb) = bars.get(&update.stage_description) {
            pb.set_position(update.current_item);
            if let Some(msg) = update.message {
                pb.set_message(msg);
            }
            if let Some(total) = update.total_items {
                if update.current_item >= total {
                    pb.finish_and_clear();
                }
            }
        }
        true
    })
}

/// Output format: explicit, else `.xml`/`.xml.gz` → XML, an existing
/// directory or a path without extension → YAML, anything else → snapshot.
fn output_format(path: &Path, explicit: Option<SourceFormat>) -> SourceFormat {
    explicit.unwrap_or_else(|| {
        if path.is_dir() || path.extension().is_none() {
            SourceFormat::Yaml
        } else {
            SourceFormat::detect(path)
        }
    })
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    error!("{}: {}", context, e);
    eprintln!("{}", format!("Error {}: {}", context, e).red());
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let multi_progress = MultiProgress::new();
    let progress_bars = Arc::new(Mutex::new(HashMap::<String, ProgressBar>::new()));
    let mut callback = create_progress_callback(multi_progress.clone(), progress_bars.clone());

    let options = LoadOptions {
        extend: !cli.no_extend,
        resolve: matches!(cli.command, Commands::Browse { .. }),
        scheme: cli.scheme,
    };
    let input = match &cli.command {
        Commands::Validate { input, .. }
        | Commands::Convert { input, .. }
        | Commands::Snapshot { input, .. }
        | Commands::Browse { input, .. }
        | Commands::Inject { input, .. }
        | Commands::Info { input } => input.clone(),
    };
    let format = cli.format.unwrap_or_else(|| SourceFormat::detect(&input));

    let start = Instant::now();
    let wn_result = oewn_graph::load_as(&input, format, &options, Some(&mut callback));
    if let Ok(bars) = progress_bars.lock() {
        for pb in bars.values() {
            pb.finish_and_clear();
        }
    }
    std::io::stdout().flush().ok();

    let mut wn = match wn_result {
        Ok(wn) => {
            info!("Loaded {}. Took {:.2?}", wn, start.elapsed());
            wn
        }
        Err(e) => fail(&format!("loading {}", input.display()), e),
    };

    let result = match cli.command {
        Commands::Validate {
            collect_all,
            strict_symmetry,
            root,
            ..
        } => {
            let options = ValidationOptions {
                mode: if collect_all {
                    ValidationMode::CollectAll
                } else {
                    ValidationMode::FailFast
                },
                strict_symmetry,
                root_synset: root,
            };
            handle_validate(&wn, &options, &mut callback)
        }
        Commands::Convert { output, to, .. } => {
            let format = output_format(&output, to);
            oewn_graph::save_as(&wn, &output, format, cli.scheme)
                .map(|()| println!("Wrote {} to {} as {}", wn, output.display(), format))
        }
        Commands::Snapshot { output, .. } => {
            oewn_graph::save_as(&wn, &output, SourceFormat::Snapshot, cli.scheme)
                .map(|()| println!("Wrote snapshot {}", output.display()))
        }
        Commands::Browse { lemma, pos, .. } => handle_browse(&mut wn, &lemma, pos),
        Commands::Inject {
            collocations,
            output,
            two_ways,
            to,
            ..
        } => handle_inject(&mut wn, &collocations, &output, two_ways, to, cli.scheme),
        Commands::Info { .. } => {
            println!("{}", wn.info());
            println!("{}", wn.info_relations());
            Ok(())
        }
    };
    drop(multi_progress);

    if let Err(e) = result {
        fail("running command", e);
    }
}

fn handle_validate(
    wn: &WordnetModel,
    options: &ValidationOptions,
    callback: &mut ProgressCallback,
) -> Result<()> {
    let report = validate_with_progress(wn, options, Some(callback))?;
    if report.is_valid() {
        println!("{}", format!("{} is valid", wn).green());
        return Ok(());
    }
    for violation in &report.violations {
        println!("{}", violation.to_string().yellow());
    }
    report.into_result()
}

fn handle_inject(
    wn: &mut WordnetModel,
    collocations: &Path,
    output: &Path,
    two_ways: bool,
    to: Option<SourceFormat>,
    scheme: EscapeScheme,
) -> Result<()> {
    let pairs = yaml::load_collocations(collocations)?;
    let (count, fails) = wn.inject_collocations(&pairs, two_ways);
    println!(
        "Injected {} collocation(s), {} unresolvable",
        count.to_string().green(),
        fails.to_string().yellow()
    );
    oewn_graph::save_as(wn, output, output_format(output, to), scheme)
}

/// Walks every entry of `lemma` through the resolved view.
fn handle_browse(wn: &mut WordnetModel, lemma: &str, pos_filter: Option<PartOfSpeech>) -> Result<()> {
    if !wn.is_resolved() {
        wn.resolve()?;
    }
    let wn = &*wn;
    let Some(resolved) = wn.resolved() else {
        return Ok(());
    };
    let matches: Vec<(usize, _)> = wn
        .entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.lemma == lemma && pos_filter.is_none_or(|p| p.equivalent(e.pos)))
        .collect();
    if matches.is_empty() {
        println!("No entries found for '{}'.", lemma.yellow());
        return Ok(());
    }

    for (entry_index, entry) in matches {
        println!("\n{} ~ {}", entry.lemma.bold().cyan(), entry.pos.to_string().italic());
        if !entry.pronunciations.is_empty() {
            let prons: Vec<String> = entry
                .pronunciations
                .iter()
                .map(|p| match &p.variety {
                    Some(v) => format!("{}[{}]", p.value.green(), v.dimmed()),
                    None => p.value.green().to_string(),
                })
                .collect();
            println!("  Pronunciations: {}", prons.join(", "));
        }

        for (sense_index, sense) in entry.senses.iter().enumerate() {
            let idx = SenseIdx {
                entry: entry_index,
                sense: sense_index,
            };
            let Some(synset) = resolved.synset_of(idx) else {
                continue;
            };
            debug!("Sense {} in synset {}", sense.id, synset.id);
            println!(
                "  {}: {} {}",
                (sense_index + 1).to_string().bold(),
                synset.definitions.join("; "),
                format!("({})", sense.id).dimmed()
            );
            for example in &synset.examples {
                println!("        {}", example.text.trim().italic());
            }

            let synonyms: Vec<&str> = wn
                .synset_index(&synset.id)
                .map(|i| resolved.members(i))
                .unwrap_or_default()
                .into_iter()
                .map(|e| e.lemma.as_str())
                .filter(|l| *l != entry.lemma)
                .collect();
            if !synonyms.is_empty() {
                println!("        {}: {}", "Synonyms".magenta(), synonyms.join(", ").green());
            }

            for (relation, target) in resolved.sense_targets(idx) {
                let target_lemma = wn.entry_of(&target.id).map(|e| e.lemma.as_str()).unwrap_or("?");
                println!(
                    "        {}: {} {}",
                    relation.kind.to_string().magenta(),
                    target_lemma.green(),
                    format!("({})", target.id).dimmed()
                );
            }
            if let Some(synset_index) = wn.synset_index(&synset.id) {
                for (relation, target) in resolved.synset_targets(synset_index) {
                    println!(
                        "        {}: {} {}",
                        relation.rel_type.to_string().magenta(),
                        target.members.join(", ").green(),
                        format!("({})", target.id).dimmed()
                    );
                }
            }
        }
    }
    println!();
    Ok(())
}
