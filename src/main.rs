//! Bandscore: IELTS Writing band estimator CLI

use anyhow::{Context, Result};
use bandscore::analyzer::ScoringEngine;
use bandscore::config::{build_ignore_set, is_ignored, load_config, starter_config, CONFIG_FILENAME};
use bandscore::grammar::{
    is_languagetool_available, GrammarChecker, LanguageToolClient, MatchesFile,
};
use bandscore::reporter::{BatchSummary, ConsoleReporter, EssayReport, JsonReporter};
use bandscore::{Band, EssayInput, TaskType};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

type Checker = Option<Box<dyn GrammarChecker + Send + Sync>>;

/// Bandscore: explainable GRA and LR band estimates for IELTS Writing
#[derive(Parser, Debug)]
#[command(name = "bandscore")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Essay file, directory of essays, or - for stdin
    #[arg(required = true)]
    path: Option<PathBuf>,

    /// Task type: task1, task2 or auto (by word count)
    #[arg(long)]
    task: Option<TaskType>,

    /// Grammar matches as JSON (plain array or LanguageTool response)
    #[arg(long, value_name = "FILE")]
    matches: Option<PathBuf>,

    /// LanguageTool server to check grammar against
    #[arg(long, value_name = "URL", env = "BANDSCORE_LANGUAGETOOL_URL")]
    languagetool_url: Option<String>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Minimum band for GRA and LR (exit 1 if either is below)
    #[arg(long, short)]
    threshold: Option<f64>,

    /// Quiet mode (bands only)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (metrics, all recommendations, debug logs)
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .bandscorerc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the analyzers one after another instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create .bandscorerc.json with sensible defaults
    Init {
        /// Minimum band (e.g. 6.5)
        #[arg(long)]
        threshold: Option<f64>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(Commands::Init { threshold, dir }) = &args.command {
        return run_init(*threshold, dir.as_deref());
    }

    let path = args
        .path
        .clone()
        .context("An essay path is required when not using a subcommand")?;
    let from_stdin = path.as_os_str() == "-";

    // Resolve work directory for config search
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let work_dir = if from_stdin {
        cwd.as_path()
    } else if path.is_file() {
        path.parent().unwrap_or(Path::new("."))
    } else {
        path.as_path()
    };

    // Load config (CLI flags override config file)
    let config = load_config(work_dir, args.config.as_deref())?.merge_with_cli(
        args.threshold,
        args.task,
        args.languagetool_url.clone(),
        args.sequential,
    );
    config.validate().context("Invalid options")?;
    let task = config.task.unwrap_or_default();
    let threshold = config.threshold_band();

    let checker = build_checker(&args, &config.grammar_service);
    let engine = ScoringEngine::with_config(checker, config.scoring.clone())?;

    // Set up parallel processing
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let (reports, failed) = if from_stdin {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read essay from stdin")?;
        let result = engine.score_bytes(&bytes, task)?;
        (vec![EssayReport::new("<stdin>", result)], 0)
    } else {
        let ignore_set = if config.ignore.is_empty() {
            None
        } else {
            Some(build_ignore_set(&config.ignore)?)
        };
        let essays = collect_essays(&path, ignore_set.as_ref())?;
        if essays.is_empty() {
            eprintln!("{}: No essays found", "Warning".yellow());
            return Ok(ExitCode::from(2));
        }
        let use_parallel = config.scoring.parallel && essays.len() > 1;
        score_files(&engine, &essays, task, args.matches.is_some(), use_parallel)
    };

    if reports.is_empty() {
        eprintln!("{}: All essays failed to score", "Error".red());
        return Ok(ExitCode::from(2));
    }

    let summary = BatchSummary::from_reports(&reports, failed, threshold);

    // Output results
    if args.json {
        let reporter = JsonReporter::new().pretty();
        if reports.len() == 1 && failed == 0 {
            println!("{}", reporter.report(&reports[0]));
        } else {
            println!("{}", reporter.report_with_summary(&reports, &summary));
        }
    } else if args.quiet {
        let reporter = ConsoleReporter::new();
        for report in &reports {
            reporter.report_quiet(report);
        }
    } else {
        let reporter = if args.verbose {
            ConsoleReporter::new().verbose()
        } else {
            ConsoleReporter::new()
        };
        if reports.len() == 1 {
            reporter.report(&reports[0]);
        } else {
            reporter.report_many(&reports, &summary);
        }
    }

    // Check threshold (config or CLI)
    if let Some(threshold) = threshold {
        let below: Vec<&EssayReport> = reports
            .iter()
            .filter(|r| r.lowest_band() < threshold)
            .collect();
        if !below.is_empty() {
            if !args.quiet && !args.json {
                for report in below {
                    eprintln!(
                        "{}: {} scored {} (GRA {}, LR {}), below threshold {}",
                        "Failed".red().bold(),
                        report.file_path.display(),
                        report.lowest_band(),
                        report.result.gra,
                        report.result.lr,
                        threshold
                    );
                }
            }
            return Ok(ExitCode::from(1));
        }
    }

    if failed > 0 {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Logs go to stderr; RUST_LOG overrides the default level
fn init_tracing(verbose: bool) {
    let default = if verbose { "bandscore=debug" } else { "bandscore=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Grammar source shared by every essay: --matches, then LanguageTool, else none
fn build_checker(args: &Args, service: &bandscore::config::GrammarServiceConfig) -> Checker {
    if let Some(ref matches) = args.matches {
        return Some(Box::new(MatchesFile::open(matches)));
    }
    let url = service.languagetool_url.as_deref()?;
    if !is_languagetool_available() {
        eprintln!(
            "{}: built without the languagetool feature; {} will not be contacted",
            "Warning".yellow(),
            url
        );
    }
    let mut client = LanguageToolClient::new(url);
    if let Some(ref language) = service.language {
        client = client.language(language);
    }
    if let Some(secs) = service.timeout_secs {
        client = client.timeout(Duration::from_secs(secs));
    }
    Some(Box::new(client))
}

/// Score each essay, using its `.matches.json` sidecar unless --matches was given
fn score_files(
    engine: &ScoringEngine<Checker>,
    files: &[PathBuf],
    task: TaskType,
    explicit_matches: bool,
    parallel: bool,
) -> (Vec<EssayReport>, usize) {
    use rayon::prelude::*;

    let score_one = |file: &PathBuf| -> Result<EssayReport> {
        let bytes =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let input = EssayInput::from_bytes(&bytes, task)?;
        let sidecar = sidecar_path(file);
        let result = if !explicit_matches && sidecar.is_file() {
            engine.score_input_with(&MatchesFile::open(sidecar), &input)?
        } else {
            engine.score_input(&input)?
        };
        Ok(EssayReport::new(file.clone(), result))
    };

    let outcomes: Vec<(&PathBuf, Result<EssayReport>)> = if parallel {
        files.par_iter().map(|f| (f, score_one(f))).collect()
    } else {
        files.iter().map(|f| (f, score_one(f))).collect()
    };

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for (file, outcome) in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                eprintln!(
                    "{}: Failed to score {}: {:#}",
                    "Error".red(),
                    file.display(),
                    e
                );
            }
        }
    }
    (reports, failed)
}

fn run_init(threshold: Option<f64>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let threshold_value = threshold.unwrap_or(6.0);
    let config = starter_config(Some(threshold_value));
    config.validate().context("Invalid threshold")?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;

    std::fs::write(&config_path, format!("{}\n", json))
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with threshold={}",
        "Done".green().bold(),
        config_path.display(),
        Band::try_from(threshold_value).map_err(anyhow::Error::msg)?
    );
    Ok(ExitCode::SUCCESS)
}

fn collect_essays(path: &Path, ignore_set: Option<&globset::GlobSet>) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if let Some(set) = ignore_set {
            if is_ignored(path, set) {
                return Ok(vec![]);
            }
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        if is_essay_file(file_path) {
            if let Some(set) = ignore_set {
                if is_ignored(file_path, set) {
                    continue;
                }
            }
            files.push(file_path.to_path_buf());
        }
    }

    // Sort for consistent output
    files.sort();

    Ok(files)
}

fn is_essay_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("txt") | Some("md")
        )
}

/// `essay.txt` -> `essay.matches.json`
fn sidecar_path(essay: &Path) -> PathBuf {
    let stem = essay
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    essay.with_file_name(format!("{}.matches.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_path_required_unless_init() {
        let err = Args::try_parse_from(["bandscore"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let args = Args::try_parse_from(["bandscore", "init", "--threshold", "6.5"]).unwrap();
        assert!(args.path.is_none());
        assert!(matches!(
            args.command,
            Some(Commands::Init { threshold: Some(t), .. }) if t == 6.5
        ));

        let args = Args::try_parse_from(["bandscore", "essay.txt", "--json"]).unwrap();
        assert_eq!(args.path, Some(PathBuf::from("essay.txt")));
        assert!(args.json);
    }

    #[test]
    fn test_is_essay_file() {
        let dir = TempDir::new().unwrap();
        for name in ["a.txt", "b.md", "a.matches.json", "notes.rtf"] {
            fs::write(dir.path().join(name), "text").unwrap();
        }
        assert!(is_essay_file(&dir.path().join("a.txt")));
        assert!(is_essay_file(&dir.path().join("b.md")));
        assert!(!is_essay_file(&dir.path().join("a.matches.json")));
        assert!(!is_essay_file(&dir.path().join("notes.rtf")));
        assert!(!is_essay_file(dir.path()));
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("essays/week1.txt")),
            PathBuf::from("essays/week1.matches.json")
        );
    }

    #[test]
    fn test_collect_essays_respects_ignore() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("drafts")).unwrap();
        fs::write(dir.path().join("final.txt"), "text").unwrap();
        fs::write(dir.path().join("drafts/first.txt"), "text").unwrap();

        let all = collect_essays(dir.path(), None).unwrap();
        assert_eq!(all.len(), 2);

        let set = build_ignore_set(&["**/drafts/**".to_string()]).unwrap();
        let kept = collect_essays(dir.path(), Some(&set)).unwrap();
        assert_eq!(kept, vec![dir.path().join("final.txt")]);
    }
}
