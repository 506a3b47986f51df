use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use slidereel::{BuildInputs, BuildOpts, BuildResult, BuildSession, StagePoolOpts, Toolset};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slidereel", version, about = "Build a narrated video from PDF slides")]
struct Cli {
    /// Source PDF. Defaults to the only `*.pdf` in the current directory.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Narration script. Defaults to the only `*.yaml`/`*.yml` in the current directory.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Output MP4 path. Defaults to `<pdf stem>.mp4`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Clip cache directory. Defaults to `<pdf stem>/`.
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Empty the cache directory before building.
    #[arg(long, default_value_t = false)]
    clean: bool,

    /// Slides processed concurrently.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Fail any single tool call that runs longer than this many seconds.
    #[arg(long)]
    stage_timeout: Option<f64>,

    /// Print the build result as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let document = match cli.pdf {
        Some(p) => p,
        None => find_single(&cwd, &["pdf"], "PDF")?,
    };
    let script = match cli.script {
        Some(p) => p,
        None => find_single(&cwd, &["yaml", "yml"], "script")?,
    };

    let stem = document
        .file_stem()
        .map(|s| s.to_os_string())
        .with_context(|| format!("cannot derive a name from '{}'", document.display()))?;
    let output = cli.output.unwrap_or_else(|| {
        let mut name = stem.clone();
        name.push(".mp4");
        PathBuf::from(name)
    });
    let cache_dir = cli.cache.unwrap_or_else(|| PathBuf::from(&stem));

    let stage_timeout = cli
        .stage_timeout
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--stage-timeout must be a positive number of seconds")?;
    let opts = BuildOpts {
        pools: StagePoolOpts {
            stage_timeout,
            ..StagePoolOpts::default()
        },
        parallel_slides: cli.jobs,
        clean: cli.clean,
    };

    let inputs = BuildInputs {
        document,
        script,
        output,
        cache_dir,
    };
    let session = BuildSession::new(inputs, Toolset::system(), opts)?;
    let result = session.build().await;

    print_summary(&result);
    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
        println!("{json}");
    }
    Ok(result.success)
}

/// The only file in `dir` with one of `exts` (case-insensitive).
fn find_single(dir: &Path, exts: &[&str], what: &str) -> anyhow::Result<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list '{}'", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_extension(p, exts))
        .collect();
    found.sort();

    match found.len() {
        1 => Ok(found.remove(0)),
        0 => anyhow::bail!(
            "no {what} file (*.{}) in '{}'; pass it explicitly",
            exts.join(", *."),
            dir.display()
        ),
        _ => {
            let names: Vec<OsString> = found
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
                .collect();
            anyhow::bail!("multiple {what} files found, pick one explicitly: {names:?}")
        }
    }
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn print_summary(result: &BuildResult) {
    eprintln!(
        "slides: {} total, {} cached, {} generated, {} failed",
        result.total_slides,
        result.cached_count,
        result.generated_count,
        result.failed_slides.len()
    );
    for f in &result.failures {
        eprintln!(
            "  slide {} (page {}) failed while {}: {}",
            f.index, f.page, f.state, f.message
        );
    }
    if result.gc_removed > 0 {
        eprintln!("removed {} unused cache entries", result.gc_removed);
    }
    match (&result.output_path, &result.error_message) {
        (Some(out), _) => eprintln!("wrote {}", out.display()),
        (None, Some(err)) => eprintln!("build failed: {err}"),
        (None, None) => eprintln!("build failed"),
    }
}
