use anyhow::Result;
use clap::Parser;

use git_calcver::config;
use git_calcver::domain::BranchKind;
use git_calcver::git::{Git2Repository, Repository};

#[derive(clap::Parser)]
#[command(
    name = "git-calcver",
    about = "Calculate a semantic version from git history, tags and branch topology"
)]
struct Args {
    #[arg(default_value = ".", help = "Path to the working copy")]
    path: String,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        short,
        long,
        help = "Branch to calculate against (required when HEAD is detached)"
    )]
    branch: Option<String>,

    #[arg(
        short,
        long,
        default_value = "canonical",
        help = "Output format: canonical, s (short) or f (full)"
    )]
    format: String,

    #[arg(long, help = "Print the chosen base version and provenance to stderr")]
    verbose: bool,

    #[arg(short = 'V', long, help = "Print version information")]
    version: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("git-calcver {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Git2Repository::open(&args.path)?;

    let branch_for_log = match args.branch.clone() {
        Some(name) => Some(name),
        None => repo.head().ok().and_then(|h| h.branch),
    };
    let result = git_calcver::calculate_version(&repo, config.clone(), args.branch.as_deref())?;

    if args.verbose {
        if let Some(branch) = &branch_for_log {
            eprintln!(
                "Branch: {} ({:?})",
                branch,
                BranchKind::classify(branch, &config)
            );
        }
        eprintln!("Base version: {}", result.base.sem_ver.format("s"));
        eprintln!("Source: {}", result.base.source);
        match &result.base.base_version_source {
            Some(sha) => eprintln!("Anchor commit: {}", sha),
            None => eprintln!("Anchor commit: (repository root)"),
        }
    }

    let format = match args.format.as_str() {
        "s" | "f" => args.format.as_str(),
        _ => "",
    };
    println!("{}", result.version.format(format));

    Ok(())
}
