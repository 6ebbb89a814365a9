use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use elevatecv::app::{App, GapCheckOptions, GenerateOptions, TextSource};
use elevatecv::models::Theme;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "elevatecv")]
#[command(about = "Draft a CV from a career goal or find skill gaps against a job description")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Draft a CV for a target role and write it as printable HTML.
    Generate(GenerateArgs),
    /// List skill gaps between a CV and a job description, with courses.
    GapCheck(GapCheckArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Career goal or target position, e.g. "Lead Designer at Airbnb".
    #[arg(long)]
    goal: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    /// Override the suggested theme.
    #[arg(long, value_parser = parse_theme_arg)]
    theme: Option<Theme>,
    /// Section title to polish after drafting; may be repeated.
    #[arg(long = "refine", value_name = "SECTION")]
    refine: Vec<String>,
    /// Output HTML file (defaults to cv-YYYY-MM-DD.html).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct GapCheckArgs {
    /// CV file (.txt or .pdf).
    #[arg(long, conflicts_with = "cv_text", required_unless_present = "cv_text")]
    cv: Option<PathBuf>,
    #[arg(long)]
    cv_text: Option<String>,
    /// Job description file.
    #[arg(long, conflicts_with = "jd_text", required_unless_present = "jd_text")]
    jd: Option<PathBuf>,
    #[arg(long)]
    jd_text: Option<String>,
    /// 1-based gap number whose full course list is shown; may be repeated.
    #[arg(long = "expand", value_name = "N", value_parser = parse_gap_number)]
    expand: Vec<usize>,
}

fn parse_theme_arg(input: &str) -> std::result::Result<Theme, String> {
    input.parse()
}

fn parse_gap_number(input: &str) -> std::result::Result<usize, String> {
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Invalid gap number '{}'. Expected 1 or more", input)),
    }
}

fn text_source(path: Option<PathBuf>, inline: Option<String>) -> TextSource {
    match path {
        Some(path) => TextSource::File(path),
        None => TextSource::Inline(inline.unwrap_or_default()),
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!("cv-{}.html", Local::now().format("%Y-%m-%d")))
}

async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Generate(args) => {
            let out = args.out.unwrap_or_else(default_output_path);
            let cv = app
                .generate(GenerateOptions {
                    goal: args.goal,
                    name: args.name,
                    location: args.location,
                    email: args.email,
                    phone: args.phone,
                    theme: args.theme,
                    refine: args.refine,
                })
                .await?;

            for (section, reason) in &cv.refinement_failures {
                warn!("Section '{}' kept its draft text: {}", section, reason);
            }

            std::fs::write(&out, &cv.html)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("{}", cv.summary);
            info!("Saved printable CV to {}", out.display());
        }
        Command::GapCheck(args) => {
            let report = app
                .gap_check(GapCheckOptions {
                    cv: text_source(args.cv, args.cv_text),
                    job_description: text_source(args.jd, args.jd_text),
                    expand: args.expand,
                })
                .await?;
            println!("{}", report);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elevatecv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&mut app, args.command).await {
        error!("{}", e);
        if let Some(task_error) = e.downcast_ref::<elevatecv::Error>() {
            eprintln!("{}", task_error.user_message());
        }
        std::process::exit(1);
    }
    Ok(())
}
