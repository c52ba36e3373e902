use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::{ClientShell, ShellApi, ShellState, SolvyClient};
use crate::config::Config;
use crate::models::{GenerateSolutionRequest, GuidanceResponse, Problem, ProblemDraft, ProblemLevel, StepDraft};
use crate::utils::encode_image_to_base64;

#[derive(Parser)]
#[command(name = "solvy")]
#[command(author, version, about = "Step-by-step math problem guidance", long_about = None)]
pub struct Cli {
    /// Server used by the client commands
    #[arg(long, global = true, env = "SOLVY_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve,

    /// Browse and register problems
    Problems {
        #[command(subcommand)]
        action: ProblemsCommand,
    },

    /// Walk through a problem from a notebook photo, one hint at a time
    Walk {
        /// Photo of the problem
        image: PathBuf,
        /// Narrows matching, e.g. "geometry"
        #[arg(long)]
        problem_type: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProblemsCommand {
    /// List every stored problem
    List,
    /// Show one problem with its solution steps
    Show { id: String },
    /// Search by title, category or keyword
    Search { query: String },
    /// Register a new problem
    Add(AddProblemArgs),
}

#[derive(Args)]
pub struct AddProblemArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// middle-school, high-school or university
    #[arg(long, default_value = "high-school")]
    pub level: ProblemLevel,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long = "theorem")]
    pub theorems: Vec<String>,
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,
    /// JSON array of steps: [{"hint": "...", "explanation": "..."}]
    #[arg(long, conflicts_with = "generate")]
    pub steps_file: Option<PathBuf>,
    /// Ask the server to draft the solution steps first
    #[arg(long)]
    pub generate: bool,
}

pub fn client_for(server: Option<String>, config: &Config) -> SolvyClient {
    SolvyClient::new(server.unwrap_or_else(|| config.server_url.clone()))
}

pub async fn handle_problems(api: &impl ShellApi, action: ProblemsCommand) -> anyhow::Result<()> {
    match action {
        ProblemsCommand::List => {
            let problems = api.list_problems().await?;
            if problems.is_empty() {
                println!("No problems stored yet.");
            }
            for problem in &problems {
                print_summary(problem);
            }
        }
        ProblemsCommand::Show { id } => {
            let problem = api.get_problem(&id).await?;
            print_problem(&problem);
        }
        ProblemsCommand::Search { query } => {
            let problems = api.search_problems(&query).await?;
            println!("{} match(es) for '{}'", problems.len(), query);
            for problem in &problems {
                print_summary(problem);
            }
        }
        ProblemsCommand::Add(args) => {
            let problem = handle_add(api, args).await?;
            println!("Created problem {}", problem.id);
            print_problem(&problem);
        }
    }
    Ok(())
}

async fn handle_add(api: &impl ShellApi, args: AddProblemArgs) -> anyhow::Result<Problem> {
    let steps = if args.generate {
        let request = GenerateSolutionRequest {
            title: args.title.clone(),
            description: args.description.clone(),
            level: args.level,
            category: args.category.clone(),
            theorems: args.theorems.clone(),
        };
        let (solution, note) = api.generate_solution(&request).await?;
        if let Some(note) = note {
            warn!("{}", note);
        }
        println!("Intent: {}", solution.intent);
        println!("Approach: {}", solution.approach);
        println!("Difficulty: {}", solution.difficulty_assessment);
        solution.steps
    } else if let Some(path) = &args.steps_file {
        read_steps(path)?
    } else {
        Vec::new()
    };

    let draft = ProblemDraft {
        title: Some(args.title),
        description: Some(args.description),
        level: Some(args.level),
        category: args.category,
        theorems: Some(args.theorems),
        keywords: Some(args.keywords),
        solution_steps: Some(steps),
        image_url: None,
        video_url: None,
    };
    api.create_problem(&draft).await
}

fn read_steps(path: &Path) -> anyhow::Result<Vec<StepDraft>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let steps: Vec<StepDraft> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid steps file {}: {}", path.display(), e))?;
    Ok(steps)
}

/// Interactive walk: analyze the photo, then show one step per Enter press.
pub async fn handle_walk<A: ShellApi>(
    api: A,
    image: &Path,
    problem_type: Option<String>,
) -> anyhow::Result<()> {
    let payload = encode_image_to_base64(image)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", image.display(), e))?;
    info!("Loaded {} ({} bytes encoded)", image.display(), payload.len());

    let mut shell = ClientShell::new(api);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    shell.select_image(payload, problem_type)?;
    loop {
        if let ShellState::Analyzed { analysis } = shell.analyze().await? {
            println!("Recognized: {}", analysis.recognized_text);
            println!("Confidence: {:.0}%", analysis.confidence * 100.0);
            if analysis.matched_problem_id.is_none() {
                println!("No stored problem matches this photo.");
                return Ok(());
            }
            break;
        }
        if !show_error_and_ask_retry(&mut shell, &mut stdin).await? {
            return Ok(());
        }
    }

    let mut answer: Option<String> = None;
    let mut first = true;
    loop {
        let state = if first {
            shell.fetch_guidance(answer.as_deref()).await?
        } else {
            shell.advance(answer.as_deref()).await?
        };

        let guidance = match state {
            ShellState::GuidanceShown { guidance, .. } => guidance.clone(),
            _ => {
                if !show_error_and_ask_retry(&mut shell, &mut stdin).await? {
                    return Ok(());
                }
                // Dismissal lands on the analysis or on the step shown before the failed advance
                first = matches!(shell.state(), ShellState::Analyzed { .. });
                continue;
            }
        };
        first = false;

        print_guidance(&guidance);
        if !guidance.has_more_steps() {
            println!("\nThat was the last step. Well done!");
            return Ok(());
        }

        println!("\nYour answer (Enter to continue, q to quit):");
        match stdin.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("q") => return Ok(()),
            Some(line) if !line.trim().is_empty() => answer = Some(line.trim().to_string()),
            Some(_) => answer = None,
            None => return Ok(()),
        }
    }
}

/// Print the error overlay, dismiss it, and report whether the user wants to retry
async fn show_error_and_ask_retry<A, R>(
    shell: &mut ClientShell<A>,
    stdin: &mut tokio::io::Lines<R>,
) -> anyhow::Result<bool>
where
    A: ShellApi,
    R: tokio::io::AsyncBufRead + Unpin,
{
    if let ShellState::ErrorShown { message, .. } = shell.state() {
        eprintln!("Error: {}", message);
    }
    shell.dismiss_error()?;

    println!("Press Enter to retry, q to quit:");
    Ok(match stdin.next_line().await? {
        Some(line) => !line.trim().eq_ignore_ascii_case("q"),
        None => false,
    })
}

fn print_summary(problem: &Problem) {
    println!(
        "{:38} {:14} {:10} {} ({} steps)",
        problem.id,
        problem.level.as_str(),
        problem.category,
        problem.title,
        problem.total_steps()
    );
}

fn print_problem(problem: &Problem) {
    println!("{}", problem.title);
    println!("  id:       {}", problem.id);
    println!("  level:    {}", problem.level.as_str());
    println!("  category: {}", problem.category);
    if !problem.theorems.is_empty() {
        println!("  theorems: {}", problem.theorems.join(", "));
    }
    if !problem.keywords.is_empty() {
        println!("  keywords: {}", problem.keywords.join(", "));
    }
    if !problem.description.is_empty() {
        println!("\n{}", problem.description);
    }
    for step in &problem.solution_steps {
        println!("\n  {}. {}", step.step, step.hint);
        println!("     {}", step.explanation);
        if let Some(formula) = &step.formula {
            println!("     formula: {}", formula);
        }
    }
}

fn print_guidance(guidance: &GuidanceResponse) {
    println!("\n--- Step {} of {} ---", guidance.current_step, guidance.total_steps);
    println!("Hint: {}", guidance.hint);
    if let Some(visual) = &guidance.visual_description {
        println!("Picture it: {}", visual);
    }
    println!("{}", guidance.explanation);
    if let Some(formula) = &guidance.formula {
        println!("Formula: {}", formula);
    }
    println!("{}", guidance.next_step_preparation);
}
