use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    format_accuracy, Difficulty, QuestionBank, QuizConfig, ScoreSummary, TagName,
    QUIZ_LENGTH_PRESETS,
};
use quiz_core::Clock;
use services::QuizFlow;
use storage::{load_bank_from_path, load_bank_from_str, StatsRecord, Storage};

/// Default question bank compiled into the binary.
const DEFAULT_BANK: &str = include_str!("../data/questions.json");

const DEFAULT_DATA_DIR: &str = "quiz-data";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
    InvalidDifficulty { raw: String },
    InvalidTag { raw: String },
    InvalidMode { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw}")
            }
            ArgsError::InvalidTag { raw } => write!(f, "invalid --tag value: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run   [options]   # start or resume a quiz (default)");
    eprintln!("  cargo run -p app -- stats [options]   # lifetime history and bank overview");
    eprintln!("  cargo run -p app -- bank  [options]   # question bank statistics");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --data-dir <path>     state directory (default {DEFAULT_DATA_DIR})");
    eprintln!("  --bank <path>         question bank file (default: built-in bank)");
    let presets: Vec<String> = QUIZ_LENGTH_PRESETS.iter().map(ToString::to_string).collect();
    eprintln!(
        "  --count <n>           questions per run (default 30, typical {})",
        presets.join("/")
    );
    eprintln!("  --difficulty <level>  foundation|advanced|expert, repeatable");
    eprintln!("  --tag <tag>           topic focus for the pool preview, repeatable");
    eprintln!("  --mode <mode>         learn|exam (default learn)");
    eprintln!("  --seed <seed>         reproducible draw; omit for a random seed");
    eprintln!("  --fresh               discard any stored session before starting");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DATA_DIR, QUIZ_BANK");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Stats,
    Bank,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "stats" => Some(Self::Stats),
            "bank" => Some(Self::Bank),
            _ => None,
        }
    }
}

struct Args {
    data_dir: PathBuf,
    bank_path: Option<PathBuf>,
    config: QuizConfig,
    fresh: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data_dir = std::env::var("QUIZ_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let mut bank_path = std::env::var("QUIZ_BANK")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let mut config = QuizConfig::default();
        let mut difficulties: Vec<Difficulty> = Vec::new();
        let mut fresh = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => {
                    data_dir = PathBuf::from(require_value(args, "--data-dir")?);
                }
                "--bank" => {
                    bank_path = Some(PathBuf::from(require_value(args, "--bank")?));
                }
                "--count" => {
                    let raw = require_value(args, "--count")?;
                    config.count = raw
                        .parse()
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or(ArgsError::InvalidCount { raw })?;
                }
                "--difficulty" => {
                    let raw = require_value(args, "--difficulty")?;
                    let difficulty = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw })?;
                    if !difficulties.contains(&difficulty) {
                        difficulties.push(difficulty);
                    }
                }
                "--tag" => {
                    let raw = require_value(args, "--tag")?;
                    let tag = TagName::new(raw.as_str())
                        .map_err(|_| ArgsError::InvalidTag { raw })?;
                    if !config.tags.contains(&tag) {
                        config.tags.push(tag);
                    }
                }
                "--mode" => {
                    let raw = require_value(args, "--mode")?;
                    config.mode = raw.parse().map_err(|_| ArgsError::InvalidMode { raw })?;
                }
                "--seed" => {
                    config.seed = Some(require_value(args, "--seed")?);
                }
                "--fresh" => fresh = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if !difficulties.is_empty() {
            config.difficulties = difficulties;
        }

        Ok(Self {
            data_dir,
            bank_path,
            config,
            fresh,
        })
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: run a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let bank = match &args.bank_path {
        Some(path) => load_bank_from_path(path)?,
        None => load_bank_from_str(DEFAULT_BANK)?,
    };
    let storage = Storage::json(&args.data_dir)?;
    log::debug!("state directory: {}", args.data_dir.display());

    match cmd {
        Command::Run => run_quiz(bank, &storage, args),
        Command::Stats => {
            let flow = QuizFlow::new(Clock::default_clock(), bank, &storage);
            print_history(&flow.stats().load());
            print_bank_overview(flow.bank());
            Ok(())
        }
        Command::Bank => {
            print_bank_stats(&bank);
            Ok(())
        }
    }
}

//
// ─── INTERACTIVE RUN ───────────────────────────────────────────────────────────
//

fn run_quiz(
    bank: QuestionBank,
    storage: &Storage,
    args: Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut flow = QuizFlow::new(Clock::default_clock(), bank, storage);

    if args.fresh {
        flow.reset();
    }

    if flow.resume()? {
        if let Some(runner) = flow.runner() {
            println!(
                "Resuming a session in progress: {} questions, seed {}.",
                runner.session().len(),
                runner.session().seed()
            );
        }
    } else {
        let pool = flow.bank().pool_size(&args.config);
        println!(
            "Question bank: {} total, {} matching your filters.",
            flow.bank().len(),
            pool
        );
        flow.start(args.config)?;
    }

    if flow.runner().is_some_and(|runner| runner.session().is_empty()) {
        println!("No questions match the current filters; nothing to run.");
        flow.reset();
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        // Quiz phase: step through questions until finish or quit.
        render_current(&flow);
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            println!("Progress saved; run again to resume.");
            return Ok(());
        };
        let input = line?;

        match input.trim() {
            "" => {}
            "n" | "next" => {
                if !flow.next()? {
                    println!("Already at the last question; type `finish` to score the run.");
                }
            }
            "p" | "prev" => {
                if !flow.previous()? {
                    println!("Already at the first question.");
                }
            }
            "f" | "flag" => {
                let flagged = flow.toggle_flag()?;
                println!(
                    "{}",
                    if flagged { "Flagged for review." } else { "Flag removed." }
                );
            }
            "r" | "reveal" => {
                flow.toggle_reveal()?;
            }
            "q" | "quit" => {
                println!("Progress saved; run again to resume.");
                return Ok(());
            }
            "finish" => {
                let summary = flow.finish()?.clone();
                print_results(&flow, &summary);

                println!();
                println!("[enter] quit · retry (new run, same settings) · mistakes (drill what you missed) · reset (discard and start over)");
                print!("> ");
                std::io::stdout().flush()?;
                let choice = match lines.next() {
                    Some(line) => line?,
                    None => return Ok(()),
                };
                match choice.trim() {
                    "retry" => {
                        flow.retry_same_settings()?;
                    }
                    "mistakes" => {
                        if flow.review_mistakes()? == 0 {
                            println!("Perfect run, nothing to drill.");
                            return Ok(());
                        }
                    }
                    "reset" => {
                        flow.reset();
                        return Ok(());
                    }
                    _ => return Ok(()),
                }
            }
            "help" | "?" => print_commands(),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => {
                    if let Err(err) = flow.select_answer(n - 1) {
                        println!("{err}");
                    }
                }
                _ => println!("Unrecognized input `{other}`; type `help` for commands."),
            },
        }
    }
}

fn print_commands() {
    println!("Commands:");
    println!("  1..9      answer with that choice");
    println!("  n / p     next / previous question");
    println!("  f         flag the question for review");
    println!("  r         reveal or hide the explanation");
    println!("  finish    score the run");
    println!("  q         save and quit");
}

fn render_current(flow: &QuizFlow) {
    let Some(runner) = flow.runner() else { return };
    let Some(question) = runner.current_question() else {
        return;
    };

    let progress = runner.progress();
    println!();
    println!(
        "── Question {} of {} · {} answered · {} · {}",
        runner.current_index() + 1,
        progress.total,
        progress.answered,
        question.difficulty().label(),
        question.section(),
    );
    if !question.tags().is_empty() {
        let tags: Vec<&str> = question.tags().iter().map(TagName::as_str).collect();
        println!("   [{}]", tags.join(", "));
    }
    println!();
    println!("{}", question.prompt());
    for (index, choice) in question.choices().iter().enumerate() {
        let marker = if runner.sheet().selected(question.id()) == Some(index) {
            "»"
        } else {
            " "
        };
        println!(" {marker} {}. {choice}", index + 1);
    }

    if runner.sheet().is_flagged(question.id()) {
        println!("   (flagged)");
    }

    if let Some(selected) = runner.sheet().selected(question.id()) {
        if runner.explanation_visible() {
            if question.is_correct(selected) {
                println!("   Correct.");
            } else {
                println!(
                    "   Incorrect; the answer is {}. {}",
                    question.answer_index() + 1,
                    question.choices()[question.answer_index()]
                );
            }
        } else {
            println!("   Answer recorded.");
        }
    }

    if runner.explanation_visible() {
        println!();
        println!("   Why: {}", question.explanation());
        if let Some(deep_dive) = question.deep_dive() {
            println!("   Deep dive: {deep_dive}");
        }
    }
}

//
// ─── REPORTS ───────────────────────────────────────────────────────────────────
//

fn print_results(flow: &QuizFlow, summary: &ScoreSummary) {
    println!();
    println!(
        "Results: {}/{} correct · {}%",
        summary.correct(),
        summary.total(),
        summary.accuracy()
    );

    println!();
    println!("By section:");
    for (section, tally) in summary.by_section() {
        println!(
            "  {section:<24} {}",
            format_accuracy(tally.correct, tally.total)
        );
    }

    println!();
    println!("By difficulty:");
    for (difficulty, tally) in summary.by_difficulty() {
        println!(
            "  {:<24} {}",
            difficulty.label(),
            format_accuracy(tally.correct, tally.total)
        );
    }

    let weakest = summary.weakest_topics(2, 6);
    if !weakest.is_empty() {
        println!();
        println!("Weakest topics:");
        for topic in &weakest {
            println!(
                "  {:<24} {:.0}%",
                topic.tag.as_str(),
                topic.tally.fraction() * 100.0
            );
        }
    }

    if let Some(runner) = flow.runner() {
        let flagged = runner.sheet().flagged();
        if !flagged.is_empty() {
            println!();
            println!("Flagged questions:");
            for id in flagged {
                let Some(question) = flow.bank().question(id) else {
                    continue;
                };
                println!("  {}", question.prompt());
                match runner.sheet().selected(id) {
                    Some(choice) => println!("    your answer: {}", question.choices()[choice]),
                    None => println!("    your answer: not answered"),
                }
                println!(
                    "    correct:     {}",
                    question.choices()[question.answer_index()]
                );
            }
        }
    }

    print_history(&flow.stats().load());
}

fn print_history(stats: &StatsRecord) {
    println!();
    println!("Your history:");
    println!("  runs completed      {}", stats.total_runs);
    println!("  lifetime accuracy   {}%", stats.lifetime_accuracy());
    for entry in &stats.last_scores {
        let date = DateTime::<Utc>::from_timestamp_millis(entry.at)
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {date}  {}/{} · {}%",
            entry.correct, entry.total, entry.accuracy
        );
    }
}

fn print_bank_overview(bank: &QuestionBank) {
    let stats = bank.stats();
    println!();
    println!("Bank overview ({} questions):", bank.len());
    for (section, count) in stats.sections().iter().take(6) {
        println!("  {section:<24} {count}");
    }
}

fn print_bank_stats(bank: &QuestionBank) {
    let stats = bank.stats();
    println!("Question bank: {} questions", bank.len());

    println!();
    println!("Sections:");
    for (section, count) in stats.sections() {
        println!("  {section:<24} {count}");
    }

    println!();
    println!("Tags:");
    for (tag, count) in stats.tags() {
        println!("  {:<24} {count}", tag.as_str());
    }

    println!();
    println!("Difficulties:");
    for (difficulty, count) in stats.difficulties() {
        println!("  {:<24} {count}", difficulty.label());
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
