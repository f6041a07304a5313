mod config;
mod models;
mod notify;
mod presenter;
mod resolver;
mod segments;
mod storage;
mod timeofday;
mod tui;

use anyhow::{bail, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use fd_lock::RwLock;
use models::{BreakSpec, RuleBook, Weekday, WorkRule};
use presenter::project;
use resolver::{resolve, ResolvedState};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use storage::Storage;

#[derive(Parser)]
#[command(name = "workdown")]
#[command(about = "A terminal countdown for recurring work schedules and breaks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live countdown
    Run {
        /// Exit after this long (e.g. 8h, 30m)
        #[arg(short, long)]
        timeout: Option<String>,
        /// Which countdown to show big: big-total or big-break
        #[arg(long)]
        layout: Option<String>,
    },
    /// Print the current schedule state once
    Status,
    /// Manage work rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List all rules
    List,
    /// Add a rule (Mon-Fri 09:00-17:00 unless overridden)
    Add {
        name: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Comma-separated days, e.g. Mon,Tue,Wed
        #[arg(long)]
        days: Option<String>,
    },
    /// Remove a rule by id
    Remove { id: String },
    /// Change fields of a rule
    Set {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Comma-separated days, e.g. Mon,Tue,Wed
        #[arg(long)]
        days: Option<String>,
    },
    /// Add a break to a rule
    AddBreak {
        id: String,
        start: String,
        end: String,
    },
    /// Remove a break from a rule
    RemoveBreak { id: String, break_id: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let storage = Storage::new()?;

    match cli.command {
        Commands::Run { timeout, layout } => {
            let base_dir = Storage::get_base_dir()?;
            let lock_path = base_dir.join("workdown.lock");
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(lock_path)?;

            let mut lock = RwLock::new(lock_file);
            let _guard = lock.try_write().map_err(|_| {
                anyhow::anyhow!("Another instance of Workdown is already running. Please close it before starting a new one.")
            })?;

            let mut config = config::load_config()?;
            if let Some(layout) = layout {
                config.layout = parse_layout(&layout)?;
            }
            let timeout = timeout
                .map(|t| humantime::parse_duration(&t))
                .transpose()
                .map_err(|err| anyhow::anyhow!("invalid --timeout: {}", err))?;

            tui::run_tui(&storage, config, timeout)?;
        }
        Commands::Status => {
            print_status(&storage);
        }
        Commands::Rules { command } => {
            run_rules_command(&storage, command)?;
        }
    }

    Ok(())
}

fn parse_layout(s: &str) -> Result<config::Layout> {
    match s {
        "big-total" => Ok(config::Layout::BigTotal),
        "big-break" => Ok(config::Layout::BigBreak),
        other => bail!("unknown layout '{}' (expected big-total or big-break)", other),
    }
}

fn parse_days(s: &str) -> Result<BTreeSet<Weekday>> {
    let mut days = BTreeSet::new();
    for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match Weekday::parse(token) {
            Some(day) => {
                days.insert(day);
            }
            None => bail!("unknown day '{}' (expected Mon..Sun)", token),
        }
    }
    Ok(days)
}

fn validate_time(label: &str, s: &str) -> Result<()> {
    if timeofday::TimeOfDay::parse(s).is_none() {
        bail!("invalid {} time '{}' (expected HH:MM)", label, s);
    }
    Ok(())
}

fn print_status(storage: &Storage) {
    let now = Local::now().naive_local();
    let book = storage.load();
    let state = resolve(&book, now);
    let view = project(&state, now);

    println!("Workdown Status");
    println!("===============");

    match &state {
        ResolvedState::None => {
            println!("No active or upcoming rule within the next 7 days.");
            return;
        }
        ResolvedState::During(r) => {
            let what = if view.is_break { "On break" } else { "Working" };
            println!("{} ({})", what, r.rule.display_name());
        }
        ResolvedState::Upcoming(r) => {
            println!("Up next ({})", r.rule.display_name());
        }
    }

    println!("  {} — {}", view.total_label, view.total_text);
    println!("  {} — {}", view.part_label, view.part_text);
    println!(
        "  Progress: {:.0}% ({} → {})",
        view.progress_pct, view.window_start_text, view.window_end_text
    );
}

fn find_rule<'a>(book: &'a mut RuleBook, id: &str) -> Result<&'a mut WorkRule> {
    book.find_mut(id)
        .ok_or_else(|| anyhow::anyhow!("no rule with id '{}' (see 'workdown rules list')", id))
}

fn run_rules_command(storage: &Storage, command: RulesCommand) -> Result<()> {
    let mut book = storage.load();

    match command {
        RulesCommand::List => {
            if book.rules.is_empty() {
                println!("No rules defined.");
                return Ok(());
            }
            for rule in &book.rules {
                let days: Vec<&str> = rule.days.iter().map(|d| d.label()).collect();
                println!("{}  {}", rule.id, rule.display_name());
                println!("    {}  {}-{}", days.join(","), rule.start, rule.end);
                for b in &rule.breaks {
                    println!("    break {}  {}-{}", b.id, b.start, b.end);
                }
            }
            return Ok(());
        }
        RulesCommand::Add {
            name,
            start,
            end,
            days,
        } => {
            let mut rule = WorkRule::blank(&name);
            if let Some(start) = start {
                validate_time("start", &start)?;
                rule.start = start;
            }
            if let Some(end) = end {
                validate_time("end", &end)?;
                rule.end = end;
            }
            if let Some(days) = days {
                rule.days = parse_days(&days)?;
            }
            println!("Added rule {} ({})", rule.id, rule.display_name());
            book.rules.push(rule);
        }
        RulesCommand::Remove { id } => {
            let before = book.rules.len();
            book.rules.retain(|r| r.id != id);
            if book.rules.len() == before {
                bail!("no rule with id '{}' (see 'workdown rules list')", id);
            }
            println!("Removed rule {}", id);
        }
        RulesCommand::Set {
            id,
            name,
            start,
            end,
            days,
        } => {
            let parsed_days = days.map(|d| parse_days(&d)).transpose()?;
            let rule = find_rule(&mut book, &id)?;
            if let Some(name) = name {
                rule.name = name;
            }
            if let Some(start) = start {
                validate_time("start", &start)?;
                rule.start = start;
            }
            if let Some(end) = end {
                validate_time("end", &end)?;
                rule.end = end;
            }
            if let Some(days) = parsed_days {
                rule.days = days;
            }
            println!("Updated rule {}", id);
        }
        RulesCommand::AddBreak { id, start, end } => {
            validate_time("break start", &start)?;
            validate_time("break end", &end)?;
            let rule = find_rule(&mut book, &id)?;
            let spec = BreakSpec::new(&start, &end);
            println!("Added break {} to rule {}", spec.id, id);
            rule.breaks.push(spec);
        }
        RulesCommand::RemoveBreak { id, break_id } => {
            let rule = find_rule(&mut book, &id)?;
            let before = rule.breaks.len();
            rule.breaks.retain(|b| b.id != break_id);
            if rule.breaks.len() == before {
                bail!("no break with id '{}' on rule '{}'", break_id, id);
            }
            println!("Removed break {} from rule {}", break_id, id);
        }
    }

    // every mutation persists the whole book
    storage.save(&book)?;
    Ok(())
}
