// okr.rs — OKR subcommands: inspect, create, transition, check in.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use pdi_directory::{Directory, DirectoryGate};
use pdi_okr::{
    build_alignment_tree, classify, AlignmentNode, BandSummary, Confidence, Cycle,
    EventDispatcher, KeyResult, LogSink, Objective, ObjectiveLevel, ObjectiveStatus, OkrEvent,
    OkrStore, Scorecard,
};
use uuid::Uuid;

use crate::config::PdiConfig;

#[derive(Subcommand)]
pub enum OkrCommands {
    /// Show an objective with per-key-result scores and bands.
    Show {
        /// Objective ID.
        id: String,
    },
    /// List objectives.
    List {
        /// Filter by status (e.g., "draft", "pending_validation", "tracking").
        #[arg(long)]
        status: Option<String>,
    },
    /// Band summary across objectives that are not closed.
    Dashboard,
    /// Print the alignment tree from company objectives down.
    Tree,
    /// Create a cycle.
    Cycle {
        /// Cycle name (e.g., "2026 Q4").
        name: String,
        /// First day, inclusive (YYYY-MM-DD).
        starts_on: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD).
        ends_on: NaiveDate,
    },
    /// Create a draft objective.
    Create {
        title: String,
        /// company, area, head, or individual.
        #[arg(long)]
        level: String,
        /// Owner person ID.
        #[arg(long)]
        owner: String,
        /// Cycle ID.
        #[arg(long)]
        cycle: String,
        /// Parent objective ID.
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Attach a key result to an objective.
    AddKr {
        /// Objective ID.
        objective_id: String,
        title: String,
        #[arg(long, allow_negative_numbers = true)]
        start: f64,
        #[arg(long, allow_negative_numbers = true)]
        target: f64,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        weight: f64,
    },
    /// Request a status change on behalf of a person.
    Transition {
        /// Objective ID.
        id: String,
        /// Target status.
        status: String,
        /// Acting person ID (must be in the directory).
        #[arg(long)]
        actor: String,
        /// Status the objective must still be in (defaults to its current one).
        #[arg(long)]
        expect: Option<String>,
        /// Evaluate cycle phase on this date instead of today.
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Apply automatic transitions (start tracking, close ended cycles).
    Advance {
        /// Evaluate cycle phases on this date instead of today.
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Record a new value for a key result.
    CheckIn {
        /// Key result ID.
        key_result_id: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Acting person ID (must be in the directory).
        #[arg(long)]
        actor: String,
        /// low, medium, or high.
        #[arg(long)]
        confidence: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
}

pub fn execute(cmd: &OkrCommands, config: &PdiConfig) -> anyhow::Result<()> {
    let store = OkrStore::new(&config.store.dir)?;
    let directory = Directory::load_or_empty(&config.directory.path)?;
    let dispatcher = dispatcher(config);
    let today = Utc::now().date_naive();

    match cmd {
        OkrCommands::Show { id } => show_objective(&store, parse_id(id)?),
        OkrCommands::List { status } => list_objectives(&store, status.as_deref()),
        OkrCommands::Dashboard => dashboard(&store),
        OkrCommands::Tree => print_tree(&store),
        OkrCommands::Cycle {
            name,
            starts_on,
            ends_on,
        } => create_cycle(&store, name, *starts_on, *ends_on).map(|_| ()),
        OkrCommands::Create {
            title,
            level,
            owner,
            cycle,
            parent,
            area,
            description,
        } => {
            let mut objective = Objective::new(
                title.as_str(),
                level.parse::<ObjectiveLevel>()?,
                parse_id(owner)?,
                parse_id(cycle)?,
            );
            objective.parent_objective_id = parent.as_deref().map(parse_id).transpose()?;
            objective.area = area.clone();
            objective.description = description.clone();
            create_objective(&store, &dispatcher, objective).map(|_| ())
        }
        OkrCommands::AddKr {
            objective_id,
            title,
            start,
            target,
            unit,
            weight,
        } => {
            let mut key_result =
                KeyResult::new(parse_id(objective_id)?, title.as_str(), *start, *target);
            key_result.unit = unit.clone();
            key_result.weight = *weight;
            add_key_result(&store, &dispatcher, &key_result)
        }
        OkrCommands::Transition {
            id,
            status,
            actor,
            expect,
            on,
        } => {
            let requested: ObjectiveStatus = status.parse()?;
            let expected = expect
                .as_deref()
                .map(str::parse::<ObjectiveStatus>)
                .transpose()?;
            transition(
                &store,
                &directory,
                &dispatcher,
                parse_id(id)?,
                expected,
                requested,
                parse_id(actor)?,
                on.unwrap_or(today),
            )
        }
        OkrCommands::Advance { on } => advance(&store, &dispatcher, on.unwrap_or(today)),
        OkrCommands::CheckIn {
            key_result_id,
            value,
            actor,
            confidence,
            note,
        } => {
            let confidence = confidence
                .as_deref()
                .map(str::parse::<Confidence>)
                .transpose()?;
            check_in(
                &store,
                &directory,
                &dispatcher,
                parse_id(key_result_id)?,
                *value,
                parse_id(actor)?,
                confidence,
                note.clone(),
            )
        }
    }
}

fn dispatcher(config: &PdiConfig) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    if config.events.enabled {
        dispatcher.add_sink(Box::new(LogSink::new(&config.events.log)));
    }
    dispatcher
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("invalid ID: {}", id))
}

fn show_objective(store: &OkrStore, id: Uuid) -> anyhow::Result<()> {
    let Some(objective) = store.get_objective(id)? else {
        eprintln!("Objective not found: {}", id);
        std::process::exit(1);
    };
    let key_results = store.list_key_results(id)?;
    let card = Scorecard::build(&objective, &key_results);

    println!("Objective: {}", objective.id);
    println!("Title:     {}", objective.title);
    if let Some(ref description) = objective.description {
        println!("About:     {}", description);
    }
    println!("Level:     {}", objective.level);
    if let Some(ref area) = objective.area {
        println!("Area:      {}", area);
    }
    println!("Status:    {}", objective.status);
    println!("Owner:     {}", objective.owner_id);
    println!("Cycle:     {}", objective.cycle_id);
    if let Some(parent) = objective.parent_objective_id {
        println!("Parent:    {}", parent);
    }
    println!("Score:     {}", format_score(card.score));
    println!();

    if key_results.is_empty() {
        println!("No key results.");
        return Ok(());
    }
    println!(
        "{:<38} {:<28} {:>10} {:>10} {:>10} {:>6} {:<10}",
        "KEY RESULT", "TITLE", "START", "CURRENT", "TARGET", "SCORE", "BAND"
    );
    println!("{}", "-".repeat(118));
    for (kr, scored) in key_results.iter().zip(&card.key_results) {
        println!(
            "{:<38} {:<28} {:>10} {:>10} {:>10} {:>6.1} {:<10}",
            kr.id,
            truncate(&kr.title, 26),
            kr.start_value,
            kr.current_value,
            kr.target_value,
            scored.score,
            scored.band,
        );
    }
    Ok(())
}

fn list_objectives(store: &OkrStore, status: Option<&str>) -> anyhow::Result<()> {
    let objectives = match status {
        Some(s) => store.list_objectives_by_status(s.parse()?)?,
        None => store.list_objectives()?,
    };

    if objectives.is_empty() {
        println!("No objectives found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<30} {:<11} {:<19} {:>6}",
        "ID", "TITLE", "LEVEL", "STATUS", "SCORE"
    );
    println!("{}", "-".repeat(108));
    for o in &objectives {
        println!(
            "{:<38} {:<30} {:<11} {:<19} {:>6}",
            o.id,
            truncate(&o.title, 28),
            o.level.to_string(),
            o.status.to_string(),
            format_score(o.current_score),
        );
    }
    println!("\n{} objective(s) total.", objectives.len());
    Ok(())
}

fn dashboard(store: &OkrStore) -> anyhow::Result<()> {
    let objectives: Vec<Objective> = store
        .list_objectives()?
        .into_iter()
        .filter(|o| o.status.is_active())
        .collect();
    let summary = BandSummary::from_scores(objectives.iter().map(|o| o.current_score));

    println!("On track:  {}", summary.on_track);
    println!("At risk:   {}", summary.at_risk);
    println!("Off track: {}", summary.off_track);
    println!("Unscored:  {}", summary.unscored);
    println!("Mean:      {}", format_score(summary.mean_score));
    println!();
    for status in ObjectiveStatus::ALL {
        let count = objectives.iter().filter(|o| o.status == status).count();
        if count > 0 {
            println!("{:<19} {}", status.to_string(), count);
        }
    }
    Ok(())
}

fn print_tree(store: &OkrStore) -> anyhow::Result<()> {
    let objectives = store.list_objectives()?;
    let key_results = store.list_all_key_results()?;
    let forest = build_alignment_tree(&objectives, &key_results);
    if forest.is_empty() {
        println!("No objectives found.");
    }
    for node in &forest {
        print_node(node, 0);
    }
    Ok(())
}

fn print_node(node: &AlignmentNode, depth: usize) {
    let band = node
        .score
        .map(|s| classify(s).to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}{} [{}] {} ({}, {} KR)",
        "  ".repeat(depth),
        node.objective.title,
        node.objective.level,
        format_score(node.score),
        band,
        node.key_results.len(),
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn create_cycle(
    store: &OkrStore,
    name: &str,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
) -> anyhow::Result<Cycle> {
    let cycle = Cycle::new(name, starts_on, ends_on)?;
    store.save_cycle(&cycle)?;
    println!("Cycle created: {}", cycle.id);
    println!("  {} ({} to {})", cycle.name, cycle.starts_on, cycle.ends_on);
    Ok(cycle)
}

fn create_objective(
    store: &OkrStore,
    dispatcher: &EventDispatcher,
    objective: Objective,
) -> anyhow::Result<Objective> {
    store
        .get_cycle(objective.cycle_id)?
        .with_context(|| format!("cycle not found: {}", objective.cycle_id))?;
    store.create_objective(&objective)?;
    dispatcher.dispatch(&OkrEvent::objective_created(&objective));
    println!("Objective created: {}", objective.id);
    println!("  {} [{}], draft", objective.title, objective.level);
    Ok(objective)
}

fn add_key_result(
    store: &OkrStore,
    dispatcher: &EventDispatcher,
    key_result: &KeyResult,
) -> anyhow::Result<()> {
    store.save_key_result(key_result)?;
    let objective = store.refresh_score(key_result.objective_id)?;
    dispatcher.dispatch(&OkrEvent::score_refreshed(&objective));
    println!("Key result added: {}", key_result.id);
    println!("  Objective score: {}", format_score(objective.current_score));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn transition(
    store: &OkrStore,
    directory: &Directory,
    dispatcher: &EventDispatcher,
    objective_id: Uuid,
    expected: Option<ObjectiveStatus>,
    requested: ObjectiveStatus,
    actor_id: Uuid,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let actor = directory.actor_for(actor_id)?;
    let gate = DirectoryGate::new(directory);
    let expected = match expected {
        Some(status) => status,
        None => {
            store
                .get_objective(objective_id)?
                .with_context(|| format!("objective not found: {}", objective_id))?
                .status
        }
    };

    let outcome =
        store.apply_transition(objective_id, expected, requested, &actor, &gate, today)?;
    dispatcher.dispatch(&OkrEvent::status_changed(
        objective_id,
        outcome.from,
        outcome.objective.status,
        actor.id,
    ));
    println!(
        "Objective {}: {} -> {}",
        objective_id, outcome.from, outcome.objective.status
    );
    Ok(())
}

fn advance(store: &OkrStore, dispatcher: &EventDispatcher, today: NaiveDate) -> anyhow::Result<()> {
    let outcomes = store.advance(today)?;
    if outcomes.is_empty() {
        println!("Nothing to advance on {}.", today);
        return Ok(());
    }
    for outcome in &outcomes {
        dispatcher.dispatch(&OkrEvent::status_changed(
            outcome.objective.id,
            outcome.from,
            outcome.objective.status,
            Uuid::nil(),
        ));
        println!(
            "{:<38} {} -> {}",
            outcome.objective.id, outcome.from, outcome.objective.status
        );
    }
    println!("\n{} transition(s) applied.", outcomes.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn check_in(
    store: &OkrStore,
    directory: &Directory,
    dispatcher: &EventDispatcher,
    key_result_id: Uuid,
    value: f64,
    actor_id: Uuid,
    confidence: Option<Confidence>,
    note: Option<String>,
) -> anyhow::Result<()> {
    let actor = directory.actor_for(actor_id)?;
    let gate = DirectoryGate::new(directory);
    let outcome = store.record_check_in(key_result_id, &actor, value, confidence, note, &gate)?;

    dispatcher.dispatch(&OkrEvent::check_in_recorded(
        outcome.objective.id,
        &outcome.check_in,
    ));
    dispatcher.dispatch(&OkrEvent::score_refreshed(&outcome.objective));

    let score = outcome.key_result.score();
    println!(
        "Check-in recorded: {} -> {} ({:.1}, {})",
        outcome.check_in.previous_value,
        outcome.check_in.value,
        score,
        classify(score)
    );
    println!(
        "  Objective score: {}",
        format_score(outcome.objective.current_score)
    );
    Ok(())
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.1}", s),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
