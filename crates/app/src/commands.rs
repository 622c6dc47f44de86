use clap::Subcommand;
use serde_json::json;
use tracing::info;

use services::TrainingServices;
use vocab_core::model::{Item, ItemId, MasteryLevel, ReviewMode, SessionId, TrainingResult};

/// Words added by `seed` when no terms are given.
const SAMPLE_TERMS: &[&str] = &[
    "la casa",
    "el perro",
    "el gato",
    "el libro",
    "la mesa",
    "la silla",
    "el agua",
    "la comida",
    "el coche",
    "la calle",
    "el trabajo",
    "la ciudad",
    "el tiempo",
    "la noche",
    "el día",
    "la mañana",
    "el amigo",
    "la familia",
    "la escuela",
    "el dinero",
];

#[derive(Subcommand)]
pub enum Command {
    /// Add items at level NEW (a built-in sample list when no terms are given)
    Seed {
        terms: Vec<String>,
    },
    /// List items, optionally only those at one mastery level
    Items {
        #[arg(long)]
        level: Option<MasteryLevel>,
    },
    /// Start a session and print it with its selection
    Start {
        #[arg(long, default_value = "MIXED")]
        mode: ReviewMode,
        /// Number of items to select (defaults to VOCAB_DEFAULT_SESSION_LENGTH or 15)
        #[arg(long)]
        length: Option<u32>,
    },
    /// Record one answer: CORRECT, INCORRECT or SKIPPED
    Answer {
        session: SessionId,
        item: ItemId,
        result: TrainingResult,
    },
    /// Mark a session completed
    Complete { session: SessionId },
    /// Show a session, its selection and how far it got
    Show { session: SessionId },
    /// List outcomes recorded in a session
    Outcomes { session: SessionId },
    /// Show an item's progress counters
    Progress { item: ItemId },
    /// Aggregate statistics over completed sessions
    Stats,
    /// Delete the oldest sessions
    Prune { count: u32 },
}

fn print_json(value: &serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn handle_command(
    services: &TrainingServices,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = services.recorder();
    match command {
        Command::Seed { terms } => {
            let added = seed_items(services, terms).await?;
            print_json(&json!(added))
        }
        Command::Items { level } => {
            let items = services.items();
            let levels = level.map_or(MasteryLevel::ALL.to_vec(), |level| vec![level]);
            let mut listed = Vec::new();
            for level in levels {
                listed.extend(items.list_by_mastery_level(level).await?);
            }
            listed.sort_by_key(Item::id);
            print_json(&json!(listed))
        }
        Command::Start { mode, length } => {
            let session = recorder.start(mode, length).await?;
            let selected = recorder.selected_items(session.id()).await?;
            print_json(&json!({ "session": session, "selected": selected }))
        }
        Command::Answer {
            session,
            item,
            result,
        } => {
            let answer = recorder.record_result(session, item, result).await?;
            print_json(&json!({
                "outcome": answer.outcome,
                "progress": answer.update.progress,
                "mastery": answer.update.change,
            }))
        }
        Command::Complete { session } => {
            let session = recorder.complete(session).await?;
            print_json(&json!(session))
        }
        Command::Show { session } => {
            let progress = recorder.progress(session).await?;
            let selected = recorder.selected_items(session).await?;
            let session = recorder.get_session(session).await?;
            print_json(&json!({
                "session": session,
                "selected": selected,
                "progress": progress,
            }))
        }
        Command::Outcomes { session } => {
            let outcomes = recorder.outcomes(session).await?;
            print_json(&json!(outcomes))
        }
        Command::Progress { item } => {
            let progress = services.tracker().progress(item).await?;
            print_json(&json!(progress))
        }
        Command::Stats => {
            let stats = services.stats().get_stats().await?;
            print_json(&json!(stats))
        }
        Command::Prune { count } => {
            let deleted = services.retention().prune_oldest(count).await?;
            print_json(&json!({ "deleted": deleted }))
        }
    }
}

async fn seed_items(
    services: &TrainingServices,
    terms: Vec<String>,
) -> Result<Vec<Item>, Box<dyn std::error::Error>> {
    let items = services.items();
    let terms = if terms.is_empty() {
        SAMPLE_TERMS.iter().map(|t| (*t).to_string()).collect()
    } else {
        terms
    };

    let mut next_id = 0;
    for level in MasteryLevel::ALL {
        for item in items.list_by_mastery_level(level).await? {
            next_id = next_id.max(item.id().value());
        }
    }

    let mut added = Vec::with_capacity(terms.len());
    for term in terms {
        next_id += 1;
        let item = Item::new(ItemId::new(next_id), term, MasteryLevel::New)?;
        items.upsert_item(&item).await?;
        added.push(item);
    }
    info!(count = added.len(), "seeded items");
    Ok(added)
}
