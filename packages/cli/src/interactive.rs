#![allow(clippy::module_name_repetitions)]

//! Interactive menu for comparing roster documents.
//!
//! Keeps one [`Session`] across actions so a comparison can be viewed,
//! filtered and saved without re-reading its documents.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, MultiSelect, Select};
use roster_diff_compare_models::{ComparisonFilter, Situation};
use roster_diff_roster_models::Province;
use roster_diff_snapshot::session::Session;
use roster_diff_store::revisions;
use strum::IntoEnumIterator as _;

use crate::commands::{self, Context, OutputOptions};

/// Top-level actions available in the interactive menu.
enum Action {
    CompareDocuments,
    FilterResults,
    SaveRevision,
    OpenRevision,
    DeleteRevision,
    StartOver,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::CompareDocuments,
        Self::FilterResults,
        Self::SaveRevision,
        Self::OpenRevision,
        Self::DeleteRevision,
        Self::StartOver,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::CompareDocuments => "Compare documents",
            Self::FilterResults => "Filter current comparison",
            Self::SaveRevision => "Save current comparison as revision",
            Self::OpenRevision => "Open saved revision",
            Self::DeleteRevision => "Delete saved revision",
            Self::StartOver => "Start over",
            Self::Quit => "Quit",
        }
    }
}

const PROVINCES: &[Province] = &[
    Province::Almeria,
    Province::Cadiz,
    Province::Cordoba,
    Province::Granada,
    Province::Huelva,
    Province::Jaen,
    Province::Malaga,
    Province::Sevilla,
    Province::Madrid,
    Province::CentralServices,
    Province::Unspecified,
];

/// Runs the menu loop until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or the store cannot be listed.
pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let mut session = Session::new();

    loop {
        if let Some(revision) = session.active_revision() {
            println!("Current revision: {revision}");
        }

        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        let result = match Action::ALL[idx] {
            Action::CompareDocuments => compare_documents(ctx, &mut session),
            Action::FilterResults => filter_results(ctx, &mut session),
            Action::SaveRevision => save_revision(ctx, &mut session).await,
            Action::OpenRevision => open_revision(ctx, &mut session).await,
            Action::DeleteRevision => delete_revision(ctx).await,
            Action::StartOver => {
                session.reset();
                println!("Session cleared.");
                Ok(())
            }
            Action::Quit => return Ok(()),
        };

        if let Err(e) = result {
            log::error!("{e}");
        }
    }
}

/// Prompts for file paths, one per line, until an empty line.
fn prompt_paths() -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    loop {
        let input: String = Input::new()
            .with_prompt(format!("Document {} (empty to finish)", paths.len() + 1))
            .allow_empty(true)
            .interact_text()?;
        let input = input.trim();
        if input.is_empty() {
            return Ok(paths);
        }
        paths.push(PathBuf::from(input));
    }
}

fn compare_documents(
    ctx: &Context,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error>> {
    if !session.documents().is_empty() {
        let keep = Confirm::new()
            .with_prompt(format!(
                "Add to the {} document(s) already loaded?",
                session.documents().len()
            ))
            .default(true)
            .interact()?;
        if !keep {
            session.reset();
        }
    }

    let paths = prompt_paths()?;
    commands::read_inputs(session, &paths)?;
    commands::run_comparison(ctx, session, &OutputOptions::default())
}

fn prompt_filter() -> Result<ComparisonFilter, Box<dyn std::error::Error>> {
    let province_labels: Vec<&str> = PROVINCES.iter().map(AsRef::as_ref).collect();
    let provinces = MultiSelect::new()
        .with_prompt("Provinces (space=toggle, enter=confirm, none=all)")
        .items(&province_labels)
        .interact()?;

    let situations: Vec<Situation> = Situation::iter().collect();
    let situation_labels: Vec<&str> = situations.iter().map(AsRef::as_ref).collect();
    let selected_situations = MultiSelect::new()
        .with_prompt("Situations (none=all)")
        .items(&situation_labels)
        .interact()?;

    let grades: String = Input::new()
        .with_prompt("Grades, comma-separated (empty for all)")
        .allow_empty(true)
        .interact_text()?;

    Ok(ComparisonFilter {
        provinces: provinces.into_iter().map(|i| PROVINCES[i]).collect(),
        situations: selected_situations
            .into_iter()
            .map(|i| situations[i])
            .collect(),
        grades: grades
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_uppercase)
            .collect(),
        ..ComparisonFilter::default()
    })
}

fn filter_results(ctx: &Context, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    if session.outcome().is_none() {
        println!("Nothing to filter yet, compare some documents first.");
        return Ok(());
    }
    let options = OutputOptions {
        filter: prompt_filter()?,
        ..OutputOptions::default()
    };
    commands::run_comparison(ctx, session, &options)
}

async fn save_revision(
    ctx: &Context,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error>> {
    if !session.has_enough_documents(&ctx.config) {
        println!("Load at least {} documents first.", ctx.config.min_documents);
        return Ok(());
    }

    let mut prompt = Input::<String>::new().with_prompt("Revision name");
    if let Some(active) = session.active_revision() {
        prompt = prompt.default(active.to_owned());
    }
    let name = prompt.interact_text()?;

    commands::save_revision(ctx, session, name.trim()).await;
    Ok(())
}

/// Lets the user pick a saved revision. `None` when there are none.
async fn select_revision(
    ctx: &Context,
    prompt: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let revisions = revisions::list_revisions(&ctx.store).await?;
    if revisions.is_empty() {
        println!("No saved revisions.");
        return Ok(None);
    }

    let labels: Vec<String> = revisions
        .iter()
        .map(|r| format!("{} ({})", r.name, r.created_time.format("%Y-%m-%d %H:%M")))
        .collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .max_length(20)
        .interact()?;

    Ok(Some(revisions[idx].name.clone()))
}

async fn open_revision(
    ctx: &Context,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(name) = select_revision(ctx, "Revision to open").await? else {
        return Ok(());
    };

    commands::load_into(ctx, session, &name).await?;

    commands::run_comparison(ctx, session, &OutputOptions::default())
}

async fn delete_revision(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let Some(name) = select_revision(ctx, "Revision to delete").await? else {
        return Ok(());
    };

    let confirmed = Confirm::new()
        .with_prompt(format!("Delete revision '{name}' and its documents?"))
        .default(false)
        .interact()?;
    if !confirmed {
        return Ok(());
    }

    commands::delete_revision(ctx, &name).await
}
