//! Command implementations shared by the subcommands and the interactive
//! menu.

use std::path::{Path, PathBuf};

use roster_diff_cli_utils::{IndicatifProgress, MultiProgress};
use roster_diff_compare::{compare_adjacent, filter_comparison, filter_records, overall_summary};
use roster_diff_compare_models::{Comparison, ComparisonFilter};
use roster_diff_extract::ExtractionConfig;
use roster_diff_pdf::AutoTextSource;
use roster_diff_snapshot::process_document;
use roster_diff_snapshot::progress::ProgressCallback as _;
use roster_diff_snapshot::session::Session;
use roster_diff_snapshot::upload::InputDocument;
use roster_diff_store::{ConfiguredStore, StoreError, revisions};

use crate::output::{self, ComparisonReport};

/// State every command needs.
pub struct Context {
    pub config: ExtractionConfig,
    pub multi: MultiProgress,
    pub store: ConfiguredStore,
}

/// How comparison results are shown and exported.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub filter: ComparisonFilter,
    pub csv_dir: Option<PathBuf>,
    pub json: bool,
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Reads every file into the session. Empty files are skipped with a
/// warning by the session.
///
/// # Errors
///
/// Returns an I/O error if a file cannot be read.
pub fn read_inputs(session: &mut Session, paths: &[PathBuf]) -> Result<(), std::io::Error> {
    for path in paths {
        let bytes = std::fs::read(path)?;
        if let Some(name) = session.add_document(&display_name(path), bytes) {
            log::debug!("Added {} as {name}", path.display());
        }
    }
    Ok(())
}

/// Processes the session's documents, then prints and exports the
/// comparisons of every adjacent pair.
///
/// # Errors
///
/// Returns an error when too few documents were supplied or produced
/// records, or when exporting fails.
pub fn run_comparison(
    ctx: &Context,
    session: &mut Session,
    options: &OutputOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if !session.has_enough_documents(&ctx.config) {
        return Err(format!(
            "At least {} non-empty documents are needed, got {}",
            ctx.config.min_documents,
            session.documents().len()
        )
        .into());
    }

    let total = session.documents().len() as u64;
    let progress = IndicatifProgress::documents_bar(&ctx.multi, "Processing", total);
    let processed = session
        .process(&AutoTextSource, &ctx.config, progress.as_ref())
        .map(|_| ());

    let Some(outcome) = session.outcome() else {
        return Ok(());
    };
    if !options.json {
        output::print_reports(outcome);
    }
    processed?;

    let overall = overall_summary(&outcome.snapshots);
    let comparisons: Vec<Comparison> = if options.filter.is_active() {
        compare_adjacent(&outcome.snapshots)
            .iter()
            .map(|comparison| filter_comparison(comparison, &options.filter))
            .collect()
    } else {
        compare_adjacent(&outcome.snapshots)
    };

    if options.json {
        let report = ComparisonReport::new(overall, &outcome.snapshots, &comparisons);
        println!("{}", output::to_json(&report)?);
    } else {
        output::print_overall(&overall, &outcome.snapshots);
        for comparison in &comparisons {
            output::print_comparison(comparison);
        }
    }

    if let Some(dir) = &options.csv_dir {
        let written = output::export_comparisons(dir, &comparisons)?;
        log::info!("Exported {} comparison(s) to {}", written.len(), dir.display());
    }

    Ok(())
}

/// Stores the session's documents as revision `name`. Failures are logged
/// and do not abort the command.
pub async fn save_revision(ctx: &Context, session: &mut Session, name: &str) {
    if !ctx.store.is_persistent() {
        log::warn!("Revision '{name}' is kept in memory only and will be lost on exit");
    }

    let spinner =
        IndicatifProgress::transfer_bar(&ctx.multi, &format!("Saving revision '{name}'"));
    let result =
        revisions::save_revision(&ctx.store, name, session.documents(), spinner.as_ref()).await;
    spinner.clear();

    match result {
        Ok(_) => {
            session.set_active_revision(name);
            println!("Saved revision '{name}'");
        }
        Err(e) => log::warn!("Could not save revision '{name}': {e}"),
    }
}

/// `compare`: reads `files`, compares them and optionally saves them.
///
/// # Errors
///
/// Returns an error if reading or comparing fails.
pub async fn compare_files(
    ctx: &Context,
    files: &[PathBuf],
    save_as: Option<&str>,
    options: &OutputOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new();
    read_inputs(&mut session, files)?;
    run_comparison(ctx, &mut session, options)?;

    if let Some(name) = save_as {
        save_revision(ctx, &mut session, name).await;
    }
    Ok(())
}

/// `extract`: prints the snapshot of a single document.
///
/// # Errors
///
/// Returns an error if the file cannot be read, yields no records, or
/// cannot be exported.
pub fn extract_file(
    ctx: &Context,
    path: &Path,
    filter: &ComparisonFilter,
    json: bool,
    csv: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = InputDocument::new(display_name(path), std::fs::read(path)?);
    let (snapshot, stats) = process_document(&input, &AutoTextSource, &ctx.config)?;
    log::info!(
        "{}: {} lines, {} pages ({} without text), {} released",
        snapshot.source_name,
        stats.lines,
        stats.pages,
        stats.pages_without_text,
        stats.positions_released
    );

    let records = filter_records(&snapshot, filter);

    if json {
        println!("{}", output::to_json(&records)?);
    } else {
        output::print_snapshot(&snapshot, &records);
    }

    if let Some(csv) = csv {
        let file = std::fs::File::create(csv)?;
        output::write_records_csv(std::io::BufWriter::new(file), &records)?;
        log::info!("Wrote {}", csv.display());
    }

    Ok(())
}

/// `revisions list`.
///
/// # Errors
///
/// Returns an error if the store cannot be listed.
pub async fn list_revisions(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let revisions = revisions::list_revisions(&ctx.store).await?;
    if revisions.is_empty() {
        println!("No saved revisions.");
        return Ok(());
    }

    println!("{:<25} NAME", "CREATED");
    println!("{}", "-".repeat(50));
    for revision in revisions {
        println!(
            "{:<25} {}",
            revision.created_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            revision.name
        );
    }
    Ok(())
}

/// `revisions open`: downloads a revision and compares its documents.
///
/// # Errors
///
/// Returns an error if the revision cannot be loaded or compared.
pub async fn open_revision(
    ctx: &Context,
    name: &str,
    options: &OutputOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new();
    load_into(ctx, &mut session, name).await?;
    run_comparison(ctx, &mut session, options)
}

/// Replaces the session's documents with those of revision `name` and
/// makes it the active revision.
///
/// # Errors
///
/// Returns [`StoreError`] if the revision cannot be loaded. The session is
/// left untouched in that case.
pub async fn load_into(ctx: &Context, session: &mut Session, name: &str) -> Result<(), StoreError> {
    let spinner =
        IndicatifProgress::transfer_bar(&ctx.multi, &format!("Loading revision '{name}'"));
    let documents = revisions::load_revision(&ctx.store, name, spinner.as_ref()).await;
    spinner.clear();

    let documents = documents?;
    session.reset();
    for document in documents {
        session.add_document(&document.name, document.bytes);
    }
    session.set_active_revision(name);
    Ok(())
}

/// `revisions delete`.
///
/// # Errors
///
/// Returns an error if the revision does not exist or cannot be deleted.
pub async fn delete_revision(ctx: &Context, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    revisions::delete_revision(&ctx.store, name).await?;
    println!("Deleted revision '{name}'");
    Ok(())
}
