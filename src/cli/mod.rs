//! Command-line surface: argument parsing and command dispatch.

use std::collections::HashSet;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::analysis::answer::answer_question;
use crate::analysis::compare::{Analysis, analyze};
use crate::analysis::interactions::{InteractionFinding, scan_interactions};
use crate::entities::batch::{Batch, LatestBatch};
use crate::entities::medication::{
    CATEGORY_COMPARISON, CATEGORY_UNKNOWN, MedicationIdentifier, MedicationPipeline,
    MedicationRecord,
};
use crate::entities::selection::{MAX_SELECTION, SelectionSet};
use crate::entities::watchlist::{self, WatchList};
use crate::error::MedLensError;
use crate::render::{json, markdown};
use crate::sources::openfda::OpenFdaClient;

pub mod health;

#[derive(Parser, Debug)]
#[command(
    name = "medlens",
    version,
    about = "Explore medications from PubChem: compare compounds and check openFDA label interactions"
)]
pub struct Cli {
    /// Emit JSON instead of Markdown
    #[arg(long, global = true)]
    pub json: bool,

    /// Bypass the local HTTP cache for this invocation
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every compound on the watch list
    List {
        /// Only load entries in this category (`c`/`n` shorthands accepted)
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one compound in detail
    Get {
        cid: u64,
        #[arg(long)]
        category: Option<String>,
        /// Also list a few structurally similar compounds
        #[arg(long)]
        similar: bool,
    },
    /// Search PubChem by name (up to 5 compounds)
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Compounds at least 90% similar to a seed compound (up to 8)
    Similar { cid: u64 },
    /// Compare 2 to 4 compounds side by side
    Compare {
        #[arg(required = true, num_args = 2..)]
        cids: Vec<u64>,
    },
    /// Scan FDA labels for drug-drug and drug-food interaction evidence
    Interactions {
        #[arg(required = true, num_args = 1..)]
        cids: Vec<u64>,
    },
    /// Ask a question about one compound
    Ask {
        cid: u64,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Manage the persisted watch list
    Watch {
        #[command(subcommand)]
        command: WatchCommand,
    },
    /// Check upstream API connectivity and local storage
    Health {
        #[arg(long)]
        apis_only: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum WatchCommand {
    /// Show the saved entries grouped by category
    List,
    /// Append a compound
    Add {
        cid: u64,
        #[arg(long)]
        category: Option<String>,
    },
    /// Restore the built-in list
    Reset,
}

#[derive(Serialize)]
struct ComparisonOutput<'a> {
    records: &'a [MedicationRecord],
    analysis: &'a Analysis,
    skipped: &'a [u64],
}

#[derive(Serialize)]
struct InteractionOutput<'a> {
    names: &'a [String],
    findings: &'a [InteractionFinding],
}

/// One invocation's state: the pipeline plus the latest accepted batch.
struct Session {
    pipeline: MedicationPipeline,
    latest: LatestBatch,
}

impl Session {
    fn new() -> Result<Self, MedLensError> {
        Ok(Self {
            pipeline: MedicationPipeline::new()?,
            latest: LatestBatch::default(),
        })
    }

    fn accept(&mut self, batch: Batch) -> Result<&Batch, MedLensError> {
        let id = batch.id.value();
        if !self.latest.offer(batch) {
            debug!(batch = id, "Discarded stale batch completion");
        }
        self.latest.current().ok_or_else(|| MedLensError::Api {
            api: "medlens".into(),
            message: "No batch available".into(),
        })
    }

    /// Fetches a deduplicated selection of at most four compounds.
    async fn selection(
        &mut self,
        cids: &[u64],
        watch: &WatchList,
    ) -> Result<(SelectionSet, Vec<u64>), MedLensError> {
        let mut seen = HashSet::new();
        let unique = cids
            .iter()
            .copied()
            .filter(|cid| seen.insert(*cid))
            .collect::<Vec<_>>();
        if unique.len() > MAX_SELECTION {
            return Err(MedLensError::SelectionFull {
                limit: MAX_SELECTION,
            });
        }

        let ids = unique
            .iter()
            .map(|cid| {
                let category = watch.category_of(*cid).unwrap_or(CATEGORY_COMPARISON);
                MedicationIdentifier::new(*cid, category)
            })
            .collect::<Vec<_>>();
        let batch = self.pipeline.fetch_selection(&ids).await;
        let batch = self.accept(batch)?;

        let mut selection = SelectionSet::new();
        for record in &batch.records {
            selection.insert(record.clone())?;
        }
        Ok((selection, batch.skipped.clone()))
    }
}

fn render_batch(batch: &Batch, as_json: bool) -> Result<String, MedLensError> {
    if as_json {
        json::to_pretty(batch)
    } else {
        markdown::batch_markdown(batch)
    }
}

fn record_identifier(cid: u64, category: Option<&str>, watch: &WatchList) -> MedicationIdentifier {
    let category = match category {
        Some(raw) => watchlist::resolve_category(Some(raw)),
        None => watch
            .category_of(cid)
            .unwrap_or(CATEGORY_UNKNOWN)
            .to_string(),
    };
    MedicationIdentifier::new(cid, category)
}

async fn run_watch(command: WatchCommand, as_json: bool) -> anyhow::Result<String> {
    let mut watch = WatchList::load_default().await;
    match command {
        WatchCommand::List => {}
        WatchCommand::Add { cid, category } => watch.add(cid, category.as_deref()).await?,
        WatchCommand::Reset => watch.reset().await?,
    }
    if as_json {
        return Ok(json::to_pretty(&watch.entries())?);
    }
    Ok(markdown::watchlist_markdown(watch.entries(), watch.path())?)
}

async fn dispatch(cli: Cli) -> anyhow::Result<String> {
    let as_json = cli.json;
    match cli.command {
        Commands::Health { apis_only } => {
            let report = health::check(apis_only).await?;
            if as_json {
                return Ok(json::to_pretty(&report)?);
            }
            Ok(report.to_markdown())
        }
        Commands::Watch { command } => run_watch(command, as_json).await,
        Commands::List { category } => {
            let watch = WatchList::load_default().await;
            let wanted = category.map(|c| watchlist::resolve_category(Some(&c)));
            let entries = watch
                .entries()
                .iter()
                .filter(|e| {
                    wanted
                        .as_deref()
                        .is_none_or(|w| e.category.eq_ignore_ascii_case(w))
                })
                .cloned()
                .collect::<Vec<_>>();
            if entries.is_empty() {
                return Err(MedLensError::InvalidArgument(format!(
                    "No watch-list entries in category '{}'",
                    wanted.unwrap_or_default()
                ))
                .into());
            }

            let mut session = Session::new()?;
            let batch = session.pipeline.load_watchlist(&entries).await;
            Ok(render_batch(session.accept(batch)?, as_json)?)
        }
        Commands::Search { query } => {
            let query = query.join(" ");
            let mut session = Session::new()?;
            let batch = session.pipeline.search(&query).await;
            Ok(render_batch(session.accept(batch)?, as_json)?)
        }
        Commands::Similar { cid } => {
            let mut session = Session::new()?;
            let batch = session.pipeline.similar(cid).await;
            Ok(render_batch(session.accept(batch)?, as_json)?)
        }
        Commands::Get {
            cid,
            category,
            similar,
        } => {
            let watch = WatchList::load_default().await;
            let session = Session::new()?;
            let id = record_identifier(cid, category.as_deref(), &watch);
            let record = session.pipeline.fetch(&id).await?;
            let similar = if similar {
                session.pipeline.similar_preview(cid).await
            } else {
                Vec::new()
            };
            if as_json {
                return Ok(json::to_pretty(&record)?);
            }
            Ok(markdown::medication_markdown(&record, &similar)?)
        }
        Commands::Ask { cid, question } => {
            let watch = WatchList::load_default().await;
            let session = Session::new()?;
            let record = session
                .pipeline
                .fetch(&record_identifier(cid, None, &watch))
                .await?;
            let answer = answer_question(&record, &question.join(" "));
            if as_json {
                return Ok(json::to_pretty(&answer)?);
            }
            Ok(markdown::answer_markdown(&record, &answer)?)
        }
        Commands::Compare { cids } => {
            let watch = WatchList::load_default().await;
            let mut session = Session::new()?;
            let (selection, skipped) = session.selection(&cids, &watch).await?;
            if !selection.can_compare() {
                return Err(MedLensError::InvalidArgument(format!(
                    "At least two compounds are needed to compare; loaded: {:?}, unavailable: {skipped:?}",
                    selection.ids()
                ))
                .into());
            }
            let analysis = analyze(selection.records())?;
            if as_json {
                return Ok(json::to_pretty(&ComparisonOutput {
                    records: selection.records(),
                    analysis: &analysis,
                    skipped: &skipped,
                })?);
            }
            Ok(markdown::comparison_markdown(
                selection.records(),
                &analysis,
                &skipped,
            )?)
        }
        Commands::Interactions { cids } => {
            let watch = WatchList::load_default().await;
            let mut session = Session::new()?;
            let (selection, _) = session.selection(&cids, &watch).await?;
            if selection.is_empty() {
                let cid = cids.first().copied().unwrap_or_default();
                return Err(MedLensError::compound_not_found(cid).into());
            }
            let names = selection.names();
            let client = OpenFdaClient::new()?;
            let findings = scan_interactions(&client, &names).await;
            if as_json {
                return Ok(json::to_pretty(&InteractionOutput {
                    names: &names,
                    findings: &findings,
                })?);
            }
            Ok(markdown::interactions_markdown(&names, &findings)?)
        }
    }
}

/// Runs one CLI command and returns its rendered output.
///
/// # Errors
///
/// Returns an error when arguments are invalid, a requested compound is missing, or
/// rendering fails. Batch commands report upstream faults in their output instead.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let no_cache = cli.no_cache;
    crate::sources::with_no_cache(no_cache, dispatch(cli)).await
}
