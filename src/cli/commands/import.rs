//! Scan and import commands.

use anyhow::{Context, bail};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::catalog::{Catalog, SqliteCatalog, db_url};
use crate::config::Config;
use crate::decision::{DecisionMaker, EvaluationContext};
use crate::import::{CandidateAnalyzer, CandidateFile, ImportOutcome, ImportService};
use crate::media_info::MediaInfoReader;
use crate::quality::MediaFamily;
use crate::scanner;
use crate::transfer::{FileStrategy, LocalTransferExecutor, ProcMountTable, StrategySelector};

/// Options for `import`
pub struct ImportArgs {
    pub path: PathBuf,
    pub family: MediaFamily,
    pub library: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub strategy: Option<FileStrategy>,
    pub dry_run: bool,
}

/// Scan a directory and print each candidate's classification
pub fn cmd_scan(rt: &Runtime, config: &Config, path: &Path, family: MediaFamily) -> anyhow::Result<()> {
    rt.block_on(async {
        let cancel = CancellationToken::new();
        let candidates = discover(config, path, family, &cancel).await?;
        if candidates.is_empty() {
            println!("No {} files found in {}", family.as_str(), path.display());
            return Ok(());
        }

        for candidate in &candidates {
            print_candidate(candidate);
        }
        println!("\n{} candidates", candidates.len());
        Ok(())
    })
}

/// Scan, decide and import into the library
pub fn cmd_import(rt: &Runtime, config: &Config, args: ImportArgs) -> anyhow::Result<()> {
    let Some(library_root) = args.library.clone().or_else(|| config.library.root.clone()) else {
        bail!("No library root: pass --library or set library.root in the config file");
    };

    rt.block_on(async {
        let db_path = args
            .database
            .clone()
            .unwrap_or_else(|| config.library.database_path());
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let catalog: Arc<dyn Catalog> = Arc::new(
            SqliteCatalog::open(&db_url(Some(&db_path)))
                .await
                .with_context(|| format!("opening catalog {}", db_path.display()))?,
        );

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling import");
                on_interrupt.cancel();
            }
        });

        let candidates = discover(config, &args.path, args.family, &cancel).await?;
        if candidates.is_empty() {
            println!("No {} files found in {}", args.family.as_str(), args.path.display());
            return Ok(());
        }

        let ctx = EvaluationContext::new(catalog.clone(), cancel.clone());
        let decisions = DecisionMaker::with_default_rules()
            .get_import_decisions(candidates, &ctx)
            .await?;

        let service = ImportService::new(
            StrategySelector::new(Arc::new(ProcMountTable::new())),
            Arc::new(LocalTransferExecutor::new(config.import.recycle_bin.clone())),
            catalog,
        )
        .with_config(&config.import);
        let preferred = args.strategy.or(config.import.preferred_strategy);

        if args.dry_run {
            println!("Dry run - no files will be transferred\n");
            for decision in &decisions {
                let candidate = decision.candidate();
                if decision.approved() {
                    let destination = service.destination_for(candidate, &library_root);
                    let strategy = service.selector().select(&candidate.path, &destination, preferred);
                    println!("  {} -> {} [{strategy}]", candidate.path.display(), destination.display());
                } else {
                    println!("  {} (rejected)", candidate.path.display());
                    for rejection in decision.rejections() {
                        println!("      {rejection}");
                    }
                }
            }
            return Ok(());
        }

        let outcomes = service
            .import_decisions(decisions, &library_root, preferred, &cancel)
            .await;

        let (mut imported, mut rejected, mut failed) = (0, 0, 0);
        for outcome in &outcomes {
            match outcome {
                ImportOutcome::Imported(result) if result.is_success() => {
                    imported += 1;
                    println!("  Imported {}", result.destination_path().display());
                }
                ImportOutcome::Imported(result) => {
                    failed += 1;
                    println!(
                        "  Failed   {}: {}",
                        result.destination_path().display(),
                        result.error_message().unwrap_or("unknown error")
                    );
                }
                ImportOutcome::Rejected { path, rejections } => {
                    rejected += 1;
                    println!("  Rejected {}", path.display());
                    for rejection in rejections {
                        println!("      {rejection}");
                    }
                }
            }
        }

        println!("\nImport complete!");
        println!("  Imported: {imported}");
        println!("  Rejected: {rejected}");
        println!("  Failed:   {failed}");
        tracing::info!(imported, rejected, failed, "Import batch finished");

        if failed > 0 {
            bail!("{failed} imports failed");
        }
        Ok(())
    })
}

async fn discover(
    config: &Config,
    path: &Path,
    family: MediaFamily,
    cancel: &CancellationToken,
) -> anyhow::Result<Vec<CandidateFile>> {
    let paths: Vec<PathBuf> = scanner::scan(path.to_path_buf(), family).collect().await;
    tracing::info!(count = paths.len(), root = %path.display(), "Scan complete");

    let analyzer = CandidateAnalyzer::new(MediaInfoReader::from_config(&config.probe));
    Ok(analyzer.analyze_all(paths, family, cancel).await?)
}

fn print_candidate(candidate: &CandidateFile) {
    println!("{}", candidate.path.display());
    println!("  Quality:  {} ({})", candidate.quality, candidate.quality.source.as_str());
    if let Some(codec) = &candidate.codec {
        println!("  Codec:    {codec}");
    }
    if let Some(title) = candidate.tags.title() {
        println!("  Title:    {title}");
    }
    match &candidate.media_item_id {
        Some(id) => println!("  Item:     {id}"),
        None => println!("  Item:     (unparsed)"),
    }
}
