//! Read-eval loop over one navigator.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use stocktake_inventory::{CompletionSummary, InventorySession};
use stocktake_workflow::{
    BulkSaveReport, CorrectionService, InventoryNavigator, NavigatorError, SaveOutcome, StockCatalogProvider,
};

use crate::command::{Command, HELP};

/// Drive navigation from `input` until the pass is finished, cancelled or the
/// input ends. Returns the completion summary when the pass was finished.
///
/// The navigator must be loaded and started.
pub async fn run<P, S, R, W>(navigator: &InventoryNavigator<P, S>, input: R, out: &mut W) -> Result<Option<CompletionSummary>>
where
    P: StockCatalogProvider,
    S: CorrectionService,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        prompt(navigator, out)?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            navigator.reset();
            return Ok(None);
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };
        debug!("command {:?}", command);

        match command {
            Command::Save(value) => {
                if let Some(summary) = save(navigator, Some(value), out).await? {
                    return Ok(Some(summary));
                }
            }
            Command::SaveDefault => {
                let shown = navigator
                    .session()
                    .read(|s| s.current_material().and_then(|m| s.count_for(m.id)));
                if let Some(summary) = save(navigator, shown, out).await? {
                    return Ok(Some(summary));
                }
            }
            Command::Next => report_step(navigator.go_to_next(None), "already at the last material", out)?,
            Command::Previous => report_step(navigator.go_to_previous(None), "already at the first material", out)?,
            Command::SaveAll => match navigator.save_all().await {
                Ok(report) => print_bulk_report(&report, out)?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Finish => match navigator.finish() {
                Ok(summary) => {
                    print_summary(&summary, out)?;
                    return Ok(Some(summary));
                }
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Quit => {
                navigator.reset();
                writeln!(out, "stock-take cancelled")?;
                return Ok(None);
            }
            Command::Help => writeln!(out, "{HELP}")?,
        }
    }
}

async fn save<P, S, W>(
    navigator: &InventoryNavigator<P, S>,
    value: Option<stocktake_core::Quantity>,
    out: &mut W,
) -> Result<Option<CompletionSummary>>
where
    P: StockCatalogProvider,
    S: CorrectionService,
    W: Write,
{
    match navigator.save_and_advance(value).await {
        Ok(SaveOutcome::Finished { summary, .. }) => {
            print_summary(&summary, out)?;
            Ok(Some(summary))
        }
        Ok(SaveOutcome::Advanced { saved, .. } | SaveOutcome::Stayed { saved, .. }) => {
            if saved.already_correct {
                writeln!(out, "stock already correct")?;
            } else {
                writeln!(out, "saved, recorded stock now {}", saved.stock_update.recorded_stock)?;
            }
            Ok(None)
        }
        Ok(SaveOutcome::Discarded) => Ok(None),
        Err(e @ NavigatorError::Persistence { .. }) => {
            writeln!(out, "error: {e} (enter the value again to retry)")?;
            Ok(None)
        }
        Err(e) => {
            writeln!(out, "error: {e}")?;
            Ok(None)
        }
    }
}

fn report_step<W: Write>(result: Result<bool, NavigatorError>, at_edge: &str, out: &mut W) -> Result<()> {
    match result {
        Ok(true) => {}
        Ok(false) => writeln!(out, "{at_edge}")?,
        Err(e) => writeln!(out, "error: {e}")?,
    }
    Ok(())
}

fn prompt<P, S, W>(navigator: &InventoryNavigator<P, S>, out: &mut W) -> Result<()>
where
    P: StockCatalogProvider,
    S: CorrectionService,
    W: Write,
{
    let line = navigator.session().read(|s: &InventorySession| {
        let material = s.current_material()?;
        let recorded = s.recorded_stock(material.id).unwrap_or(material.recorded_stock);
        let shown = s.count_for(material.id).unwrap_or(recorded);
        let mark = if s.is_saved(material.id) { " [saved]" } else { "" };
        Some(format!(
            "[{}] {} (recorded {}){} count [{}]> ",
            s.position_label(),
            material.name,
            recorded,
            mark,
            shown
        ))
    });
    write!(out, "{}", line.unwrap_or_else(|| "> ".to_string()))?;
    out.flush()?;
    Ok(())
}

fn print_bulk_report<W: Write>(report: &BulkSaveReport, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "saved {}, failed {} of {} pending corrections",
        report.saved_count, report.error_count, report.total_count
    )?;
    for failure in &report.failures {
        writeln!(out, "  material {}: {}", failure.material_id, failure.reason)?;
    }
    Ok(())
}

pub fn print_summary<W: Write>(summary: &CompletionSummary, out: &mut W) -> Result<()> {
    writeln!(out, "stock-take finished")?;
    writeln!(out, "  processed:   {}/{}", summary.processed_count, summary.total_count)?;
    writeln!(out, "  saved:       {}", summary.saved_count)?;
    writeln!(out, "  unprocessed: {}", summary.unprocessed_count())?;
    writeln!(out, "  completion:  {}%", summary.completion_percentage())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stocktake_core::{MaterialId, Quantity};
    use stocktake_workflow::{InMemoryStockBackend, NavigatorConfig, SessionHandle};

    use crate::demo::{DEMO_WORKSHOP, demo_catalog};

    async fn navigator() -> (
        Arc<InMemoryStockBackend>,
        InventoryNavigator<Arc<InMemoryStockBackend>, Arc<InMemoryStockBackend>>,
    ) {
        let backend = Arc::new(InMemoryStockBackend::new(demo_catalog().unwrap()));
        let navigator = InventoryNavigator::new(
            SessionHandle::new(),
            backend.clone(),
            backend.clone(),
            NavigatorConfig::default(),
        );
        navigator.load(DEMO_WORKSHOP).await.unwrap();
        navigator.start().unwrap();
        (backend, navigator)
    }

    #[tokio::test]
    async fn full_pass_prints_summary() {
        let (backend, navigator) = navigator().await;
        let mut out = Vec::new();

        let summary = run(&navigator, &b"\n75\n3,5\n"[..], &mut out).await.unwrap().unwrap();

        assert_eq!((summary.processed_count, summary.saved_count, summary.total_count), (3, 3, 3));
        assert_eq!(backend.recorded_stock(MaterialId::new(2)), Some(Quantity::from_units(75)));
        // 3.50 was already recorded.
        assert_eq!(backend.corrections().len(), 1);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("stock already correct"));
        assert!(text.contains("completion:  100%"));
    }

    #[tokio::test]
    async fn quit_resets_without_summary() {
        let (backend, navigator) = navigator().await;
        let mut out = Vec::new();

        let summary = run(&navigator, &b"n\n5\nq\n"[..], &mut out).await.unwrap();

        assert!(summary.is_none());
        assert!(!navigator.session().read(|s| s.is_active()));
        assert_eq!(backend.corrections().len(), 1);
    }

    #[tokio::test]
    async fn bad_input_and_failures_keep_the_loop_going() {
        let (backend, navigator) = navigator().await;
        backend.fail_next(MaterialId::new(1), "backend down");
        let mut out = Vec::new();

        let summary = run(&navigator, &b"abc\n-4\n100\n100\nf\n"[..], &mut out).await.unwrap().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("unrecognised input"));
        assert!(text.contains("negative"));
        assert!(text.contains("backend down"));
        assert_eq!((summary.processed_count, summary.saved_count), (2, 1));
        assert_eq!(backend.recorded_stock(MaterialId::new(1)), Some(Quantity::from_units(100)));
    }

    #[tokio::test]
    async fn prompt_shows_stock_recorded_during_the_pass() {
        let (_backend, navigator) = navigator().await;
        let mut out = Vec::new();

        run(&navigator, &b"100\np\nq\n"[..], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[1/3] Bolt M8 (recorded 120) count [120]> "));
        assert!(text.contains("[1/3] Bolt M8 (recorded 100) [saved] count [100]> "));
    }

    #[tokio::test]
    async fn save_all_commits_edited_values() {
        let (backend, navigator) = navigator().await;
        let mut out = Vec::new();

        // Edit via the session directly, as a table view would.
        navigator
            .session()
            .lock()
            .set_count(MaterialId::new(3), Quantity::from_units(1))
            .unwrap();
        run(&navigator, &b"s\nq\n"[..], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("saved 1, failed 0 of 1"));
        assert_eq!(backend.recorded_stock(MaterialId::new(3)), Some(Quantity::from_units(1)));
    }
}
