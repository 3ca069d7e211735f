use std::path::{Path, PathBuf};

use cardvault_core::catalog::{ExternalCard, ExternalSetSummary};
use cardvault_core::db::{SqliteCatalogRepository, SqliteSyncRunRepository};
use cardvault_core::mapper::{map_card, map_set_summary};
use cardvault_core::{Database, SyncEvent, SyncReport, SyncRun, SyncRunStatus};
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use crate::cli::{Cli, Commands};
use crate::commands::cards::{format_card_lines, list_cards};
use crate::commands::common::{format_timestamp, normalize_card_id, truncate};
use crate::commands::holdings::{add_holding, format_holding_lines, list_holdings};
use crate::commands::runs::{format_run_lines, list_runs};
use crate::commands::sync::format_event;
use crate::error::CliError;

fn test_db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("cardvault.db")
}

/// Two sets in two series with one card each
fn seed_catalog(path: &Path) {
    let db = Database::open(path).unwrap();
    let conn = db.connection().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    for (set_id, set_name, series, card_id, card_name, rarity) in [
        ("base1", "Base Set", "Base", "base1-58", "Pikachu", "Common"),
        ("sv03.5", "151", "Scarlet & Violet", "sv03.5-025", "Pikachu", "Common"),
        ("sv03.5", "151", "Scarlet & Violet", "sv03.5-006", "Charizard ex", "Double rare"),
    ] {
        let set: ExternalSetSummary = serde_json::from_value(json!({
            "id": set_id,
            "name": set_name,
            "serie": {"id": series.to_lowercase(), "name": series}
        }))
        .unwrap();
        repo.upsert_set(&map_set_summary(&set, 1_000)).unwrap();

        let card: ExternalCard = serde_json::from_value(json!({
            "id": card_id,
            "localId": card_id.rsplit('-').next().unwrap(),
            "name": card_name,
            "category": "Pokemon",
            "rarity": rarity,
            "pricing": {"cardmarket": {"avg": 2.5}}
        }))
        .unwrap();
        repo.upsert_card(&map_card(&card, set_id, 1_000)).unwrap();
    }
}

#[test]
fn sync_flags_build_clamped_configs() {
    let cli = Cli::try_parse_from([
        "cardvault",
        "sync",
        "--catalog-url",
        "http://localhost:4000/v2",
        "--language",
        "fr",
        "--batch-size",
        "0",
        "--concurrency",
        "64",
        "--no-series",
    ])
    .unwrap();

    let Commands::Sync(args) = cli.command else {
        panic!("expected sync command");
    };
    let catalog = args.catalog_config();
    assert_eq!(catalog.base_url, "http://localhost:4000/v2");
    assert_eq!(catalog.language, "fr");

    let pass = args.pass_config();
    assert_eq!(pass.batch_size, 1);
    assert_eq!(pass.concurrency, 8);
    assert!(!pass.include_series);
}

#[test]
fn sync_rejects_out_of_range_timeout() {
    assert!(Cli::try_parse_from(["cardvault", "sync", "--timeout", "0"]).is_err());
    assert!(Cli::try_parse_from(["cardvault", "sync", "--timeout", "30"]).is_ok());
}

#[test]
fn card_flags_become_filter_criteria() {
    let cli = Cli::try_parse_from([
        "cardvault",
        "cards",
        "--series",
        "Base",
        "--names",
        "Pikachu,Raichu",
        "--rarity",
        "Rare",
        "--rarity",
        "Common",
    ])
    .unwrap();

    let Commands::Cards { filter, .. } = cli.command else {
        panic!("expected cards command");
    };
    let criteria = filter.criteria();
    assert_eq!(criteria.series.as_deref(), Some("Base"));
    assert_eq!(
        criteria.names,
        Some(vec!["Pikachu".to_string(), "Raichu".to_string()])
    );
    assert_eq!(
        criteria.rarities,
        Some(vec!["Rare".to_string(), "Common".to_string()])
    );
    assert_eq!(criteria.set_id, None);
}

#[test]
fn format_event_renders_each_kind() {
    assert_eq!(
        format_event(&SyncEvent::Progress {
            message: "Synced Base Set".to_string(),
            progress: 7,
            processed_sets: Some(1),
            total_sets: Some(10),
            total_cards: Some(102),
        }),
        "[  7%] Synced Base Set"
    );
    assert_eq!(
        format_event(&SyncEvent::Warning {
            message: "HTTP 500".to_string(),
            set_id: Some("jungle".to_string()),
        }),
        "warning [jungle]: HTTP 500"
    );

    let stats = SyncReport {
        warnings: 2,
        ..SyncReport::default()
    };
    assert_eq!(
        format_event(&SyncEvent::Complete {
            message: "Synced 3 sets".to_string(),
            stats,
        }),
        "Synced 3 sets (2 warnings)"
    );
}

#[test]
fn card_listing_applies_filter_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);
    seed_catalog(&db_path);

    let cli = Cli::try_parse_from(["cardvault", "cards", "--name", "pikachu"]).unwrap();
    let Commands::Cards { filter, .. } = cli.command else {
        panic!("expected cards command");
    };

    let pikachus = list_cards(&filter.criteria(), None, &db_path).unwrap();
    assert_eq!(pikachus.len(), 2);

    let limited = list_cards(&filter.criteria(), Some(1), &db_path).unwrap();
    assert_eq!(limited.len(), 1);

    let mut criteria = filter.criteria();
    criteria.series = Some("scarlet & violet".to_string());
    let modern = list_cards(&criteria, None, &db_path).unwrap();
    assert_eq!(modern.len(), 1);
    assert_eq!(modern[0].card.id, "sv03.5-025");

    let lines = format_card_lines(&modern);
    assert!(lines[0].contains("151 #025"));
    assert!(lines[0].contains("2.50"));
}

#[test]
fn holdings_are_added_and_listed_with_card_names() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);
    seed_catalog(&db_path);

    let holding = add_holding(" base1-58 ", 3, "holo", Some("  first edition "), &db_path).unwrap();
    assert_eq!(holding.card_id, "base1-58");
    assert_eq!(holding.notes.as_deref(), Some("first edition"));

    let items = list_holdings(&db_path).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].card_name.as_deref(), Some("Pikachu"));
    assert_eq!(items[0].quantity, 3);

    let lines = format_holding_lines(&items);
    assert!(lines[0].contains("3x"));
    assert!(lines[0].contains("Pikachu"));
}

#[test]
fn holdings_reject_unknown_or_empty_cards() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);
    seed_catalog(&db_path);

    let err = add_holding("nope-1", 1, "normal", None, &db_path).unwrap_err();
    assert!(matches!(
        err,
        CliError::Core(cardvault_core::Error::NotFound(_))
    ));

    let err = add_holding("base1-58", 0, "normal", None, &db_path).unwrap_err();
    assert!(matches!(
        err,
        CliError::Core(cardvault_core::Error::InvalidInput(_))
    ));

    assert!(matches!(normalize_card_id("  "), Err(CliError::EmptyCardId)));
}

#[test]
fn runs_are_listed_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);
    {
        let db = Database::open(&db_path).unwrap();
        let conn = db.connection().unwrap();
        let repo = SqliteSyncRunRepository::new(&conn);
        let first = repo.start(1_000).unwrap();
        repo.finish(&SyncRun {
            id: first,
            started_at: 1_000,
            finished_at: Some(2_000),
            status: SyncRunStatus::Completed,
            sets_processed: 170,
            cards_processed: 18_000,
            sets_removed: 1,
            holdings_migrated: 4,
            warnings: 0,
        })
        .unwrap();
        repo.start(5_000).unwrap();
    }

    let runs = list_runs(10, &db_path).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].status, SyncRunStatus::Running);

    let lines = format_run_lines(&runs);
    assert!(lines[1].starts_with("1970-01-01 00:00:01 UTC"));
    assert!(lines[1].contains("completed"));
    assert!(lines[1].contains("migrated=4"));
}

#[test]
fn format_timestamp_returns_utc_label() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn truncate_adds_ellipsis_only_when_cut() {
    assert_eq!(truncate("Pikachu", 10), "Pikachu");
    assert_eq!(truncate("Charizard ex Special Art", 12), "Charizard...");
}
