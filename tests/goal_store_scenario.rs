// tests/goal_store_scenario.rs
// End-to-end goal lifecycle against the flat-file store

use squad_goals::goals::{GoalName, GoalStatus, canonicalize};
use squad_goals::{CsvTable, GoalOutcome, GoalStore, GoalView};
use tempfile::TempDir;

fn name(raw: &str) -> GoalName {
    GoalName::parse(raw).unwrap()
}

fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_read_a_book_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("goals.csv");
    let store = GoalStore::new(CsvTable::open(&path).await.unwrap());
    let book = name("Read a book");

    // log
    let outcome = store.log_goal(&book).await;
    assert!(matches!(outcome, GoalOutcome::Logged { .. }));
    assert!(outcome.to_string().contains("Read a book"));
    let rows = read_rows(&path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "'Read a book'");
    assert_eq!(rows[0][1], "Pending");
    assert_eq!(rows[0][3], "");
    assert_eq!(rows[0][4], "");

    // duplicate
    let outcome = store.log_goal(&book).await;
    assert!(outcome.to_string().contains("already exists"));
    assert_eq!(read_rows(&path).len(), 1);

    // complete
    let outcome = store.mark_goal_complete(&book).await;
    assert!(matches!(outcome, GoalOutcome::Completed { .. }));
    let rows = read_rows(&path);
    assert_eq!(rows[0][1], "Completed");
    assert!(!rows[0][4].is_empty());

    // update notes
    let before = read_rows(&path)[0].clone();
    let outcome = store
        .update_goal_fields(&book, &[("Notes".into(), "finished chapter 3".into())])
        .await;
    assert!(matches!(outcome, GoalOutcome::Updated { .. }));
    let after = read_rows(&path)[0].clone();
    assert_eq!(after[6], "finished chapter 3");
    assert_eq!(after[..6], before[..6]);

    // delete
    let outcome = store.delete_goal(&book).await;
    assert!(matches!(outcome, GoalOutcome::Deleted { .. }));

    let view = store.view_goals_formatted().await;
    assert!(matches!(view, GoalView::Empty));
    assert_eq!(view.text(), "No goals found.");
    let (rows, headers, _) = view.into_parts();
    assert!(rows.is_empty() && headers.is_empty());
}

#[tokio::test]
async fn test_whitespace_variants_are_one_goal() {
    let dir = TempDir::new().unwrap();
    let store = GoalStore::new(CsvTable::open(dir.path().join("goals.csv")).await.unwrap());

    for raw in ["Run a 5k", "  Run a 5k", "Run a 5k\t", "\n Run a 5k  "] {
        assert_eq!(canonicalize(raw).unwrap(), canonicalize(raw.trim()).unwrap());
        store.log_goal(&name(raw)).await;
    }

    let (rows, _) = store.current_table().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Run a 5k");
}

#[tokio::test]
async fn test_formula_like_names_are_stored_wrapped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("goals.csv");
    let store = GoalStore::new(CsvTable::open(&path).await.unwrap());

    store.log_goal(&name("=HYPERLINK(\"x\")")).await;
    store.log_goal(&name("+1 push-up a day")).await;

    let stored: Vec<String> = read_rows(&path).into_iter().map(|r| r[0].clone()).collect();
    assert_eq!(stored, vec!["'=HYPERLINK(\"x\")'", "'+1 push-up a day'"]);

    let outcome = store.mark_goal_complete(&name("+1 push-up a day")).await;
    assert!(matches!(outcome, GoalOutcome::Completed { .. }));
}

#[tokio::test]
async fn test_reopen_then_complete_again() {
    let dir = TempDir::new().unwrap();
    let store = GoalStore::new(CsvTable::open(dir.path().join("goals.csv")).await.unwrap());
    let run = name("Run");

    store.log_goal(&run).await;
    store.mark_goal_complete(&run).await;
    assert!(matches!(store.reopen_goal(&run).await, GoalOutcome::Reopened { .. }));
    assert!(matches!(
        store.mark_goal_complete(&run).await,
        GoalOutcome::Completed { .. }
    ));

    let (rows, _) = store.current_table().await;
    assert_eq!(rows[0][1], GoalStatus::Completed.to_string());
}
