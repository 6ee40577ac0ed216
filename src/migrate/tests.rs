use super::*;
use crate::db;

// ── Test migrations ──────────────────────────────────────

struct CreateWidgets;

#[async_trait]
impl Migration for CreateWidgets {
    fn name(&self) -> &'static str {
        "001_create_widgets"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY, label TEXT NOT NULL)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

struct SeedWidget;

#[async_trait]
impl Migration for SeedWidget {
    fn name(&self) -> &'static str {
        "002_seed_widget"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO widgets (label) VALUES ('first')")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// Creates a table, then fails. The table must not survive.
struct Broken;

#[async_trait]
impl Migration for Broken {
    fn name(&self) -> &'static str {
        "003_broken"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE half_done (id INTEGER)")
            .execute(&mut *conn)
            .await?;
        sqlx::query("INSERT INTO no_such_table VALUES (1)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

struct AddGadgets;

#[async_trait]
impl Migration for AddGadgets {
    fn name(&self) -> &'static str {
        "004_add_gadgets"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE gadgets (id INTEGER PRIMARY KEY)")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

async fn migrator() -> Migrator {
    let pool = db::connect_in_memory().await.unwrap();
    let migrations: Vec<Box<dyn Migration>> = vec![
        Box::new(AddGadgets),
        Box::new(Broken),
        Box::new(SeedWidget),
        Box::new(CreateWidgets),
    ];
    let catalog = Catalog::new(migrations).unwrap();
    Migrator::with_catalog(pool, catalog)
}

async fn table_exists(pool: &SqlitePool, table: &str) -> bool {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .bind(table)
            .fetch_optional(pool)
            .await
            .unwrap();
    row.is_some()
}

async fn widget_count(pool: &SqlitePool) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM widgets")
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

async fn ledger_names(m: &Migrator) -> Vec<String> {
    m.applied().await.unwrap().into_iter().map(|r| r.name).collect()
}

// ── init_schema ──────────────────────────────────────────

#[tokio::test]
async fn init_schema_twice_succeeds() {
    let m = migrator().await;
    m.init_schema().await.unwrap();
    m.init_schema().await.unwrap();

    assert!(table_exists(m.pool(), ledger::LEDGER_TABLE).await);
    let (tables,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
        .fetch_one(m.pool())
        .await
        .unwrap();
    m.init_schema().await.unwrap();
    let (after,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
        .fetch_one(m.pool())
        .await
        .unwrap();
    assert_eq!(tables, after);
    assert!(ledger_names(&m).await.is_empty());
}

// ── apply_migrations ─────────────────────────────────────

#[tokio::test]
async fn applies_in_given_order_and_records_ledger() {
    let m = migrator().await;
    let report = m
        .apply_migrations(&["001_create_widgets", "002_seed_widget"])
        .await
        .unwrap();

    assert_eq!(report.applied, vec!["001_create_widgets", "002_seed_widget"]);
    assert!(report.skipped.is_empty());
    assert_eq!(widget_count(m.pool()).await, 1);
    assert_eq!(
        ledger_names(&m).await,
        vec!["001_create_widgets", "002_seed_widget"]
    );
}

#[tokio::test]
async fn reapplying_is_a_noop() {
    let m = migrator().await;
    m.apply_migrations(&["001_create_widgets", "002_seed_widget"])
        .await
        .unwrap();
    let first = m.applied().await.unwrap();

    let report = m
        .apply_migrations(&["001_create_widgets", "002_seed_widget"])
        .await
        .unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped.len(), 2);

    // The seed body did not run a second time and the ledger is untouched.
    assert_eq!(widget_count(m.pool()).await, 1);
    assert_eq!(m.applied().await.unwrap(), first);
}

#[tokio::test]
async fn superset_applies_only_the_new_names() {
    let m = migrator().await;
    m.apply_migrations(&["001_create_widgets"]).await.unwrap();

    let report = m
        .apply_migrations(&["001_create_widgets", "002_seed_widget", "004_add_gadgets"])
        .await
        .unwrap();
    assert_eq!(report.skipped, vec!["001_create_widgets"]);
    assert_eq!(report.applied, vec!["002_seed_widget", "004_add_gadgets"]);
}

#[tokio::test]
async fn failure_rolls_back_and_stops_the_batch() {
    let m = migrator().await;
    let err = m
        .apply_migrations(&[
            "001_create_widgets",
            "002_seed_widget",
            "003_broken",
            "004_add_gadgets",
        ])
        .await
        .unwrap_err();

    match &err {
        MigrationError::Migration { name, .. } => assert_eq!(name, "003_broken"),
        other => panic!("expected Migration error, got {other:?}"),
    }
    assert_eq!(err.migration_name(), Some("003_broken"));
    assert!(err.to_string().contains("003_broken"));

    // Earlier migrations committed, the failed one left nothing behind,
    // the later one never ran.
    assert_eq!(widget_count(m.pool()).await, 1);
    assert!(!table_exists(m.pool(), "half_done").await);
    assert!(!table_exists(m.pool(), "gadgets").await);
    assert_eq!(
        ledger_names(&m).await,
        vec!["001_create_widgets", "002_seed_widget"]
    );
}

#[tokio::test]
async fn failed_migration_stays_pending() {
    let m = migrator().await;
    let _ = m.apply_migrations(&["001_create_widgets", "003_broken"]).await;
    // Still pending, still failing the same way: no partial state leaked.
    let err = m.apply_migrations(&["003_broken"]).await.unwrap_err();
    assert!(matches!(err, MigrationError::Migration { .. }));
    assert_eq!(ledger_names(&m).await, vec!["001_create_widgets"]);
}

#[tokio::test]
async fn unknown_name_fails_before_touching_the_database() {
    let m = migrator().await;
    let err = m
        .apply_migrations(&["001_create_widgets", "999_missing"])
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::NotFound(ref n) if n == "999_missing"));

    // Not even the ledger was created.
    assert!(!table_exists(m.pool(), ledger::LEDGER_TABLE).await);
    assert!(!table_exists(m.pool(), "widgets").await);
}

#[tokio::test]
async fn caller_order_is_respected() {
    let m = migrator().await;
    // Seeding before the table exists fails: the engine did not re-sort.
    let err = m
        .apply_migrations(&["002_seed_widget", "001_create_widgets"])
        .await
        .unwrap_err();
    assert_eq!(err.migration_name(), Some("002_seed_widget"));
    assert!(ledger_names(&m).await.is_empty());
}

#[tokio::test]
async fn prefix_then_boundary_equals_inclusive_prefix() {
    let split = migrator().await;
    let before = split.sequence_before("002_seed_widget").unwrap();
    assert_eq!(before, vec!["001_create_widgets"]);
    split.apply_migrations(&before).await.unwrap();
    split.apply_migrations(&["002_seed_widget"]).await.unwrap();

    let whole = migrator().await;
    let through = whole.sequence_through("002_seed_widget").unwrap();
    whole.apply_migrations(&through).await.unwrap();

    assert_eq!(ledger_names(&split).await, ledger_names(&whole).await);
    assert_eq!(widget_count(split.pool()).await, widget_count(whole.pool()).await);
}

#[tokio::test]
async fn pending_filters_applied_names() {
    let m = migrator().await;
    m.apply_migrations(&["001_create_widgets"]).await.unwrap();
    let pending = m.pending(&m.sequence()).await.unwrap();
    assert_eq!(pending, vec!["002_seed_widget", "003_broken", "004_add_gadgets"]);
}

#[tokio::test]
async fn empty_batch_only_bootstraps_the_ledger() {
    let m = migrator().await;
    let report = m.apply_migrations::<&str>(&[]).await.unwrap();
    assert_eq!(report, ApplyReport::default());
    assert!(table_exists(m.pool(), ledger::LEDGER_TABLE).await);
}

#[tokio::test]
async fn ledger_records_application_time() {
    let m = migrator().await;
    let before = Utc::now();
    m.apply_migrations(&["001_create_widgets"]).await.unwrap();
    let records = m.applied().await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].applied_at >= before - chrono::Duration::seconds(1));
}

/// Drops the ledger table, so recording itself fails.
struct DropsLedger;

#[async_trait]
impl Migration for DropsLedger {
    fn name(&self) -> &'static str {
        "005_drops_ledger"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE orphan (id INTEGER)")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DROP TABLE schema_migrations")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn ledger_write_failure_rolls_back_and_stops_the_batch() {
    let pool = db::connect_in_memory().await.unwrap();
    let migrations: Vec<Box<dyn Migration>> = vec![
        Box::new(CreateWidgets),
        Box::new(AddGadgets),
        Box::new(DropsLedger),
    ];
    let m = Migrator::with_catalog(pool, Catalog::new(migrations).unwrap());

    let err = m
        .apply_migrations(&["001_create_widgets", "005_drops_ledger", "004_add_gadgets"])
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::Ledger(_)), "got {err:?}");

    // The ledger table and the earlier commit survive; the failed body does not.
    assert!(table_exists(m.pool(), ledger::LEDGER_TABLE).await);
    assert!(!table_exists(m.pool(), "orphan").await);
    assert!(!table_exists(m.pool(), "gadgets").await);
    assert_eq!(ledger_names(&m).await, vec!["001_create_widgets"]);
}
