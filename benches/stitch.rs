use std::time::{Duration, Instant};

use billing_schema::db;
use billing_schema::migrate::Migrator;
use billing_schema::usage;

const RESOURCE_DURATIONS: &str = "051_create_resource_durations";

fn print_timing(label: &str, elapsed: Duration, rows: usize) {
    println!(
        "  {label}: {:.2}ms for {rows} rows ({:.0} rows/s)",
        elapsed.as_secs_f64() * 1000.0,
        rows as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
    );
}

/// `apps` apps, each started and stopped `cycles` times, plus one service per app.
async fn seed(migrator: &Migrator, apps: usize, cycles: usize) -> usize {
    let mut tx = migrator.pool().begin().await.expect("begin failed");
    let mut n = 0;
    for a in 0..apps {
        let app_guid = format!("app-{a:06}");
        for c in 0..cycles {
            for (offset, state) in [(0, "STARTED"), (30, "STOPPED")] {
                let minute = c * 60 + offset;
                let created_at = format!("2018-01-{:02} {:02}:{:02}:00", 1 + minute / 1440, (minute / 60) % 24, minute % 60);
                let payload = format!(
                    r#"{{"state": "{state}", "app_guid": "{app_guid}", "instance_count": 2, "memory_in_mb_per_instance": 512}}"#
                );
                sqlx::query("INSERT INTO app_usage_events (created_at, guid, raw_message) VALUES (?1, ?2, ?3)")
                    .bind(created_at)
                    .bind(format!("{app_guid}-{c}-{state}"))
                    .bind(payload)
                    .execute(&mut *tx)
                    .await
                    .expect("insert failed");
                n += 1;
            }
        }
        let payload = format!(
            r#"{{"state": "CREATED", "service_instance_guid": "svc-{a:06}", "service_plan_guid": "plan", "service_instance_type": "managed_service_instance"}}"#
        );
        sqlx::query("INSERT INTO service_usage_events (created_at, guid, raw_message) VALUES ('2018-01-01 00:00:00', ?1, ?2)")
            .bind(format!("svc-{a:06}-created"))
            .bind(payload)
            .execute(&mut *tx)
            .await
            .expect("insert failed");
        n += 1;
    }
    tx.commit().await.expect("commit failed");
    n
}

#[tokio::main]
async fn main() {
    let apps: usize = std::env::var("BENCH_APPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    let cycles: usize = std::env::var("BENCH_CYCLES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    println!("=== resource duration benchmark ===");
    println!("apps: {apps}, cycles per app: {cycles}\n");

    let pool = db::connect_in_memory().await.expect("connect failed");
    let migrator = Migrator::new(pool).expect("catalog failed");
    let prior = migrator.sequence_before(RESOURCE_DURATIONS).expect("boundary missing");
    migrator.apply_migrations(&prior).await.expect("prior migrations failed");

    println!("[seed]");
    let start = Instant::now();
    let events = seed(&migrator, apps, cycles).await;
    print_timing("insert events", start.elapsed(), events);

    println!("\n[migrate]");
    let start = Instant::now();
    migrator
        .apply_migrations(&[RESOURCE_DURATIONS])
        .await
        .expect("migration failed");
    let elapsed = start.elapsed();

    let mut conn = migrator.pool().acquire().await.expect("acquire failed");
    let durations = usage::load_resource_durations(&mut conn).await.expect("read failed");
    print_timing(RESOURCE_DURATIONS, elapsed, durations.len());
    println!("  open intervals: {}", durations.iter().filter(|d| d.span.is_open()).count());

    println!("\n=== benchmark complete ===");
}
