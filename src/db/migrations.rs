use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;

const MIGRATIONS_DIR: &str = "migrations";

/// Applies migrations/*.sql in filename order, once each. Applied names are
/// tracked in schema_migrations so restarts are safe.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create schema_migrations table")?;

    let dir = Path::new(MIGRATIONS_DIR);
    if !dir.exists() {
        tracing::warn!("no migrations directory, starting with an empty schema");
        return Ok(());
    }

    let applied = applied_names(conn)?;

    let mut pending: Vec<_> = fs::read_dir(dir)
        .context("failed to read migrations directory")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "sql"))
        .collect();
    pending.sort();

    for path in pending {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if applied.contains(&name) {
            continue;
        }

        let sql = fs::read_to_string(&path)
            .with_context(|| format!("failed to read migration {name}"))?;
        conn.execute_batch(&sql)
            .with_context(|| format!("migration {name} failed"))?;
        conn.execute("INSERT INTO schema_migrations (name) VALUES (?1)", [&name])
            .with_context(|| format!("failed to record migration {name}"))?;

        tracing::info!(migration = %name, "applied");
    }

    Ok(())
}

fn applied_names(conn: &Connection) -> anyhow::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut names = HashSet::new();
    for row in rows {
        names.insert(row?);
    }
    Ok(names)
}
