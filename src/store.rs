use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params};

use crate::model::MatchRecord;
use crate::source::{MatchSource, TeamMatches};
use crate::team_names::resolve_team_name;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub source: String,
    pub rows_seen: usize,
    pub rows_upserted: usize,
    pub rows_unchanged: usize,
    pub rows_skipped: usize,
    pub total_matches: usize,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY,
            match_date TEXT NOT NULL DEFAULT '',
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            outcome TEXT NOT NULL,
            source TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_matches_fixture
            ON matches(match_date, home_team, away_team) WHERE match_date <> '';
        CREATE INDEX IF NOT EXISTS idx_matches_home ON matches(home_team);
        CREATE INDEX IF NOT EXISTS idx_matches_away ON matches(away_team);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            source TEXT NOT NULL,
            rows_seen INTEGER NOT NULL,
            rows_upserted INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Upserts completed matches; a replayed fixture overwrites its score.
///
/// Dated matches are keyed by (date, home, away). Undated matches have no
/// natural key, so the undated rows previously loaded from the same `source`
/// are replaced wholesale.
pub fn ingest_matches(
    conn: &mut Connection,
    db_path: PathBuf,
    source: &str,
    matches: &[MatchRecord],
) -> Result<IngestSummary> {
    let started_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, source, rows_seen, rows_upserted)
         VALUES (?1, NULL, ?2, ?3, 0)",
        params![started_at, source, matches.len() as i64],
    )
    .context("insert ingest run")?;
    let run_id = conn.last_insert_rowid();

    let mut rows_upserted = 0usize;
    let mut rows_unchanged = 0usize;
    let mut rows_skipped = 0usize;
    let tx = conn.transaction().context("begin ingest transaction")?;
    let mut previous_undated = query_matches(
        &tx,
        &format!("{SELECT_MATCHES} WHERE match_date = '' AND source = ?1"),
        &[&source],
    )?;
    let replaced = tx
        .execute(
            "DELETE FROM matches WHERE match_date = '' AND source = ?1",
            params![source],
        )
        .context("clear undated matches")?;
    if replaced > 0 {
        tracing::debug!(source, replaced, "replacing undated matches");
    }
    for m in matches {
        if !m.is_completed() {
            rows_skipped += 1;
            continue;
        }
        let written = upsert_match(&tx, source, m)?;
        let reloaded = m.date.is_none() && take_match(&mut previous_undated, m);
        if written && !reloaded {
            rows_upserted += 1;
        } else {
            rows_unchanged += 1;
        }
    }
    tx.commit().context("commit ingest transaction")?;

    conn.execute(
        "UPDATE ingest_runs SET finished_at = ?1, rows_upserted = ?2 WHERE run_id = ?3",
        params![Utc::now().to_rfc3339(), rows_upserted as i64, run_id],
    )
    .context("update ingest run")?;

    let total_matches = count_matches(conn)?;
    tracing::info!(
        source,
        rows_upserted,
        rows_unchanged,
        rows_skipped,
        total_matches,
        "ingest finished"
    );

    Ok(IngestSummary {
        db_path,
        source: source.to_string(),
        rows_seen: matches.len(),
        rows_upserted,
        rows_unchanged,
        rows_skipped,
        total_matches,
    })
}

/// Removes one stored copy of `m`; true when the same result was already there.
fn take_match(previous: &mut Vec<MatchRecord>, m: &MatchRecord) -> bool {
    match previous.iter().position(|p| p == m) {
        Some(pos) => {
            previous.swap_remove(pos);
            true
        }
        None => false,
    }
}

pub fn count_matches(conn: &Connection) -> Result<usize> {
    let n = conn
        .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get::<_, i64>(0))
        .context("count matches")?;
    Ok(n.max(0) as usize)
}

const SELECT_MATCHES: &str = "SELECT match_date, home_team, away_team, home_goals, away_goals FROM matches";
const ORDER_NEWEST_FIRST: &str = "ORDER BY match_date = '' ASC, match_date DESC, rowid ASC";

/// Every stored match, newest first; undated rows last.
pub fn load_all(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let sql = format!("{SELECT_MATCHES} {ORDER_NEWEST_FIRST}");
    query_matches(conn, &sql, &[])
}

/// Matches where `team` (exact spelling) played either side, newest first.
pub fn load_team_matches(conn: &Connection, team: &str) -> Result<Vec<MatchRecord>> {
    let sql = format!("{SELECT_MATCHES} WHERE home_team = ?1 OR away_team = ?1 {ORDER_NEWEST_FIRST}");
    query_matches(conn, &sql, &[&team])
}

/// Distinct team names in the store, sorted.
pub fn team_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT home_team FROM matches UNION SELECT away_team FROM matches ORDER BY 1",
        )
        .context("prepare team names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query team names")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode team name")?);
    }
    Ok(out)
}

fn query_matches(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn.prepare(sql).context("prepare load matches query")?;

    let rows = stmt
        .query_map(args, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, i32>(4)?,
            ))
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        let (date, home_team, away_team, home_goals, away_goals) =
            row.context("decode match row")?;
        let date = if date.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(&date, DATE_FORMAT)
                    .with_context(|| format!("stored date '{date}' is not YYYY-MM-DD"))?,
            )
        };
        out.push(MatchRecord {
            date,
            home_team,
            away_team,
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
        });
    }
    Ok(out)
}

/// Returns whether a row was written; a dated fixture already stored with
/// the same score is left alone.
fn upsert_match(tx: &rusqlite::Transaction<'_>, source: &str, m: &MatchRecord) -> Result<bool> {
    let home_goals = m.home_goals.unwrap_or_default();
    let away_goals = m.away_goals.unwrap_or_default();
    let outcome = if home_goals > away_goals {
        "H"
    } else if home_goals < away_goals {
        "A"
    } else {
        "D"
    };
    let Some(date) = m.date else {
        tx.execute(
            r#"
            INSERT INTO matches (
                match_date, home_team, away_team, home_goals, away_goals,
                outcome, source, updated_at
            ) VALUES ('', ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                m.home_team,
                m.away_team,
                home_goals,
                away_goals,
                outcome,
                source,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("insert undated match")?;
        return Ok(true);
    };
    let changed = tx
        .execute(
            r#"
            INSERT INTO matches (
                match_date, home_team, away_team, home_goals, away_goals,
                outcome, source, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(match_date, home_team, away_team) WHERE match_date <> '' DO UPDATE SET
                home_goals = excluded.home_goals,
                away_goals = excluded.away_goals,
                outcome = excluded.outcome,
                source = excluded.source,
                updated_at = excluded.updated_at
            WHERE matches.home_goals <> excluded.home_goals
                OR matches.away_goals <> excluded.away_goals
            "#,
            params![
                date.format(DATE_FORMAT).to_string(),
                m.home_team,
                m.away_team,
                home_goals,
                away_goals,
                outcome,
                source,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("upsert match")?;
    Ok(changed > 0)
}

/// Reads matches previously ingested into a SQLite file.
#[derive(Debug, Clone)]
pub struct StoreSource {
    path: PathBuf,
}

impl StoreSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<Connection> {
        if !self.path.exists() {
            return Err(anyhow!("match store not found: {}", self.path.display()));
        }
        open_db(&self.path)
    }

    pub fn load_all(&self) -> Result<Vec<MatchRecord>> {
        let conn = self.open()?;
        let rows = load_all(&conn)?;
        tracing::info!(path = %self.path.display(), rows = rows.len(), "loaded stored matches");
        Ok(rows)
    }
}

impl MatchSource for StoreSource {
    fn team_matches(&self, team: &str) -> Result<TeamMatches> {
        let conn = self.open()?;
        let names = team_names(&conn)?;
        let resolved = resolve_team_name(names.iter().map(String::as_str), team)
            .ok_or_else(|| anyhow!("team '{team}' not found in match data"))?;
        let matches = load_team_matches(&conn, &resolved)?;
        tracing::info!(team = %resolved, rows = matches.len(), "loaded stored team matches");
        Ok(TeamMatches {
            team: resolved,
            matches,
        })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}
