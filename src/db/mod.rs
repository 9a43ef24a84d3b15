//! SQLite access used by the agent's tools.
//!
//! One connection per process, shared behind a mutex. In read-only mode the
//! file is opened with `SQLITE_OPEN_READ_ONLY` and every statement is checked
//! with [`rusqlite::Statement::readonly`] before it runs.
//!
//! Calls here block. Async callers go through `spawn_blocking` and use
//! [`Database::interrupt`] to stop a statement they stopped waiting for.

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, InterruptHandle, OpenFlags, Statement};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Whether the agent may change the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Only statements that make no changes are allowed (default).
    ReadOnly,
    /// Anything SQLite accepts.
    ReadWrite,
}

pub struct Database {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
    mode: AccessMode,
}

impl Database {
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self> {
        let path = path.as_ref();
        let flags = match mode {
            AccessMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            AccessMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
        } | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Ok(Self::from_connection(conn, mode))
    }

    /// Wrap an already open connection. Handy for `:memory:` databases in tests.
    pub fn from_connection(conn: Connection, mode: AccessMode) -> Self {
        Self {
            interrupt: conn.get_interrupt_handle(),
            conn: Mutex::new(conn),
            mode,
        }
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Abort whatever statement is running on the connection. A no-op when idle.
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// User tables and views, sorted by name.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// `CREATE` statements for the given tables, each followed by a few sample rows.
    /// Name matching is case-insensitive; unknown names fail the whole call.
    pub fn table_info(&self, names: &[&str], sample_rows: usize) -> Result<String> {
        let known = self.table_names()?;

        let mut resolved = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match known.iter().find(|k| k.eq_ignore_ascii_case(name)) {
                Some(table) => resolved.push(table.as_str()),
                None => missing.push(*name),
            }
        }
        if !missing.is_empty() {
            bail!("table_names {{{}}} not found in database", missing.join(", "));
        }

        let conn = self.lock()?;
        let mut sections = Vec::with_capacity(resolved.len());
        for table in resolved {
            let ddl: Option<String> = conn.query_row(
                "SELECT sql FROM sqlite_master WHERE name = ?1",
                [table],
                |row| row.get(0),
            )?;
            let mut section = ddl.unwrap_or_default().trim().to_string();

            if sample_rows > 0 {
                let mut stmt = conn.prepare(&format!(
                    "SELECT * FROM {} LIMIT {}",
                    quote_identifier(table),
                    sample_rows
                ))?;
                let rows = render_rows(&mut stmt)?;
                section.push_str(&format!(
                    "\n\n/*\n{sample_rows} rows from {table} table:\n{rows}*/"
                ));
            }
            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }

    /// Compile a statement without running it.
    pub fn check(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        let stmt = conn.prepare(sql)?;
        self.ensure_allowed(&stmt)
    }

    /// Run a statement and render its result as tab-separated text.
    ///
    /// The connection is shared by every request, so a statement that leaves a
    /// transaction open is rolled back and reported as an error.
    pub fn query(&self, sql: &str) -> Result<String> {
        let conn = self.lock()?;
        let result = conn
            .prepare(sql)
            .map_err(anyhow::Error::from)
            .and_then(|mut stmt| {
                self.ensure_allowed(&stmt)?;
                render_rows(&mut stmt)
            });

        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")
                .context("failed to roll back open transaction")?;
            bail!("transaction control statements are not allowed");
        }
        result
    }

    fn ensure_allowed(&self, stmt: &Statement<'_>) -> Result<()> {
        if self.mode == AccessMode::ReadOnly && !stmt.readonly() {
            bail!("write statements are not allowed: the database is read-only");
        }
        Ok(())
    }
}

fn render_rows(stmt: &mut Statement<'_>) -> Result<String> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    if columns.is_empty() {
        let changed = stmt.execute([])?;
        return Ok(format!("{changed} row(s) affected\n"));
    }

    let mut out = columns.join("\t");
    out.push('\n');

    let mut rows = stmt.query([])?;
    let mut count = 0usize;
    while let Some(row) = rows.next()? {
        let cells = (0..columns.len())
            .map(|i| row.get_ref(i).map(format_value))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_str(&cells.join("\t"));
        out.push('\n');
        count += 1;
    }

    if count == 0 {
        out.push_str("(no rows)\n");
    }
    Ok(out)
}

fn format_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
