#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use askdb::db::{AccessMode, Database};
use askdb::thinker::{Step, StepResult, ToolCall};
use rusqlite::Connection;
use tempfile::TempDir;

const SEED: &str = "
    CREATE TABLE Employees (
        EmployeeID INTEGER PRIMARY KEY,
        LastName TEXT NOT NULL,
        FirstName TEXT NOT NULL,
        Title TEXT
    );
    INSERT INTO Employees VALUES
        (1, 'Davolio', 'Nancy', 'Sales Representative'),
        (2, 'Fuller', 'Andrew', 'Vice President, Sales'),
        (3, 'Leverling', 'Janet', 'Sales Representative'),
        (4, 'Peacock', 'Margaret', 'Sales Representative'),
        (5, 'Buchanan', 'Steven', 'Sales Manager'),
        (6, 'Suyama', 'Michael', 'Sales Representative'),
        (7, 'King', 'Robert', 'Sales Representative'),
        (8, 'Callahan', 'Laura', 'Inside Sales Coordinator'),
        (9, 'Dodsworth', 'Anne', 'Sales Representative');
    CREATE TABLE Customers (
        CustomerID TEXT PRIMARY KEY,
        CompanyName TEXT NOT NULL,
        Country TEXT
    );
    INSERT INTO Customers VALUES
        ('ALFKI', 'Alfreds Futterkiste', 'Germany'),
        ('ANATR', 'Ana Trujillo Emparedados y helados', 'Mexico'),
        ('BONAP', 'Bon app''', 'France');
";

/// Counts to 30 million; takes seconds unless interrupted.
pub const SLOW_QUERY: &str = "WITH RECURSIVE c(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM c WHERE n < 30000000) \
     SELECT COUNT(*) AS n FROM c";

/// A small Northwind-shaped SQLite file in a temp dir. Keep the TempDir alive.
pub fn seeded_db(mode: AccessMode) -> (Arc<Database>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("northwind.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SEED).unwrap();
    }
    let db = Database::open(&path, mode).unwrap();
    (Arc::new(db), dir)
}

/// Wrap steps into StepResults with no token usage.
pub fn wrap(steps: Vec<Step>) -> Vec<StepResult> {
    steps
        .into_iter()
        .map(|step| StepResult { step, usage: None })
        .collect()
}

pub fn call(tool: &str, args: &[(&str, &str)]) -> ToolCall {
    ToolCall {
        tool: tool.to_string(),
        args: args
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

pub fn act(thought: &str, calls: Vec<ToolCall>) -> Step {
    Step::Act {
        thought: thought.to_string(),
        calls,
    }
}

pub fn finish(answer: &str) -> Step {
    Step::Finish {
        thought: "done".to_string(),
        answer: answer.to_string(),
    }
}
