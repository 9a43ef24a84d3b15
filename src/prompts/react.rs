use std::fmt::Write as _;

use crate::thinker::ToolDescription;

const ROLE: &str = "You answer questions about a SQL database by calling tools and reading their results. \
Each turn you either call one or more tools or give the final answer.";

const CALL_EXAMPLE: &str = r#"{"thought": "which tables could hold employees?", "action": {"calls": [{"tool": "sql_db_list_tables", "args": {}}]}}"#;
const ANSWER_EXAMPLE: &str = r#"{"thought": "the count came back as 9", "answer": "Hay 9 empleados."}"#;

const SQL_RULES: &[&str] = &[
    "Always start with sql_db_list_tables. Never guess table names.",
    "Call sql_db_schema on the tables you need before writing a query. Never guess column names.",
    "Check every query with sql_db_query_checker before running it with sql_db_query.",
    "Select only the columns the question needs, never SELECT *.",
    "When a query fails, read the error, fix the query and try again.",
    "Independent calls (e.g. two schemas) can go in the same calls array.",
    "Base the answer only on rows the tools returned.",
];

/// System prompt for the agent loop: the JSON reply protocol, the tool list and the SQL rules.
pub fn build_react_system_prompt(tools: &[ToolDescription]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{ROLE}\n");

    let _ = writeln!(prompt, "Tools:");
    if tools.is_empty() {
        let _ = writeln!(prompt, "(none)");
    }
    for tool in tools {
        let _ = writeln!(prompt, "- {}: {}", tool.name, tool.description);
    }

    let _ = writeln!(
        prompt,
        "\nReply with a single JSON object and nothing else (no markdown, no prose).\n\
         To call tools:\n{CALL_EXAMPLE}\n\
         To answer:\n{ANSWER_EXAMPLE}\n"
    );

    let _ = writeln!(prompt, "Rules:");
    for (i, rule) in SQL_RULES.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, rule);
    }
    prompt
}
