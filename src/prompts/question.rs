//! The prompt wrapped around every user question.

use crate::consts::FALLBACK_ANSWER;

/// Values substituted into the question prompt.
#[derive(Debug, Clone)]
pub struct QuestionPrompt<'a> {
    pub database: &'a str,
    pub dialect: &'a str,
    pub top_k: usize,
}

impl QuestionPrompt<'_> {
    /// Instructions the model sees before the question.
    pub fn system(&self) -> String {
        format!(
            "You are an agent designed to interact with a SQL database {database}.\n\
             Given an input question, create a syntactically correct {dialect} query to run, \
             then look at the results of the query and return the answer.\n\
             Unless the user specifies a specific number of examples they wish to obtain, \
             always limit your query to at most {top_k} results.\n\
             You can order the results by a relevant column to return the most interesting examples in the database.\n\
             Never query for all the columns from a specific table, only ask for the relevant columns given the question.\n\
             You have access to tools for interacting with the database.\n\
             Only use the given tools. Only use the information returned by the tools to construct your final answer.\n\
             You MUST double check your query before executing it. If you get an error while executing a query, \
             rewrite the query and try again.\n\n\
             DO NOT make any DML statements (INSERT, UPDATE, DELETE, DROP etc.) to the database.\n\
             If the question does not seem related to the database, just return \"{fallback}\" as the answer.\n\n\
             Answer in Spanish.",
            database = self.database,
            dialect = self.dialect,
            top_k = self.top_k,
            fallback = FALLBACK_ANSWER,
        )
    }

    /// Full prompt for one question, in `System:` / `Human:` transcript form.
    pub fn render(&self, question: &str) -> String {
        format!("System: {}\nHuman: {}\n ai: ", self.system(), question)
    }
}
