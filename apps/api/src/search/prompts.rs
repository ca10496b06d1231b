// Query translation prompt templates.

/// System prompt that enforces a single bare SQL statement as output.
pub const SQL_ONLY_SYSTEM: &str = "You are a SQL expert for a SQLite database. \
    You MUST respond with exactly one SQL SELECT statement and nothing else. \
    Do NOT include explanations, comments, or markdown code fences. \
    NEVER emit INSERT, UPDATE, DELETE, DROP, ALTER, PRAGMA, ATTACH, or multiple statements.";

pub const QUERY_TRANSLATE_PROMPT: &str = r#"Convert the following natural language search into a single SQLite query.

TABLE SCHEMA:
{table}

SEARCH:
"{query}"

RULES:
1. Return ONLY the SQL statement. It must start with SELECT * FROM candidates.
2. Use LIKE '%value%' for partial matches on text columns ({text_columns}).
3. {list_columns} are JSON arrays stored as text. Match them with LIKE '%value%' on the column.
4. Use numeric comparisons on {number_columns}, e.g. experience_years >= 5.
5. Do not use joins, subqueries, WITH clauses, UNION, or any table other than candidates.

EXAMPLE:
"Python developers in Pune" -> SELECT * FROM candidates WHERE skills LIKE '%Python%' AND location LIKE '%Pune%'"#;
