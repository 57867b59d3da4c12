//! Rank users of an in-memory SQLite table against a query

use rusqlite::Connection;
use sqlrank::{
    fetch_ranked, AdmissionRule, Dialect, QueryBuilder, Result, SearchOptions, SearchSpec,
    Searchable, SelectQuery, TableSchema,
};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let query = args.get(1).map(|s| s.as_str()).unwrap_or("bob");

    let conn = Connection::open_in_memory()?;
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT);
         INSERT INTO users (name, email) VALUES
             ('Bob Smith', 'bob@example.com'),
             ('Bobby Tables', 'tables@example.com'),
             ('Alice', 'alice@bob.org');",
    )?;

    let spec = SearchSpec::new()
        .column("users.name", 10.0)
        .column("users.email", 5.0)
        .condition("users.name", AdmissionRule::pattern("[a-zA-Z]{3,}"));
    let users = Searchable::new(spec, TableSchema::from_sqlite(&conn, "", "users")?)?;

    let search = users.search(
        SelectQuery::from_table(Dialect::Sqlite, "users"),
        query,
        &SearchOptions::new().whole_text(),
    )?;
    let compiled = search.compile();
    println!("{}\n", compiled.sql);

    for row in fetch_ranked(&conn, &compiled)? {
        println!("  {:>6} {}", row.relevance, row.fields["name"]);
    }

    Ok(())
}
