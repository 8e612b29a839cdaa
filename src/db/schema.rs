use duckdb::Connection;
use tracing::info;

/// DDL for the three tables the prompt describes. Issued by the service at
/// startup only, never built from model output.
pub const BOOTSTRAP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name VARCHAR(255),
    email VARCHAR(255) UNIQUE,
    created_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name VARCHAR(255),
    price DECIMAL(10, 2),
    stock INTEGER
);
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    user_id INTEGER REFERENCES users(id),
    product_id INTEGER REFERENCES products(id),
    quantity INTEGER,
    order_date TIMESTAMP
);
"#;

pub fn bootstrap_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(BOOTSTRAP_SQL)?;
    info!("Ensured users, products and orders tables exist");
    Ok(())
}
