//! Schema command - print the event table DDL
//!
//! Every statement is `IF NOT EXISTS`, so the output can be applied to an
//! existing database as-is.

use anyhow::Result;
use kb_analytics::ddl_statements;
use kb_config::Config;

/// Run the schema command
pub fn run(config: &Config) -> Result<()> {
    print!("{}", render(&config.analytics.table));
    Ok(())
}

fn render(table: &str) -> String {
    ddl_statements(table)
        .iter()
        .map(|statement| format!("{};\n", statement))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let ddl = render("events");
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS events ("));
        assert_eq!(ddl.matches("CREATE INDEX IF NOT EXISTS").count(), 4);
        assert_eq!(ddl.matches(";\n").count(), 5);
    }
}
