/*!
The delete-execution contract and SQLite's native implementation of it
*/

use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::error::Result;
use crate::statement::{DeleteStatement, Predicate};

/// Entry point through which bulk deletes reach the store.
///
/// Decorators implement the same contract and delegate to the executor they wrap.
pub trait DeleteExecutor: Send + Sync {
    /// Remove the rows `statement` selects, returning how many went away.
    fn execute_delete(&self, conn: &Connection, statement: &DeleteStatement) -> Result<usize>;

    /// Parse raw statement text and execute it.
    fn execute_sql(&self, conn: &Connection, sql: &str) -> Result<usize> {
        let statement = DeleteStatement::parse(sql)?;
        self.execute_delete(conn, &statement)
    }
}

impl<T: DeleteExecutor + ?Sized> DeleteExecutor for &T {
    fn execute_delete(&self, conn: &Connection, statement: &DeleteStatement) -> Result<usize> {
        (**self).execute_delete(conn, statement)
    }
}

/// SQLite's own delete path: one `DELETE` per listed table.
///
/// An unfiltered delete lets SQLite apply its truncate optimization.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDelete;

impl DeleteExecutor for NativeDelete {
    fn execute_delete(&self, conn: &Connection, statement: &DeleteStatement) -> Result<usize> {
        let params = statement.predicate().map(Predicate::params).unwrap_or_default();

        let mut removed = 0;
        for table in statement.tables() {
            let sql = statement.sql_for(table);
            let rows = conn.execute(&sql, params_from_iter(params.iter()))?;
            debug!("{} -> {} rows", sql, rows);
            removed += rows;
        }
        Ok(removed)
    }
}
