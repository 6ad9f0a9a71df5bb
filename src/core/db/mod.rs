/// Database Module
///
/// The connection wrapper, split by concern:
/// - **Connection** (`connection.rs`): opening, closing and scoped use of a `Db`
/// - **Rows** (`row.rs`): cell values and the tuple/mapping row shapes
/// - **Parameters** (`params.rs`): named parameters and how they are bound
/// - **Reads** (`query.rs`): single-shot fetches and the batched cursor
/// - **Writes** (`write.rs`): execute, execute-many and scripts with commit/rollback
///
/// ## Error Handling
///
/// Reads and connection management return `DbError`. Writes never do: a
/// failed write is rolled back and reported as `WriteOutcome::Failed`.
pub mod connection;
pub mod params;
pub mod query;
pub mod row;
pub mod write;

pub use connection::*;
pub use params::*;
pub use query::*;
pub use row::*;
pub use write::*;
