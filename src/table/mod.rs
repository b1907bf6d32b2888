//! One table, one connection.
//!
//! `Table` tracks the protocol state of its connection and refuses operations
//! the state does not allow. The connection itself sits behind `Session`.

mod session;
mod state;
mod table;

pub use session::{PgSession, Session, TextRow};
pub use state::ConnectionState;
pub use table::Table;
