//! Output sinks for tagged tables.
//!
//! - [`CsvFileSink`] appends a delimited dump to a file.
//! - [`RelationalSink`] maps, coerces and batch-inserts columns into a
//!   relational table through a [`Connector`].

mod config;
mod connection;
mod file;
mod relational;
mod sqlite;
mod value;

pub mod mock;

pub use config::{
    ColumnMapping, ConnectionDescriptor, Credentials, RelationalTarget, SinkMapping,
    DEFAULT_DATE_FORMAT,
};
pub use connection::{Connector, ScopedConnection, SinkConnection};
pub use file::{CsvFileSink, FileSinkConfig, HeaderMode};
pub use relational::{Batch, PersistReport, RelationalSink};
pub use sqlite::{SqliteConnection, SqliteConnector};
pub use value::{check_date_format, SinkValue, ValueKind};
pub(crate) use value::render_date;
