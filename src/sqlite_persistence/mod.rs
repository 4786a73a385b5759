mod versioned_schema;

pub use versioned_schema::{
    open_versioned_database, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table,
    VersionedSchema, BASE_DB_VERSION,
};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";
