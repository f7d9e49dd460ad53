mod sqlite_registry;

pub use sqlite_registry::SqliteSourceRegistry;
