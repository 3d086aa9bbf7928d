//! Table registry and DDL rendering.
//!
//! The registry is the single description of the relational model. It feeds
//! `Database::init_schema`, the migration baseline and `revision --autogenerate`.
//!
//! # Type mapping
//! | column type | Postgres | SQLite |
//! |---|---|---|
//! | `Id` | `BIGSERIAL PRIMARY KEY` | `INTEGER PRIMARY KEY AUTOINCREMENT` |
//! | `BigInt` | `BIGINT` | `INTEGER` |
//! | `Varchar(n)` | `VARCHAR(n)` | `VARCHAR(n)` |
//! | `Timestamp` | `TEXT` (RFC 3339) | `TEXT` (RFC 3339) |
//!
//! Flags are stored as `BigInt` 0/1 so every backend decodes them the same way.

use std::collections::{BTreeMap, BTreeSet};

/// SQL dialect of the connected database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Dialect for a driver-qualified URL.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite:") {
            Dialect::Sqlite
        } else {
            Dialect::Postgres
        }
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Id,
    BigInt,
    Varchar(u32),
    Timestamp,
}

impl ColumnType {
    fn render(self, dialect: Dialect) -> String {
        match (self, dialect) {
            (ColumnType::Id, Dialect::Postgres) => "BIGSERIAL PRIMARY KEY".to_string(),
            (ColumnType::Id, Dialect::Sqlite) => "INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            (ColumnType::BigInt, Dialect::Postgres) => "BIGINT".to_string(),
            (ColumnType::BigInt, Dialect::Sqlite) => "INTEGER".to_string(),
            (ColumnType::Varchar(len), _) => format!("VARCHAR({})", len),
            (ColumnType::Timestamp, _) => "TEXT".to_string(),
        }
    }
}

/// A single column of a registered table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<&'static str>,
    /// `(table, column)` this column references.
    pub references: Option<(&'static str, &'static str)>,
}

impl Column {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            unique: false,
            default: None,
            references: None,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some((table, column));
        self
    }

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`.
    pub fn definition(&self, dialect: Dialect) -> String {
        let mut def = format!("{} {}", self.name, self.ty.render(dialect));
        if !self.nullable && self.ty != ColumnType::Id {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(value) = self.default {
            def.push_str(" DEFAULT ");
            def.push_str(value);
        }
        if let Some((table, column)) = self.references {
            def.push_str(&format!(" REFERENCES {}({}) ON DELETE CASCADE", table, column));
        }
        def
    }
}

/// A registered table.
#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Composite primary key; empty when the table has an `Id` column.
    pub primary_key: &'static [&'static str],
}

impl TableDef {
    /// `CREATE TABLE` statement for this table.
    pub fn create_sql(&self, dialect: Dialect, if_not_exists: bool) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.definition(dialect)))
            .collect();
        if !self.primary_key.is_empty() {
            parts.push(format!("    PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        format!(
            "CREATE TABLE {}{} (\n{}\n)",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            self.name,
            parts.join(",\n")
        )
    }

    /// `DROP TABLE` statement for this table.
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub const USER_TABLE: TableDef = TableDef {
    name: "app_user",
    columns: &[
        Column::new("id", ColumnType::Id),
        Column::new("name", ColumnType::Varchar(255)),
        Column::new("username", ColumnType::Varchar(255)).unique(),
        Column::new("email", ColumnType::Varchar(255)),
        Column::new("password", ColumnType::Varchar(255)),
        Column::new("disabled", ColumnType::BigInt).default("0"),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp).nullable(),
    ],
    primary_key: &[],
};

pub const ACTOR_TABLE: TableDef = TableDef {
    name: "actor",
    columns: &[
        Column::new("id", ColumnType::Id),
        Column::new("name", ColumnType::Varchar(255)),
        Column::new("age", ColumnType::BigInt),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp).nullable(),
    ],
    primary_key: &[],
};

pub const MOVIE_TABLE: TableDef = TableDef {
    name: "movie",
    columns: &[
        Column::new("id", ColumnType::Id),
        Column::new("title", ColumnType::Varchar(255)),
        Column::new("year", ColumnType::BigInt).default("1900"),
        Column::new("rating", ColumnType::BigInt).default("0"),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp).nullable(),
    ],
    primary_key: &[],
};

pub const ADDRESS_TABLE: TableDef = TableDef {
    name: "address",
    columns: &[
        Column::new("id", ColumnType::Id),
        Column::new("country", ColumnType::Varchar(255)),
        Column::new("city", ColumnType::Varchar(255)),
        Column::new("address_line_1", ColumnType::Varchar(255)),
        Column::new("address_line_2", ColumnType::Varchar(255)).nullable(),
        Column::new("postcode", ColumnType::Varchar(32)),
        Column::new("actor_id", ColumnType::BigInt).references("actor", "id"),
        Column::new("created_at", ColumnType::Timestamp),
        Column::new("updated_at", ColumnType::Timestamp).nullable(),
    ],
    primary_key: &[],
};

pub const ACTOR_MOVIE_TABLE: TableDef = TableDef {
    name: "actor_movie",
    columns: &[
        Column::new("actor_id", ColumnType::BigInt).references("actor", "id"),
        Column::new("movie_id", ColumnType::BigInt).references("movie", "id"),
    ],
    primary_key: &["actor_id", "movie_id"],
};

/// Every registered table, in dependency order.
pub static TABLES: &[&TableDef] = &[
    &USER_TABLE,
    &ACTOR_TABLE,
    &MOVIE_TABLE,
    &ADDRESS_TABLE,
    &ACTOR_MOVIE_TABLE,
];

/// Tables and columns found in a live database.
pub type LiveSchema = BTreeMap<String, BTreeSet<String>>;

/// A difference between the registry and a live database.
#[derive(Debug, Clone, Copy)]
pub enum SchemaChange {
    CreateTable(&'static TableDef),
    AddColumn {
        table: &'static TableDef,
        column: &'static Column,
    },
}

impl SchemaChange {
    /// Statement applying the change.
    pub fn up_sql(&self, dialect: Dialect) -> String {
        match self {
            SchemaChange::CreateTable(table) => table.create_sql(dialect, false),
            SchemaChange::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                table.name,
                column.definition(dialect)
            ),
        }
    }

    /// Statement reverting the change.
    pub fn down_sql(&self) -> String {
        match self {
            SchemaChange::CreateTable(table) => table.drop_sql(),
            SchemaChange::AddColumn { table, column } => {
                format!("ALTER TABLE {} DROP COLUMN {}", table.name, column.name)
            }
        }
    }
}

/// Compare the registry against a live schema.
///
/// Only additions are detected; dropped or altered columns are left for a
/// hand-written revision.
pub fn diff(live: &LiveSchema) -> Vec<SchemaChange> {
    let mut changes = Vec::new();
    for table in TABLES.iter().copied() {
        match live.get(table.name) {
            None => changes.push(SchemaChange::CreateTable(table)),
            Some(columns) => {
                for column in table.columns {
                    if !columns.contains(column.name) {
                        changes.push(SchemaChange::AddColumn { table, column });
                    }
                }
            }
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_postgres_ddl() {
        let sql = ACTOR_TABLE.create_sql(Dialect::Postgres, true);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS actor ("));
        assert!(sql.contains("id BIGSERIAL PRIMARY KEY"));
        assert!(sql.contains("age BIGINT NOT NULL"));
        assert!(sql.contains("updated_at TEXT,") || sql.ends_with("updated_at TEXT\n)"));
    }

    #[test]
    fn renders_composite_key_and_references() {
        let sql = ACTOR_MOVIE_TABLE.create_sql(Dialect::Sqlite, false);
        assert!(sql.contains("actor_id INTEGER NOT NULL REFERENCES actor(id) ON DELETE CASCADE"));
        assert!(sql.contains("PRIMARY KEY (actor_id, movie_id)"));
    }

    #[test]
    fn unique_and_default_modifiers() {
        let username = USER_TABLE.column("username").unwrap();
        assert_eq!(
            username.definition(Dialect::Sqlite),
            "username VARCHAR(255) NOT NULL UNIQUE"
        );
        let year = MOVIE_TABLE.column("year").unwrap();
        assert_eq!(year.definition(Dialect::Postgres), "year BIGINT NOT NULL DEFAULT 1900");
    }

    #[test]
    fn diff_against_empty_database_creates_everything() {
        let changes = diff(&LiveSchema::new());
        assert_eq!(changes.len(), TABLES.len());
        assert!(matches!(changes[0], SchemaChange::CreateTable(t) if t.name == "app_user"));
    }

    #[test]
    fn diff_detects_missing_column() {
        let mut live = LiveSchema::new();
        for table in TABLES {
            let mut columns: BTreeSet<String> =
                table.columns.iter().map(|c| c.name.to_string()).collect();
            if table.name == "movie" {
                columns.remove("rating");
            }
            live.insert(table.name.to_string(), columns);
        }

        let changes = diff(&live);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].up_sql(Dialect::Sqlite),
            "ALTER TABLE movie ADD COLUMN rating INTEGER NOT NULL DEFAULT 0"
        );
        assert_eq!(changes[0].down_sql(), "ALTER TABLE movie DROP COLUMN rating");
    }
}
