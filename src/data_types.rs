use serde::{ser::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

pub type DatabaseId = i64;
pub type TableId = i64;
pub type ColumnId = i64;

/// A catalogued database: the root of the entity tree.
///
/// An `id` of `None` means "not yet assigned"; the store allocates one when the
/// database is created. Cloning produces a deep copy.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Database {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<DatabaseId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Table {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<TableId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Column {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ColumnId>,
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub description: String,
}

/// Documents written by older tools use a literal 0 for "unassigned".
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.filter(|id| *id != 0))
}

impl Database {
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            tables,
        }
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Render the whole entity tree as tab-indented JSON. This is the context
    /// handed to the SQL translator.
    pub fn schema_text(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
        self.serialize(&mut serializer)?;

        String::from_utf8(buf).map_err(serde_json::Error::custom)
    }
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            columns,
        }
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            data_type: data_type.into(),
            description: String::new(),
        }
    }
}
