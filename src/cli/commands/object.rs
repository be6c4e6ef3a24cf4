//! Object command implementations.

use serde::Serialize;
use tabled::{Table, Tabled, builder::Builder};

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{OutputFormat, apply_table_style, format_properties, parse_properties};
use crate::db::{EntityObject, Properties, Timestamp};
use crate::store::{Database, StatePersistence};

/// JSON/YAML view of an object
#[derive(Debug, Serialize)]
struct ObjectView<'a> {
    id: &'a str,
    created: String,
    modified: String,
    properties: &'a Properties,
}

impl<'a> From<&'a EntityObject> for ObjectView<'a> {
    fn from(object: &'a EntityObject) -> Self {
        Self {
            id: &object.identifier,
            created: object.creation_date.to_string(),
            modified: object.last_modified_date.to_string(),
            properties: &object.properties,
        }
    }
}

#[derive(Tabled)]
pub(crate) struct ObjectDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Properties")]
    pub(crate) properties: String,
    #[tabled(rename = "Modified")]
    pub(crate) modified: String,
}

impl From<&EntityObject> for ObjectDisplay {
    fn from(object: &EntityObject) -> Self {
        Self {
            id: object.identifier.clone(),
            properties: format_properties(&object.properties, 60),
            modified: object.last_modified_date.to_string(),
        }
    }
}

fn format_object(object: &EntityObject, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ObjectView::from(object))?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&ObjectView::from(object))?),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            builder.push_record(["ID", object.identifier.as_str()]);
            builder.push_record(["Created", &object.creation_date.to_string()]);
            builder.push_record(["Modified", &object.last_modified_date.to_string()]);
            for (key, value) in &object.properties {
                builder.push_record([key.as_str(), value.as_str()]);
            }

            let mut table = builder.build();
            apply_table_style(&mut table);
            Ok(table.to_string())
        }
    }
}

pub(crate) fn format_table(objects: &[&EntityObject]) -> String {
    if objects.is_empty() {
        return "No objects found.".to_string();
    }

    let display: Vec<ObjectDisplay> = objects.iter().map(|o| (*o).into()).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);
    table.to_string()
}

/// Insert a new object and persist the store
pub fn insert<P: StatePersistence>(
    db: &mut Database,
    persistence: &mut P,
    id: Option<String>,
    properties: &[String],
    format: OutputFormat,
) -> CliResult<String> {
    let properties = parse_properties(properties)?;
    let object = match id {
        Some(id) => {
            let now = Timestamp::now();
            EntityObject::new(id, now, now, properties)
        }
        None => EntityObject::unassigned(properties),
    };
    let applied = db.insert(object);
    db.save(persistence)?;

    match format {
        OutputFormat::Table => Ok(format!("✓ Inserted object: {}", applied.object.identifier)),
        _ => format_object(&applied.object, format),
    }
}

/// Update properties of an object and persist the store
pub fn update<P: StatePersistence>(
    db: &mut Database,
    persistence: &mut P,
    id: &str,
    properties: &[String],
    format: OutputFormat,
) -> CliResult<String> {
    let properties = parse_properties(properties)?;
    let applied = db.update(id, properties);
    db.save(persistence)?;

    match format {
        OutputFormat::Table if applied.deltas.is_empty() => {
            Ok(format!("ℹ No changes to object: {}", id))
        }
        OutputFormat::Table => {
            let changed = applied
                .deltas
                .get(id)
                .map(|delta| delta.properties.len())
                .unwrap_or_default();
            Ok(format!("✓ Updated object: {} ({} properties changed)", id, changed))
        }
        _ => format_object(&applied.object, format),
    }
}

/// Show a single object
pub fn get(db: &Database, id: &str, format: OutputFormat) -> CliResult<String> {
    let object = db
        .fetch_object(id)
        .ok_or_else(|| CliError::NotFound { id: id.to_string() })?;
    format_object(object, format)
}

/// List all objects, oldest first
pub fn list(db: &Database, format: OutputFormat) -> CliResult<String> {
    let objects = db.fetch_objects();
    match format {
        OutputFormat::Json => {
            let views: Vec<ObjectView> = objects.iter().map(|o| ObjectView::from(*o)).collect();
            Ok(serde_json::to_string_pretty(&views)?)
        }
        OutputFormat::Yaml => {
            let views: Vec<ObjectView> = objects.iter().map(|o| ObjectView::from(*o)).collect();
            Ok(serde_yaml::to_string(&views)?)
        }
        OutputFormat::Table => Ok(format_table(&objects)),
    }
}
