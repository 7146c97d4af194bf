//! Display helpers for the target datasource.

use std::path::Path;

use tessera_schema::{Datasource, Provider};
use url::Url;

/// What the user sees about the database a command targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasourceInfo {
    /// Datasource block name.
    pub name: Option<String>,
    /// Provider as shown to users, e.g. `PostgreSQL`.
    pub pretty_provider: Option<String>,
    /// Database name, or the file name for SQLite.
    pub db_name: Option<String>,
    /// `host:port`, or the file path for SQLite.
    pub db_location: Option<String>,
    /// Schema selected through the connection URL.
    pub schema: Option<String>,
    /// Schemas listed in the datasource block.
    pub schemas: Vec<String>,
}

/// Derive display information from the datasource, if any.
///
/// Unparseable URLs leave the connection fields empty; they are never an error.
pub fn parse_datasource_info(datasource: Option<&Datasource>) -> DatasourceInfo {
    let Some(ds) = datasource else {
        return DatasourceInfo::default();
    };

    let mut info = DatasourceInfo {
        name: Some(ds.name.clone()),
        pretty_provider: Some(ds.provider.pretty_name().to_string()),
        schemas: ds.schemas.clone(),
        ..Default::default()
    };

    let Some(url) = ds.effective_url() else {
        return info;
    };

    match ds.provider {
        Provider::Sqlite => {
            let path = url
                .strip_prefix("file:")
                .unwrap_or(url)
                .split('?')
                .next()
                .unwrap_or_default();
            let path = Path::new(path);
            info.db_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            let base = ds.source_file.parent().unwrap_or(Path::new(""));
            info.db_location = Some(base.join(path).display().to_string());
        }
        Provider::SqlServer => parse_sqlserver(url, &mut info),
        provider => {
            if let Ok(parsed) = Url::parse(url) {
                let db_name = parsed.path().trim_start_matches('/');
                if !db_name.is_empty() {
                    info.db_name = Some(db_name.to_string());
                }
                info.db_location = parsed.host_str().map(|host| match parsed.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                });
                if matches!(provider, Provider::PostgreSql | Provider::CockroachDb) {
                    let schema = parsed
                        .query_pairs()
                        .find(|(k, _)| k == "schema")
                        .map(|(_, v)| v.into_owned());
                    info.schema = Some(schema.unwrap_or_else(|| "public".to_string()));
                }
            }
        }
    }

    info
}

/// `sqlserver://host:port;database=app;schema=dbo`
fn parse_sqlserver(url: &str, info: &mut DatasourceInfo) {
    let rest = url.strip_prefix("sqlserver://").unwrap_or(url);
    let mut parts = rest.split(';');

    if let Some(host) = parts.next().filter(|h| !h.is_empty()) {
        info.db_location = Some(host.to_string());
    }

    for part in parts {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_lowercase().as_str() {
            "database" | "initial catalog" => info.db_name = Some(value.trim().to_string()),
            "schema" => info.schema = Some(value.trim().to_string()),
            _ => {}
        }
    }

    if info.schema.is_none() {
        info.schema = Some("dbo".to_string());
    }
}

/// One-line summary of the target, printed before the dev flow starts.
pub fn format_datasource(info: &DatasourceInfo, adapter: Option<&str>) -> Option<String> {
    let name = info.name.as_deref()?;
    let provider = info.pretty_provider.as_deref()?;

    if let Some(adapter) = adapter {
        return Some(format!(
            "Datasource \"{name}\": {provider} database via driver adapter \"{adapter}\""
        ));
    }

    let mut line = format!("Datasource \"{name}\": {provider} database");
    if let Some(db) = &info.db_name {
        line.push_str(&format!(" \"{db}\""));
    }
    if !info.schemas.is_empty() {
        line.push_str(&format!(", schemas \"{}\"", info.schemas.join(", ")));
    } else if let Some(schema) = &info.schema {
        line.push_str(&format!(", schema \"{schema}\""));
    }
    if let Some(location) = &info.db_location {
        line.push_str(&format!(" at \"{location}\""));
    }
    Some(line)
}

/// What a reset would wipe.
pub fn reset_message(info: &DatasourceInfo) -> String {
    let provider = info.pretty_provider.as_deref().unwrap_or("database");

    let mut message = if matches!(provider, "PostgreSQL" | "SQL Server") {
        if !info.schemas.is_empty() {
            format!(
                "We need to reset the following schemas: \"{}\"",
                info.schemas.join(", ")
            )
        } else if let Some(schema) = &info.schema {
            format!("We need to reset the \"{schema}\" schema")
        } else {
            "We need to reset the database schema".to_string()
        }
    } else {
        format!(
            "We need to reset the {provider} database \"{}\"",
            info.db_name.as_deref().unwrap_or_default()
        )
    };

    if let Some(location) = &info.db_location {
        message.push_str(&format!(" at \"{location}\""));
    }
    message
}

/// Notice printed after the engine created a missing database.
pub fn created_database_message(info: &DatasourceInfo) -> String {
    let provider = info.pretty_provider.as_deref().unwrap_or("The");
    let mut message = format!("{provider} database");
    if let Some(db) = &info.db_name {
        message.push_str(&format!(" {db}"));
    }
    message.push_str(" created");
    if let Some(location) = &info.db_location {
        message.push_str(&format!(" at {location}"));
    }
    message
}

/// Tree view of migration folders:
///
/// ```text
/// migrations/
///   └─ 20240101120000_init/
///     └─ migration.sql
/// ```
pub fn format_migration_tree(dir_label: &str, ids: &[String]) -> String {
    let mut tree = format!("{dir_label}/\n");
    for id in ids {
        tree.push_str(&format!("  └─ {id}/\n    └─ migration.sql\n"));
    }
    tree
}
