use crate::config::{Config, DatabaseConfig};
use crate::db::{DatabasePopulator, collator_for, remove_database};
use crate::error::{PrefillerError, SourceKind};
use crate::parser::StatementParserFactory;
use crate::schema::find_latest;
use crate::sql::SplitOptions;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything one database generation needs, with paths resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub name: String,
    pub schema_directory: PathBuf,
    pub script_files: Vec<PathBuf>,
    pub database_file: PathBuf,
    pub split_options: SplitOptions,
}

impl GenerateRequest {
    pub fn from_config(config: &Config, database: &DatabaseConfig) -> Result<Self, PrefillerError> {
        let classname = database
            .classname
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PrefillerError::MissingClassname(database.name.clone()))?;
        let schema_root = database
            .schema_directory
            .as_ref()
            .or(config.schema_location.as_ref())
            .ok_or(PrefillerError::SchemaLocationMissing)?;

        let scripts = match &database.script {
            Some(script) => {
                warn!("Deprecated 'script' property was used, please use 'scripts' instead.");
                vec![script.clone()]
            }
            None => database.scripts.clone(),
        };

        let output_directory = database
            .output_directory
            .as_ref()
            .unwrap_or(&config.output_directory);

        Ok(Self {
            name: database.name.clone(),
            schema_directory: config.resolve(schema_root).join(classname),
            script_files: scripts.iter().map(|s| config.resolve(s)).collect(),
            database_file: config
                .resolve(output_directory)
                .join(format!("{}.db", database.name)),
            split_options: if database.strict {
                SplitOptions::strict()
            } else {
                SplitOptions::default()
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub name: String,
    pub database_file: PathBuf,
    pub schema_file: PathBuf,
    pub schema_version: u64,
    pub schema_statements: usize,
    pub script_statements: usize,
}

/// Build one pre-filled database: schema pass, then script pass.
///
/// A failed script pass removes the output so no half-built database is
/// left behind.
pub async fn generate(
    request: &GenerateRequest,
    populator: &DatabasePopulator,
) -> Result<GenerationReport, PrefillerError> {
    let schema = find_latest(&request.schema_directory)?;

    let factory = StatementParserFactory::new(request.split_options);
    let setup_statements = factory.create_parser(SourceKind::Schema, &schema.path).parse()?;
    let mut script_statements = Vec::new();
    for file in &request.script_files {
        script_statements.extend(factory.create_parser(SourceKind::Script, file).parse()?);
    }

    populator
        .populate(&request.database_file, &setup_statements, true)
        .await?;
    if let Err(e) = populator
        .populate(&request.database_file, &script_statements, false)
        .await
    {
        if let Err(cleanup) = remove_database(&request.database_file) {
            warn!(
                database = %request.database_file.display(),
                error = %cleanup,
                "failed to remove database after failed script pass"
            );
        }
        return Err(e);
    }

    let report = GenerationReport {
        name: request.name.clone(),
        database_file: request.database_file.clone(),
        schema_file: schema.path,
        schema_version: schema.version,
        schema_statements: setup_statements.len(),
        script_statements: script_statements.len(),
    };
    info!(
        name = %report.name,
        database = %report.database_file.display(),
        schema_version = report.schema_version,
        schema_statements = report.schema_statements,
        script_statements = report.script_statements,
        "generated pre-filled database"
    );
    Ok(report)
}

/// Generate every configured database, or only those named in `only`.
/// Databases run one after another; the first failure stops the run.
pub async fn run(config: &Config, only: &[String]) -> Result<Vec<GenerationReport>, PrefillerError> {
    if let Some(unknown) = only.iter().find(|name| config.database(name).is_none()) {
        return Err(PrefillerError::UnknownDatabase(unknown.clone()));
    }

    let populator = DatabasePopulator::new(collator_for(config.locale.as_deref())?);
    let mut reports = Vec::new();
    for database in config
        .databases
        .iter()
        .filter(|db| only.is_empty() || only.contains(&db.name))
    {
        let request = GenerateRequest::from_config(config, database)?;
        reports.push(generate(&request, &populator).await?);
    }

    if reports.is_empty() {
        warn!("no databases configured; nothing generated");
    }
    Ok(reports)
}
