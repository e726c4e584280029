use serde_json::Value;
use storage::repository::{DocumentPath, DocumentStore, Fields};
use tracing::info;

/// Demo content written by `seed` when no `--fixture` is given.
pub const DEMO_FIXTURE: &str = include_str!("../fixtures/demo_chapter.json");

#[derive(Debug)]
pub enum FixtureError {
    Json(serde_json::Error),
    NotAnObject { path: String },
    Path(storage::StorageError),
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureError::Json(e) => write!(f, "fixture is not valid JSON: {e}"),
            FixtureError::NotAnObject { path } => {
                write!(f, "fixture entry `{path}` must be an object")
            }
            FixtureError::Path(e) => write!(f, "fixture path: {e}"),
        }
    }
}

impl std::error::Error for FixtureError {}

/// Parse a fixture: one JSON object mapping document paths to their fields.
pub fn parse_fixture(text: &str) -> Result<Vec<(DocumentPath, Fields)>, FixtureError> {
    let Value::Object(entries) = serde_json::from_str::<Value>(text).map_err(FixtureError::Json)? else {
        return Err(FixtureError::NotAnObject {
            path: "<root>".into(),
        });
    };
    entries
        .into_iter()
        .map(|(raw, value)| {
            let path = DocumentPath::parse(&raw).map_err(FixtureError::Path)?;
            match value {
                Value::Object(fields) => Ok((path, fields)),
                _ => Err(FixtureError::NotAnObject { path: raw }),
            }
        })
        .collect()
}

/// Write every fixture document, replacing what was there.
pub async fn load_fixture(
    store: &dyn DocumentStore,
    text: &str,
) -> Result<usize, Box<dyn std::error::Error>> {
    let documents = parse_fixture(text)?;
    let count = documents.len();
    for (path, fields) in documents {
        store.set_document(&path, fields, false).await?;
    }
    info!(documents = count, "fixture loaded");
    Ok(count)
}
