use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use iris_client::{ApiClient, FileStore, Page, ReqwestTransport, Session};
use iris_core::canvas::build_model_version_data;
use iris_core::registry::{registry, validate_all};
use iris_core::{model_version_schema, CanvasEdge, CanvasNode, CanvasState, Notation};
use serde::Deserialize;
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::config::{load_config, IrisConfig};

/// A diagram as the canvas exports it.
#[derive(Debug, Deserialize)]
pub struct CanvasFile {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

impl CanvasFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read canvas file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a canvas file", path.display()))
    }

    fn into_state(self) -> CanvasState {
        let mut state = CanvasState::new();
        state.load(self.nodes, self.edges);
        state
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    validate_all().context("Notation registries are inconsistent")?;

    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    debug!(base_url = %config.api.base_url, persist = config.session.persist, "configuration loaded");

    match command {
        Commands::Login { username, password } => {
            let client = connect(&config)?;
            let user = client
                .login(&username, &password)
                .await
                .context("Login failed")?;
            println!("Logged in as {} ({})", user.username, user.role);
        }
        Commands::Logout => {
            connect(&config)?.logout().await;
            println!("Logged out");
        }
        Commands::Whoami => whoami(&connect(&config)?),
        Commands::Notations { notation, json } => notations(notation, json)?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&model_version_schema())?);
        }
        Commands::BuildVersion { canvas } => {
            let data = CanvasFile::read(&canvas)?.into_state().to_model_version();
            println!("{}", data.to_json_pretty()?);
        }
        Commands::SaveVersion {
            model,
            canvas,
            summary,
        } => {
            let state = CanvasFile::read(&canvas)?.into_state();
            let client = connect(&config)?;
            let current = client
                .get_model(&model)
                .await
                .with_context(|| format!("Failed to load model {model}"))?;
            let saved = client
                .save_model_version(&current, &state.to_model_version(), summary.as_deref())
                .await
                .context("Failed to save model version")?;
            info!(model_id = %saved.id, "saved");
            println!(
                "Saved {} as version {} ({} nodes, {} edges)",
                saved.name,
                saved.current_version,
                state.nodes().len(),
                state.edges().len()
            );
        }
        Commands::Models { page, page_size } => {
            let client = connect(&config)?;
            let list = client
                .list_models(Page::new(page, page_size))
                .await
                .context("Failed to list models")?;
            for model in &list.items {
                println!(
                    "{:<38} {:<10} v{:<4} {}",
                    model.id, model.model_type, model.current_version, model.name
                );
            }
            println!("page {} of {} models", list.page, list.total);
        }
        Commands::Versions { model } => {
            let client = connect(&config)?;
            let versions = client
                .list_model_versions(&model)
                .await
                .with_context(|| format!("Failed to list versions of {model}"))?;
            for version in versions {
                println!(
                    "v{:<4} {:<8} {} {}",
                    version.version,
                    version.change_type,
                    version.created_at,
                    version.change_summary.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn connect(config: &IrisConfig) -> Result<ApiClient> {
    let transport = ReqwestTransport::new(&config.api.base_url, config.api.timeout())
        .context("Failed to create HTTP client")?;
    let session = if config.session.persist {
        let store = match &config.session.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::in_data_dir(),
        };
        debug!(path = %store.path().display(), "using session file");
        Session::with_store(Arc::new(store))
    } else {
        Session::new()
    };
    Ok(ApiClient::new(Arc::new(transport), session))
}

fn whoami(client: &ApiClient) {
    let session = client.session();
    let Some(user) = session.current_user() else {
        println!("Not logged in");
        return;
    };
    println!("{} ({})", user.username, user.role);

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    match session.access_token_expiry() {
        Some(_) if session.is_expired_at(now_ms) => {
            println!("Access token expired; it is refreshed on the next request")
        }
        Some(expiry) => println!("Access token valid for {}s", (expiry - now_ms) / 1000),
        None => println!("Access token expiry unknown"),
    }
}

fn notations(only: Option<Notation>, json: bool) -> Result<()> {
    let selected: Vec<Notation> = match only {
        Some(notation) => vec![notation],
        None => Notation::ALL.to_vec(),
    };

    if json {
        let registries: Vec<_> = selected.iter().map(|n| registry(*n)).collect();
        println!("{}", serde_json::to_string_pretty(&registries)?);
        return Ok(());
    }

    for notation in selected {
        let reg = registry(notation);
        println!("{notation}");
        println!("  entities:");
        for info in reg.entity_types {
            println!("    {:<24} {}  {}", info.key, info.icon, info.label);
        }
        println!("  relationships:");
        for info in reg.relationship_types {
            println!("    {:<24} {}", info.key, info.label);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_file_converts_to_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.json");
        fs::write(
            &path,
            r#"{
                "nodes": [
                    {"id": "node-1", "type": "service", "position": {"x": 10, "y": 20},
                     "data": {"label": "Orders", "entityType": "service", "entityId": "e1"}},
                    {"id": "node-2", "type": "database", "position": {"x": 200, "y": 20},
                     "data": {"label": "Orders DB", "entityType": "database"}}
                ],
                "edges": [
                    {"id": "edge-1", "source": "node-1", "target": "node-2", "type": "uses",
                     "data": {"relationshipType": "uses", "relationshipId": "rel-1"}},
                    {"id": "edge-2", "source": "node-2", "target": "node-1", "type": "depends_on",
                     "data": {"relationshipType": "depends_on"}}
                ]
            }"#,
        )
        .unwrap();

        let data = CanvasFile::read(&path).unwrap().into_state().to_model_version();
        let ids: Vec<_> = data.placements.iter().map(|p| p.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "node-2"]);
        assert_eq!(data.displayed_relationships, vec!["rel-1".to_string()]);
    }

    #[test]
    fn unknown_node_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.json");
        fs::write(
            &path,
            r#"{"nodes": [{"id": "n1", "type": "simpleEntity", "data": {"label": "x", "entityType": "simpleEntity"}}]}"#,
        )
        .unwrap();
        assert!(CanvasFile::read(&path).is_err());
    }

    #[test]
    fn notation_listing_runs() {
        notations(None, false).unwrap();
        notations(Some(Notation::Sequence), true).unwrap();
    }

    #[test]
    fn build_matches_direct_conversion() {
        let file = CanvasFile {
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        assert_eq!(
            file.into_state().to_model_version(),
            build_model_version_data(&[], &[])
        );
    }
}
