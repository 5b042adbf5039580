use clap::{Args, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use bizplan_core::store::PlanStore;

use crate::input;

/// Arguments for versioned plan storage
#[derive(Args)]
pub struct PlanStoreArgs {
    /// Store file (created on first save)
    #[arg(long, default_value = "bizplan-plans.json", global = true)]
    pub store: PathBuf,

    /// Owner the plans belong to
    #[arg(long, default_value = "default", global = true)]
    pub owner: String,

    #[command(subcommand)]
    pub action: PlanAction,
}

#[derive(Subcommand)]
pub enum PlanAction {
    /// Save the five input models as a new version
    Save {
        /// JSON or YAML plan document (stdin when omitted)
        #[arg(long)]
        input: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        note: Option<String>,
        /// Who is saving (defaults to the owner)
        #[arg(long)]
        actor: Option<String>,
    },
    /// Load a version (latest when --version is omitted)
    Load {
        #[arg(long)]
        name: String,
        #[arg(long)]
        version: Option<u32>,
    },
    /// List the owner's plans
    List,
    /// List a plan's versions, newest first
    Versions {
        #[arg(long)]
        name: String,
    },
    /// Dump every version of every plan of the owner
    Backup,
}

pub fn run_plan_store(args: PlanStoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store = PlanStore::open(&args.store)?;
    let owner = args.owner.as_str();

    let value = match args.action {
        PlanAction::Save {
            input: path,
            name,
            note,
            actor,
        } => {
            let doc = input::load_plan_input(path.as_deref())?;
            doc.validate()?;
            let actor = actor.unwrap_or_else(|| owner.to_string());
            let version = store.save_version(owner, &name, doc.bundle, note, &actor)?;
            store.save(&args.store)?;
            serde_json::json!({ "result": { "name": name, "version": version } })
        }
        PlanAction::Load { name, version } => {
            let found = store.load(owner, &name, version)?;
            serde_json::json!({ "result": found })
        }
        PlanAction::List => serde_json::json!({ "result": store.list_plans(owner) }),
        PlanAction::Versions { name } => {
            serde_json::json!({ "result": store.list_versions(owner, &name)? })
        }
        PlanAction::Backup => serde_json::json!({ "result": store.backup(owner) }),
    };
    Ok(value)
}
