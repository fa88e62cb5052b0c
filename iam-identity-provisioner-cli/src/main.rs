use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use iam_identity_provisioner_core::{
    render_by_name, AccountId, AwsIamClient, BatchRunner, DefinitionStore, KindSelection, LogSink,
    PolicyTemplate, ProvisionError, ProvisionerConfig, TemplateParams, DEFAULT_ACCOUNT_ID,
};

/// Every requested definition succeeded.
const EXIT_OK: u8 = 0;
/// At least one definition or identity list failed.
const EXIT_FAILURES: u8 = 1;
/// Bad selector or configuration; nothing was attempted.
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "iam-identity-provisioner",
    version,
    about = "Generate AWS IAM roles and groups with associated policies."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create roles and/or groups from the definition store
    Provision {
        /// Creates role identities
        #[arg(long)]
        role: bool,

        /// Creates group identities
        #[arg(long)]
        group: bool,

        /// Root directory of the definition store
        #[arg(long, env = "IAM_PROVISIONER_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// AWS account id used in account principals
        #[arg(long, env = "IAM_PROVISIONER_ACCOUNT_ID", default_value = DEFAULT_ACCOUNT_ID)]
        account_id: String,
    },

    /// Print a policy document rendered from a template
    RenderPolicy {
        /// Template name: assumed-role, default-role or default-group
        #[arg(short, long)]
        policy: String,

        /// AWS account id used in account principals
        #[arg(long, env = "IAM_PROVISIONER_ACCOUNT_ID", default_value = DEFAULT_ACCOUNT_ID)]
        account_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Provision {
            role,
            group,
            data_dir,
            account_id,
        } => provision(KindSelection::new(role, group), data_dir, &account_id).await,
        Command::RenderPolicy { policy, account_id } => render_policy(&policy, &account_id),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            let usage = e.downcast_ref::<ProvisionError>().is_some_and(|e| {
                matches!(
                    e,
                    ProvisionError::UnknownSelector { .. } | ProvisionError::InvalidConfig(_)
                )
            });
            ExitCode::from(if usage { EXIT_USAGE } else { EXIT_FAILURES })
        }
    }
}

async fn provision(selection: KindSelection, data_dir: PathBuf, account_id: &str) -> Result<u8> {
    let config = ProvisionerConfig::new(data_dir, account_id.parse::<AccountId>()?);
    let store = DefinitionStore::new(&config.storage_root);
    let sink = LogSink;

    if selection.is_empty() {
        info!("Nothing requested; pass --role and/or --group");
    }
    info!(
        "Provisioning from {} for account {}",
        config.storage_root.display(),
        config.account_id
    );
    let client = AwsIamClient::from_env();
    let summary = BatchRunner::new(&client, &store, &sink)
        .run(selection)
        .await;

    info!(
        "Finished: {} succeeded, {} failed",
        summary.succeeded_count(),
        summary.failed_count()
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
    );

    Ok(if summary.has_failures() {
        EXIT_FAILURES
    } else {
        EXIT_OK
    })
}

fn render_policy(name: &str, account_id: &str) -> Result<u8> {
    let params = TemplateParams::new(account_id.parse()?);
    let document = render_by_name(name, &params).map_err(|e| {
        let known: Vec<&str> = PolicyTemplate::ALL.iter().map(|t| t.name()).collect();
        anyhow::Error::new(e).context(format!("Known templates: {}", known.join(", ")))
    })?;

    println!(
        "{}",
        serde_json::to_string_pretty(&document).context("Failed to serialize policy")?
    );
    Ok(EXIT_OK)
}
