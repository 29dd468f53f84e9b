//! Execution of a resolution run and rendering of its result.

use crate::cli::{Cli, OutputType};
use crate::errors::CliError;
use crate::input::{load_excludes, load_json_array};
use cubx_resolver::{DependencyResolver, ResolverConfig, RuntimeMode};
use serde_json::Value;
use tracing::{debug, instrument};

/// Resolver settings derived from the command line.
pub fn resolver_config(cli: &Cli) -> Result<ResolverConfig, CliError> {
    let excludes = cli
        .excludes
        .as_deref()
        .map(load_excludes)
        .transpose()?
        .unwrap_or_default();

    Ok(ResolverConfig::default()
        .with_runtime_mode(RuntimeMode::parse_or_default(cli.mode.as_deref()))
        .with_automatic_conflict_resolution(cli.acr)
        .with_fetch_timeout_secs(cli.timeout)
        .with_global_excludes(excludes))
}

/// Run the resolver and produce the requested view as JSON.
#[instrument(skip(cli), fields(output = ?cli.output, base_url = %cli.base_url))]
pub async fn execute(cli: &Cli) -> Result<Value, CliError> {
    let root_dependencies = load_json_array("rootDependencies", &cli.root_dependencies)?;
    let mut resolver = DependencyResolver::new(resolver_config(cli)?)?;
    let base_url = cli.base_url.as_str();

    let output = match cli.output {
        OutputType::Raw => {
            let tree = resolver
                .build_raw_dependency_tree(&root_dependencies, base_url)
                .await?;
            serde_json::to_value(tree.to_json(true))?
        }
        OutputType::Resolved => {
            let tree = resolver
                .resolve_dependencies(&root_dependencies, base_url)
                .await?;
            serde_json::to_value(tree.to_json(true))?
        }
        OutputType::List => serde_json::to_value(
            resolver
                .resolve_resources_list(&root_dependencies, base_url, None)
                .await?,
        )?,
        OutputType::Wplist => serde_json::to_value(
            resolver
                .resolve_wp_list(&root_dependencies, base_url)
                .await?,
        )?,
        OutputType::Mlist => Value::Array(
            resolver
                .resolve_manifests_list(&root_dependencies, base_url)
                .await?,
        ),
    };

    debug!("Resolution finished");
    Ok(output)
}

/// Print `value` as pretty JSON on standard output.
#[allow(clippy::print_stdout)]
pub fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
