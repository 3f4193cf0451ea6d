use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use inv_collector::InventoryConfig;
use inv_store::{Detail, InMemoryStore, ListOptions, ObjectStore, Predicate};
use inv_tree::{ovirt, vsphere, DetailMap, TreeNode};
use serde_json::Value;

use crate::cli::*;
use crate::fixture::{Fixture, Platform};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => InventoryConfig::load(path)?,
        None => InventoryConfig::default(),
    };
    match cli.command {
        Command::Tree(args) => cmd_tree(args, &config, &cli.format),
        Command::List(args) => cmd_list(args, &config, &cli.format),
        Command::Kinds(args) => cmd_kinds(args, &cli.format),
    }
}

fn collect(fixture: &Fixture, config: &InventoryConfig) -> anyhow::Result<Arc<InMemoryStore>> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?
        .block_on(fixture.collect(config))
}

fn cmd_tree(args: TreeArgs, config: &InventoryConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let fixture = Fixture::load(&args.fixture)?;
    let store = collect(&fixture, config)?;

    let mut detail = DetailMap::new(config.tree.detail.clone());
    if args.full {
        detail = DetailMap::uniform(fixture.platform.kinds().iter().copied(), true);
    }
    for kind in &args.detail {
        detail.set(kind.as_str(), true);
    }

    let provider = fixture.provider(config);
    let content = match fixture.platform {
        Platform::Ovirt => ovirt::tree(&*store, ovirt::OvirtNodeBuilder::new(provider, detail))?,
        Platform::Vsphere => {
            vsphere::tree(&*store, vsphere::VsphereNodeBuilder::new(provider, detail))?
        }
        Platform::Ocp => bail!("{} inventories have no hierarchy; use `list`", Platform::Ocp.name()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&content)?),
        OutputFormat::Text => {
            for root in &content.children {
                print_node(root, 0);
            }
            println!("\n{} nodes", (content.count() - 1).to_string().bold());
        }
    }
    Ok(())
}

fn print_node(node: &TreeNode, depth: usize) {
    let name = node.object.get("name").and_then(Value::as_str).unwrap_or("");
    println!(
        "{}{} {} {}",
        "  ".repeat(depth),
        node.kind.cyan(),
        name.bold(),
        format!("({})", node.id).dimmed()
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

/// Parse `field=value` filters into an `And` of equalities.
fn parse_filters(parent: Option<&str>, filters: &[String]) -> anyhow::Result<Option<Predicate>> {
    let mut predicate: Option<Predicate> = parent.map(|p| Predicate::eq("parent", p));
    for filter in filters {
        let Some((field, value)) = filter.split_once('=') else {
            bail!("filter {filter:?} is not field=value");
        };
        let term = Predicate::eq(field.trim(), parse_value(value.trim()));
        predicate = Some(match predicate {
            Some(p) => p.and(term),
            None => term,
        });
    }
    Ok(predicate)
}

/// Booleans and integers compare as JSON scalars; anything else as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(|v| v.is_boolean() || v.is_number())
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn cmd_list(args: ListArgs, config: &InventoryConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let fixture = Fixture::load(&args.fixture)?;
    if !fixture.platform.kinds().contains(&args.kind.as_str()) {
        bail!(
            "{} has no kind {}; expected one of {}",
            fixture.platform.name(),
            args.kind,
            fixture.platform.kinds().join(", ")
        );
    }
    let store = collect(&fixture, config)?;

    let detail = Detail::from_flag(args.full);
    let mut options = ListOptions::new().detail(detail);
    if let Some(predicate) = parse_filters(args.parent.as_deref(), &args.filters)? {
        options = options.filter(predicate);
    }
    if let Some(limit) = args.limit {
        options = options.page(args.offset, limit);
    } else if args.offset > 0 {
        options = options.page(args.offset, usize::MAX);
    }

    let total = store.count(&args.kind, &options)?;
    let records = store.list(&args.kind, &options)?;
    let content = records
        .iter()
        .map(|r| fixture.platform.content(r, detail))
        .collect::<anyhow::Result<Vec<Value>>>()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&content)?),
        OutputFormat::Text => {
            for object in &content {
                let field = |key: &str| object.get(key).and_then(Value::as_str).unwrap_or("").to_string();
                println!("{:<24} {:<32} {}", field("id").yellow(), field("name"), field("parent").dimmed());
            }
            println!("\n{} of {} {}", content.len().to_string().bold(), total, args.kind);
        }
    }
    Ok(())
}

fn cmd_kinds(args: KindsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let kinds = args.platform.kinds();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(kinds)?),
        OutputFormat::Text => {
            println!("{}", args.platform.name().bold());
            for kind in kinds {
                println!("  {}", kind.cyan());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_combine_with_parent() {
        let predicate = parse_filters(Some("dc-1"), &["status=up".into(), "local=true".into()])
            .unwrap()
            .unwrap();
        let expected = Predicate::eq("parent", "dc-1")
            .and(Predicate::eq("status", "up"))
            .and(Predicate::eq("local", true));
        assert_eq!(predicate, expected);
    }

    #[test]
    fn no_filters_is_none() {
        assert!(parse_filters(None, &[]).unwrap().is_none());
        assert!(parse_filters(None, &["broken".into()]).is_err());
    }

    #[test]
    fn values_keep_scalar_types() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("false"), json!(false));
        assert_eq!(parse_value("prod"), json!("prod"));
        assert_eq!(parse_value("\"quoted\""), json!("\"quoted\""));
    }
}
