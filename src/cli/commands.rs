//! Command dispatch

use std::fs;
use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Generator};
use serde_json::json;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::permalink::{
    background_layer_param, decode_layer_param, encode_layer_param,
};
use crate::application::services::stack::LayerStack;
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::domain::entities::Layer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show { tree }) => _show(tree),
        Some(Commands::Encode { tree, reverse }) => _encode(tree, *reverse),
        Some(Commands::Decode { param }) => _decode(param),
        Some(Commands::Params { tree }) => _params(tree),
        Some(Commands::Completion { shell }) => _completion(*shell),
        None => Ok(()),
    }
}

fn load_stack(path: &Path) -> CliResult<LayerStack> {
    let json = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LayerStack::from_json(&json)?)
}

#[instrument]
fn _show(tree: &Path) -> CliResult<()> {
    let stack = load_stack(tree)?;
    debug!("loaded {} root layers", stack.flat.len());
    for layer in &stack.flat {
        output::info(&layer_tree(layer));
    }
    Ok(())
}

fn layer_tree(layer: &Layer) -> Tree<String> {
    let leaves: Vec<_> = layer
        .sublayers
        .iter()
        .flatten()
        .map(layer_tree)
        .collect();
    Tree::new(layer_label(layer)).with_leaves(leaves)
}

fn layer_label(layer: &Layer) -> String {
    let mut label = layer.name.clone();
    if let Some(title) = layer.title.as_deref().filter(|t| !t.is_empty() && *t != layer.name) {
        label.push_str(&format!(" ({title})"));
    }
    let mut flags = Vec::new();
    if !layer.visibility {
        flags.push("hidden".to_string());
    }
    if layer.opacity < 255 {
        let percent = (f64::from(layer.opacity) / 255.0 * 100.0).round() as u8;
        flags.push(format!("{percent}%"));
    }
    if layer.mutually_exclusive {
        flags.push("exclusive".to_string());
    }
    if !flags.is_empty() {
        label.push_str(&format!(" [{}]", flags.join(", ")));
    }
    label
}

#[instrument]
fn _encode(tree: &Path, reverse: bool) -> CliResult<()> {
    let stack = load_stack(tree)?;
    output::info(&format!("l={}", encode_layer_param(&stack.flat, reverse)));
    if let Some(bl) = background_layer_param(&stack.flat) {
        output::info(&format!("bl={bl}"));
    }
    Ok(())
}

#[instrument]
fn _decode(param: &str) -> CliResult<()> {
    let configs = decode_layer_param(param);
    if configs.is_empty() {
        return Err(CliError::InvalidArgs("empty layer parameter".to_string()));
    }
    let json = serde_json::to_string_pretty(&configs)
        .map_err(|e| CliError::Application(e.into()))?;
    output::info(&json);
    Ok(())
}

#[instrument]
fn _params(tree: &Path) -> CliResult<()> {
    let stack = load_stack(tree)?;
    let mut entries = Vec::new();
    for layer in &stack.flat {
        if layer.kind.is_wms() {
            let params = crate::application::services::wms::build_wms_params(layer);
            entries.push(json!({ "name": layer.name, "params": params }));
        }
    }
    let json = serde_json::to_string_pretty(&entries)
        .map_err(|e| CliError::Application(e.into()))?;
    output::info(&json);
    Ok(())
}

fn _completion(shell: impl Generator) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
