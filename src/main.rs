use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use node_forge_template_options::{TemplateWorkspace, template};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PassSelection {
    pass: String,
    option: String,
    index: i32,
}

#[derive(Debug, Default, Clone)]
struct Cli {
    template: Option<PathBuf>,
    selections: Vec<PassSelection>,
    sub_shader_selections: Vec<(String, i32)>,
    restore: Option<PathBuf>,
    refresh: bool,
}

const USAGE: &str = "supported: --template <doc.json>, --select <pass>:<option>=<index>, \
--sub-shader-select <option>=<index>, --restore <tokens.json>, --refresh";

fn parse_assignment(flag: &str, value: &str) -> Result<(String, i32)> {
    let (name, index) = value
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("{flag} expects <option>=<index>, got {value}"))?;
    let index = index
        .parse()
        .map_err(|e| anyhow!("{flag}: invalid index in {value}: {e}"))?;
    Ok((name.to_string(), index))
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--template" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --template"));
                };
                cli.template = Some(PathBuf::from(v));
                i += 2;
            }
            "--select" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --select"));
                };
                let (pass, rest) = v
                    .split_once(':')
                    .ok_or_else(|| anyhow!("--select expects <pass>:<option>=<index>, got {v}"))?;
                let (option, index) = parse_assignment("--select", rest)?;
                cli.selections.push(PassSelection {
                    pass: pass.to_string(),
                    option,
                    index,
                });
                i += 2;
            }
            "--sub-shader-select" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --sub-shader-select"));
                };
                cli.sub_shader_selections
                    .push(parse_assignment("--sub-shader-select", v)?);
                i += 2;
            }
            "--restore" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --restore"));
                };
                cli.restore = Some(PathBuf::from(v));
                i += 2;
            }
            "--refresh" => {
                cli.refresh = true;
                i += 1;
            }
            other => {
                return Err(anyhow!("unknown argument: {other} ({USAGE})"));
            }
        }
    }
    Ok(cli)
}

fn read_tokens(path: &std::path::Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read --restore file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid token list json in {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;

    let doc = match cli.template.as_deref() {
        Some(path) => template::load_template_from_path(path)?,
        None => template::load_default_template()?,
    };
    let mut workspace = TemplateWorkspace::from_template(&doc);

    if let Some(path) = cli.restore.as_deref() {
        let tokens = read_tokens(path)?;
        workspace.load_tokens(&tokens)?;
    }
    if cli.refresh {
        workspace.refresh_all();
    }

    for (option, index) in &cli.sub_shader_selections {
        if !workspace.select_sub_shader_option(option, *index)? {
            log::info!("sub-shader option {option} already at {index}");
        }
    }
    for sel in &cli.selections {
        if !workspace.select_pass_option(&sel.pass, &sel.option, sel.index)? {
            log::info!("{}:{} already at {}", sel.pass, sel.option, sel.index);
        }
    }

    let mut directives = serde_json::Map::new();
    for node in &workspace.graph().nodes {
        let collector = workspace.collect_pass_data(&node.pass_name)?;
        directives.insert(node.pass_name.clone(), serde_json::json!(collector.directives()));
    }

    let report = serde_json::json!({
        "workspace": serde_json::to_value(&workspace)?,
        "build_directives": directives,
        "tokens": workspace.save_tokens(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
