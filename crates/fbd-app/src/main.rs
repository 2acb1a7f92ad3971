//! FBD 命令行入口
//!
//! 读取题目文档（缺省为内置题目 6），应用符号覆盖，
//! 以 JSON 输出数值化的题目与调色板。日志写到 stderr。

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fbd_core::arc::ArcRegistry;
use fbd_core::expression::evaluate;
use fbd_core::palette::Palette;
use fbd_core::problem::Problem;
use fbd_core::symbols::SymbolTable;
use fbd_file::{ParserOptions, ProblemCatalogue, ProblemDocument, ProblemParser, BUILTIN_PROBLEM_ID};

/// 读取受力分析题目并输出数值化的题目与调色板
#[derive(Parser, Debug)]
#[command(name = "fbd", version)]
struct CliArgs {
    /// 题目文档（.xml 或 .json），缺省为内置题目 6
    document: Option<PathBuf>,

    /// 符号覆盖 `NAME=VALUE`，值为表达式，可重复
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    overrides: Vec<(String, String)>,

    /// 表达式求值失败时报错而不是取 0
    #[arg(long)]
    strict: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

fn parse_assignment(text: &str) -> std::result::Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("invalid assignment '{}', expected NAME=VALUE", text)),
    }
}

#[derive(Serialize)]
struct Output<'a> {
    problem: &'a Problem,
    palette: Palette,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // 初始化日志
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    let options = if args.strict {
        ParserOptions::strict()
    } else {
        ParserOptions::default()
    };
    let parser = ProblemParser::new(options);
    let symbols = SymbolTable::with_defaults();

    let (mut catalogue, id) = match &args.document {
        Some(path) => {
            info!("Loading {}", path.display());
            let document = ProblemDocument::open(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let mut catalogue = ProblemCatalogue::new(parser, symbols);
            let id = catalogue.insert(document)?.id.clone();
            (catalogue, id)
        }
        None => (
            ProblemCatalogue::with_builtin_using(parser, symbols)?,
            BUILTIN_PROBLEM_ID.to_string(),
        ),
    };

    if !args.overrides.is_empty() {
        let mut overrides = Vec::with_capacity(args.overrides.len());
        for (name, expression) in &args.overrides {
            let value = evaluate(expression, catalogue.symbols())
                .with_context(|| format!("Invalid value for {}", name))?;
            overrides.push((name.clone(), value));
        }
        catalogue.update_symbols(&id, overrides)?;
    }

    let problem = catalogue
        .get(&id)
        .with_context(|| format!("Problem {} failed to load", id))?;
    let output = Output {
        problem,
        palette: Palette::from_problem(problem, &ArcRegistry::default()),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
