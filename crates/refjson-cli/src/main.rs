//! `refjson` CLI — evaluate path expressions against JSON documents.
//!
//! ## Usage
//!
//! ```sh
//! # Pick a field out of a document
//! refjson data.json '$.users[0].name'
//!
//! # Bare identifiers are sugar for $.IDENT
//! refjson data.json 'users[0].name'
//!
//! # Project several paths at once
//! refjson data.json '${.name, .version}'
//!
//! # Built-in functions
//! refjson data.json 'size($.users)'
//!
//! # Pretty-print a sub-tree
//! refjson data.json '$.users' --pretty
//!
//! # Python-style negative indices
//! refjson data.json '$.users[-1]' --negative-indexing
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use refjson_core::EvalOptions;

#[derive(Parser)]
#[command(
    name = "refjson",
    version,
    about = "Evaluate path expressions against JSON documents"
)]
struct Cli {
    /// JSON document to read
    file: PathBuf,

    /// Path expression evaluated against the document
    expression: String,

    /// Pretty-print the result with tab indentation
    #[arg(long)]
    pretty: bool,

    /// Allow symmetric lookups: i[arr] works like arr[i], key[obj] like obj[key]
    #[arg(long)]
    symmetric_indexing: bool,

    /// Allow negative array indices counting from the end
    #[arg(long)]
    negative_indexing: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = EvalOptions {
        symmetric_indexing: cli.symmetric_indexing,
        negative_indexing: cli.negative_indexing,
    };

    let document = refjson_core::parse_file_with_options(&cli.file, options)
        .with_context(|| format!("failed to parse {}", cli.file.display()))?;

    let result = refjson_core::eval(&document, &cli.expression, options)
        .with_context(|| format!("failed to evaluate `{}`", cli.expression))?;

    let rendered = if cli.pretty {
        result.render_pretty()
    } else {
        result.render()
    }
    .context("failed to render the result")?;

    println!("{rendered}");
    Ok(())
}
