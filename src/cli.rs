//! Minimal CLI: compile a shape file → request envelope, or fold responses.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use gql_shape::{
    construct_mutation, construct_query, fold_data, path_de, Request, Shape, Variable, Variables,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile typed shape descriptions into minified GraphQL documents, and fold
/// repeated-field responses back into lists
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile a JSON shape descriptor (+ variables) into a request envelope
    Compile(CompileOut),
    /// fold `name__N` keys of GraphQL responses into lists
    Fold(FoldOut),
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    /// JSON-serialized shape descriptor
    #[arg(long, short)]
    shape: PathBuf,

    /// JSON object of variables; arrays of objects are repetition groups
    #[arg(long, short)]
    variables: Option<PathBuf>,

    /// emit a mutation instead of a query
    #[arg(long, default_value_t = false)]
    mutation: bool,

    /// print only the document text, not the JSON envelope
    #[arg(long, default_value_t = false)]
    text: bool,

    #[command(flatten)]
    output: OutputSettings,
}

#[derive(clap::Parser, Debug)]
struct FoldOut {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// inputs are full response envelopes; fold their `data` and keep `errors`
    #[arg(long, default_value_t = false)]
    envelope: bool,

    #[command(flatten)]
    output: OutputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Compile(target) => {
                // debug path
                if target.output.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }
                let shape: Shape = read_json(&target.shape)?;
                let variables = match target.variables.as_ref() {
                    Some(path) => load_variables(path)?,
                    None => Variables::new(),
                };
                let document = if target.mutation {
                    construct_mutation(&shape, variables)?
                } else {
                    construct_query(&shape, variables)?
                };
                let out_src = if target.text {
                    document.text
                } else {
                    serde_json::to_string_pretty(&Request::from(document))?
                };
                target.output.write(&out_src)
            }
            Command::Fold(target) => {
                // debug path
                if target.output.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }
                let source_paths = resolve_file_path_patterns(&target.input)
                    .context("failed to resolve input file paths")?;
                let mut folded = Vec::with_capacity(source_paths.len());
                for source_path in &source_paths {
                    let value: Value = read_json(source_path)?;
                    let value = if target.envelope {
                        fold_envelope(value)
                    } else {
                        fold_data(value).map_err(anyhow::Error::from)
                    };
                    folded.push(value.with_context(|| {
                        format!("failed to fold {}", source_path.to_string_lossy())
                    })?);
                }
                let out = match folded.len() {
                    1 => folded.remove(0),
                    _ => Value::Array(folded),
                };
                target.output.write(&serde_json::to_string_pretty(&out)?)
            }
        }
    }
}

impl OutputSettings {
    fn write(&self, src: &str) -> Result<()> {
        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, src)
                .with_context(|| format!("failed to write {}", out.to_string_lossy()))?;
        } else {
            println!("{src}");
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.to_string_lossy().to_string();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file ({path_str})"))?;
    path_de::from_str_with_path(&source)
        .with_context(|| format!("failed to parse JSON source file ({path_str})"))
}

fn load_variables(path: &Path) -> Result<Variables> {
    let value: Value = read_json(path)?;
    let Value::Object(map) = value else {
        anyhow::bail!("variables file must hold a JSON object ({})", path.to_string_lossy());
    };
    Ok(map.into_iter().map(|(k, v)| (k, Variable::from_json(v))).collect())
}

fn fold_envelope(mut envelope: Value) -> Result<Value> {
    if let Some(data) = envelope.get_mut("data") {
        *data = fold_data(data.take())?;
    }
    Ok(envelope)
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
