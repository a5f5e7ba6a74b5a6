use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use content_schema_core::Schema;
use content_schema_inference::output::{OutputFormat, format_inference, format_schema};
use content_schema_inference::{Inference, infer_schema};
use content_schema_project::config::default_config_path;
use content_schema_project::{
    DevServerManager, EditorConfig, Project, RecentProject, RecentProjects, read_document,
};

#[derive(Debug, Parser)]
#[command(name = "content-schema")]
#[command(about = "Static schema inference and project tools for Astro content collections")]
struct Cli {
    /// Editor config file (default: ~/.config/content-schema/config.yml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Infer the schema of a collection from a project's content config.
    Schema(SchemaArgs),
    /// Infer the schema of a collection from a content config read on stdin.
    ParseStdin(ParseStdinArgs),
    /// List the collections of a project.
    Collections(ProjectArgs),
    /// List documents with previews.
    Documents(DocumentsArgs),
    /// Print a document's frontmatter and body.
    Read(ReadArgs),
    /// Manage the recent projects list.
    Recent(RecentArgs),
    /// Check whether a project's dev server can run.
    Status(ProjectArgs),
    /// Start the dev server and wait until it exits.
    Dev(ProjectArgs),
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Project root containing src/content.
    #[arg(long, default_value = ".")]
    project: PathBuf,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Read this content config file instead of the project's.
    #[arg(long)]
    config_file: Option<PathBuf>,
    /// Collection name.
    #[arg(long)]
    collection: String,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Include how the schema was obtained.
    #[arg(long)]
    explain: bool,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    /// Collection name.
    #[arg(long)]
    collection: String,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Include how the schema was obtained.
    #[arg(long)]
    explain: bool,
}

#[derive(Debug, Args)]
struct DocumentsArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Only list this collection.
    #[arg(long)]
    collection: Option<String>,
    /// Print JSON instead of one line per document.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ReadArgs {
    /// Markdown document path.
    file: PathBuf,
    /// Print JSON instead of YAML.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct RecentArgs {
    #[command(subcommand)]
    operation: RecentOperation,
}

#[derive(Debug, Subcommand)]
enum RecentOperation {
    /// Print remembered projects, dropping ones that no longer exist.
    List {
        /// Print JSON instead of one line per project.
        #[arg(long)]
        json: bool,
    },
    /// Remember a project.
    Add { path: PathBuf },
    /// Forget a project.
    Remove { path: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Schema(args) => run_schema(args, config),
        Command::ParseStdin(args) => run_parse_stdin(args),
        Command::Collections(args) => run_collections(args, config),
        Command::Documents(args) => run_documents(args, config),
        Command::Read(args) => run_read(args),
        Command::Recent(args) => run_recent(args, config),
        Command::Status(args) => run_status(args, config),
        Command::Dev(args) => run_dev(args, config),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, String> {
    match path {
        Some(path) => EditorConfig::load(path)
            .map_err(|err| format!("Failed to load config {}: {err}", path.display())),
        None => EditorConfig::load_or_default(default_config_path())
            .map_err(|err| format!("Failed to load default config: {err}")),
    }
}

fn open_project(args: &ProjectArgs, config: EditorConfig) -> Result<Project, String> {
    Project::open_with_config(&args.project, config).map_err(|err| err.to_string())
}

fn run_schema(args: SchemaArgs, config: EditorConfig) -> Result<(), String> {
    let inference = match &args.config_file {
        Some(path) => {
            let source = fs::read_to_string(path)
                .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
            infer_schema(Some(&source), &args.collection)
        }
        None => open_project(&args.project, config)?.infer_collection_schema(&args.collection),
    };
    print_inference(&inference, args.format, args.explain)
}

fn run_parse_stdin(args: ParseStdinArgs) -> Result<(), String> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    let inference = infer_schema(Some(&source), &args.collection);
    print_inference(&inference, args.format, args.explain)
}

fn print_inference(inference: &Inference, format: OutputFormat, explain: bool) -> Result<(), String> {
    let output = if explain {
        format_inference(inference, format)?
    } else {
        format_schema(&inference.collection, &inference.schema, format)?
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    if inference.is_fallback() && !explain {
        eprintln!("note: {}", inference.outcome);
    }
    Ok(())
}

fn run_collections(args: ProjectArgs, config: EditorConfig) -> Result<(), String> {
    let project = open_project(&args, config)?;
    let collections = project.collections().map_err(|err| err.to_string())?;
    for collection in collections {
        let schema: Schema = project.collection_schema(&collection.name);
        let source = if schema.is_default() { "default" } else { "inferred" };
        println!("{}\t{} field(s), {source}", collection.name, schema.len());
    }
    Ok(())
}

fn run_documents(args: DocumentsArgs, config: EditorConfig) -> Result<(), String> {
    let project = open_project(&args.project, config)?;
    let documents = match &args.collection {
        Some(name) => {
            let collection = project.collection(name).map_err(|err| err.to_string())?;
            project.documents(&collection)
        }
        None => project.all_documents(),
    }
    .map_err(|err| err.to_string())?;

    if args.json {
        let json = serde_json::to_string_pretty(&documents)
            .map_err(|e| format!("Failed to serialize output: {e}"))?;
        println!("{json}");
        return Ok(());
    }
    for document in documents {
        println!("{}/{}\t{}", document.collection, document.name, document.preview);
    }
    Ok(())
}

fn run_read(args: ReadArgs) -> Result<(), String> {
    let document = read_document(&args.file)
        .map_err(|err| format!("Failed to read {}: {err}", args.file.display()))?;

    #[derive(serde::Serialize)]
    struct Output<'a> {
        frontmatter: &'a serde_yaml::Mapping,
        content: &'a str,
    }
    let output = Output {
        frontmatter: &document.frontmatter,
        content: &document.content,
    };

    let text = if args.json {
        serde_json::to_string_pretty(&output)
            .map_err(|e| format!("Failed to serialize output: {e}"))?
    } else {
        serde_yaml::to_string(&output).map_err(|e| format!("Failed to serialize output: {e}"))?
    };
    println!("{}", text.trim_end());
    Ok(())
}

fn run_recent(args: RecentArgs, config: EditorConfig) -> Result<(), String> {
    let recent = RecentProjects::new(config.recent_projects_path(), config.max_recent_projects);
    match args.operation {
        RecentOperation::List { json } => {
            let entries = recent.list().map_err(|err| err.to_string())?;
            if json {
                let text = serde_json::to_string_pretty(&entries)
                    .map_err(|e| format!("Failed to serialize output: {e}"))?;
                println!("{text}");
            } else {
                print_recent(&entries);
            }
        }
        RecentOperation::Add { path } => {
            let project = Project::open_with_config(&path, config).map_err(|err| err.to_string())?;
            let entries = recent.add(project.root()).map_err(|err| err.to_string())?;
            print_recent(&entries);
        }
        RecentOperation::Remove { path } => {
            let entries = recent.remove(&path).map_err(|err| err.to_string())?;
            print_recent(&entries);
        }
    }
    Ok(())
}

fn print_recent(entries: &[RecentProject]) {
    for entry in entries {
        println!("{}\t{}\t{}", entry.name, entry.path.display(), entry.last_opened);
    }
}

fn run_status(args: ProjectArgs, config: EditorConfig) -> Result<(), String> {
    let manager = DevServerManager::new(config.dev_server);
    let status = manager.status(&args.project);
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_dev(args: ProjectArgs, config: EditorConfig) -> Result<(), String> {
    let root = &args.project;
    let has_override = config.dev_server.command.is_some();
    let manager = DevServerManager::new(config.dev_server);

    if !has_override {
        let status = manager.status(root);
        if let Some(error) = status.error {
            return Err(error);
        }
    }

    let started = manager.start(root).map_err(|err| err.to_string())?;
    println!("Dev server running at {}", started.url());
    if let Some(warning) = &started.warning {
        eprintln!("warning: {warning}");
    }

    match manager.wait(root).map_err(|err| err.to_string())? {
        Some(status) if !status.success() => Err(format!("Dev server exited with {status}")),
        _ => {
            println!("Dev server exited");
            Ok(())
        }
    }
}
