#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tabledash_console::{
    render_text, HttpTransport, Notifications, TableListView, TableTransport, TableView,
    DEFAULT_API_URL,
};
use tabledash_model::{TableRegistry, ValidationError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabledash")]
#[command(about = "Config-driven table console")]
struct Cli {
    #[arg(long, global = true, env = "TABLEDASH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    #[arg(long, global = true, env = "TABLEDASH_TABLES_CONFIG")]
    tables_config: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 10_000)]
    timeout_ms: u64,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the store's tables.
    Tables {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Print a table's rows.
    Show {
        table: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add a row: `--set column=value` per field.
    Add {
        table: String,
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Edit the row with this identifier.
    Update {
        table: String,
        identifier: String,
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    Delete {
        table: String,
        identifier: String,
    },
    /// Line-driven editing session on stdin.
    Session { table: String },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got {raw}"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in {raw}"));
    }
    Ok((column.to_string(), value.to_string()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(path: Option<&PathBuf>) -> Result<TableRegistry, ValidationError> {
    match path {
        Some(path) => TableRegistry::from_path(path),
        None => Ok(TableRegistry::builtin()),
    }
}

fn flush(notifications: Notifications) {
    for notification in notifications.iter() {
        eprintln!("{notification}");
    }
}

fn print_view(view: &TableView, json: bool) -> Result<(), String> {
    if json {
        let rows: Vec<Value> = view
            .rows()
            .iter()
            .map(|r| Value::Object(r.as_map().clone()))
            .collect();
        let text = serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print!("{}", render_text(&view.render()));
    }
    Ok(())
}

fn apply_edits(view: &mut TableView, set: &[(String, String)]) {
    for (column, value) in set {
        view.edit_field(column, value);
    }
}

const SESSION_HELP: &str = "commands: show | search <term> | reload | edit <id> | set <column> <value> | save | cancel | add <column>=<value>... | delete <id> | quit";

async fn run_session(view: &mut TableView, json: bool) -> Result<bool, String> {
    let mut ok = view.load().await;
    flush(view.take_notifications());
    print_view(view, json)?;
    eprintln!("{SESSION_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let step = match command {
            "" => continue,
            "quit" | "exit" => break,
            "show" => true,
            "search" => {
                view.set_search(rest);
                true
            }
            "reload" => view.load().await,
            "edit" => view.begin_edit(&Value::String(rest.to_string())),
            "set" => {
                let (column, value) = rest.split_once(' ').unwrap_or((rest, ""));
                view.edit_field(column, value);
                true
            }
            "save" => view.save_edit().await,
            "cancel" => {
                view.cancel_edit();
                true
            }
            "add" => {
                let mut all_set = true;
                for pair in rest.split_whitespace() {
                    match parse_assignment(pair) {
                        Ok((column, value)) => all_set &= view.set_form_value(&column, &value),
                        Err(e) => {
                            eprintln!("{e}");
                            all_set = false;
                        }
                    }
                }
                all_set && view.add_row().await
            }
            "delete" => view.delete_row(&Value::String(rest.to_string())).await,
            _ => {
                eprintln!("{SESSION_HELP}");
                false
            }
        };
        ok &= step;
        flush(view.take_notifications());
        print_view(view, json)?;
    }
    Ok(ok)
}

async fn run(cli: Cli) -> Result<bool, String> {
    let transport: Arc<dyn TableTransport> = Arc::new(
        HttpTransport::new(&cli.api_url, Duration::from_millis(cli.timeout_ms))
            .map_err(|e| e.to_string())?,
    );
    let registry = load_registry(cli.tables_config.as_ref()).map_err(|e| e.to_string())?;

    match cli.command {
        Commands::Tables { search } => {
            let mut list = TableListView::new(transport);
            let ok = list.load().await;
            list.set_search(&search);
            for notification in list.notifications().iter() {
                eprintln!("{notification}");
            }
            if cli.json {
                let text = serde_json::to_string_pretty(&list.visible()).map_err(|e| e.to_string())?;
                println!("{text}");
            } else {
                for name in list.visible() {
                    println!("{name}");
                }
            }
            Ok(ok)
        }
        Commands::Show { table, search } => {
            let mut view = TableView::new(&table, &registry, transport);
            let ok = view.load().await;
            view.set_search(&search);
            flush(view.take_notifications());
            print_view(&view, cli.json)?;
            Ok(ok)
        }
        Commands::Add { table, set } => {
            let mut view = TableView::new(&table, &registry, transport);
            for (column, value) in &set {
                if !view.set_form_value(column, value) {
                    return Err(format!("table {table} has no input named {column}"));
                }
            }
            let ok = view.add_row().await;
            flush(view.take_notifications());
            if ok {
                print_view(&view, cli.json)?;
            }
            Ok(ok)
        }
        Commands::Update {
            table,
            identifier,
            set,
        } => {
            let mut view = TableView::new(&table, &registry, transport);
            let mut ok = view.load().await && view.begin_edit(&Value::String(identifier));
            if ok {
                apply_edits(&mut view, &set);
                ok = view.save_edit().await;
            }
            flush(view.take_notifications());
            if ok {
                print_view(&view, cli.json)?;
            }
            Ok(ok)
        }
        Commands::Delete { table, identifier } => {
            let mut view = TableView::new(&table, &registry, transport);
            let ok = view.delete_row(&Value::String(identifier)).await;
            flush(view.take_notifications());
            Ok(ok)
        }
        Commands::Session { table } => {
            let mut view = TableView::new(&table, &registry, transport);
            run_session(&mut view, cli.json).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
