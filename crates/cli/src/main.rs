// GridPilot CLI - spreadsheet AI assistant, headless
//
// One-shot pipeline per invocation: load workbook → extract context →
// call the model → apply the result → save. Credentials resolve
// flag > keychain > environment; they never touch the settings file.

mod exit_codes;
mod workbook_io;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gridpilot_assistant::{
    apply, chart_consolidated, extract_context, GatewayError, ModelGateway, Session,
};
use gridpilot_config as config;
use gridpilot_config::{Settings, ThemePreference};
use gridpilot_core::ChartKind;
use gridpilot_host::{HostError, MemoryWorkbook};

use exit_codes::{
    EXIT_GATEWAY_EMPTY, EXIT_GATEWAY_EXHAUSTED, EXIT_GATEWAY_HTTP, EXIT_GATEWAY_NETWORK,
    EXIT_HOST_READ, EXIT_HOST_WRITE, EXIT_KEYCHAIN_ERR, EXIT_MISSING_KEY, EXIT_SUCCESS,
    EXIT_USAGE,
};

/// CLI-level error: exit code + message + optional hint.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<HostError> for CliError {
    fn from(err: HostError) -> Self {
        let code = match err {
            HostError::Access(_) => EXIT_HOST_READ,
            HostError::Write(_) => EXIT_HOST_WRITE,
        };
        Self {
            code,
            message: err.to_string(),
            hint: None,
        }
    }
}

impl From<GatewayError> for CliError {
    fn from(err: GatewayError) -> Self {
        let code = match err {
            GatewayError::Http { .. } => EXIT_GATEWAY_HTTP,
            GatewayError::Exhausted => EXIT_GATEWAY_EXHAUSTED,
            GatewayError::EmptyResponse => EXIT_GATEWAY_EMPTY,
            GatewayError::Network(_) => EXIT_GATEWAY_NETWORK,
        };
        Self {
            code,
            message: err.to_string(),
            hint: None,
        }
    }
}

#[derive(Parser)]
#[command(name = "gridpilot")]
#[command(about = "Spreadsheet AI assistant (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Workbook-loading options shared by the pipeline commands.
#[derive(clap::Args)]
struct WorkbookArgs {
    /// CSV file loaded as the first sheet
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Additional sheet as NAME=PATH (repeatable; first sheet stays active)
    #[arg(long, value_name = "NAME=PATH")]
    sheet: Vec<String>,

    /// CSV delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Save the active sheet back to CSV after applying the result
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a natural-language request against the loaded workbook
    #[command(after_help = "\
Examples:
  gridpilot ask 'total the Sales column' -f data.csv --cell C1
  gridpilot ask 'filter rows where Amount > 100' -f data.csv -o result.csv
  gridpilot ask 'sum Q1 and Q2' --sheet Q1=q1.csv --sheet Q2=q2.csv")]
    Ask {
        /// The request
        prompt: String,

        #[command(flatten)]
        workbook: WorkbookArgs,

        /// Selection anchor (where results are written)
        #[arg(long, default_value = "A1")]
        cell: String,

        /// API key (overrides keychain/environment)
        #[arg(long, env = "GRIDPILOT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Intent hint passed alongside the prompt
        #[arg(long)]
        intent: Option<String>,

        /// Model id override
        #[arg(long)]
        model: Option<String>,

        /// Endpoint override (testing, regional proxies)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Ask for a chart of the given kind (pie, column, line)
    Chart {
        /// Chart kind; anything unrecognized becomes column
        kind: String,

        /// What to chart
        prompt: String,

        #[command(flatten)]
        workbook: WorkbookArgs,

        /// Selection anchor
        #[arg(long, default_value = "A1")]
        cell: String,

        #[arg(long, env = "GRIDPILOT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Collect one cell from every sheet into a summary table + chart
    #[command(after_help = "\
Examples:
  gridpilot consolidate --cell B2 --kind pie --sheet Jan=jan.csv --sheet Feb=feb.csv")]
    Consolidate {
        /// Cell address read from every sheet
        #[arg(long)]
        cell: String,

        /// Chart kind
        #[arg(long, default_value = "column")]
        kind: String,

        /// Chart title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        workbook: WorkbookArgs,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// View or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Check configuration and credential status
    Doctor,
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Load an API key from a text file (key.txt drop-in)
    Load { file: PathBuf },
    /// Store an API key directly
    Set { key: String },
    /// Remove the stored API key
    Eject,
    /// Show where the key would come from
    Status,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set the UI theme (light or dark)
    Theme { theme: String },
    /// Print effective settings
    Show,
    /// Print the settings file path
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask {
            prompt,
            workbook,
            cell,
            api_key,
            intent,
            model,
            endpoint,
        } => cmd_ask(prompt, workbook, cell, api_key, intent.as_deref(), model, endpoint),
        Commands::Chart {
            kind,
            prompt,
            workbook,
            cell,
            api_key,
            model,
            endpoint,
        } => {
            let kind = ChartKind::parse(&kind);
            let enriched = format!(
                "Analyze the data or the following request and create a {} chart: {}",
                kind, prompt
            );
            cmd_ask(enriched, workbook, cell, api_key, Some("CREATE_CHART"), model, endpoint)
        }
        Commands::Consolidate {
            cell,
            kind,
            title,
            workbook,
        } => cmd_consolidate(cell, kind, title, workbook),
        Commands::Key { command } => match command {
            KeyCommands::Load { file } => cmd_key_load(&file),
            KeyCommands::Set { key } => cmd_key_store(&key),
            KeyCommands::Eject => cmd_key_eject(),
            KeyCommands::Status => cmd_key_status(),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Theme { theme } => cmd_config_theme(&theme),
            ConfigCommands::Show => cmd_config_show(),
            ConfigCommands::Path => {
                println!("{}", Settings::config_path_display());
                Ok(())
            }
        },
        Commands::Doctor => cmd_doctor(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(err.code)
        }
    }
}

// ── Workbook loading ────────────────────────────────────────────────

fn load_workbook(args: &WorkbookArgs) -> Result<MemoryWorkbook, CliError> {
    let mut wb = MemoryWorkbook::new();

    let mut specs: Vec<(String, PathBuf)> = Vec::with_capacity(args.sheet.len());
    for spec in &args.sheet {
        let (name, path) = spec.split_once('=').ok_or_else(|| {
            CliError::usage(format!("bad --sheet value {:?}", spec))
                .with_hint("expected NAME=PATH, e.g. --sheet Q1=q1.csv")
        })?;
        specs.push((name.to_string(), PathBuf::from(path)));
    }

    let mut primary = "Sheet1".to_string();
    if let Some(ref path) = args.file {
        workbook_io::load_csv_into_active(&mut wb, path, args.delimiter)?;
    } else if !specs.is_empty() {
        // No --file: the first named sheet takes over the initial sheet
        let (name, path) = specs.remove(0);
        wb.rename_active_sheet(&name);
        workbook_io::load_csv_into_active(&mut wb, &path, args.delimiter)?;
        primary = name;
    }

    for (name, path) in &specs {
        wb.add_sheet(name).map_err(CliError::from)?;
        wb.set_active_sheet(name);
        workbook_io::load_csv_into_active(&mut wb, path, args.delimiter)?;
    }

    // The first sheet is the working sheet
    wb.set_active_sheet(&primary);
    Ok(wb)
}

fn save_if_requested(wb: &MemoryWorkbook, args: &WorkbookArgs) -> Result<(), CliError> {
    if let Some(ref out) = args.out {
        let sheet = wb.active_sheet_name().unwrap_or("Sheet1").to_string();
        workbook_io::save_sheet_csv(wb, &sheet, out, args.delimiter)?;
        eprintln!("Saved {} to {}", sheet, out.display());
    }
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an API key: flag value > keychain > environment > error.
fn resolve_api_key(flag: Option<String>) -> Result<String, CliError> {
    if let Some(key) = flag {
        let trimmed = key.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }

    let lookup = config::get_api_key();
    if let Some(key) = lookup.key {
        return Ok(key);
    }

    Err(CliError {
        code: EXIT_MISSING_KEY,
        message: "no API key configured".into(),
        hint: Some(format!(
            "load one with `gridpilot key load key.txt` or set {}",
            config::credential::KEY_ENV_VAR
        )),
    })
}

// ── Pipeline commands ───────────────────────────────────────────────

fn build_gateway(
    settings: &Settings,
    endpoint: Option<String>,
    model: Option<String>,
) -> ModelGateway {
    let endpoint = endpoint.or_else(|| settings.endpoint.clone());
    let gateway = match endpoint {
        Some(base) => ModelGateway::with_base_url(base),
        None => ModelGateway::new(),
    };
    let model = model.unwrap_or_else(|| settings.model.clone());
    gateway.with_model(&model)
}

fn cmd_ask(
    prompt: String,
    workbook: WorkbookArgs,
    cell: String,
    api_key: Option<String>,
    intent: Option<&str>,
    model: Option<String>,
    endpoint: Option<String>,
) -> Result<(), CliError> {
    if prompt.trim().is_empty() {
        return Err(CliError::usage("empty prompt"));
    }
    let settings = Settings::load();
    let api_key = resolve_api_key(api_key)?;

    let mut wb = load_workbook(&workbook)?;
    wb.set_cursor(&cell).map_err(CliError::from)?;

    let mut session = Session::new();
    session.set_prompt(&prompt);
    session.begin_request();

    let gateway = build_gateway(&settings, endpoint, model);
    let outcome = (|| -> Result<String, CliError> {
        let context = extract_context(&wb, true)?;
        eprintln!(
            "Context: {} sample rows, used range {}, cursor {}",
            context.sample_rows.len(),
            context.used_range_address,
            context.active_cell_address
        );
        let result = gateway.invoke(&api_key, &prompt, &context, intent)?;
        Ok(apply(&mut wb, &result)?)
    })();

    match outcome {
        Ok(summary) => {
            session.complete(&summary);
            println!("{}", summary);
            save_if_requested(&wb, &workbook)?;
            Ok(())
        }
        Err(err) => {
            session.fail(&err.message);
            Err(err)
        }
    }
}

fn cmd_consolidate(
    cell: String,
    kind: String,
    title: Option<String>,
    workbook: WorkbookArgs,
) -> Result<(), CliError> {
    let mut wb = load_workbook(&workbook)?;
    let kind = ChartKind::parse(&kind);
    let title = title.unwrap_or_else(|| format!("Consolidation of {}", cell));

    let summary = chart_consolidated(&mut wb, &cell, kind, &title).map_err(CliError::from)?;
    println!("{}", summary);
    save_if_requested(&wb, &workbook)?;
    Ok(())
}

// ── Key commands ────────────────────────────────────────────────────

fn cmd_key_load(file: &PathBuf) -> Result<(), CliError> {
    let key = config::load_key_file(file).map_err(CliError::usage)?;
    cmd_key_store(&key)
}

fn cmd_key_store(key: &str) -> Result<(), CliError> {
    if key.trim().is_empty() {
        return Err(CliError::usage("key is empty"));
    }
    let settings = Settings::load();
    if !settings.persist_credential {
        return Err(CliError::usage(
            "ai.persistCredential is off; nothing durable to store",
        )
        .with_hint(format!(
            "export {} for this shell instead, or enable ai.persistCredential",
            config::credential::KEY_ENV_VAR
        )));
    }
    config::set_api_key(key.trim()).map_err(|e| CliError {
        code: EXIT_KEYCHAIN_ERR,
        message: e,
        hint: None,
    })?;
    eprintln!("Key stored in system keychain");
    Ok(())
}

fn cmd_key_eject() -> Result<(), CliError> {
    config::delete_api_key().map_err(|e| CliError {
        code: EXIT_KEYCHAIN_ERR,
        message: e,
        hint: None,
    })?;
    eprintln!("Key removed from system keychain");
    Ok(())
}

fn cmd_key_status() -> Result<(), CliError> {
    let lookup = config::get_api_key();
    match lookup.key {
        Some(key) => {
            println!("key present ({}): {}", lookup.source.as_str(), mask(&key));
            Ok(())
        }
        None => {
            println!("no key configured");
            Ok(())
        }
    }
}

fn mask(key: &str) -> String {
    let head: String = key.chars().take(4).collect();
    format!("{}… ({} chars)", head, key.chars().count())
}

// ── Config commands ─────────────────────────────────────────────────

fn cmd_config_theme(theme: &str) -> Result<(), CliError> {
    let theme = ThemePreference::parse(theme)
        .ok_or_else(|| CliError::usage(format!("unknown theme {:?}", theme))
            .with_hint("expected light or dark"))?;
    let mut settings = Settings::load();
    settings.theme = theme;
    settings.save().map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: e,
        hint: None,
    })?;
    eprintln!("Theme set to {}", theme.as_str());
    Ok(())
}

fn cmd_config_show() -> Result<(), CliError> {
    let settings = Settings::load();
    let json = serde_json::to_string_pretty(&settings).map_err(|e| CliError {
        code: exit_codes::EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })?;
    println!("{}", json);
    Ok(())
}

// ── Doctor ──────────────────────────────────────────────────────────

fn cmd_doctor() -> Result<(), CliError> {
    let settings = Settings::load();
    let lookup = config::get_api_key();

    println!("GridPilot Configuration");
    println!("──────────────────────────────");
    println!("Theme:             {}", settings.theme.as_str());
    println!(
        "Model:             {}",
        if settings.model.is_empty() {
            gridpilot_assistant::gateway::DEFAULT_MODEL
        } else {
            &settings.model
        }
    );
    println!(
        "Endpoint:          {}",
        settings
            .endpoint
            .as_deref()
            .unwrap_or(gridpilot_assistant::gateway::DEFAULT_BASE_URL)
    );
    println!(
        "Key present:       {}",
        if lookup.key.is_some() { "yes" } else { "no" }
    );
    println!("Key source:        {}", lookup.source.as_str());
    println!(
        "Keychain available:{}",
        if config::keychain_available() { "yes" } else { "no" }
    );
    println!(
        "Persist credential:{}",
        if settings.persist_credential { "yes" } else { "no" }
    );
    Ok(())
}
