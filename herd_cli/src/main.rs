use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use herd_cli::commands::SettingsSection;
use herd_cli::{App, FlowResult, LogNavigator};
use herd_common::{HerdConfig, PersistedSettings};
use herd_http::{Call, DispatchEnvelope, MultipartForm, Operation};
use herd_session::GuardDecision;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "herd_cli=info,herd_http=info,herd_session=info";

#[derive(Parser)]
#[command(name = "herd")]
#[command(about = "Client for the herd animal traceability API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with username and password
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Record a session obtained through single sign-on
    SsoLogin {
        #[arg(long)]
        token: String,
        #[arg(long)]
        username: String,
    },
    /// Print the address that starts a single sign-on login
    SsoUrl {
        #[arg(long, default_value = "/dashboard")]
        callback: String,
    },
    /// Sign out locally and at the SSO provider
    Logout,
    /// Show the stored session and the API's view of the user
    Whoami,
    /// Decide a navigation the way the client router would
    Guard {
        to: String,
        #[arg(long, default_value = "/")]
        from: String,
    },
    /// Invoke any operation from the endpoint table
    Call {
        operation: String,
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
        #[arg(long = "query", value_parser = parse_pair)]
        queries: Vec<(String, String)>,
        #[arg(long, value_parser = parse_json)]
        json: Option<Value>,
    },
    /// Attach a document to an animal
    Upload {
        animal_id: i64,
        file: PathBuf,
        #[arg(long)]
        document_type: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Print the download address of a report
    ReportUrl {
        operation: String,
        #[arg(long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// Load or update the signed-in user's settings
    Settings {
        section: SettingsSection,
        #[arg(long, value_parser = parse_json)]
        update: Option<Value>,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// List every operation name
    Operations,
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    SetApiUrl { url: String },
    SetAuthOrigin { origin: String },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {}", s))
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| e.to_string())
}

fn operation(name: &str) -> anyhow::Result<Operation> {
    Operation::from_name(name).ok_or_else(|| anyhow!("unknown operation: {}", name))
}

fn init_tracing(config: &HerdConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender =
        tracing_appender::rolling::never(config.config_dir.join("logs"), "herd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    guard
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a flow's outcome as a `{data, error}` envelope; failures also
/// fail the process.
fn report(result: FlowResult<Value>) -> anyhow::Result<()> {
    match result {
        Ok(data) => print_json(&DispatchEnvelope {
            data: Some(data),
            error: None,
        }),
        Err(e) => {
            print_json(&DispatchEnvelope::<Value> {
                data: None,
                error: Some(e.to_string()),
            })?;
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = HerdConfig::load();
    herd_common::ensure_dir(&config.config_dir)?;
    let _guard = init_tracing(&config);

    let app = App::from_config(&config, Arc::new(LogNavigator))?;

    match cli.command {
        Command::Login { username, password } => report(app.login(&username, &password).await),
        Command::Register {
            username,
            email,
            password,
            full_name,
        } => {
            let payload = serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
                "full_name": full_name,
            });
            report(app.register(payload).await)
        }
        Command::SsoLogin { token, username } => {
            app.start_sso_session(&token, &username)?;
            print_json(&app.session.snapshot())
        }
        Command::SsoUrl { callback } => {
            let sso = herd_cli::app::sso_config(&config)
                .context("SSO is not configured (set HERD_SSO_CLIENT_ID)")?;
            println!("{}", sso.sign_in_url(&callback));
            Ok(())
        }
        Command::Logout => {
            let outcome = app.logout().await;
            info!("Signed out via {}", if outcome.is_sso() { "SSO" } else { "local" });
            Ok(())
        }
        Command::Whoami => {
            let mut snapshot = serde_json::to_value(app.session.snapshot())?;
            if let Some(obj) = snapshot.as_object_mut() {
                obj.remove("token");
            }
            print_json(&snapshot)?;
            report(app.whoami().await)
        }
        Command::Guard { to, from } => {
            match app.guard.check(&app.session, &to, &from) {
                GuardDecision::Proceed => println!("proceed {}", to),
                GuardDecision::Redirect(target) => println!("redirect {}", target),
            }
            Ok(())
        }
        Command::Call {
            operation: name,
            params,
            queries,
            json,
        } => {
            let mut call = Call::new().queries(queries);
            for (k, v) in params {
                call = call.param(k, v);
            }
            if let Some(body) = json {
                call = call.json(body);
            }
            let result = app.api.call(operation(&name)?, call).await;
            report(result.map_err(Into::into))
        }
        Command::Upload {
            animal_id,
            file,
            document_type,
            content_type,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {:?}", file))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "upload".to_string());
            let mut form = MultipartForm::new();
            if let Some(kind) = document_type {
                form = form.text("document_type", kind);
            }
            form = form.file("file", file_name, content_type, data);
            report(app.api.upload_document(animal_id, form).await.map_err(Into::into))
        }
        Command::ReportUrl {
            operation: name,
            params,
        } => {
            let mut call = Call::new();
            for (k, v) in params {
                call = call.param(k, v);
            }
            let url = app.api.link(operation(&name)?, &call)?;
            println!("{}", url);
            Ok(())
        }
        Command::Settings { section, update } => match update {
            Some(changes) => report(app.update_settings(section, changes).await),
            None => report(app.load_settings(section).await),
        },
        Command::ChangePassword { current, new } => {
            report(app.change_password(&current, &new).await)
        }
        Command::Operations => {
            for op in Operation::ALL {
                let endpoint = op.endpoint();
                println!("{:<24} {:<6} {}", endpoint.name, endpoint.method, endpoint.path);
            }
            Ok(())
        }
        Command::Config(cmd) => {
            let mut settings = herd_common::load_settings(&config.config_dir);
            match cmd {
                ConfigCommand::Show => return print_json(&settings),
                ConfigCommand::SetApiUrl { url } => settings.api_url = Some(url),
                ConfigCommand::SetAuthOrigin { origin } => settings.auth_origin = Some(origin),
            }
            save(&config, &settings)
        }
    }
}

fn save(config: &HerdConfig, settings: &PersistedSettings) -> anyhow::Result<()> {
    herd_common::save_settings(&config.config_dir, settings)?;
    info!("Saved {:?}", config.settings_path());
    Ok(())
}
