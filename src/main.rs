mod api;
mod auth;
mod dates;
mod debts;
mod error;
mod format;
mod forms;
mod model;
mod pages;
mod report;
mod settings;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use inquire::InquireError;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::auth::SessionStore;
use crate::error::ApiError;
use crate::pages::clients::ClientsCommand;
use crate::pages::expenses::ExpensesCommand;
use crate::pages::orders::OrdersCommand;
use crate::pages::payment_methods::PaymentMethodsCommand;
use crate::pages::products::ProductsCommand;
use crate::pages::receivables::ReceivablesCommand;
use crate::pages::reports::ReportsCommand;
use crate::pages::suppliers::SuppliersCommand;
use crate::pages::transfers::TransfersCommand;
use crate::settings::{AppSettings, SettingsStore, setup_config_wizard};

const LOG_ENV: &str = "AREPAS_LOG";

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "arepas", version, about = "ArepasERP back office")]
struct Cli {
    /// Debug logging on stderr (overrides AREPAS_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the current session and check it against the API
    Whoami,
    /// Today's sales, expenses, profit and debtors
    Dashboard,
    /// WhatsApp-formatted summary, printed for piping
    Whatsapp {
        /// YYYY-MM-DD; empty lets the server list pending orders
        #[arg(long)]
        date: Option<String>,
    },
    /// Client registry
    #[command(subcommand)]
    Clients(ClientsCommand),
    /// Product catalogue
    #[command(subcommand)]
    Products(ProductsCommand),
    /// Supplier registry
    #[command(subcommand)]
    Suppliers(SuppliersCommand),
    /// Expense tracking
    #[command(subcommand)]
    Expenses(ExpensesCommand),
    /// Order entry and reports
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Cash accounts used to pay and get paid
    #[command(subcommand)]
    PaymentMethods(PaymentMethodsCommand),
    /// Movements between cash accounts
    #[command(subcommand)]
    Transfers(TransfersCommand),
    /// Accounts receivable and payments (abonos)
    #[command(subcommand)]
    Receivables(ReceivablesCommand),
    /// Printable client and vendor reports
    #[command(subcommand)]
    Reports(ReportsCommand),
    /// Configure API URL and data directory
    Config,
}

/// Everything a protected page needs.
struct App {
    settings: AppSettings,
    api: ApiClient,
}

// ==========================================
// Main Function
// ==========================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        return ExitCode::SUCCESS;
    };

    let sessions = SessionStore::default_location();
    match run(command, &sessions) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err, &sessions),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(format!("{}=debug,warn", env!("CARGO_CRATE_NAME")))
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn connect(store: &SettingsStore, sessions: &SessionStore) -> Result<App> {
    let settings = store.effective()?;
    debug!(api = %settings.api_url, data_root = %settings.data_root, "settings loaded");
    let api = ApiClient::new(&settings.api_url, Duration::from_secs(settings.timeout_secs))?
        .with_token(sessions.token());
    Ok(App { settings, api })
}

/// Protected route: no session, no page.
fn protected(store: &SettingsStore, sessions: &SessionStore) -> Result<App> {
    sessions.require()?;
    connect(store, sessions)
}

fn run(command: Commands, sessions: &SessionStore) -> Result<()> {
    let store = SettingsStore::default_location();

    match command {
        Commands::Config => setup_config_wizard(&store).map(|_| ()),
        Commands::Login { email } => {
            let app = connect(&store, sessions)?;
            pages::login::login(&app.api, sessions, email)
        }
        Commands::Logout => pages::login::logout(sessions),
        Commands::Whoami => {
            let app = protected(&store, sessions)?;
            pages::login::whoami(&app.api, sessions)
        }
        Commands::Dashboard => pages::dashboard::show(&protected(&store, sessions)?.api),
        Commands::Whatsapp { date } => pages::whatsapp::show(&protected(&store, sessions)?.api, date),
        Commands::Clients(cmd) => pages::clients::run(&protected(&store, sessions)?.api, cmd),
        Commands::Products(cmd) => pages::products::run(&protected(&store, sessions)?.api, cmd),
        Commands::Suppliers(cmd) => pages::suppliers::run(&protected(&store, sessions)?.api, cmd),
        Commands::Expenses(cmd) => pages::expenses::run(&protected(&store, sessions)?.api, cmd),
        Commands::Orders(cmd) => pages::orders::run(&protected(&store, sessions)?.api, cmd),
        Commands::PaymentMethods(cmd) => {
            pages::payment_methods::run(&protected(&store, sessions)?.api, cmd)
        }
        Commands::Transfers(cmd) => pages::transfers::run(&protected(&store, sessions)?.api, cmd),
        Commands::Receivables(cmd) => {
            pages::receivables::run(&protected(&store, sessions)?.api, cmd)
        }
        Commands::Reports(cmd) => {
            let app = protected(&store, sessions)?;
            pages::reports::run(&app.api, &app.settings, cmd)
        }
    }
}

/// Last stop for every failure: one alert line, one log record.
fn report_error(err: &anyhow::Error, sessions: &SessionStore) -> ExitCode {
    if let Some(InquireError::OperationCanceled | InquireError::OperationInterrupted) =
        err.downcast_ref::<InquireError>()
    {
        println!("Operación cancelada.");
        return ExitCode::SUCCESS;
    }

    if let Some(ApiError::Unauthorized(_)) = err.downcast_ref::<ApiError>() {
        warn!("token rejected by the API, clearing session");
        if let Err(e) = sessions.clear() {
            error!(error = %e, "could not clear session");
        }
        ui::alert("Sesión expirada o no autorizada. Ejecute `arepas login` para ingresar de nuevo.");
        return ExitCode::from(2);
    }

    error!("{err:#}");
    ui::alert(&err.to_string());
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from(["arepas", "-v", "receivables", "accounts", "--from-orders"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Receivables(ReceivablesCommand::Accounts { from_orders: true }))
        ));

        let cli = Cli::try_parse_from(["arepas", "orders", "report", "--month", "2025-02"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Orders(OrdersCommand::Report { month: Some(ref m) })) if m == "2025-02"
        ));

        let cli = Cli::try_parse_from(["arepas", "payment-methods", "delete", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::PaymentMethods(PaymentMethodsCommand::Delete { id: Some(3) }))
        ));
    }

    #[test]
    fn no_command_is_allowed() {
        assert!(Cli::try_parse_from(["arepas"]).unwrap().command.is_none());
    }

    #[test]
    fn cancelled_prompt_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionStore::new(dir.path().join("session.json"));
        let err = anyhow::Error::new(InquireError::OperationCanceled);
        assert_eq!(report_error(&err, &sessions), ExitCode::SUCCESS);
    }

    #[test]
    fn unauthorized_clears_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"access_token": "abc", "user": {"id": 1, "email": "a@b.co"}}"#,
        )
        .unwrap();
        let sessions = SessionStore::new(path);
        assert!(sessions.session().is_some());

        let err = pages::failure("Error")(ApiError::Unauthorized(String::new()));
        assert_eq!(report_error(&err, &sessions), ExitCode::from(2));
        assert!(sessions.session().is_none());
    }
}
