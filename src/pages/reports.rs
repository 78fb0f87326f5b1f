use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use inquire::DateSelect;

use crate::api::ApiClient;
use crate::dates::today;
use crate::error::FormError;
use crate::report::{ReportRenderer, open_in_browser, report_path, write_report};
use crate::settings::AppSettings;
use crate::ui;

use super::{client_choices, failure, resolve_id, supplier_choices};

#[derive(Subcommand)]
pub enum ReportsCommand {
    /// Account statement of a client
    Client {
        #[arg(long)]
        client: Option<i64>,
        /// First day, YYYY-MM-DD (asked when missing)
        #[arg(long)]
        from: Option<String>,
        /// Last day, YYYY-MM-DD (asked when missing)
        #[arg(long)]
        to: Option<String>,
        /// Write the file without opening the browser
        #[arg(long)]
        no_open: bool,
    },
    /// Expenses paid to a supplier
    Vendor {
        #[arg(long)]
        supplier: Option<i64>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        no_open: bool,
    },
}

fn parse_day(label: &'static str, value: &str) -> Result<NaiveDate, FormError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| FormError::Rule(format!("{label}: fecha inválida '{value}' (use AAAA-MM-DD)")))
}

/// Checks the range is ordered and renders it as `YYYY-MM-DD` pairs.
pub fn date_range(from: NaiveDate, to: NaiveDate) -> Result<(String, String), FormError> {
    if from > to {
        return Err(FormError::Rule(
            "La fecha inicial no puede ser posterior a la final".into(),
        ));
    }
    Ok((from.format("%Y-%m-%d").to_string(), to.format("%Y-%m-%d").to_string()))
}

fn ask_range(from: Option<String>, to: Option<String>) -> Result<(String, String)> {
    let now = today();
    let from = match from {
        Some(f) => parse_day("Desde", &f)?,
        None => DateSelect::new("Desde:")
            .with_default(now.with_day(1).unwrap_or(now))
            .prompt()?,
    };
    let to = match to {
        Some(t) => parse_day("Hasta", &t)?,
        None => DateSelect::new("Hasta:")
            .with_default(now)
            .with_min_date(from)
            .prompt()?,
    };
    Ok(date_range(from, to)?)
}

pub fn run(api: &ApiClient, settings: &AppSettings, cmd: ReportsCommand) -> Result<()> {
    let root = settings.data_root_path();
    let renderer = ReportRenderer::from_dir(&root.join("templates"))?;

    let (party, path, no_open) = match cmd {
        ReportsCommand::Client {
            client,
            from,
            to,
            no_open,
        } => {
            let id = resolve_id(client, "Cliente:", || {
                let clients = api.list_clients().map_err(failure("Error al cargar clientes"))?;
                Ok(client_choices(&clients))
            })?;
            let (start, end) = ask_range(from, to)?;
            let report = api
                .client_report(id, &start, &end)
                .map_err(failure("Error al generar reporte"))?;
            let html = renderer.render_client(&report, &start, &end)?;
            let party = report.cliente.nombre.clone();
            let path = report_path(&root, &party, &start, &end);
            write_report(&path, &html)?;
            (party, path, no_open)
        }
        ReportsCommand::Vendor {
            supplier,
            from,
            to,
            no_open,
        } => {
            let id = resolve_id(supplier, "Proveedor:", || {
                let suppliers = api.list_suppliers().map_err(failure("Error al cargar proveedores"))?;
                Ok(supplier_choices(&suppliers))
            })?;
            let (start, end) = ask_range(from, to)?;
            let report = api
                .vendor_report(id, &start, &end)
                .map_err(failure("Error al generar reporte"))?;
            let html = renderer.render_vendor(&report, &start, &end)?;
            let party = report.proveedor.nombre.clone();
            let path = report_path(&root, &party, &start, &end);
            write_report(&path, &html)?;
            (party, path, no_open)
        }
    };

    ui::success(&format!("Reporte de {party} generado: {}", path.display()));
    if !no_open {
        open_in_browser(&path);
    }
    Ok(())
}
