//! Printable client/vendor reports: Tera HTML that prints itself on load.

use anyhow::{Context as _, Result, anyhow};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use slug::slugify;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tera::{Context, Tera};
use tracing::{debug, info, warn};

use crate::debts::sales_total;
use crate::error::StoreError;
use crate::format::{format_currency, format_currency_str, format_date, format_status};
use crate::model::{ClientReport, VendorReport};

const CLIENT_TEMPLATE: &str = include_str!("../templates/client_report.tera");
const VENDOR_TEMPLATE: &str = include_str!("../templates/vendor_report.tera");

const CLIENT_NAME: &str = "client_report.tera";
const VENDOR_NAME: &str = "vendor_report.tera";

#[derive(Debug, Serialize)]
struct OrderRow {
    id: i64,
    date: String,
    status: String,
    delivery: f64,
    total: f64,
    paid: f64,
}

#[derive(Debug, Serialize)]
struct PaymentRow {
    date: String,
    description: String,
    method: String,
    amount: f64,
}

#[derive(Debug, Serialize)]
struct ClientContext {
    party: String,
    start_date: String,
    end_date: String,
    generated_at: String,
    orders: Vec<OrderRow>,
    payments: Vec<PaymentRow>,
    total_sales: f64,
    total_payments: f64,
    balance: f64,
}

#[derive(Debug, Serialize)]
struct ExpenseRow {
    date: String,
    concept: String,
    category: String,
    kind: String,
    amount: f64,
}

#[derive(Debug, Serialize)]
struct VendorContext {
    party: String,
    start_date: String,
    end_date: String,
    generated_at: String,
    expenses: Vec<ExpenseRow>,
    total_expenses: f64,
}

pub struct ReportRenderer {
    tera: Tera,
}

impl ReportRenderer {
    /// Loads `<dir>/*.tera`, writing the bundled templates first if missing.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        for (name, body) in [(CLIENT_NAME, CLIENT_TEMPLATE), (VENDOR_NAME, VENDOR_TEMPLATE)] {
            let path = dir.join(name);
            if !path.exists() {
                println!("✨ Inicializando plantilla {name}...");
                fs::write(&path, body).map_err(|e| StoreError::io(&path, e))?;
            }
        }

        let glob = dir.join("*.tera");
        let glob = glob
            .to_str()
            .ok_or_else(|| anyhow!("Ruta de plantillas no válida: {}", dir.display()))?;
        let mut tera = Tera::new(glob).context("Error de plantilla")?;
        setup(&mut tera);
        debug!(dir = %dir.display(), "templates loaded");
        Ok(Self { tera })
    }

    /// Bundled templates only, no filesystem.
    #[cfg(test)]
    pub fn embedded() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![(CLIENT_NAME, CLIENT_TEMPLATE), (VENDOR_NAME, VENDOR_TEMPLATE)])?;
        setup(&mut tera);
        Ok(Self { tera })
    }

    pub fn render_client(&self, report: &ClientReport, start: &str, end: &str) -> Result<String> {
        let total_sales = report.total_ventas.unwrap_or_else(|| sales_total(&report.pedidos));
        let total_payments = report
            .total_abonos
            .unwrap_or_else(|| report.abonos.iter().map(|p| p.amount).sum());
        let ctx = ClientContext {
            party: report.cliente.nombre.clone(),
            start_date: report.start_date.clone().unwrap_or_else(|| start.to_string()),
            end_date: report.end_date.clone().unwrap_or_else(|| end.to_string()),
            generated_at: generated_at(),
            orders: report
                .pedidos
                .iter()
                .map(|o| OrderRow {
                    id: o.id,
                    date: o.date.clone(),
                    status: o.status.to_string(),
                    delivery: o.delivery(),
                    total: o.total,
                    paid: o.amount_paid.unwrap_or(0.0),
                })
                .collect(),
            payments: report
                .abonos
                .iter()
                .map(|p| PaymentRow {
                    date: p.date.clone().unwrap_or_default(),
                    description: p.description.clone().unwrap_or_else(|| "-".into()),
                    method: p.payment_method.clone().unwrap_or_else(|| "-".into()),
                    amount: p.amount,
                })
                .collect(),
            total_sales,
            total_payments,
            balance: report.saldo.unwrap_or(total_sales - total_payments),
        };
        let context = Context::from_serialize(&ctx)?;
        Ok(self.tera.render(CLIENT_NAME, &context)?)
    }

    pub fn render_vendor(&self, report: &VendorReport, start: &str, end: &str) -> Result<String> {
        let ctx = VendorContext {
            party: report.proveedor.nombre.clone(),
            start_date: report.start_date.clone().unwrap_or_else(|| start.to_string()),
            end_date: report.end_date.clone().unwrap_or_else(|| end.to_string()),
            generated_at: generated_at(),
            expenses: report
                .gastos
                .iter()
                .map(|g| ExpenseRow {
                    date: g.data.date.clone(),
                    concept: g.data.concept.clone(),
                    category: g.data.category.clone(),
                    kind: g.data.expense_type.clone(),
                    amount: g.data.amount,
                })
                .collect(),
            total_expenses: report
                .total_gastos
                .unwrap_or_else(|| report.gastos.iter().map(|g| g.data.amount).sum()),
        };
        let context = Context::from_serialize(&ctx)?;
        Ok(self.tera.render(VENDOR_NAME, &context)?)
    }
}

fn setup(tera: &mut Tera) {
    tera.autoescape_on(vec![".tera"]);
    tera.register_filter("cop", cop_filter);
    tera.register_filter("fecha", fecha_filter);
    tera.register_filter("estado", estado_filter);
}

fn generated_at() -> String {
    Local::now().format("%d/%m/%Y %H:%M").to_string()
}

fn cop_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::Number(n) => format_currency(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => format_currency_str(s),
        _ => format_currency(0.0),
    };
    Ok(Value::String(text))
}

fn fecha_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(format_date(value.as_str().unwrap_or(""))))
}

fn estado_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(format_status(value.as_str().unwrap_or("")).label))
}

/// `<root>/reports/<YYYY>/<slug>-<from>-<to>.html`
pub fn report_path(root: &Path, party: &str, from: &str, to: &str) -> PathBuf {
    let year = from.get(..4).unwrap_or("sin-fecha");
    let mut name = slugify(party);
    if name.is_empty() {
        name = "reporte".to_string();
    }
    root.join("reports")
        .join(year)
        .join(format!("{name}-{from}-{to}.html"))
}

pub fn write_report(path: &Path, html: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    fs::write(path, html).map_err(|e| StoreError::io(path, e))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Hands the file to the system browser, which runs the print dialog.
pub fn open_in_browser(path: &Path) {
    #[cfg(target_os = "macos")]
    let spawned = Command::new("open").arg(path).spawn();

    #[cfg(target_os = "windows")]
    let spawned = Command::new("explorer").arg(path).spawn();

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let spawned = Command::new("xdg-open").arg(path).spawn();

    if let Err(e) = spawned {
        warn!(path = %path.display(), error = %e, "could not open browser");
        println!("Abra el archivo manualmente: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expense, ExpenseInput, Order, OrderStatus, PaymentRecord, ReportParty};
    use tempfile::tempdir;

    fn order(id: i64, total: f64, paid: Option<f64>, status: OrderStatus) -> Order {
        Order {
            id,
            client_id: 4,
            client_name: None,
            date: "2025-03-02T10:00:00".into(),
            total,
            delivery_fee: Some(3000.0),
            payment_method_id: None,
            status,
            amount_paid: paid,
            items: vec![],
        }
    }

    fn client_report() -> ClientReport {
        ClientReport {
            cliente: ReportParty {
                id: 4,
                nombre: "Tienda <b>Sol</b> & Cía".into(),
            },
            pedidos: vec![
                order(1, 50000.0, Some(10000.0), OrderStatus::Partial),
                order(2, 20000.0, None, OrderStatus::Cancelled),
            ],
            abonos: vec![PaymentRecord {
                id: 9,
                client_id: 4,
                client_name: "Tienda Sol".into(),
                amount: 10000.0,
                date: Some("2025-03-03T00:00:00".into()),
                description: Some("Abono".into()),
                payment_method_id: Some(1),
                payment_method: Some("Nequi".into()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn client_report_escapes_and_computes_totals() {
        let html = ReportRenderer::embedded()
            .unwrap()
            .render_client(&client_report(), "2025-03-01", "2025-03-31")
            .unwrap();

        assert!(html.contains("window.print()"));
        assert!(html.contains("Tienda &lt;b&gt;Sol&lt;&#x2F;b&gt; &amp; Cía"));
        assert!(!html.contains("<b>Sol</b>"));
        assert!(html.contains("$\u{a0}50.000"));
        assert!(html.contains("PARCIAL"));
        assert!(html.contains("Nequi"));
        // 50.000 sold (cancelled excluded) minus 10.000 paid
        assert!(html.contains("$\u{a0}40.000"));
    }

    #[test]
    fn server_totals_win() {
        let mut report = client_report();
        report.total_ventas = Some(123456.0);
        report.saldo = Some(777.0);
        let html = ReportRenderer::embedded()
            .unwrap()
            .render_client(&report, "2025-03-01", "2025-03-31")
            .unwrap();
        assert!(html.contains("$\u{a0}123.456"));
        assert!(html.contains("$\u{a0}777"));
    }

    #[test]
    fn vendor_report_sums_expenses() {
        let expense = |amount: f64| Expense {
            id: 1,
            data: ExpenseInput {
                concept: "Harina".into(),
                category: "materia_prima".into(),
                expense_type: "variable".into(),
                date: "2025-03-04".into(),
                amount,
                supplier_id: Some(2),
                payment_method_id: None,
                order_id: None,
                notes: None,
                paid_at: None,
            },
            supplier_name: None,
        };
        let report = VendorReport {
            proveedor: ReportParty {
                id: 2,
                nombre: "Molinos".into(),
            },
            gastos: vec![expense(120000.0), expense(30500.0)],
            ..Default::default()
        };
        let html = ReportRenderer::embedded()
            .unwrap()
            .render_vendor(&report, "2025-03-01", "2025-03-31")
            .unwrap();
        assert!(html.contains("Harina"));
        assert!(html.contains("Total gastos: $\u{a0}150.500"));
    }

    #[test]
    fn templates_are_seeded_once_and_kept() {
        let dir = tempdir().unwrap();
        let templates = dir.path().join("templates");
        ReportRenderer::from_dir(&templates).unwrap();
        assert!(templates.join(CLIENT_NAME).exists());

        fs::write(templates.join(VENDOR_NAME), "custom {{ party }}").unwrap();
        let html = ReportRenderer::from_dir(&templates)
            .unwrap()
            .render_vendor(&VendorReport::default(), "2025-01-01", "2025-01-31")
            .unwrap();
        assert_eq!(html, "custom ");
    }

    #[test]
    fn report_files_land_under_year() {
        let dir = tempdir().unwrap();
        let path = report_path(dir.path(), "Doña Rosa", "2025-02-01", "2025-02-28");
        assert_eq!(
            path,
            dir.path().join("reports/2025/dona-rosa-2025-02-01-2025-02-28.html")
        );
        write_report(&path, "<html></html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");

        let unnamed = report_path(dir.path(), "", "2025-02-01", "2025-02-28");
        assert!(unnamed.ends_with("reporte-2025-02-01-2025-02-28.html"));
    }
}
