use anyhow::Result;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::dates::today;
use crate::format::format_date;
use crate::ui;

use super::failure;

pub fn show(api: &ApiClient) -> Result<()> {
    let data = api
        .dashboard()
        .map_err(failure("No se pudo conectar con el servidor (API)"))?;

    ui::page_header("Resumen");
    ui::card("Fecha", &today().format("%d/%m/%Y").to_string());

    let mut totals = ui::table(&["Ventas Hoy", "Gastos Hoy", "Utilidad Estimada"]);
    totals.add_row(vec![
        ui::money_cell(data.sales),
        ui::money_cell(data.expenses),
        ui::signed_money_cell(data.estimated_profit),
    ]);
    println!("{totals}");

    println!("\nClientes por cobrar");
    if data.debtors.is_empty() {
        ui::empty("No hay cuentas pendientes");
        return Ok(());
    }

    let mut table = ui::table(&["Cliente", "Saldo", "Vence"]);
    for d in &data.debtors {
        let due = d.due_date.as_deref().map(format_date).unwrap_or_else(|| "-".into());
        table.add_row(vec![ui::bold(&d.name), ui::debt_cell(d.balance), Cell::new(due)]);
    }
    println!("{table}");
    Ok(())
}
