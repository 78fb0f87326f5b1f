use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::dates::{prompt_triple_date, today_iso};
use crate::error::FormError;
use crate::forms::{ask_number, ask_required, number_default, positive_number, required};
use crate::format::format_date;
use crate::model::{PaymentMethod, Transfer, TransferInput};
use crate::ui::{self, Choice};

use super::{active_methods, failure, find_by_id, method_choices, resolve_id};

#[derive(Subcommand)]
pub enum TransfersCommand {
    /// List movements between accounts
    List,
    /// Register a transfer
    New,
    /// Edit a transfer
    Edit { id: Option<i64> },
    /// Delete a transfer
    Delete { id: Option<i64> },
    /// Current balance per payment method
    Balances,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferForm {
    pub origin_id: Option<i64>,
    pub destination_id: Option<i64>,
    pub amount: String,
    pub date: String,
    pub description: String,
}

impl Default for TransferForm {
    fn default() -> Self {
        Self {
            origin_id: None,
            destination_id: None,
            amount: String::new(),
            date: today_iso(),
            description: String::new(),
        }
    }
}

impl TransferForm {
    pub fn from_transfer(t: &Transfer) -> Self {
        let d = &t.data;
        Self {
            origin_id: Some(d.origin_id),
            destination_id: Some(d.destination_id),
            amount: number_default(d.amount),
            date: d.date.get(..10).unwrap_or(&d.date).to_string(),
            description: d.description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<TransferInput, FormError> {
        let origin_id = self.origin_id.ok_or(FormError::Required("Origen"))?;
        let destination_id = self.destination_id.ok_or(FormError::Required("Destino"))?;
        let amount = positive_number("Valor", &self.amount)?;
        let date = required("Fecha", &self.date)?;
        let description = required("Descripción", &self.description)?;
        if origin_id == destination_id {
            return Err(FormError::Rule("El origen y destino no pueden ser iguales".into()));
        }
        Ok(TransferInput {
            origin_id,
            destination_id,
            amount,
            date,
            description: Some(description),
        })
    }
}

pub fn run(api: &ApiClient, cmd: TransfersCommand) -> Result<()> {
    match cmd {
        TransfersCommand::List => list(api),
        TransfersCommand::Balances => balances(api),
        TransfersCommand::New => {
            ui::page_header("Nueva Transferencia");
            let input = prompt(api, TransferForm::default())?.validate()?;
            api.create_transfer(&input)
                .map_err(failure("Error al registrar transferencia"))?;
            ui::success("Transferencia registrada exitosamente");
            list(api)
        }
        TransfersCommand::Edit { id } => {
            let transfers = load(api)?;
            let id = resolve_id(id, "Transferencia:", || Ok(transfer_choices(&transfers)))?;
            let transfer = find_by_id(&transfers, id, |t| t.id, "Transferencia")?;

            ui::page_header("Editar Transferencia");
            let input = prompt(api, TransferForm::from_transfer(transfer))?.validate()?;
            api.update_transfer(id, &input)
                .map_err(failure("Error al actualizar transferencia"))?;
            ui::success("Transferencia actualizada");
            list(api)
        }
        TransfersCommand::Delete { id } => {
            let id = resolve_id(id, "Transferencia:", || Ok(transfer_choices(&load(api)?)))?;
            if !ui::confirm("¿Eliminar esta transferencia?", false)? {
                return Ok(());
            }
            api.delete_transfer(id)
                .map_err(failure("Error al eliminar transferencia"))?;
            ui::success("Transferencia eliminada");
            list(api)
        }
    }
}

fn load(api: &ApiClient) -> Result<Vec<Transfer>> {
    api.list_transfers().map_err(failure("Error al cargar transferencias"))
}

fn transfer_choices(transfers: &[Transfer]) -> Vec<Choice<i64>> {
    transfers
        .iter()
        .map(|t| {
            let label = format!(
                "#{} {} {}",
                t.id,
                format_date(&t.data.date),
                crate::format::format_currency(t.data.amount)
            );
            Choice::new(label, t.id)
        })
        .collect()
}

fn method_name(methods: &[PaymentMethod], id: i64, given: &Option<String>) -> String {
    given
        .clone()
        .or_else(|| methods.iter().find(|m| m.id == id).map(|m| m.data.name.clone()))
        .unwrap_or_else(|| "Desconocido".into())
}

fn list(api: &ApiClient) -> Result<()> {
    let transfers = load(api)?;
    let methods = api
        .list_payment_methods()
        .map_err(failure("Error al cargar medios de pago"))?;

    ui::page_header("Movimientos");
    if transfers.is_empty() {
        ui::empty("No hay movimientos.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Fecha", "Origen", "Destino", "Valor", "Descripción"]);
    for t in &transfers {
        let d = &t.data;
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(format_date(&d.date)),
            Cell::new(method_name(&methods, d.origin_id, &t.origin_name)),
            Cell::new(method_name(&methods, d.destination_id, &t.destination_name)),
            ui::money_cell(d.amount),
            Cell::new(ui::opt(&d.description)),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn balances(api: &ApiClient) -> Result<()> {
    let balances = api
        .transfer_balances()
        .map_err(failure("Error al cargar saldos"))?;
    ui::page_header("Saldos por Medio de Pago");
    if balances.is_empty() {
        ui::empty("No hay saldos para mostrar.");
        return Ok(());
    }

    let mut table = ui::table(&["Medio", "Saldo"]);
    for b in &balances {
        table.add_row(vec![ui::bold(&b.name), ui::signed_money_cell(b.balance)]);
    }
    let total: f64 = balances.iter().map(|b| b.balance).sum();
    table.add_row(vec![ui::bold("TOTAL"), ui::signed_money_cell(total)]);
    println!("{table}");
    Ok(())
}

fn prompt(api: &ApiClient, mut form: TransferForm) -> Result<TransferForm> {
    let methods = active_methods(api)?;
    form.origin_id = Some(ui::pick("Origen:", method_choices(&methods), form.origin_id.as_ref())?);
    form.destination_id = Some(ui::pick(
        "Destino:",
        method_choices(&methods),
        form.destination_id.as_ref(),
    )?);
    form.amount = ask_number("Valor:", "Valor", &form.amount, true)?;
    form.date = prompt_triple_date("Fecha:", &form.date)?.to_string();
    form.description = ask_required("Descripción:", "Descripción", &form.description)?;
    Ok(form)
}
