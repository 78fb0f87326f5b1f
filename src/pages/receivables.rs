use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::dates::{prompt_triple_date, today_iso};
use crate::debts::{group_debtors, outstanding, pending_orders_for, total_debt};
use crate::error::FormError;
use crate::forms::{ask_number, ask_text, number, number_default, required};
use crate::format::{format_currency, format_date};
use crate::model::{Order, OrderQuery, PaymentInput, PaymentRecord, ReceivableAccount};
use crate::ui::{self, Choice};

use super::{active_methods, failure, find_by_id, method_choices};

#[derive(Subcommand)]
pub enum ReceivablesCommand {
    /// Clients with outstanding debt
    Accounts {
        /// Rebuild the accounts from the order list instead of the receivables endpoint
        #[arg(long)]
        from_orders: bool,
    },
    /// Payments received
    History,
    /// Register a payment (abono) from a client
    Pay {
        #[arg(long)]
        client: Option<i64>,
    },
    /// Pay off one specific order of a client
    PayOrder {
        #[arg(long)]
        client: Option<i64>,
    },
    /// Edit a registered payment
    EditPayment { id: i64 },
    /// Delete a registered payment
    DeletePayment { id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentForm {
    pub amount: String,
    pub date: String,
    pub description: String,
    pub method_id: Option<i64>,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self {
            amount: String::new(),
            date: today_iso(),
            description: String::new(),
            method_id: None,
        }
    }
}

/// Start of day in UTC, the shape the backend stores.
pub fn payment_timestamp(date: &str) -> String {
    format!("{}T00:00:00.000Z", date.trim())
}

impl PaymentForm {
    pub fn from_record(p: &PaymentRecord) -> Self {
        Self {
            amount: number_default(p.amount),
            date: p
                .date
                .as_deref()
                .and_then(|d| d.split('T').next())
                .unwrap_or_default()
                .to_string(),
            description: p.description.clone().unwrap_or_default(),
            method_id: p.payment_method_id,
        }
    }

    pub fn validate(&self, client_id: i64) -> Result<PaymentInput, FormError> {
        let method = match self.method_id {
            Some(id) if !self.amount.trim().is_empty() => id,
            _ => return Err(FormError::Rule("Complete el monto y medio de pago".into())),
        };
        let amount = number("Monto", &self.amount)?;
        if amount <= 0.0 {
            return Err(FormError::Rule("El monto debe ser mayor a 0".into()));
        }
        let date = required("Fecha", &self.date)?;
        Ok(PaymentInput {
            client_id,
            amount,
            date: payment_timestamp(&date),
            description: self.description.trim().to_string(),
            payment_method_id: method,
        })
    }
}

/// Full payment of one order's outstanding balance.
pub fn order_payment(
    client_id: i64,
    order: &Order,
    form: &PaymentForm,
) -> Result<PaymentInput, FormError> {
    let method = form
        .method_id
        .ok_or_else(|| FormError::Rule("Seleccione un pedido y un medio de pago".into()))?;
    let debt = outstanding(order);
    if debt <= 0.0 {
        return Err(FormError::Rule("Este pedido ya está completamente pagado".into()));
    }
    let description = match form.description.trim() {
        "" => format!("Pago completo pedido #{}", order.id),
        d => d.to_string(),
    };
    Ok(PaymentInput {
        client_id,
        amount: debt,
        date: payment_timestamp(&required("Fecha", &form.date)?),
        description,
        payment_method_id: method,
    })
}

pub fn overpayment_warning(amount: f64, debt: f64) -> Option<String> {
    (amount > debt).then(|| {
        format!(
            "El monto ingresado ({}) es MAYOR a la deuda total ({}). ¿Desea continuar? (El excedente no se asocia a pedidos futuros automáticamente)",
            format_currency(amount),
            format_currency(debt)
        )
    })
}

pub fn run(api: &ApiClient, cmd: ReceivablesCommand) -> Result<()> {
    match cmd {
        ReceivablesCommand::Accounts { from_orders } => {
            let accounts = if from_orders {
                let orders = api
                    .list_orders(&OrderQuery::default())
                    .map_err(failure("Error al cargar pedidos"))?;
                group_debtors(&orders)
            } else {
                load_accounts(api)?
            };
            print_accounts(&accounts);
            Ok(())
        }
        ReceivablesCommand::History => history(api),
        ReceivablesCommand::Pay { client } => pay(api, client),
        ReceivablesCommand::PayOrder { client } => pay_order(api, client),
        ReceivablesCommand::EditPayment { id } => edit_payment(api, id),
        ReceivablesCommand::DeletePayment { id } => {
            let question = "¿Está seguro de eliminar este abono? La deuda del cliente volverá a aumentar.";
            if !ui::confirm(question, false)? {
                return Ok(());
            }
            api.delete_payment(id).map_err(failure("Error al eliminar abono"))?;
            ui::success("Abono eliminado");
            history(api)
        }
    }
}

fn load_accounts(api: &ApiClient) -> Result<Vec<ReceivableAccount>> {
    api.receivable_accounts()
        .map_err(failure("Error al cargar cuentas por cobrar"))
}

fn print_accounts(accounts: &[ReceivableAccount]) {
    ui::page_header("Cuentas por Cobrar");
    if accounts.is_empty() {
        ui::empty("No hay cuentas por cobrar pendientes.");
        return;
    }

    let mut table = ui::table(&["Cliente", "Deuda Total", "Pedidos", "Más Antiguo"]);
    for a in accounts {
        table.add_row(vec![
            Cell::new(format!("{}\nID Cliente: #{}", a.name, a.client_id)),
            ui::debt_cell(a.total_debt),
            Cell::new(a.pending_orders),
            Cell::new(format_date(a.oldest_date.as_deref().unwrap_or(""))),
        ]);
    }
    println!("{table}");
    ui::card("Total general", &format_currency(total_debt(accounts)));
}

fn history(api: &ApiClient) -> Result<()> {
    let records = api
        .payment_history()
        .map_err(failure("Error al cargar historial"))?;
    ui::page_header("Historial de Abonos");
    if records.is_empty() {
        ui::empty("No hay abonos registrados.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Fecha", "Cliente", "Descripción", "Medio", "Monto"]);
    for p in &records {
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(format_date(p.date.as_deref().unwrap_or(""))),
            ui::bold(&p.client_name),
            Cell::new(ui::opt(&p.description)),
            Cell::new(ui::opt(&p.payment_method)),
            ui::signed_money_cell(p.amount),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn pick_account(accounts: &[ReceivableAccount], client: Option<i64>) -> Result<ReceivableAccount> {
    let id = match client {
        Some(id) => id,
        None => {
            let choices = accounts
                .iter()
                .map(|a| Choice::new(format!("{} · {}", a.name, format_currency(a.total_debt)), a.client_id))
                .collect();
            ui::pick("Cliente:", choices, None)?
        }
    };
    Ok(find_by_id(accounts, id, |a| a.client_id, "Cliente con deuda")?.clone())
}

fn prompt(api: &ApiClient, mut form: PaymentForm, ask_amount: bool) -> Result<PaymentForm> {
    if ask_amount {
        form.amount = ask_number("Monto:", "Monto", &form.amount, true)?;
    }
    form.date = prompt_triple_date("Fecha:", &form.date)?.to_string();
    form.description = ask_text("Descripción:", &form.description)?;
    let methods = active_methods(api)?;
    form.method_id = ui::pick_optional(
        "Medio de pago:",
        "-- Seleccionar --",
        method_choices(&methods),
        form.method_id.as_ref(),
    )?;
    Ok(form)
}

fn pay(api: &ApiClient, client: Option<i64>) -> Result<()> {
    let accounts = load_accounts(api)?;
    let account = pick_account(&accounts, client)?;

    ui::page_header("Registrar Abono");
    ui::card("CLIENTE", &account.name);
    ui::card("DEUDA ACTUAL", &format_currency(account.total_debt));

    let payload = prompt(api, PaymentForm::default(), true)?.validate(account.client_id)?;
    if let Some(warning) = overpayment_warning(payload.amount, account.total_debt) {
        if !ui::confirm(&warning, false)? {
            return Ok(());
        }
    }
    api.register_payment(&payload)
        .map_err(failure("Error al procesar abono"))?;
    ui::success(&format!("Abono de {} registrado", format_currency(payload.amount)));
    print_accounts(&load_accounts(api)?);
    Ok(())
}

fn pay_order(api: &ApiClient, client: Option<i64>) -> Result<()> {
    let accounts = load_accounts(api)?;
    let account = pick_account(&accounts, client)?;

    let orders = api
        .list_orders(&OrderQuery::default())
        .map_err(failure("Error al cargar los pedidos del cliente"))?;
    let pending = pending_orders_for(&orders, account.client_id);
    if pending.is_empty() {
        ui::empty("No hay pedidos pendientes para este cliente");
        return Ok(());
    }

    let choices = pending
        .iter()
        .map(|o| {
            let label = format!(
                "#{} {} · Total {} · Saldo Pendiente {}",
                o.id,
                format_date(&o.date),
                format_currency(o.total),
                format_currency(outstanding(o))
            );
            Choice::new(label, o.id)
        })
        .collect();
    let order_id = ui::pick("Pedido:", choices, None)?;
    let order = find_by_id(&pending, order_id, |o| o.id, "Pedido")?;

    let form = prompt(api, PaymentForm::default(), false)?;
    let payload = order_payment(account.client_id, order, &form)?;
    let question = format!(
        "¿Confirma el pago completo de {} para el pedido #{}?",
        format_currency(payload.amount),
        order.id
    );
    if !ui::confirm(&question, true)? {
        return Ok(());
    }
    api.register_payment(&payload)
        .map_err(failure("Error al procesar el pago"))?;
    ui::success(&format!("Pedido #{} pagado", order.id));
    Ok(())
}

fn edit_payment(api: &ApiClient, id: i64) -> Result<()> {
    let records = api
        .payment_history()
        .map_err(failure("Error al cargar historial"))?;
    let record = find_by_id(&records, id, |p| p.id, "Abono")?;

    let debt = load_accounts(api)?
        .iter()
        .find(|a| a.client_id == record.client_id)
        .map(|a| a.total_debt)
        .unwrap_or(0.0);

    ui::page_header("Editar Abono");
    ui::card("CLIENTE", &record.client_name);
    ui::card("DEUDA ACTUAL", &format_currency(debt));

    let payload = prompt(api, PaymentForm::from_record(record), true)?.validate(record.client_id)?;
    api.update_payment(id, &payload)
        .map_err(failure("Error al procesar abono"))?;
    ui::success("Abono actualizado");
    history(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderStatus;

    fn order(total: f64, paid: Option<f64>) -> Order {
        Order {
            id: 12,
            client_id: 4,
            client_name: None,
            date: "2025-03-02T10:00:00".into(),
            total,
            delivery_fee: None,
            payment_method_id: None,
            status: OrderStatus::Partial,
            amount_paid: paid,
            items: vec![],
        }
    }

    fn form(amount: &str, method: Option<i64>) -> PaymentForm {
        PaymentForm {
            amount: amount.into(),
            date: "2025-03-05".into(),
            description: " abono semana ".into(),
            method_id: method,
        }
    }

    #[test]
    fn amount_and_method_required() {
        let missing = Err(FormError::Rule("Complete el monto y medio de pago".into()));
        assert_eq!(form("", Some(1)).validate(4), missing);
        assert_eq!(form("1000", None).validate(4), missing);
        assert_eq!(
            form("0", Some(1)).validate(4),
            Err(FormError::Rule("El monto debe ser mayor a 0".into()))
        );
    }

    #[test]
    fn payment_payload() {
        let p = form("25000", Some(2)).validate(4).unwrap();
        assert_eq!(
            p,
            PaymentInput {
                client_id: 4,
                amount: 25000.0,
                date: "2025-03-05T00:00:00.000Z".into(),
                description: "abono semana".into(),
                payment_method_id: 2,
            }
        );
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["metodo_pago_id"], 2);
        assert_eq!(v["cliente_id"], 4);
    }

    #[test]
    fn overpayment_needs_confirmation() {
        assert!(overpayment_warning(50000.0, 40000.0).unwrap().contains("MAYOR"));
        assert_eq!(overpayment_warning(40000.0, 40000.0), None);
    }

    #[test]
    fn specific_order_pays_its_balance() {
        let mut f = form("", Some(1));
        f.description = String::new();
        let p = order_payment(4, &order(45000.0, Some(5000.0)), &f).unwrap();
        assert_eq!(p.amount, 40000.0);
        assert_eq!(p.description, "Pago completo pedido #12");

        assert_eq!(
            order_payment(4, &order(45000.0, Some(45000.0)), &f),
            Err(FormError::Rule("Este pedido ya está completamente pagado".into()))
        );
        assert!(order_payment(4, &order(45000.0, None), &form("", None)).is_err());
    }

    #[test]
    fn edit_prefills_day_part() {
        let record: PaymentRecord = serde_json::from_str(
            r#"{"id": 3, "cliente_id": 4, "cliente": "Tienda", "monto": 12000,
                "fecha": "2025-03-01T15:30:00", "metodo_pago_id": 1}"#,
        )
        .unwrap();
        let f = PaymentForm::from_record(&record);
        assert_eq!(f.date, "2025-03-01");
        assert_eq!(f.amount, "12000");
        assert_eq!(f.method_id, Some(1));
    }
}
