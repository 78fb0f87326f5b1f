use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;
use std::collections::HashMap;

use crate::api::ApiClient;
use crate::dates::{current_month, month_bounds, today_iso};
use crate::debts::{orders_on, outstanding, sales_total};
use crate::error::FormError;
use crate::forms::{ask_number, ask_text, number, number_default, positive_int};
use crate::format::{format_currency, format_date, format_time};
use crate::model::{NewOrder, NewOrderItem, Order, OrderQuery, OrderStatus, Product, StatusUpdate};
use crate::ui::{self, Choice};

use super::whatsapp::date_filter;
use super::{active_methods, client_choices, failure, method_choices};

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// Orders of a day next to its WhatsApp summary
    Day {
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Take a new order
    New,
    /// Edit an order's items and delivery fee
    Edit { id: i64 },
    /// Show an order with its items
    Show { id: i64 },
    /// Mark an order pending, paid or cancelled
    Status { id: i64 },
    /// Delete an order
    Delete { id: i64 },
    /// Monthly orders report
    Report {
        /// YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
}

/// One line of the order form, as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub product_id: Option<i64>,
    pub quantity: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    pub client_id: Option<i64>,
    pub items: Vec<ItemDraft>,
    pub delivery_fee: String,
    pub payment_method_id: Option<i64>,
    pub date: Option<String>,
    pub status: OrderStatus,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            client_id: None,
            items: Vec::new(),
            delivery_fee: "0".into(),
            payment_method_id: None,
            date: None,
            status: OrderStatus::Pending,
        }
    }
}

impl OrderForm {
    pub fn from_order(order: &Order) -> Self {
        Self {
            client_id: Some(order.client_id),
            items: order
                .items
                .iter()
                .map(|i| ItemDraft {
                    product_id: Some(i.product_id),
                    quantity: i.quantity.to_string(),
                    price: Some(i.unit_price),
                })
                .collect(),
            delivery_fee: number_default(order.delivery()),
            payment_method_id: order.payment_method_id,
            date: Some(order.date.clone()),
            status: order.status.clone(),
        }
    }

    /// Items missing a product or with quantity below one are dropped.
    pub fn valid_items(&self) -> Vec<NewOrderItem> {
        self.items
            .iter()
            .filter_map(|i| {
                let product_id = i.product_id?;
                let quantity = positive_int("Cantidad", &i.quantity).ok()?;
                Some(NewOrderItem {
                    product_id,
                    quantity,
                    price: i.price,
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<NewOrder, FormError> {
        let client_id = self.client_id.ok_or(FormError::Required("Cliente"))?;
        let items = self.valid_items();
        if items.is_empty() {
            return Err(FormError::Rule("Agregue al menos un producto".into()));
        }
        let delivery_fee = if self.delivery_fee.trim().is_empty() {
            0.0
        } else {
            number("Domicilio", &self.delivery_fee)?
        };
        Ok(NewOrder {
            client_id,
            payment_method_id: self.payment_method_id,
            items,
            date: self.date.clone(),
            delivery_fee,
            status: self.status.clone(),
        })
    }
}

/// What the status dialog can do to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Pending,
    Paid,
    Cancel,
}

/// Builds the PATCH body. Paying needs a method; the others clear it.
pub fn status_update(action: StatusAction, method: Option<i64>) -> Result<StatusUpdate, FormError> {
    match action {
        StatusAction::Paid => {
            let id = method.ok_or_else(|| FormError::Rule("Por favor selecciona un medio de pago.".into()))?;
            Ok(StatusUpdate {
                status: OrderStatus::Paid,
                payment_method_id: Some(id),
            })
        }
        StatusAction::Pending => Ok(StatusUpdate {
            status: OrderStatus::Pending,
            payment_method_id: None,
        }),
        StatusAction::Cancel => Ok(StatusUpdate {
            status: OrderStatus::Cancelled,
            payment_method_id: None,
        }),
    }
}

pub fn run(api: &ApiClient, cmd: OrdersCommand) -> Result<()> {
    match cmd {
        OrdersCommand::Day { date } => {
            let date = date_filter(date.as_deref())?.unwrap_or_else(today_iso);
            day(api, &date)
        }
        OrdersCommand::New => {
            ui::page_header("Nuevo Pedido");
            let order = prompt(api, OrderForm::default())?.validate()?;
            let created = api.create_order(&order).map_err(failure("Error al crear pedido"))?;
            ui::success(&format!(
                "Pedido #{} creado por {}",
                created.id,
                format_currency(created.total)
            ));
            day(api, &today_iso())
        }
        OrdersCommand::Edit { id } => {
            let order = get(api, id)?;
            ui::page_header(&format!("Editar Pedido #{id}"));
            let update = prompt(api, OrderForm::from_order(&order))?.validate()?;
            let saved = api.update_order(id, &update).map_err(failure("Error al actualizar pedido"))?;
            ui::success("Pedido actualizado");
            print_order(&saved);
            Ok(())
        }
        OrdersCommand::Show { id } => {
            print_order(&get(api, id)?);
            Ok(())
        }
        OrdersCommand::Status { id } => change_status(api, id),
        OrdersCommand::Delete { id } => {
            let order = get(api, id)?;
            let question = format!(
                "¿Eliminar el pedido #{} de {} por {}?",
                order.id,
                order.client_label(),
                format_currency(order.total)
            );
            if !ui::confirm(&question, false)? {
                return Ok(());
            }
            api.delete_order(id).map_err(failure("Error al eliminar pedido"))?;
            ui::success("Pedido eliminado");
            Ok(())
        }
        OrdersCommand::Report { month } => {
            let month = month.unwrap_or_else(current_month);
            report(api, &month)
        }
    }
}

fn get(api: &ApiClient, id: i64) -> Result<Order> {
    api.get_order(id).map_err(failure("Error al cargar pedido"))
}

fn item_lines(order: &Order) -> String {
    let mut lines: Vec<String> = order
        .items
        .iter()
        .map(|i| {
            let name = i
                .product_name
                .clone()
                .unwrap_or_else(|| format!("Producto #{}", i.product_id));
            format!("{} x {}  {}", i.quantity, name, format_currency(i.subtotal))
        })
        .collect();
    if order.delivery() > 0.0 {
        lines.push(format!("Domicilio  {}", format_currency(order.delivery())));
    }
    lines.join("\n")
}

fn day(api: &ApiClient, date: &str) -> Result<()> {
    let query = OrderQuery {
        start_date: Some(date.to_string()),
        end_date: None,
    };
    let orders = api.list_orders(&query).map_err(failure("Error al cargar pedidos"))?;
    let orders = orders_on(&orders, date);

    ui::page_header(&format!("Pedidos del Día {}", format_date(date)));
    if orders.is_empty() {
        ui::empty("No hay pedidos para esta fecha.");
    } else {
        let mut table = ui::table(&["#", "Hora", "Cliente", "Detalle", "Total", "Estado"]);
        for o in &orders {
            table.add_row(vec![
                Cell::new(o.id),
                Cell::new(format_time(&o.date)),
                ui::bold(o.client_label()),
                Cell::new(item_lines(o)),
                ui::money_cell(o.total),
                ui::status_cell(o.status.as_str()),
            ]);
        }
        println!("{table}");
    }

    println!("\nReporte WhatsApp");
    let summary = api
        .whatsapp_summary(Some(date))
        .map_err(failure("Error al cargar el resumen"))?;
    if summary.text.trim().is_empty() {
        ui::empty("No hay datos para generar reporte.");
    } else {
        println!("{}", summary.text);
    }
    Ok(())
}

fn print_order(order: &Order) {
    ui::page_header(&format!("Pedido #{}", order.id));
    ui::card("Cliente", &order.client_label());
    ui::card("Fecha", &format!("{} {}", format_date(&order.date), format_time(&order.date)));
    ui::card("Estado", &crate::format::format_status(order.status.as_str()).label);

    let mut table = ui::table(&["Producto", "Cantidad", "Precio", "Subtotal"]);
    for i in &order.items {
        table.add_row(vec![
            Cell::new(i.product_name.clone().unwrap_or_else(|| format!("#{}", i.product_id))),
            Cell::new(i.quantity),
            ui::money_cell(i.unit_price),
            ui::money_cell(i.subtotal),
        ]);
    }
    println!("{table}");

    ui::card("Domicilio", &format_currency(order.delivery()));
    ui::card("Total", &format_currency(order.total));
    ui::card("Pagado", &format_currency(order.amount_paid.unwrap_or(0.0)));
    ui::card("Saldo", &format_currency(outstanding(order)));
}

fn change_status(api: &ApiClient, id: i64) -> Result<()> {
    let order = get(api, id)?;
    ui::page_header("Actualizar Estado");
    ui::card("Pedido", &format!("#{} {}", order.id, order.client_label()));
    ui::card("Estado actual", &crate::format::format_status(order.status.as_str()).label);

    let mut actions = Vec::new();
    if order.status != OrderStatus::Pending {
        actions.push(Choice::new("Pendiente", StatusAction::Pending));
    }
    actions.push(Choice::new("PAGADO", StatusAction::Paid));
    actions.push(Choice::new("ANULAR PEDIDO", StatusAction::Cancel));
    let action = ui::pick("Nuevo estado:", actions, None)?;

    let method = match action {
        StatusAction::Paid => {
            let methods = active_methods(api)?;
            ui::pick_optional(
                "Medio de pago:",
                "-- Seleccionar Medio --",
                method_choices(&methods),
                None,
            )?
        }
        StatusAction::Cancel => {
            let question = "¿Seguro que deseas cancelar este pedido? Se eliminará de las cuentas por cobrar.";
            if !ui::confirm(question, false)? {
                return Ok(());
            }
            None
        }
        StatusAction::Pending => None,
    };

    let update = status_update(action, method)?;
    api.update_order_status(id, &update)
        .map_err(failure("Error al actualizar estado"))?;
    ui::success(&format!("Pedido #{id} marcado como {}", update.status));
    Ok(())
}

fn report(api: &ApiClient, month: &str) -> Result<()> {
    let (start, end) = month_bounds(month)
        .ok_or_else(|| FormError::Rule(format!("Mes inválido: '{month}' (use AAAA-MM)")))?;
    let query = OrderQuery {
        start_date: Some(start),
        end_date: Some(end),
    };
    let orders = api.list_orders(&query).map_err(failure("Error al cargar pedidos"))?;
    let methods: HashMap<i64, String> = api
        .list_payment_methods()
        .map_err(failure("Error al cargar medios de pago"))?
        .into_iter()
        .map(|m| (m.id, m.data.name))
        .collect();

    ui::page_header(&format!("Reporte Mensual Pedidos {month}"));
    ui::card("Total Ventas (Mes)", &format_currency(sales_total(&orders)));
    ui::card("Pedidos Totales", &orders.len().to_string());

    if orders.is_empty() {
        ui::empty("No se encontraron pedidos en este mes.");
        return Ok(());
    }

    let mut table = ui::table(&["ID", "Fecha", "Cliente", "Estado", "Medio Pago", "Domicilio", "Total"]);
    for o in &orders {
        let method = o
            .payment_method_id
            .and_then(|id| methods.get(&id).cloned())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(format!("#{}", o.id)),
            Cell::new(format!("{} {}", format_date(&o.date), format_time(&o.date))),
            ui::bold(o.client_label()),
            ui::status_cell(o.status.as_str()),
            Cell::new(method),
            ui::money_cell(o.delivery()),
            ui::money_cell(o.total),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn product_label(products: &[Product], id: i64) -> String {
    products
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.data.name.clone())
        .unwrap_or_else(|| format!("Producto #{id}"))
}

fn prompt(api: &ApiClient, mut form: OrderForm) -> Result<OrderForm> {
    let clients = api.list_clients().map_err(failure("Error al cargar clientes"))?;
    form.client_id = Some(ui::pick("Cliente:", client_choices(&clients), form.client_id.as_ref())?);

    let products = api.list_products(true).map_err(failure("Error al cargar productos"))?;

    let mut kept = Vec::new();
    for item in form.items.drain(..) {
        let name = item
            .product_id
            .map(|id| product_label(&products, id))
            .unwrap_or_default();
        if ui::confirm(&format!("¿Conservar {} x {}?", item.quantity, name), true)? {
            let quantity = ask_text(&format!("Cantidad de {name}:"), &item.quantity)?;
            kept.push(ItemDraft { quantity, ..item });
        }
    }
    form.items = kept;

    let choices: Vec<Choice<i64>> = products
        .iter()
        .map(|p| {
            let label = format!("{} ({}) {}", p.data.name, p.data.short_code, format_currency(p.data.standard_price));
            Choice::new(label, p.id)
        })
        .collect();
    while let Some(product_id) = ui::pick_optional("Agregar producto:", "✔ Terminar", choices.clone(), None)? {
        let quantity = ask_text("Cantidad:", "1")?;
        form.items.push(ItemDraft {
            product_id: Some(product_id),
            quantity,
            price: None,
        });
    }

    let dropped = form.items.len() - form.valid_items().len();
    if dropped > 0 {
        println!("Se omiten {dropped} ítem(s) sin producto o con cantidad menor a 1.");
    }

    form.delivery_fee = ask_number("Valor domicilio:", "Domicilio", &form.delivery_fee, false)?;
    Ok(form)
}
