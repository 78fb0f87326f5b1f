use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::dates::{prompt_triple_date, today_iso};
use crate::error::FormError;
use crate::forms::{ask_number, ask_required, ask_text, number_default, optional, positive_number, required};
use crate::format::format_date;
use crate::model::{Expense, ExpenseInput, ExpenseQuery};
use crate::ui::{self, Choice};

use super::{active_methods, failure, find_by_id, method_choices, resolve_id, supplier_choices};
use super::whatsapp::date_filter;

pub const CATEGORIES: [(&str, &str); 8] = [
    ("materia_prima", "Materia Prima"),
    ("produccion", "Producción"),
    ("mantenimiento", "Mantenimiento"),
    ("transporte", "Transporte"),
    ("servicios", "Servicios"),
    ("nomina", "Nómina"),
    ("administracion", "Administración"),
    ("otros", "Otros"),
];

pub const EXPENSE_TYPES: [(&str, &str); 2] = [("variable", "Variable"), ("fijo", "Fijo")];

#[derive(Subcommand)]
pub enum ExpensesCommand {
    /// List expenses
    List {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },
    /// Register an expense
    New,
    /// Edit an expense
    Edit { id: Option<i64> },
    /// Delete an expense
    Delete { id: Option<i64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseForm {
    pub concept: String,
    pub amount: String,
    pub category: String,
    pub expense_type: String,
    pub date: String,
    pub supplier_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub notes: String,
    order_id: Option<i64>,
    paid_at: Option<String>,
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self {
            concept: String::new(),
            amount: String::new(),
            category: "materia_prima".into(),
            expense_type: "variable".into(),
            date: today_iso(),
            supplier_id: None,
            payment_method_id: None,
            notes: String::new(),
            order_id: None,
            paid_at: None,
        }
    }
}

impl ExpenseForm {
    pub fn from_expense(e: &Expense) -> Self {
        let d = &e.data;
        Self {
            concept: d.concept.clone(),
            amount: number_default(d.amount),
            category: d.category.clone(),
            expense_type: d.expense_type.clone(),
            date: d.date.get(..10).unwrap_or(&d.date).to_string(),
            supplier_id: d.supplier_id,
            payment_method_id: d.payment_method_id,
            notes: d.notes.clone().unwrap_or_default(),
            order_id: d.order_id,
            paid_at: d.paid_at.clone(),
        }
    }

    pub fn validate(&self) -> Result<ExpenseInput, FormError> {
        Ok(ExpenseInput {
            concept: required("Concepto", &self.concept)?,
            category: self.category.clone(),
            expense_type: self.expense_type.clone(),
            date: required("Fecha", &self.date)?,
            amount: positive_number("Valor", &self.amount)?,
            supplier_id: self.supplier_id,
            payment_method_id: self.payment_method_id,
            order_id: self.order_id,
            notes: optional(&self.notes),
            paid_at: self.paid_at.clone(),
        })
    }
}

pub fn run(api: &ApiClient, cmd: ExpensesCommand) -> Result<()> {
    match cmd {
        ExpensesCommand::List { from, to } => {
            let query = ExpenseQuery {
                start_date: date_filter(from.as_deref())?,
                end_date: date_filter(to.as_deref())?,
            };
            list(api, &query)
        }
        ExpensesCommand::New => {
            ui::page_header("Nuevo Gasto");
            let input = prompt(api, ExpenseForm::default())?.validate()?;
            api.create_expense(&input).map_err(failure("Error al guardar gasto"))?;
            ui::success("Gasto registrado correctamente");
            list(api, &ExpenseQuery::default())
        }
        ExpensesCommand::Edit { id } => {
            let expenses = load(api, &ExpenseQuery::default())?;
            let id = resolve_id(id, "Gasto:", || Ok(expense_choices(&expenses)))?;
            let expense = find_by_id(&expenses, id, |e| e.id, "Gasto")?;

            ui::page_header("Editar Gasto");
            let input = prompt(api, ExpenseForm::from_expense(expense))?.validate()?;
            api.update_expense(id, &input).map_err(failure("Error al guardar gasto"))?;
            ui::success("Gasto actualizado");
            list(api, &ExpenseQuery::default())
        }
        ExpensesCommand::Delete { id } => {
            let id = resolve_id(id, "Gasto:", || {
                Ok(expense_choices(&load(api, &ExpenseQuery::default())?))
            })?;
            if !ui::confirm("¿Eliminar este gasto?", false)? {
                return Ok(());
            }
            api.delete_expense(id).map_err(failure("Error al eliminar"))?;
            ui::success("Gasto eliminado");
            list(api, &ExpenseQuery::default())
        }
    }
}

fn load(api: &ApiClient, query: &ExpenseQuery) -> Result<Vec<Expense>> {
    api.list_expenses(query).map_err(failure("Error al cargar gastos"))
}

fn expense_choices(expenses: &[Expense]) -> Vec<Choice<i64>> {
    expenses
        .iter()
        .map(|e| {
            let label = format!(
                "{} · {} · {}",
                format_date(&e.data.date),
                e.data.concept,
                crate::format::format_currency(e.data.amount)
            );
            Choice::new(label, e.id)
        })
        .collect()
}

fn category_label(value: &str) -> &str {
    CATEGORIES
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
        .unwrap_or(value)
}

fn list(api: &ApiClient, query: &ExpenseQuery) -> Result<()> {
    let expenses = load(api, query)?;
    ui::page_header("Gastos");
    if expenses.is_empty() {
        ui::empty("No hay gastos registrados.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Fecha", "Concepto", "Categoría", "Tipo", "Proveedor", "Valor"]);
    for e in &expenses {
        let d = &e.data;
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(format_date(&d.date)),
            ui::bold(&d.concept),
            Cell::new(category_label(&d.category)),
            Cell::new(&d.expense_type),
            Cell::new(ui::opt(&e.supplier_name)),
            ui::money_cell(d.amount),
        ]);
    }
    let total: f64 = expenses.iter().map(|e| e.data.amount).sum();
    println!("{table}");
    ui::card("Total", &crate::format::format_currency(total));
    Ok(())
}

fn prompt(api: &ApiClient, mut form: ExpenseForm) -> Result<ExpenseForm> {
    form.concept = ask_required("Concepto:", "Concepto", &form.concept)?;
    form.amount = ask_number("Valor:", "Valor", &form.amount, true)?;
    form.category = ui::pick_static("Categoría:", &CATEGORIES, &form.category)?;
    form.expense_type = ui::pick_static("Tipo de gasto:", &EXPENSE_TYPES, &form.expense_type)?;
    form.date = prompt_triple_date("Fecha:", &form.date)?.to_string();

    let suppliers = api.list_suppliers().map_err(failure("Error al cargar proveedores"))?;
    form.supplier_id = ui::pick_optional(
        "Proveedor:",
        "Sin proveedor",
        supplier_choices(&suppliers),
        form.supplier_id.as_ref(),
    )?;
    let methods = active_methods(api)?;
    form.payment_method_id = ui::pick_optional(
        "Medio de pago:",
        "Sin especificar",
        method_choices(&methods),
        form.payment_method_id.as_ref(),
    )?;
    form.notes = ask_text("Observaciones:", &form.notes)?;
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let f = ExpenseForm::default();
        assert_eq!(f.category, "materia_prima");
        assert_eq!(f.expense_type, "variable");
        assert_eq!(f.date, today_iso());
        assert_eq!(f.supplier_id, None);
    }

    #[test]
    fn concept_and_positive_amount_required() {
        assert_eq!(ExpenseForm::default().validate(), Err(FormError::Required("Concepto")));

        let mut f = ExpenseForm {
            concept: "Gas".into(),
            ..Default::default()
        };
        assert_eq!(f.validate(), Err(FormError::Required("Valor")));
        f.amount = "-100".into();
        assert_eq!(f.validate(), Err(FormError::NotPositive("Valor")));
        f.amount = "45000".into();
        let input = f.validate().unwrap();
        assert_eq!(input.amount, 45000.0);
        assert_eq!(input.notes, None);
    }

    #[test]
    fn edit_keeps_links_it_does_not_show() {
        let e: Expense = serde_json::from_str(
            r#"{"id": 5, "concepto": "Domicilio", "categoria": "transporte", "tipo_gasto": "variable",
                "fecha": "2025-03-04", "valor": 6000, "pedido_id": 31, "fecha_pago": "2025-03-05"}"#,
        )
        .unwrap();
        let input = ExpenseForm::from_expense(&e).validate().unwrap();
        assert_eq!(input, e.data);
        assert_eq!(input.order_id, Some(31));
    }

    #[test]
    fn category_labels() {
        assert_eq!(category_label("nomina"), "Nómina");
        assert_eq!(category_label("desconocida"), "desconocida");
    }
}
