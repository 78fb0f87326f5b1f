use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::error::{ApiError, FormError};
use crate::forms::{ask_required, required};
use crate::model::{PaymentMethod, PaymentMethodInput};
use crate::ui;

use super::{failure, find_by_id, method_choices, resolve_id};

pub const METHOD_KINDS: [(&str, &str); 3] = [
    ("digital", "Digital"),
    ("efectivo", "Efectivo"),
    ("transferencia", "Transferencia"),
];

#[derive(Subcommand)]
pub enum PaymentMethodsCommand {
    /// List payment methods
    List,
    /// Add a payment method
    New,
    /// Edit a payment method
    Edit { id: Option<i64> },
    /// Delete a payment method
    Delete { id: Option<i64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentMethodForm {
    pub name: String,
    pub kind: String,
    pub active: bool,
}

impl Default for PaymentMethodForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: "digital".into(),
            active: true,
        }
    }
}

impl PaymentMethodForm {
    pub fn from_method(m: &PaymentMethod) -> Self {
        Self {
            name: m.data.name.clone(),
            kind: m.data.kind.clone(),
            active: m.data.active,
        }
    }

    pub fn validate(&self) -> Result<PaymentMethodInput, FormError> {
        Ok(PaymentMethodInput {
            name: required("Nombre", &self.name)?,
            kind: self.kind.clone(),
            active: self.active,
        })
    }
}

pub fn run(api: &ApiClient, cmd: PaymentMethodsCommand) -> Result<()> {
    match cmd {
        PaymentMethodsCommand::List => list(api),
        PaymentMethodsCommand::New => {
            ui::page_header("Nuevo Medio de Pago");
            let input = prompt(PaymentMethodForm::default())?.validate()?;
            api.create_payment_method(&input).map_err(failure("Error al guardar."))?;
            ui::success("Medio de pago creado");
            list(api)
        }
        PaymentMethodsCommand::Edit { id } => {
            let methods = load(api)?;
            let id = resolve_id(id, "Medio de pago:", || Ok(method_choices(&methods)))?;
            let method = find_by_id(&methods, id, |m| m.id, "Medio de pago")?;

            ui::page_header("Editar Medio de Pago");
            let input = prompt(PaymentMethodForm::from_method(method))?.validate()?;
            api.update_payment_method(id, &input).map_err(failure("Error al guardar."))?;
            ui::success("Medio de pago actualizado");
            list(api)
        }
        PaymentMethodsCommand::Delete { id } => {
            let id = resolve_id(id, "Medio de pago:", || Ok(method_choices(&load(api)?)))?;
            if !ui::confirm("¿Eliminar este medio de pago?", false)? {
                return Ok(());
            }
            api.delete_payment_method(id).map_err(|e| match e {
                ApiError::Status { .. } => {
                    failure("No se puede eliminar porque está asociado a registros.")(e)
                }
                other => failure("Error al eliminar")(other),
            })?;
            ui::success("Medio de pago eliminado");
            list(api)
        }
    }
}

fn load(api: &ApiClient) -> Result<Vec<PaymentMethod>> {
    api.list_payment_methods().map_err(failure("Error al cargar medios de pago"))
}

fn list(api: &ApiClient) -> Result<()> {
    let methods = load(api)?;
    ui::page_header("Medios de Pago");
    if methods.is_empty() {
        ui::empty("No hay medios de pago registrados.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Nombre", "Tipo", "Estado"]);
    for m in &methods {
        table.add_row(vec![
            Cell::new(m.id),
            ui::bold(&m.data.name),
            Cell::new(&m.data.kind),
            Cell::new(if m.data.active { "Activo" } else { "Inactivo" }),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn prompt(mut form: PaymentMethodForm) -> Result<PaymentMethodForm> {
    form.name = ask_required("Nombre:", "Nombre", &form.name)?;
    form.kind = ui::pick_static("Tipo:", &METHOD_KINDS, &form.kind)?;
    form.active = ui::confirm("¿Activo?", form.active)?;
    Ok(form)
}
