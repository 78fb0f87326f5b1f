use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::error::{ApiError, FormError};
use crate::forms::{ask_required, ask_text, optional, required};
use crate::model::{Supplier, SupplierInput};
use crate::ui;

use super::{failure, find_by_id, resolve_id, supplier_choices};

#[derive(Subcommand)]
pub enum SuppliersCommand {
    /// List suppliers
    List,
    /// Register a supplier
    New,
    /// Edit a supplier
    Edit { id: Option<i64> },
    /// Delete a supplier (refused by the server when it has expenses)
    Delete { id: Option<i64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupplierForm {
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub supply_type: String,
    pub active: bool,
}

impl Default for SupplierForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            contact: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            supply_type: String::new(),
            active: true,
        }
    }
}

impl SupplierForm {
    pub fn from_supplier(s: &Supplier) -> Self {
        let d = &s.data;
        Self {
            name: d.name.clone(),
            contact: d.contact.clone().unwrap_or_default(),
            phone: d.phone.clone().unwrap_or_default(),
            email: d.email.clone().unwrap_or_default(),
            address: d.address.clone().unwrap_or_default(),
            supply_type: d.supply_type.clone().unwrap_or_default(),
            active: d.active,
        }
    }

    pub fn validate(&self) -> Result<SupplierInput, FormError> {
        Ok(SupplierInput {
            name: required("Nombre", &self.name)?,
            contact: optional(&self.contact),
            phone: optional(&self.phone),
            email: optional(&self.email),
            address: optional(&self.address),
            supply_type: optional(&self.supply_type),
            active: self.active,
        })
    }
}

pub fn run(api: &ApiClient, cmd: SuppliersCommand) -> Result<()> {
    match cmd {
        SuppliersCommand::List => list(api),
        SuppliersCommand::New => {
            ui::page_header("Nuevo Proveedor");
            let input = prompt(SupplierForm::default())?.validate()?;
            api.create_supplier(&input).map_err(failure("Error al guardar proveedor"))?;
            ui::success("Proveedor registrado");
            list(api)
        }
        SuppliersCommand::Edit { id } => {
            let suppliers = load(api)?;
            let id = resolve_id(id, "Proveedor:", || Ok(supplier_choices(&suppliers)))?;
            let supplier = find_by_id(&suppliers, id, |s| s.id, "Proveedor")?;

            ui::page_header("Editar Proveedor");
            let input = prompt(SupplierForm::from_supplier(supplier))?.validate()?;
            api.update_supplier(id, &input).map_err(failure("Error al guardar proveedor"))?;
            ui::success("Proveedor actualizado");
            list(api)
        }
        SuppliersCommand::Delete { id } => {
            let id = resolve_id(id, "Proveedor:", || Ok(supplier_choices(&load(api)?)))?;
            if !ui::confirm("¿Eliminar proveedor? Si tiene gastos asociados no se podrá eliminar.", false)? {
                return Ok(());
            }
            api.delete_supplier(id).map_err(|e| match e {
                ApiError::Status { .. } => {
                    failure("No se puede eliminar: Probablemente tenga gastos asociados.")(e)
                }
                other => failure("Error al eliminar proveedor")(other),
            })?;
            ui::success("Proveedor eliminado");
            list(api)
        }
    }
}

fn load(api: &ApiClient) -> Result<Vec<Supplier>> {
    api.list_suppliers().map_err(failure("Error al cargar proveedores"))
}

fn list(api: &ApiClient) -> Result<()> {
    let suppliers = load(api)?;
    ui::page_header("Proveedores");
    if suppliers.is_empty() {
        ui::empty("No hay proveedores registrados.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Nombre", "Contacto", "Teléfono", "Email", "Insumo", "Estado"]);
    for s in &suppliers {
        let d = &s.data;
        table.add_row(vec![
            Cell::new(s.id),
            ui::bold(&d.name),
            Cell::new(ui::opt(&d.contact)),
            Cell::new(ui::opt(&d.phone)),
            Cell::new(ui::opt(&d.email)),
            Cell::new(ui::opt(&d.supply_type)),
            Cell::new(if d.active { "Activo" } else { "Inactivo" }),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn prompt(mut form: SupplierForm) -> Result<SupplierForm> {
    form.name = ask_required("Nombre:", "Nombre", &form.name)?;
    form.contact = ask_text("Contacto:", &form.contact)?;
    form.phone = ask_text("Teléfono:", &form.phone)?;
    form.email = ask_text("Email:", &form.email)?;
    form.address = ask_text("Dirección:", &form.address)?;
    form.supply_type = ask_text("Tipo de insumo:", &form.supply_type)?;
    form.active = ui::confirm("¿Activo?", form.active)?;
    Ok(form)
}
