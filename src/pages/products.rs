use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color};

use crate::api::ApiClient;
use crate::error::FormError;
use crate::forms::{ask_number, ask_required, number, number_default, required};
use crate::model::{Product, ProductInput};
use crate::ui::{self, Choice};

use super::{failure, find_by_id, resolve_id, supplier_choices};

pub const PRODUCT_TYPES: [(&str, &str); 3] = [("arepa", "Arepa"), ("queso", "Queso"), ("otro", "Otro")];

pub const UNITS: [(&str, &str); 4] = [
    ("paquete", "Paquete"),
    ("unidad", "Unidad"),
    ("libra", "Libra"),
    ("kg", "Kg"),
];

#[derive(Subcommand)]
pub enum ProductsCommand {
    /// List products
    List {
        /// Only active products
        #[arg(long)]
        active: bool,
    },
    /// Register a product
    New,
    /// Edit a product (also used to deactivate it)
    Edit { id: Option<i64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub short_code: String,
    pub product_type: String,
    pub standard_price: String,
    pub unit_cost: String,
    pub unit: String,
    pub active: bool,
    pub supplier_id: Option<i64>,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            short_code: String::new(),
            product_type: "arepa".into(),
            standard_price: String::new(),
            unit_cost: String::new(),
            unit: "paquete".into(),
            active: true,
            supplier_id: None,
        }
    }
}

impl ProductForm {
    pub fn from_product(p: &Product) -> Self {
        let d = &p.data;
        Self {
            name: d.name.clone(),
            short_code: d.short_code.clone(),
            product_type: d.product_type.clone(),
            standard_price: number_default(d.standard_price),
            unit_cost: number_default(d.unit_cost),
            unit: d.unit.clone(),
            active: d.active,
            supplier_id: d.supplier_id,
        }
    }

    pub fn validate(&self) -> Result<ProductInput, FormError> {
        Ok(ProductInput {
            name: required("Nombre", &self.name)?,
            short_code: required("Código", &self.short_code)?,
            product_type: self.product_type.clone(),
            standard_price: number("Precio", &self.standard_price)?,
            unit_cost: number("Costo", &self.unit_cost)?,
            unit: self.unit.clone(),
            active: self.active,
            supplier_id: self.supplier_id,
        })
    }
}

pub fn run(api: &ApiClient, cmd: ProductsCommand) -> Result<()> {
    match cmd {
        ProductsCommand::List { active } => list(api, active),
        ProductsCommand::New => {
            ui::page_header("Nuevo Producto");
            let input = prompt(api, ProductForm::default())?.validate()?;
            let created = api.create_product(&input).map_err(failure("Error al guardar producto"))?;
            ui::success(&format!("Producto creado: {} (#{})", created.data.name, created.id));
            list(api, false)
        }
        ProductsCommand::Edit { id } => {
            let products = api.list_products(false).map_err(failure("Error al cargar productos"))?;
            let id = resolve_id(id, "Producto:", || {
                Ok(products
                    .iter()
                    .map(|p| Choice::new(format!("{} ({})", p.data.name, p.data.short_code), p.id))
                    .collect())
            })?;
            let product = find_by_id(&products, id, |p| p.id, "Producto")?;

            ui::page_header("Editar Producto");
            let input = prompt(api, ProductForm::from_product(product))?.validate()?;
            api.update_product(id, &input).map_err(failure("Error al guardar producto"))?;
            ui::success("Producto actualizado");
            list(api, false)
        }
    }
}

fn list(api: &ApiClient, active_only: bool) -> Result<()> {
    let products = api.list_products(active_only).map_err(failure("Error al cargar productos"))?;
    ui::page_header("Productos");
    if products.is_empty() {
        ui::empty("No hay productos registrados.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Código", "Nombre", "Tipo", "Unidad", "Precio", "Costo", "Estado"]);
    for p in &products {
        let d = &p.data;
        let state = if d.active {
            Cell::new("Activo")
        } else {
            Cell::new("Inactivo").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(&d.short_code),
            ui::bold(&d.name),
            Cell::new(&d.product_type),
            Cell::new(&d.unit),
            ui::money_cell(d.standard_price),
            ui::money_cell(d.unit_cost),
            state,
        ]);
    }
    println!("{table}");
    Ok(())
}

fn prompt(api: &ApiClient, mut form: ProductForm) -> Result<ProductForm> {
    form.name = ask_required("Nombre:", "Nombre", &form.name)?;
    form.short_code = ask_required("Código corto:", "Código", &form.short_code)?;
    form.product_type = ui::pick_static("Tipo:", &PRODUCT_TYPES, &form.product_type)?;
    form.unit = ui::pick_static("Unidad de medida:", &UNITS, &form.unit)?;
    form.standard_price = ask_number("Precio estándar:", "Precio", &form.standard_price, false)?;
    form.unit_cost = ask_number("Costo unitario:", "Costo", &form.unit_cost, false)?;

    let suppliers = api.list_suppliers().map_err(failure("Error al cargar proveedores"))?;
    form.supplier_id = ui::pick_optional(
        "Proveedor:",
        "Sin proveedor",
        supplier_choices(&suppliers),
        form.supplier_id.as_ref(),
    )?;
    form.active = ui::confirm("¿Activo?", form.active)?;
    Ok(form)
}
