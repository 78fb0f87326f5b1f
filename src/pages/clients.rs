use anyhow::Result;
use clap::Subcommand;
use comfy_table::Cell;

use crate::api::ApiClient;
use crate::error::FormError;
use crate::forms::{ask_required, ask_text, optional, required};
use crate::model::{Client, ClientInput};
use crate::ui;

use super::{client_choices, failure, resolve_id};

pub const CLIENT_TYPES: [(&str, &str); 4] = [
    ("local", "Local"),
    ("mayorista", "Mayorista"),
    ("minorista", "Minorista"),
    ("distribuidor", "Distribuidor"),
];

pub const SALES_CHANNELS: [(&str, &str); 3] = [
    ("local", "Local"),
    ("whatsapp", "WhatsApp"),
    ("domicilio", "Domicilio"),
];

pub const PAYMENT_TERMS: [(&str, &str); 2] = [("contado", "Contado"), ("credito", "Crédito")];

#[derive(Subcommand)]
pub enum ClientsCommand {
    /// List clients
    List,
    /// Register a client
    New,
    /// Edit a client
    Edit { id: Option<i64> },
    /// Delete a client (refused by the server when it has orders)
    Delete { id: Option<i64> },
}

/// Raw client form. Fields the form does not show are carried over on edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientForm {
    pub name: String,
    pub client_type: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub sales_channel: String,
    pub payment_terms: String,
    credit_limit: Option<f64>,
    show_balance_in_whatsapp: Option<bool>,
}

impl Default for ClientForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            client_type: "local".into(),
            phone: String::new(),
            address: String::new(),
            city: "Bogotá".into(),
            sales_channel: "local".into(),
            payment_terms: "contado".into(),
            credit_limit: None,
            show_balance_in_whatsapp: None,
        }
    }
}

impl ClientForm {
    pub fn from_client(c: &Client) -> Self {
        let d = &c.data;
        Self {
            name: d.name.clone(),
            client_type: d.client_type.clone(),
            phone: d.phone.clone().unwrap_or_default(),
            address: d.address.clone().unwrap_or_default(),
            city: d.city.clone().unwrap_or_default(),
            sales_channel: d.sales_channel.clone().unwrap_or_else(|| "local".into()),
            payment_terms: d.payment_terms.clone().unwrap_or_else(|| "contado".into()),
            credit_limit: d.credit_limit,
            show_balance_in_whatsapp: d.show_balance_in_whatsapp,
        }
    }

    pub fn validate(&self) -> Result<ClientInput, FormError> {
        Ok(ClientInput {
            name: required("Nombre", &self.name)?,
            client_type: self.client_type.clone(),
            phone: optional(&self.phone),
            address: optional(&self.address),
            city: optional(&self.city),
            sales_channel: optional(&self.sales_channel),
            payment_terms: optional(&self.payment_terms),
            credit_limit: self.credit_limit,
            show_balance_in_whatsapp: self.show_balance_in_whatsapp,
        })
    }
}

pub fn run(api: &ApiClient, cmd: ClientsCommand) -> Result<()> {
    match cmd {
        ClientsCommand::List => list(api),
        ClientsCommand::New => {
            let input = prompt(ClientForm::default())?.validate()?;
            let created = api.create_client(&input).map_err(failure("Error al guardar cliente"))?;
            ui::success(&format!("Cliente creado: {} (#{})", created.data.name, created.id));
            list(api)
        }
        ClientsCommand::Edit { id } => {
            let id = pick_client(api, id)?;
            let client = api.get_client(id).map_err(failure("Error al cargar cliente"))?;
            ui::page_header("Editar Cliente");
            let input = prompt(ClientForm::from_client(&client))?.validate()?;
            api.update_client(id, &input).map_err(failure("Error al guardar cliente"))?;
            ui::success("Cliente actualizado");
            list(api)
        }
        ClientsCommand::Delete { id } => {
            let id = pick_client(api, id)?;
            if !ui::confirm("¿Eliminar este cliente?", false)? {
                return Ok(());
            }
            api.delete_client(id).map_err(failure("Error al eliminar cliente"))?;
            ui::success("Cliente eliminado");
            list(api)
        }
    }
}

fn pick_client(api: &ApiClient, id: Option<i64>) -> Result<i64> {
    resolve_id(id, "Cliente:", || {
        let clients = api.list_clients().map_err(failure("Error al cargar clientes"))?;
        Ok(client_choices(&clients))
    })
}

fn list(api: &ApiClient) -> Result<()> {
    let clients = api.list_clients().map_err(failure("Error al cargar clientes"))?;
    ui::page_header("Clientes");
    if clients.is_empty() {
        ui::empty("No hay clientes registrados.");
        return Ok(());
    }

    let mut table = ui::table(&["#", "Nombre", "Tipo", "Teléfono", "Dirección", "Ciudad", "Pago"]);
    for c in &clients {
        let d = &c.data;
        table.add_row(vec![
            Cell::new(c.id),
            ui::bold(&d.name),
            Cell::new(&d.client_type),
            Cell::new(ui::opt(&d.phone)),
            Cell::new(ui::opt(&d.address)),
            Cell::new(ui::opt(&d.city)),
            Cell::new(ui::opt(&d.payment_terms)),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn prompt(mut form: ClientForm) -> Result<ClientForm> {
    form.name = ask_required("Nombre:", "Nombre", &form.name)?;
    form.client_type = ui::pick_static("Tipo:", &CLIENT_TYPES, &form.client_type)?;
    form.phone = ask_text("Teléfono:", &form.phone)?;
    form.address = ask_text("Dirección:", &form.address)?;
    form.city = ask_text("Ciudad:", &form.city)?;
    form.sales_channel = ui::pick_static("Canal de venta:", &SALES_CHANNELS, &form.sales_channel)?;
    form.payment_terms = ui::pick_static("Condición de pago:", &PAYMENT_TERMS, &form.payment_terms)?;
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_defaults() {
        let f = ClientForm::default();
        assert_eq!(f.client_type, "local");
        assert_eq!(f.city, "Bogotá");
        assert_eq!(f.sales_channel, "local");
        assert_eq!(f.payment_terms, "contado");
    }

    #[test]
    fn empty_name_blocks_submission() {
        assert_eq!(ClientForm::default().validate(), Err(FormError::Required("Nombre")));
    }

    #[test]
    fn blank_optionals_are_omitted() {
        let form = ClientForm {
            name: "  Doña Rosa ".into(),
            phone: " ".into(),
            ..Default::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.name, "Doña Rosa");
        assert_eq!(input.phone, None);
        assert_eq!(input.city.as_deref(), Some("Bogotá"));
    }

    #[test]
    fn edit_keeps_hidden_fields() {
        let client: Client = serde_json::from_str(
            r#"{"id": 3, "nombre": "Tienda", "tipo_cliente": "mayorista",
                "cupo_credito": 500000, "mostrar_saldo_whatsapp": true}"#,
        )
        .unwrap();
        let input = ClientForm::from_client(&client).validate().unwrap();
        assert_eq!(input.credit_limit, Some(500000.0));
        assert_eq!(input.show_balance_in_whatsapp, Some(true));
        assert_eq!(input.sales_channel.as_deref(), Some("local"));
    }
}
