//! One module per screen. Each page fetches, renders a table, prompts a
//! form, submits, then shows the refreshed list.

pub mod clients;
pub mod dashboard;
pub mod expenses;
pub mod login;
pub mod orders;
pub mod payment_methods;
pub mod products;
pub mod receivables;
pub mod reports;
pub mod suppliers;
pub mod transfers;
pub mod whatsapp;

use anyhow::{Result, anyhow};
use tracing::error;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{Client, PaymentMethod, Supplier};
use crate::ui::{self, Choice};

/// Wraps an API failure in the alert text the page shows.
///
/// A 401 goes through untouched so `main` can drop the session.
pub fn failure(fallback: &'static str) -> impl Fn(ApiError) -> anyhow::Error {
    move |e| match e {
        ApiError::Unauthorized(_) => anyhow::Error::new(e),
        other => {
            error!(error = %other, "{fallback}");
            let msg = other.user_message(fallback);
            anyhow::Error::new(other).context(msg)
        }
    }
}

pub fn client_choices(clients: &[Client]) -> Vec<Choice<i64>> {
    clients
        .iter()
        .map(|c| Choice::new(c.data.name.clone(), c.id))
        .collect()
}

pub fn method_choices(methods: &[PaymentMethod]) -> Vec<Choice<i64>> {
    methods
        .iter()
        .map(|m| Choice::new(m.data.name.clone(), m.id))
        .collect()
}

pub fn supplier_choices(suppliers: &[Supplier]) -> Vec<Choice<i64>> {
    suppliers
        .iter()
        .map(|s| Choice::new(s.data.name.clone(), s.id))
        .collect()
}

/// Uses `id` when given, otherwise loads the choices and asks.
pub fn resolve_id(
    id: Option<i64>,
    prompt: &str,
    load: impl FnOnce() -> Result<Vec<Choice<i64>>>,
) -> Result<i64> {
    match id {
        Some(id) => Ok(id),
        None => ui::pick(prompt, load()?, None),
    }
}

/// Finds `id` in an already fetched list (for resources without a GET by id).
pub fn find_by_id<'a, T>(items: &'a [T], id: i64, key: impl Fn(&T) -> i64, what: &str) -> Result<&'a T> {
    items
        .iter()
        .find(|item| key(item) == id)
        .ok_or_else(|| anyhow!("{what} #{id} no encontrado"))
}

pub fn active_methods(api: &ApiClient) -> Result<Vec<PaymentMethod>> {
    api.active_payment_methods()
        .map_err(failure("Error al cargar medios de pago"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_server_detail_and_unauthorized() {
        let err = failure("Error al guardar")(ApiError::Status {
            status: 400,
            detail: "Nombre duplicado".into(),
        });
        assert_eq!(err.to_string(), "Nombre duplicado");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Status { status: 400, .. })));

        let err = failure("Error al guardar")(ApiError::Decode("x".into()));
        assert_eq!(err.to_string(), "Error al guardar");

        let err = failure("Error al guardar")(ApiError::Unauthorized(String::new()));
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized(_))));
    }

    #[test]
    fn find_by_id_reports_missing() {
        let items = vec![(1_i64, "a"), (2, "b")];
        assert_eq!(find_by_id(&items, 2, |i| i.0, "Gasto").unwrap().1, "b");
        assert_eq!(
            find_by_id(&items, 5, |i| i.0, "Gasto").unwrap_err().to_string(),
            "Gasto #5 no encontrado"
        );
    }
}
