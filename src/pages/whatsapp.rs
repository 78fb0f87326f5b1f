use anyhow::Result;

use crate::api::ApiClient;
use crate::error::FormError;
use crate::format::parse_timestamp;

use super::failure;

/// Checks an optional `YYYY-MM-DD` filter before it is sent.
pub fn date_filter(date: Option<&str>) -> Result<Option<String>, FormError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(d) if d.len() == 10 && parse_timestamp(d).is_some() => Ok(Some(d.to_string())),
        Some(d) => Err(FormError::Rule(format!("Fecha inválida: '{d}' (use AAAA-MM-DD)"))),
    }
}

/// Prints the summary bare so it can be piped or pasted into WhatsApp.
pub fn show(api: &ApiClient, date: Option<String>) -> Result<()> {
    let date = date_filter(date.as_deref())?;
    let summary = api
        .whatsapp_summary(date.as_deref())
        .map_err(failure("Error al cargar el resumen"))?;

    if summary.text.trim().is_empty() {
        println!("No hay pedidos pendientes.");
    } else {
        println!("{}", summary.text);
    }
    Ok(())
}
