use anyhow::Result;

use crate::api::ApiClient;
use crate::auth::{self, SessionStore};
use crate::forms::{ask_password, ask_text};
use crate::ui;

use super::failure;

pub fn login(api: &ApiClient, store: &SessionStore, email: Option<String>) -> Result<()> {
    ui::page_header("ArepasERP");
    println!("Inicie sesión para continuar");

    let email = match email {
        Some(e) => e,
        None => ask_text("Correo:", "")?,
    };
    let password = ask_password("Contraseña:")?;

    let session = auth::sign_in(api, store, &email, &password)?;
    let name = session.user.nombre.as_deref().unwrap_or(&session.user.email);
    ui::success(&format!("Bienvenido, {name}"));
    Ok(())
}

pub fn logout(store: &SessionStore) -> Result<()> {
    auth::sign_out(store)?;
    ui::success("Sesión cerrada");
    Ok(())
}

/// Shows the stored session and checks the token against `/auth/me`.
pub fn whoami(api: &ApiClient, store: &SessionStore) -> Result<()> {
    let session = store.require()?;
    ui::page_header("Sesión");
    ui::card("Usuario", &session.user.email);
    ui::card("Nombre", &ui::opt(&session.user.nombre));
    ui::card("Rol", &ui::opt(&session.user.rol));
    ui::card("Servidor", api.base_url());
    ui::card("Archivo", &store.path().display().to_string());

    let me = api.me().map_err(failure("No se pudo verificar la sesión"))?;
    ui::success(&format!("Token válido para {}", me.email));
    Ok(())
}
