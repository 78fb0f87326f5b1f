//! Blocking REST client for the ArepasERP backend.
//!
//! Paths mirror the backend routers one to one (trailing slashes included,
//! FastAPI redirects otherwise). Every call is a single request: no retry,
//! no backoff.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::model::{
    AccountBalance, Client as ErpClient, ClientInput, ClientReport, Dashboard, Expense,
    ExpenseInput, ExpenseQuery, LoginRequest, LoginResponse, NewOrder, Order, OrderQuery,
    PaymentInput, PaymentMethod, PaymentMethodInput, PaymentRecord, Product,
    ProductInput, ReceivableAccount, StatusUpdate, Supplier, SupplierInput, Transfer,
    TransferInput, User, VendorReport, WhatsappSummary,
};

pub struct ApiClient {
    base_url: String,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(json_headers())
            .build()?;
        Ok(Self::with_http(base_url, http))
    }

    pub fn with_http(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: None,
        }
    }

    /// Attaches `Authorization: Bearer <token>` to every following request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let rb = self.http.request(method, url);
        match &self.token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    fn send<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(rb)?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// For calls whose answer carries nothing we need (deletes).
    fn send_unit(&self, rb: RequestBuilder) -> Result<(), ApiError> {
        self.send_raw(rb).map(|_| ())
    }

    fn send_raw(&self, rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = rb.send()?;
        let status = resp.status();
        let body = resp.text()?;
        if status == StatusCode::UNAUTHORIZED {
            warn!("unauthorized response from API");
            return Err(ApiError::Unauthorized(extract_detail(&body)));
        }
        if !status.is_success() {
            let mut detail = extract_detail(&body);
            if detail.is_empty() {
                detail = status.canonical_reason().unwrap_or("error").to_string();
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path))
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).json(body))
    }

    fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(self.request(Method::PUT, path).json(body))
    }

    fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, path))
    }

    // ---- auth ----

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post("/auth/login", &LoginRequest { email, password })
    }

    pub fn me(&self) -> Result<User, ApiError> {
        self.get("/auth/me")
    }

    // ---- clients ----

    pub fn list_clients(&self) -> Result<Vec<ErpClient>, ApiError> {
        self.get("/clients/")
    }

    pub fn get_client(&self, id: i64) -> Result<ErpClient, ApiError> {
        self.get(&format!("/clients/{id}"))
    }

    pub fn create_client(&self, data: &ClientInput) -> Result<ErpClient, ApiError> {
        self.post("/clients/", data)
    }

    pub fn update_client(&self, id: i64, data: &ClientInput) -> Result<ErpClient, ApiError> {
        self.put(&format!("/clients/{id}"), data)
    }

    pub fn delete_client(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/clients/{id}"))
    }

    // ---- products ----

    pub fn list_products(&self, active_only: bool) -> Result<Vec<Product>, ApiError> {
        self.send(
            self.request(Method::GET, "/products/")
                .query(&[("active_only", active_only)]),
        )
    }

    pub fn create_product(&self, data: &ProductInput) -> Result<Product, ApiError> {
        self.post("/products/", data)
    }

    pub fn update_product(&self, id: i64, data: &ProductInput) -> Result<Product, ApiError> {
        self.put(&format!("/products/{id}"), data)
    }

    // ---- orders ----

    pub fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, ApiError> {
        self.send(self.request(Method::GET, "/orders/").query(query))
    }

    pub fn get_order(&self, id: i64) -> Result<Order, ApiError> {
        self.get(&format!("/orders/{id}"))
    }

    pub fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.post("/orders/", order)
    }

    pub fn update_order(&self, id: i64, order: &NewOrder) -> Result<Order, ApiError> {
        self.put(&format!("/orders/{id}"), order)
    }

    pub fn update_order_status(&self, id: i64, update: &StatusUpdate) -> Result<serde_json::Value, ApiError> {
        self.send(
            self.request(Method::PATCH, &format!("/orders/{id}/status"))
                .json(update),
        )
    }

    pub fn delete_order(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/orders/{id}"))
    }

    // ---- expenses ----

    pub fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, ApiError> {
        self.send(self.request(Method::GET, "/expenses/").query(query))
    }

    pub fn create_expense(&self, data: &ExpenseInput) -> Result<Expense, ApiError> {
        self.post("/expenses/", data)
    }

    pub fn update_expense(&self, id: i64, data: &ExpenseInput) -> Result<Expense, ApiError> {
        self.put(&format!("/expenses/{id}"), data)
    }

    pub fn delete_expense(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/expenses/{id}"))
    }

    // ---- suppliers ----

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>, ApiError> {
        self.get("/suppliers/")
    }

    pub fn create_supplier(&self, data: &SupplierInput) -> Result<Supplier, ApiError> {
        self.post("/suppliers/", data)
    }

    pub fn update_supplier(&self, id: i64, data: &SupplierInput) -> Result<Supplier, ApiError> {
        self.put(&format!("/suppliers/{id}"), data)
    }

    pub fn delete_supplier(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/suppliers/{id}"))
    }

    // ---- payment methods ----

    pub fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        self.get("/payment-methods/")
    }

    /// Methods that may be offered in forms.
    pub fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        Ok(self
            .list_payment_methods()?
            .into_iter()
            .filter(|m| m.data.active)
            .collect())
    }

    pub fn create_payment_method(&self, data: &PaymentMethodInput) -> Result<PaymentMethod, ApiError> {
        self.post("/payment-methods/", data)
    }

    pub fn update_payment_method(&self, id: i64, data: &PaymentMethodInput) -> Result<PaymentMethod, ApiError> {
        self.put(&format!("/payment-methods/{id}"), data)
    }

    pub fn delete_payment_method(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/payment-methods/{id}"))
    }

    // ---- transfers ----

    pub fn list_transfers(&self) -> Result<Vec<Transfer>, ApiError> {
        self.get("/transfers/")
    }

    pub fn create_transfer(&self, data: &TransferInput) -> Result<Transfer, ApiError> {
        self.post("/transfers/", data)
    }

    pub fn transfer_balances(&self) -> Result<Vec<AccountBalance>, ApiError> {
        self.get("/transfers/balances")
    }

    pub fn update_transfer(&self, id: i64, data: &TransferInput) -> Result<Transfer, ApiError> {
        self.put(&format!("/transfers/{id}"), data)
    }

    pub fn delete_transfer(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/transfers/{id}"))
    }

    // ---- reports ----

    pub fn dashboard(&self) -> Result<Dashboard, ApiError> {
        self.get("/reports/dashboard")
    }

    /// `date` is `YYYY-MM-DD`; `None` lets the backend decide (pending orders).
    pub fn whatsapp_summary(&self, date: Option<&str>) -> Result<WhatsappSummary, ApiError> {
        self.send(
            self.request(Method::GET, "/reports/whatsapp-summary")
                .query(&[("date_str", date.unwrap_or(""))]),
        )
    }

    pub fn client_report(&self, client_id: i64, start: &str, end: &str) -> Result<ClientReport, ApiError> {
        self.send(
            self.request(Method::GET, "/reports/client-report")
                .query(&[("client_id", client_id.to_string().as_str()), ("start_date", start), ("end_date", end)]),
        )
    }

    pub fn vendor_report(&self, vendor_id: i64, start: &str, end: &str) -> Result<VendorReport, ApiError> {
        self.send(
            self.request(Method::GET, "/reports/vendor-report")
                .query(&[("vendor_id", vendor_id.to_string().as_str()), ("start_date", start), ("end_date", end)]),
        )
    }

    // ---- receivables ----

    pub fn receivable_accounts(&self) -> Result<Vec<ReceivableAccount>, ApiError> {
        self.get("/receivables/accounts")
    }

    pub fn payment_history(&self) -> Result<Vec<PaymentRecord>, ApiError> {
        self.get("/receivables/history")
    }

    pub fn register_payment(&self, data: &PaymentInput) -> Result<serde_json::Value, ApiError> {
        self.post("/receivables/payments", data)
    }

    pub fn update_payment(&self, id: i64, data: &PaymentInput) -> Result<serde_json::Value, ApiError> {
        self.put(&format!("/receivables/payments/{id}"), data)
    }

    pub fn delete_payment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/receivables/payments/{id}"))
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Pulls a readable message out of an error body.
///
/// FastAPI answers `{"detail": "..."}` for HTTPException and
/// `{"detail": [{"msg": ...}, ...]}` for validation errors.
pub fn extract_detail(body: &str) -> String {
    let body = body.trim();
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|i| {
                    i.get("msg")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| i.to_string())
                })
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answers exactly one HTTP request with `status_line` and `body`,
    /// handing back the raw request text.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let content_length = text[..pos]
                        .lines()
                        .filter_map(|l| l.split_once(':'))
                        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= pos + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}/api"), handle)
    }

    fn client(base: &str) -> ApiClient {
        let http = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .default_headers(json_headers())
            .build()
            .unwrap();
        ApiClient::with_http(base, http)
    }

    #[test]
    fn sends_bearer_token_and_decodes_list() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id": 1, "nombre": "Efectivo", "tipo": "efectivo", "activo": true},
                {"id": 2, "nombre": "Nequi", "activo": false}]"#,
        );
        let api = client(&base).with_token(Some("tok-123".into()));
        let methods = api.list_payment_methods().unwrap();
        let request = server.join().unwrap().to_lowercase();

        assert!(request.starts_with("get /api/payment-methods/ http/1.1"));
        assert!(request.contains("authorization: bearer tok-123"));
        assert!(request.contains("content-type: application/json"));
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[1].data.kind, "digital");
        assert!(!methods[1].data.active);
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let (base, server) = serve_once("200 OK", "[]");
        let api = client(&base).with_token(Some(String::new()));
        api.list_clients().unwrap();
        let request = server.join().unwrap().to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[test]
    fn unauthorized_is_its_own_error() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"detail": "Email o contraseña incorrectos"}"#);
        let err = client(&base).login("a@b.co", "x").unwrap_err();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /api/auth/login"));
        assert!(request.contains(r#""email":"a@b.co""#));
        match &err {
            ApiError::Unauthorized(detail) => assert_eq!(detail, "Email o contraseña incorrectos"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.user_message("Error de autenticación"), "Email o contraseña incorrectos");
    }

    #[test]
    fn server_detail_is_surfaced() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"detail": "No se puede eliminar: el cliente tiene pedidos"}"#,
        );
        let err = client(&base).delete_client(9).unwrap_err();
        let request = server.join().unwrap();

        assert!(request.starts_with("DELETE /api/clients/9 "));
        match err {
            ApiError::Status { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "No se puede eliminar: el cliente tiene pedidos");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn query_strings() {
        let (base, server) = serve_once("200 OK", r#"{"text": "Doña Rosa $42,000\n6 r"}"#);
        let summary = client(&base).whatsapp_summary(None).unwrap();
        let request = server.join().unwrap();
        assert!(request.starts_with("GET /api/reports/whatsapp-summary?date_str= "));
        assert!(summary.text.ends_with("6 r"));

        let (base, server) = serve_once("200 OK", "[]");
        client(&base).list_products(false).unwrap();
        assert!(server.join().unwrap().starts_with("GET /api/products/?active_only=false "));

        let (base, server) = serve_once("200 OK", "[]");
        let query = OrderQuery {
            start_date: Some("2025-02-01".into()),
            end_date: Some("2025-02-28".into()),
        };
        client(&base).list_orders(&query).unwrap();
        assert!(
            server
                .join()
                .unwrap()
                .starts_with("GET /api/orders/?start_date=2025-02-01&end_date=2025-02-28 ")
        );
    }

    #[test]
    fn bad_body_is_a_decode_error() {
        let (base, server) = serve_once("200 OK", r#"{"unexpected": true}"#);
        let err = client(&base).list_suppliers().unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn status_update_is_a_patch() {
        let (base, server) = serve_once("200 OK", r#"{"ok": true}"#);
        let update = StatusUpdate {
            status: crate::model::OrderStatus::Paid,
            payment_method_id: Some(2),
        };
        client(&base).update_order_status(14, &update).unwrap();
        let request = server.join().unwrap();
        assert!(request.starts_with("PATCH /api/orders/14/status "));
        assert!(request.contains(r#""estado":"pagado""#));
        assert!(request.contains(r#""medio_pago_id":2"#));
    }

    #[test]
    fn detail_extraction() {
        assert_eq!(extract_detail(r#"{"detail": "x"}"#), "x");
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["body", "monto"], "msg": "field required"}, {"msg": "bad"}]}"#),
            "field required; bad"
        );
        assert_eq!(extract_detail("Internal Server Error"), "Internal Server Error");
        assert_eq!(extract_detail(""), "");
    }
}
