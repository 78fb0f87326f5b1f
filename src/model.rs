use serde::{Deserialize, Deserializer, Serialize};

fn default_true() -> bool {
    true
}

/// Legacy rows send `null` where a value is expected; read it as the default.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// Nullable `activo` column: `null` counts as active.
fn null_as_true<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Option::<bool>::deserialize(d).map(|v| v.unwrap_or_else(default_true))
}

fn null_as_method_kind<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(|v| v.unwrap_or_else(default_method_kind))
}

// ==========================================
// Auth
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub rol: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

// ==========================================
// Clients
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Client {
    pub id: i64,
    #[serde(flatten)]
    pub data: ClientInput,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
}

/// Editable client fields, also the create/update payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClientInput {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo_cliente", default = "default_client_type")]
    pub client_type: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    #[serde(rename = "canal_venta", default)]
    pub sales_channel: Option<String>,
    #[serde(rename = "condicion_pago", default)]
    pub payment_terms: Option<String>,
    #[serde(rename = "cupo_credito", default)]
    pub credit_limit: Option<f64>,
    #[serde(rename = "mostrar_saldo_whatsapp", default)]
    pub show_balance_in_whatsapp: Option<bool>,
}

fn default_client_type() -> String {
    "local".to_string()
}

// ==========================================
// Products
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: i64,
    #[serde(flatten)]
    pub data: ProductInput,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductInput {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "codigo_corto")]
    pub short_code: String,
    #[serde(rename = "tipo_producto")]
    pub product_type: String,
    #[serde(rename = "precio_estandar")]
    pub standard_price: f64,
    #[serde(rename = "costo_unitario")]
    pub unit_cost: f64,
    #[serde(rename = "unidad_medida")]
    pub unit: String,
    #[serde(rename = "activo", default = "default_true", deserialize_with = "null_as_true")]
    pub active: bool,
    #[serde(rename = "proveedor_id", default)]
    pub supplier_id: Option<i64>,
}

// ==========================================
// Orders
// ==========================================

/// Order state as reported by the backend. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Partial,
    Paid,
    Cancelled,
    Credit,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::Partial => "parcial",
            OrderStatus::Paid => "pagado",
            OrderStatus::Cancelled => "cancelado",
            OrderStatus::Credit => "credito",
            OrderStatus::Other(s) => s,
        }
    }

    /// Still owes money: pending or partially paid.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Partial)
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "pendiente" => OrderStatus::Pending,
            "parcial" => OrderStatus::Partial,
            "pagado" => OrderStatus::Paid,
            "cancelado" => OrderStatus::Cancelled,
            "credito" => OrderStatus::Credit,
            _ => OrderStatus::Other(s),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(s: OrderStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    #[serde(rename = "producto_nombre", default)]
    pub product_name: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: i64,
    #[serde(rename = "precio_aplicado")]
    pub unit_price: f64,
    pub subtotal: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "cliente_nombre", default)]
    pub client_name: Option<String>,
    #[serde(rename = "fecha")]
    pub date: String,
    pub total: f64,
    #[serde(rename = "valor_domicilio", default)]
    pub delivery_fee: Option<f64>,
    #[serde(rename = "medio_pago_id", default)]
    pub payment_method_id: Option<i64>,
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    #[serde(rename = "monto_pagado", default)]
    pub amount_paid: Option<f64>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn delivery(&self) -> f64 {
        self.delivery_fee.unwrap_or(0.0)
    }

    pub fn client_label(&self) -> String {
        self.client_name
            .clone()
            .unwrap_or_else(|| format!("Cliente #{}", self.client_id))
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewOrderItem {
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    #[serde(rename = "cantidad")]
    pub quantity: i64,
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewOrder {
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "medio_pago_id")]
    pub payment_method_id: Option<i64>,
    pub items: Vec<NewOrderItem>,
    #[serde(rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "valor_domicilio")]
    pub delivery_fee: f64,
    #[serde(rename = "estado")]
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatusUpdate {
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    #[serde(rename = "medio_pago_id")]
    pub payment_method_id: Option<i64>,
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct OrderQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

// ==========================================
// Expenses & Suppliers
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Expense {
    pub id: i64,
    #[serde(flatten)]
    pub data: ExpenseInput,
    #[serde(rename = "proveedor_nombre", default, skip_serializing)]
    pub supplier_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExpenseInput {
    #[serde(rename = "concepto")]
    pub concept: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "tipo_gasto")]
    pub expense_type: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "proveedor_id", default)]
    pub supplier_id: Option<i64>,
    #[serde(rename = "medio_pago_id", default)]
    pub payment_method_id: Option<i64>,
    #[serde(rename = "pedido_id", default)]
    pub order_id: Option<i64>,
    #[serde(rename = "observaciones", default)]
    pub notes: Option<String>,
    #[serde(rename = "fecha_pago", default)]
    pub paid_at: Option<String>,
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct ExpenseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Supplier {
    pub id: i64,
    #[serde(flatten)]
    pub data: SupplierInput,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SupplierInput {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "contacto", default)]
    pub contact: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "tipo_insumo", default)]
    pub supply_type: Option<String>,
    #[serde(rename = "activo", default = "default_true", deserialize_with = "null_as_true")]
    pub active: bool,
}

// ==========================================
// Payment methods & transfers
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentMethod {
    pub id: i64,
    #[serde(flatten)]
    pub data: PaymentMethodInput,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentMethodInput {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo", default = "default_method_kind", deserialize_with = "null_as_method_kind")]
    pub kind: String,
    #[serde(rename = "activo", default = "default_true", deserialize_with = "null_as_true")]
    pub active: bool,
}

fn default_method_kind() -> String {
    "digital".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transfer {
    pub id: i64,
    #[serde(flatten)]
    pub data: TransferInput,
    #[serde(rename = "origen_nombre", default, skip_serializing)]
    pub origin_name: Option<String>,
    #[serde(rename = "destino_nombre", default, skip_serializing)]
    pub destination_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TransferInput {
    #[serde(rename = "origen_id")]
    pub origin_id: i64,
    #[serde(rename = "destino_id")]
    pub destination_id: i64,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

/// One row of `/transfers/balances`.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountBalance {
    #[serde(alias = "medio_pago_id", default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", alias = "medio_pago")]
    pub name: String,
    #[serde(rename = "saldo", alias = "saldo_actual", default, deserialize_with = "null_as_default")]
    pub balance: f64,
}

// ==========================================
// Reports
// ==========================================

#[derive(Debug, Deserialize, Clone)]
pub struct DebtorSummary {
    #[serde(default)]
    pub cuenta_cobrar_id: Option<i64>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "saldo", default, deserialize_with = "null_as_default")]
    pub balance: f64,
    #[serde(rename = "fecha_vencimiento", default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Dashboard {
    #[serde(rename = "ventas", alias = "ventas_hoy", default, deserialize_with = "null_as_default")]
    pub sales: f64,
    #[serde(rename = "gastos", alias = "gastos_hoy", default, deserialize_with = "null_as_default")]
    pub expenses: f64,
    #[serde(rename = "utilidad_estimada", default, deserialize_with = "null_as_default")]
    pub estimated_profit: f64,
    #[serde(rename = "clientes_deudores", default, deserialize_with = "null_as_default")]
    pub debtors: Vec<DebtorSummary>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WhatsappSummary {
    #[serde(default)]
    pub text: String,
}

/// Party a report is about (client or supplier).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ReportParty {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub nombre: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClientReport {
    #[serde(alias = "client", default)]
    pub cliente: ReportParty,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(alias = "orders", default)]
    pub pedidos: Vec<Order>,
    #[serde(alias = "payments", default)]
    pub abonos: Vec<PaymentRecord>,
    #[serde(default)]
    pub total_ventas: Option<f64>,
    #[serde(default)]
    pub total_abonos: Option<f64>,
    #[serde(default)]
    pub saldo: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VendorReport {
    #[serde(alias = "vendor", alias = "supplier", default)]
    pub proveedor: ReportParty,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(alias = "expenses", default)]
    pub gastos: Vec<Expense>,
    #[serde(default)]
    pub total_gastos: Option<f64>,
}

// ==========================================
// Receivables
// ==========================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReceivableAccount {
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "total_deuda")]
    pub total_debt: f64,
    #[serde(rename = "ordenes_pendientes", default)]
    pub pending_orders: u32,
    #[serde(rename = "fecha_mas_antigua", default)]
    pub oldest_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentRecord {
    pub id: i64,
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "cliente", default)]
    pub client_name: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha", default)]
    pub date: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "metodo_pago_id", default)]
    pub payment_method_id: Option<i64>,
    #[serde(rename = "medio_pago", default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PaymentInput {
    #[serde(rename = "cliente_id")]
    pub client_id: i64,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "metodo_pago_id")]
    pub payment_method_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_keeps_unknown_values() {
        let s: OrderStatus = serde_json::from_str("\"en_ruta\"").unwrap();
        assert_eq!(s, OrderStatus::Other("en_ruta".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"en_ruta\"");

        let paid: OrderStatus = serde_json::from_str("\"pagado\"").unwrap();
        assert_eq!(paid, OrderStatus::Paid);
        assert!(!paid.is_open());
        assert!(OrderStatus::Partial.is_open());
    }

    #[test]
    fn order_decodes_backend_shape() {
        let json = r#"{
            "id": 7, "cliente_id": 3, "cliente_nombre": "Tienda La 14",
            "fecha": "2025-03-02T10:15:00", "total": 42000.0,
            "medio_pago_id": null, "estado": "pendiente",
            "items": [{"id": 1, "producto_id": 2, "producto_nombre": "Arepa Rellena",
                       "cantidad": 6, "precio_aplicado": 7000.0, "subtotal": 42000.0}]
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.client_label(), "Tienda La 14");
        assert_eq!(order.delivery(), 0.0);
        assert_eq!(order.amount_paid, None);
        assert_eq!(order.items[0].quantity, 6);
    }

    #[test]
    fn dashboard_accepts_both_field_spellings() {
        let a: Dashboard = serde_json::from_str(r#"{"ventas_hoy": 100, "gastos_hoy": 40, "utilidad_estimada": 60}"#).unwrap();
        assert_eq!(a.sales, 100.0);
        assert_eq!(a.expenses, 40.0);
        assert!(a.debtors.is_empty());

        let b: Dashboard = serde_json::from_str(r#"{"ventas": 5, "gastos": 1}"#).unwrap();
        assert_eq!(b.sales, 5.0);
        assert_eq!(b.estimated_profit, 0.0);
    }

    #[test]
    fn client_payload_uses_backend_names() {
        let input = ClientInput {
            name: "Doña Rosa".into(),
            client_type: "mayorista".into(),
            phone: Some("3001234567".into()),
            address: None,
            city: Some("Bogotá".into()),
            sales_channel: Some("whatsapp".into()),
            payment_terms: Some("credito".into()),
            credit_limit: None,
            show_balance_in_whatsapp: None,
        };
        let v = serde_json::to_value(&input).unwrap();
        assert_eq!(v["nombre"], "Doña Rosa");
        assert_eq!(v["tipo_cliente"], "mayorista");
        assert_eq!(v["canal_venta"], "whatsapp");
    }

    #[test]
    fn legacy_nulls_read_as_defaults() {
        let methods: Vec<PaymentMethod> = serde_json::from_str(
            r#"[{"id": 1, "nombre": "Nequi", "tipo": "digital", "activo": true},
                {"id": 2, "nombre": "Caja vieja", "tipo": null, "activo": null}]"#,
        )
        .unwrap();
        assert_eq!(methods[1].data.kind, "digital");
        assert!(methods[1].data.active);

        let product: Product = serde_json::from_str(
            r#"{"id": 4, "nombre": "Arepa Boyacense", "codigo_corto": "AB", "tipo_producto": "arepa",
                "precio_estandar": 7000, "costo_unitario": 4200, "unidad_medida": "paquete",
                "activo": null}"#,
        )
        .unwrap();
        assert!(product.data.active);

        let supplier: Supplier =
            serde_json::from_str(r#"{"id": 9, "nombre": "Lácteos del Valle", "activo": null}"#).unwrap();
        assert!(supplier.data.active);
    }

    #[test]
    fn dashboard_tolerates_null_totals() {
        let d: Dashboard = serde_json::from_str(
            r#"{"ventas_hoy": null, "gastos_hoy": 12000, "utilidad_estimada": null,
                "clientes_deudores": [{"nombre": "Tienda", "saldo": null}]}"#,
        )
        .unwrap();
        assert_eq!(d.sales, 0.0);
        assert_eq!(d.expenses, 12000.0);
        assert_eq!(d.estimated_profit, 0.0);
        assert_eq!(d.debtors[0].balance, 0.0);

        let empty: Dashboard = serde_json::from_str(r#"{"clientes_deudores": null}"#).unwrap();
        assert!(empty.debtors.is_empty());
    }
}
