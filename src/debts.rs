//! Receivable arithmetic over data already fetched from the API.

use crate::format::parse_timestamp;
use crate::model::{Order, OrderStatus, ReceivableAccount};

/// Balances below this are rounding noise, not debt.
pub const DEBT_EPSILON: f64 = 0.01;

/// What is still owed on an order.
pub fn outstanding(order: &Order) -> f64 {
    order.total - order.amount_paid.unwrap_or(0.0)
}

/// Orders of `client_id` that still owe more than a cent.
pub fn pending_orders_for(orders: &[Order], client_id: i64) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| o.client_id == client_id && outstanding(o) > DEBT_EPSILON)
        .cloned()
        .collect()
}

/// Rebuilds receivable accounts from a list of orders.
///
/// Only pending/partial orders with positive balance count. Groups keep the
/// order in which each client first appears.
pub fn group_debtors(orders: &[Order]) -> Vec<ReceivableAccount> {
    let mut accounts: Vec<ReceivableAccount> = Vec::new();

    for order in orders.iter().filter(|o| o.status.is_open()) {
        let debt = outstanding(order);
        if debt <= 0.0 {
            continue;
        }

        let idx = match accounts.iter().position(|a| a.client_id == order.client_id) {
            Some(i) => i,
            None => {
                accounts.push(ReceivableAccount {
                    client_id: order.client_id,
                    name: order.client_label(),
                    total_debt: 0.0,
                    pending_orders: 0,
                    oldest_date: None,
                });
                accounts.len() - 1
            }
        };

        let account = &mut accounts[idx];
        account.total_debt += debt;
        account.pending_orders += 1;
        if is_older(&order.date, account.oldest_date.as_deref()) {
            account.oldest_date = Some(order.date.clone());
        }
    }

    accounts
}

fn is_older(candidate: &str, current: Option<&str>) -> bool {
    if candidate.trim().is_empty() {
        return false;
    }
    let Some(current) = current else {
        return true;
    };
    match (parse_timestamp(candidate), parse_timestamp(current)) {
        (Some(a), Some(b)) => a < b,
        _ => candidate < current,
    }
}

pub fn total_debt(accounts: &[ReceivableAccount]) -> f64 {
    accounts.iter().map(|a| a.total_debt).sum()
}

/// Sales of a period: every order that was not cancelled.
pub fn sales_total(orders: &[Order]) -> f64 {
    orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .map(|o| o.total)
        .sum()
}

/// Orders whose timestamp falls on `date` (`YYYY-MM-DD`).
pub fn orders_on(orders: &[Order], date: &str) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| o.date.starts_with(date))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, client: i64, name: &str, date: &str, total: f64, paid: Option<f64>, status: OrderStatus) -> Order {
        Order {
            id,
            client_id: client,
            client_name: Some(name.to_string()),
            date: date.to_string(),
            total,
            delivery_fee: None,
            payment_method_id: None,
            status,
            amount_paid: paid,
            items: vec![],
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order(1, 10, "Tienda Sol", "2025-03-05T09:00:00", 50000.0, None, OrderStatus::Pending),
            order(2, 20, "Panadería Luna", "2025-03-01T08:00:00", 30000.0, Some(10000.0), OrderStatus::Partial),
            order(3, 10, "Tienda Sol", "2025-02-20T17:30:00", 12000.0, Some(2000.0), OrderStatus::Partial),
            order(4, 10, "Tienda Sol", "2025-01-01T10:00:00", 9000.0, None, OrderStatus::Paid),
            order(5, 30, "Don Pepe", "2025-03-02T10:00:00", 8000.0, Some(8000.0), OrderStatus::Pending),
            order(6, 20, "Panadería Luna", "2025-02-01T10:00:00", 4000.0, None, OrderStatus::Cancelled),
        ]
    }

    #[test]
    fn groups_open_debt_by_client() {
        let accounts = group_debtors(&sample());
        assert_eq!(accounts.len(), 2);

        assert_eq!(accounts[0].client_id, 10);
        assert_eq!(accounts[0].name, "Tienda Sol");
        assert_eq!(accounts[0].total_debt, 60000.0);
        assert_eq!(accounts[0].pending_orders, 2);
        assert_eq!(accounts[0].oldest_date.as_deref(), Some("2025-02-20T17:30:00"));

        assert_eq!(accounts[1].client_id, 20);
        assert_eq!(accounts[1].total_debt, 20000.0);
        assert_eq!(accounts[1].pending_orders, 1);

        assert_eq!(total_debt(&accounts), 80000.0);
    }

    #[test]
    fn oldest_date_compares_mixed_formats() {
        let orders = vec![
            order(1, 1, "A", "2025-03-01T00:00:00+00:00", 10.0, None, OrderStatus::Pending),
            order(2, 1, "A", "2025-02-28 23:00:00", 10.0, None, OrderStatus::Pending),
        ];
        let accounts = group_debtors(&orders);
        assert_eq!(accounts[0].oldest_date.as_deref(), Some("2025-02-28 23:00:00"));
    }

    #[test]
    fn pending_orders_skip_cent_residue() {
        let mut orders = sample();
        orders.push(order(7, 10, "Tienda Sol", "2025-03-06T09:00:00", 100.0, Some(99.995), OrderStatus::Partial));
        let pending: Vec<i64> = pending_orders_for(&orders, 10).iter().map(|o| o.id).collect();
        assert_eq!(pending, vec![1, 3, 4]);
    }

    #[test]
    fn monthly_sales_exclude_cancelled() {
        assert_eq!(sales_total(&sample()), 50000.0 + 30000.0 + 12000.0 + 9000.0 + 8000.0);
        assert_eq!(sales_total(&[]), 0.0);
    }

    #[test]
    fn orders_of_a_day() {
        let ids: Vec<i64> = orders_on(&sample(), "2025-03-01").iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2]);
    }
}
