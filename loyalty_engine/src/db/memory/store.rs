use std::collections::BTreeMap;

use chrono::Utc;

use crate::{
    db::traits::LedgerError,
    db_types::{NewWithdrawal, Order, OrderStatusType, Points, User, Withdrawal},
};

/// The three ledger collections, plus the id sequences that feed them.
///
/// Every method either fails without touching the collections, or succeeds completely.
#[derive(Debug, Clone, Default)]
pub(crate) struct Collections {
    users: BTreeMap<i64, User>,
    orders: BTreeMap<i64, Order>,
    withdrawals: BTreeMap<i64, Withdrawal>,
    last_user_id: i64,
    last_order_id: i64,
    last_withdrawal_id: i64,
}

impl Collections {
    pub fn add_user(&mut self, login: &str, password: &str) -> Result<User, LedgerError> {
        if self.users.values().any(|u| u.login == login) {
            return Err(LedgerError::LoginAlreadyExists);
        }
        self.last_user_id += 1;
        let user = User {
            id: self.last_user_id,
            login: login.to_string(),
            password: password.to_string(),
            accrued_total: Points::default(),
            withdrawn_total: Points::default(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn find_user_by_login(&self, login: &str) -> Result<User, LedgerError> {
        self.users
            .values()
            .find(|u| u.login == login)
            .cloned()
            .ok_or_else(|| LedgerError::UserLoginNotFound(login.to_string()))
    }

    pub fn find_user_by_id(&self, user_id: i64) -> Result<User, LedgerError> {
        self.users.get(&user_id).cloned().ok_or(LedgerError::UserNotFound(user_id))
    }

    pub fn add_order(&mut self, number: &str, user_id: i64) -> Result<Order, LedgerError> {
        if !self.users.contains_key(&user_id) {
            return Err(LedgerError::UserNotFound(user_id));
        }
        if self.orders.values().any(|o| o.number == number) {
            return Err(LedgerError::OrderAlreadyExists(number.to_string()));
        }
        self.last_order_id += 1;
        let order = Order {
            id: self.last_order_id,
            number: number.to_string(),
            user_id,
            status: OrderStatusType::New,
            accrual: Points::default(),
            uploaded_at: Utc::now(),
        };
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    pub fn find_order_by_number(&self, number: &str) -> Result<Order, LedgerError> {
        self.orders
            .values()
            .find(|o| o.number == number)
            .cloned()
            .ok_or_else(|| LedgerError::OrderNotFound(number.to_string()))
    }

    pub fn orders_for_user(&self, user_id: i64) -> Vec<Order> {
        let mut orders = self.orders.values().filter(|o| o.user_id == user_id).cloned().collect::<Vec<_>>();
        orders.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        orders
    }

    pub fn unprocessed_orders(&self) -> Vec<Order> {
        self.orders.values().filter(|o| !o.status.is_terminal()).cloned().collect()
    }

    pub fn update_order_status(
        &mut self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError> {
        let order = self.orders.get_mut(&order_id).ok_or_else(|| LedgerError::OrderNotFound(order_id.to_string()))?;
        order.status = status;
        order.accrual = if status == OrderStatusType::Processed { accrual } else { Points::default() };
        Ok(())
    }

    pub fn update_user_accrued_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        let user = self.users.get_mut(&user_id).ok_or(LedgerError::UserNotFound(user_id))?;
        user.accrued_total = total;
        Ok(())
    }

    pub fn update_user_withdrawn_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        let user = self.users.get_mut(&user_id).ok_or(LedgerError::UserNotFound(user_id))?;
        user.withdrawn_total = total;
        Ok(())
    }

    pub fn add_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        if !self.users.contains_key(&withdrawal.user_id) {
            return Err(LedgerError::UserNotFound(withdrawal.user_id));
        }
        self.last_withdrawal_id += 1;
        let withdrawal = Withdrawal {
            id: self.last_withdrawal_id,
            user_id: withdrawal.user_id,
            order_number: withdrawal.order_number,
            amount: withdrawal.amount,
            processed_at: withdrawal.processed_at,
        };
        self.withdrawals.insert(withdrawal.id, withdrawal.clone());
        Ok(withdrawal)
    }

    pub fn withdrawals_for_user(&self, user_id: i64) -> Vec<Withdrawal> {
        let mut withdrawals =
            self.withdrawals.values().filter(|w| w.user_id == user_id).cloned().collect::<Vec<_>>();
        withdrawals.sort_by(|a, b| b.processed_at.cmp(&a.processed_at).then(b.id.cmp(&a.id)));
        withdrawals
    }

    pub fn sum_withdrawals_for_user(&self, user_id: i64) -> Result<Points, LedgerError> {
        let amounts = self.withdrawals.values().filter(|w| w.user_id == user_id).map(|w| w.amount);
        Points::checked_sum(amounts).ok_or(LedgerError::TotalOutOfRange(user_id))
    }

    pub fn sum_accruals_for_user(&self, user_id: i64) -> Result<Points, LedgerError> {
        let amounts = self
            .orders
            .values()
            .filter(|o| o.user_id == user_id && o.status == OrderStatusType::Processed)
            .map(|o| o.accrual);
        Points::checked_sum(amounts).ok_or(LedgerError::TotalOutOfRange(user_id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accruals_only_count_processed_orders() {
        let mut store = Collections::default();
        let user = store.add_user("alice", "hash").unwrap();
        let a = store.add_order("79927398713", user.id).unwrap();
        let b = store.add_order("12345678903", user.id).unwrap();
        store.update_order_status(a.id, OrderStatusType::Processed, Points::from(5)).unwrap();
        store.update_order_status(b.id, OrderStatusType::Invalid, Points::from(7)).unwrap();
        assert_eq!(store.sum_accruals_for_user(user.id).unwrap(), Points::from(5));
        assert_eq!(store.find_order_by_number("12345678903").unwrap().accrual, Points::default());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut store = Collections::default();
        let user = store.add_user("alice", "hash").unwrap();
        assert!(matches!(store.add_user("alice", "other"), Err(LedgerError::LoginAlreadyExists)));
        store.add_order("18", user.id).unwrap();
        assert!(matches!(store.add_order("18", user.id), Err(LedgerError::OrderAlreadyExists(n)) if n == "18"));
        assert!(matches!(store.add_order("26", 99), Err(LedgerError::UserNotFound(99))));
    }

    #[test]
    fn totals_that_overflow_are_errors() {
        let mut store = Collections::default();
        let user = store.add_user("alice", "hash").unwrap();
        let huge = Points::from_units(i64::MAX / 2 + 1);
        for number in ["79927398713", "12345678903"] {
            let order = store.add_order(number, user.id).unwrap();
            store.update_order_status(order.id, OrderStatusType::Processed, huge).unwrap();
            store.add_withdrawal(NewWithdrawal::new(user.id, number.into(), huge)).unwrap();
        }
        assert!(matches!(store.sum_accruals_for_user(user.id), Err(LedgerError::TotalOutOfRange(id)) if id == user.id));
        assert!(matches!(store.sum_withdrawals_for_user(user.id), Err(LedgerError::TotalOutOfRange(_))));
    }
}
