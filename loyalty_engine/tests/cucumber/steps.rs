use std::str::FromStr;

use cucumber::{given, then, when};
use loyalty_engine::{
    db_types::{OrderStatusType, Points},
    AccrualStatus,
    BalanceApiError,
    LedgerRepository,
    OrderSubmission,
};

use crate::{cucumber::LedgerWorld, support::mock_oracle::Answer};

fn points(value: f64) -> Points {
    Points::try_from(value).expect("Not a valid points value")
}

fn accrual_status(s: &str) -> AccrualStatus {
    match s {
        "REGISTERED" => AccrualStatus::Registered,
        "PROCESSING" => AccrualStatus::Processing,
        "INVALID" => AccrualStatus::Invalid,
        "PROCESSED" => AccrualStatus::Processed,
        s => panic!("Unknown accrual status {s}"),
    }
}

#[given(expr = "the accrual system reports order {word} as PROCESSED with {float} points")]
async fn oracle_processed(world: &mut LedgerWorld, number: String, value: f64) {
    world.system().oracle.processed(&number, value);
}

#[given(expr = "the accrual system reports order {word} as {word}")]
async fn oracle_status(world: &mut LedgerWorld, number: String, status: String) {
    world.system().oracle.status(&number, accrual_status(&status));
}

#[given(expr = "the accrual system does not know order {word}")]
async fn oracle_unknown(world: &mut LedgerWorld, number: String) {
    world.system().oracle.set(&number, Answer::NotRegistered);
}

#[given(expr = "the accrual system fails for order {word}")]
async fn oracle_fails(world: &mut LedgerWorld, number: String) {
    world.system().oracle.set(&number, Answer::Fails(500));
}

#[when(expr = "'{word}' uploads order {word}")]
async fn upload_order(world: &mut LedgerWorld, login: String, number: String) {
    let user_id = world.user_id(&login);
    let outcome = world.system().orders.register_order_number(user_id, &number).await;
    world.last_submission = Some(outcome);
}

#[when("the reconciliation pass runs")]
async fn reconcile(world: &mut LedgerWorld) {
    world.system().balances.reconcile_pending_orders().await.expect("Reconciliation pass failed");
}

#[when(expr = "'{word}' withdraws {float} points against order {word}")]
async fn withdraw(world: &mut LedgerWorld, login: String, value: f64, number: String) {
    let user_id = world.user_id(&login);
    let result = world.system().balances.withdraw(user_id, &number, points(value)).await;
    world.last_withdrawal = Some(result);
}

#[then(expr = "the upload is {word}")]
async fn check_submission(world: &mut LedgerWorld, expected: String) {
    let expected = match expected.as_str() {
        "accepted" => OrderSubmission::Accepted,
        "a_repeat" => OrderSubmission::SubmittedByThisUser,
        "taken" => OrderSubmission::SubmittedByAnotherUser,
        "malformed" => OrderSubmission::InvalidFormat,
        s => panic!("Unknown submission outcome {s}"),
    };
    assert_eq!(world.last_submission, Some(expected));
}

#[then(expr = "order {word} has status {word}")]
async fn check_order_status(world: &mut LedgerWorld, number: String, status: String) {
    let order = world.system().db.find_order_by_number(&number).await.expect("Order not found");
    let expected = OrderStatusType::from_str(&status).expect("Not a valid order status");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} has an accrual of {float} points")]
async fn check_order_accrual(world: &mut LedgerWorld, number: String, value: f64) {
    let order = world.system().db.find_order_by_number(&number).await.expect("Order not found");
    assert_eq!(order.accrual, points(value));
}

#[then(expr = "'{word}' has {float} points available and {float} points withdrawn")]
async fn check_balance(world: &mut LedgerWorld, login: String, current: f64, withdrawn: f64) {
    let user_id = world.user_id(&login);
    let balance = world.system().balances.balance(user_id).await.expect("Error fetching balance");
    assert_eq!(balance.current, points(current), "Current balance is incorrect");
    assert_eq!(balance.withdrawn, points(withdrawn), "Withdrawn total is incorrect");
}

#[then(expr = "'{word}' has {int} orders")]
async fn check_order_count(world: &mut LedgerWorld, login: String, count: usize) {
    let user_id = world.user_id(&login);
    let orders = world.system().orders.order_list(user_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then("the withdrawal succeeds")]
async fn check_withdrawal_ok(world: &mut LedgerWorld) {
    let result = world.last_withdrawal.as_ref().expect("No withdrawal was attempted");
    assert!(result.is_ok(), "Withdrawal failed: {result:?}");
}

#[then(expr = "the withdrawal is rejected for {word}")]
async fn check_withdrawal_rejected(world: &mut LedgerWorld, reason: String) {
    let result = world.last_withdrawal.as_ref().expect("No withdrawal was attempted");
    match (reason.as_str(), result) {
        ("insufficient_balance", Err(BalanceApiError::InsufficientBalance)) => {},
        ("invalid_order", Err(BalanceApiError::InvalidOrderFormat)) => {},
        ("invalid_amount", Err(BalanceApiError::InvalidAmount)) => {},
        (reason, result) => panic!("Expected a rejection for {reason}, got {result:?}"),
    }
}

#[then(expr = "'{word}' has {int} withdrawals")]
async fn check_withdrawal_count(world: &mut LedgerWorld, login: String, count: usize) {
    let user_id = world.user_id(&login);
    let withdrawals = world.system().balances.withdrawals(user_id).await.expect("Error fetching withdrawals");
    assert_eq!(withdrawals.len(), count);
}
