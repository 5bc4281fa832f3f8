/// json state - persist a loan aggregate as json and restore it
use loan_servicing_rs::chrono::NaiveDate;
use loan_servicing_rs::{Currency, LoanAggregate, LoanEngine, Money, Uuid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let engine = LoanEngine::standard();

    let loan = engine.create_loan_now(
        Uuid::new_v4(),
        Money::from_major(1_200),
        Currency::VND,
        4,
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    )?;
    engine.apply_payment_now(
        loan.id,
        Money::from_major(300),
        Currency::VND,
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
    )?;

    let aggregate = engine.loan(loan.id)?;
    let json = serde_json::to_string_pretty(&aggregate)?;
    println!("{json}");

    let restored: LoanAggregate = serde_json::from_str(&json)?;
    restored.check_invariants()?;
    assert_eq!(restored.loan.outstanding_balance, Money::from_major(900));
    println!("restored aggregate passes every invariant");

    Ok(())
}
