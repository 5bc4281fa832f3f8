/// quick start - minimal example to get started
use loan_servicing_rs::chrono::NaiveDate;
use loan_servicing_rs::{Currency, LoanEngine, LoanView, Money, Uuid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let engine = LoanEngine::standard();

    // lend 5,000 SGD over 6 monthly installments
    let loan = engine.create_loan_now(
        Uuid::new_v4(),
        Money::from_major(5_000),
        Currency::SGD,
        6,
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )?;

    // the borrower pays one installment
    engine.apply_payment_now(
        loan.id,
        Money::from_major(833),
        Currency::SGD,
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
    )?;

    // print current state
    let aggregate = engine.loan(loan.id)?;
    println!("{}", LoanView::from_aggregate(&aggregate).to_json_pretty()?);

    Ok(())
}
