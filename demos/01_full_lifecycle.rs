/// full lifecycle - create a loan and repay it installment by installment
use loan_servicing_rs::chrono::{NaiveDate, TimeZone, Utc};
use loan_servicing_rs::{
    Currency, LoanEngine, LoanStatus, Money, SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let engine = LoanEngine::standard();
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
    ));

    let loan = engine.create_loan(
        Uuid::new_v4(),
        Money::from_major(1_000),
        Currency::SGD,
        3,
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        &time,
    )?;

    let aggregate = engine.loan(loan.id)?;
    println!("schedule:");
    for installment in &aggregate.installments {
        println!("  {}  {}", installment.due_date, installment.amount);
    }

    // pay each installment on its due date
    for (due_date, amount) in [
        (NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), 333),
        (NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 333),
        (NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(), 334),
    ] {
        engine.apply_payment(loan.id, Money::from_major(amount), Currency::SGD, due_date, &time)?;
        let aggregate = engine.loan(loan.id)?;
        println!(
            "paid {amount} on {due_date}, outstanding now {}",
            aggregate.loan.outstanding_balance
        );
    }

    let aggregate = engine.loan(loan.id)?;
    assert_eq!(aggregate.loan.status, LoanStatus::Repaid);
    println!("loan fully repaid");

    println!("events:");
    for event in engine.take_events() {
        println!("  {event:?}");
    }

    Ok(())
}
