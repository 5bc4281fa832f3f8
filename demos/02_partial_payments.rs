/// partial payments - how the two allocation policies treat a partially
/// settled installment on the next payment
use loan_servicing_rs::chrono::{NaiveDate, TimeZone, Utc};
use loan_servicing_rs::{
    Currency, EngineConfig, LoanEngine, Money, SafeTimeProvider, TimeSource, Uuid,
};

fn run(label: &str, config: EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = LoanEngine::new(config);
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
    ));

    // three installments of 100 each
    let loan = engine.create_loan(
        Uuid::new_v4(),
        Money::from_major(300),
        Currency::SGD,
        3,
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        &time,
    )?;

    // 150 settles the first installment and half of the second
    engine.apply_payment(
        loan.id,
        Money::from_major(150),
        Currency::SGD,
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        &time,
    )?;

    // where the second 150 lands depends on the policy
    engine.apply_payment(
        loan.id,
        Money::from_major(150),
        Currency::SGD,
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        &time,
    )?;

    let aggregate = engine.loan(loan.id)?;
    println!("{label}:");
    for installment in &aggregate.installments {
        println!(
            "  {}  amount {}  outstanding {}  {:?}",
            installment.due_date,
            installment.amount,
            installment.outstanding_balance,
            installment.status
        );
    }
    println!("  loan outstanding {}\n", aggregate.loan.outstanding_balance);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run("due-only (default)", EngineConfig::standard())?;
    run("due-or-partial", EngineConfig::due_or_partial())?;
    Ok(())
}
