use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use budget_tracker::{
    AmountPolicy, MatchRule, NewCategoryRule, Transaction, classify, create_category_rule,
    create_transaction, default_rules, get_active_category_rules, initialize_db,
};

/// A utility for creating a test database for the budget tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Merchant, amount in cents and account for each sample transaction.
const SAMPLE_TRANSACTIONS: [(&str, i64, &str); 10] = [
    ("ACME Corp Payroll", 325_000, "checking"),
    ("Starbucks", -575, "credit_card"),
    ("Whole Foods Market", -8_642, "credit_card"),
    ("Uber Trip", -2_350, "credit_card"),
    ("Netflix", -1_599, "credit_card"),
    ("Oak Street Property Management", -180_000, "checking"),
    ("Hydro One", -9_812, "checking"),
    ("Amazon Marketplace", -4_299, "credit_card"),
    ("Local Bookshop", -2_450, "credit_card"),
    ("Transfer to Savings", 50_000, "savings"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating category rules...");

    create_category_rule(
        NewCategoryRule::new("bookshop|books", "Books")
            .priority(10)
            .notes(Some("Checked before the built-in shopping rule".to_owned())),
        &connection,
    )?;
    create_category_rule(
        NewCategoryRule::new("transfer to savings", "Savings").priority(5),
        &connection,
    )?;
    create_category_rule(
        NewCategoryRule::new("lottery", "Windfall").active(false),
        &connection,
    )?;

    println!("Creating transactions...");

    let rules: Vec<MatchRule> = get_active_category_rules(&connection)?
        .iter()
        .map(MatchRule::from)
        .chain(default_rules())
        .collect();
    let today = OffsetDateTime::now_utc().date();

    for (days_ago, (merchant, cents, account)) in SAMPLE_TRANSACTIONS.into_iter().enumerate() {
        let date = today - Duration::days(days_ago as i64);
        let category = classify(merchant, &rules);

        create_transaction(
            Transaction::build(date, Decimal::new(cents, 2), merchant, account)
                .category(Some(category)),
            AmountPolicy::Signed,
            &connection,
        )?;
    }

    println!("Success!");

    Ok(())
}
