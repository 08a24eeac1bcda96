use std::fmt::Write as _;

use time::{Date, Month};

use crate::application::random::RandomRange;

use super::format::{write_balance, write_transaction};
use super::{LedgerWriter, WriterError};

const DEFAULT_TITLE: &str = "Example Beancount file";
const ADULT_AGE_YEARS: i32 = 18;

const CHECKING: &str = "Assets:US:BofA:Checking";
const CREDIT_CARD: &str = "Liabilities:US:Chase:Slate";
const SALARY: &str = "Income:US:Hooli:Salary";
const OPENING_BALANCES: &str = "Equity:Opening-Balances";
const RENT: &str = "Expenses:Home:Rent";
const ELECTRICITY: &str = "Expenses:Home:Electricity";
const GROCERIES: &str = "Expenses:Food:Groceries";
const RESTAURANT: &str = "Expenses:Food:Restaurant";

const ACCOUNTS: [&str; 8] = [
    OPENING_BALANCES,
    CHECKING,
    CREDIT_CARD,
    SALARY,
    RENT,
    ELECTRICITY,
    GROCERIES,
    RESTAURANT,
];

const GROCERY_STORES: [&str; 4] = [
    "Onion Market",
    "Good Moods Market",
    "Corner Deli",
    "Farmer Fresh",
];

const RESTAURANTS: [&str; 6] = [
    "Rose Flower",
    "Cafe Modagor",
    "Kin Soy",
    "Uncle Boons",
    "China Garden",
    "Jewel of Morroco",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Posting {
    pub account: &'static str,
    pub cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Transaction {
    pub date: Date,
    pub flag: char,
    pub payee: &'static str,
    pub narration: String,
    pub postings: Vec<Posting>,
}

impl Transaction {
    fn transfer(
        date: Date,
        payee: &'static str,
        narration: impl Into<String>,
        to: &'static str,
        from: &'static str,
        cents: i64,
    ) -> Self {
        Self {
            date,
            flag: '*',
            payee,
            narration: narration.into(),
            postings: vec![
                Posting {
                    account: to,
                    cents,
                },
                Posting {
                    account: from,
                    cents: -cents,
                },
            ],
        }
    }
}

/// Writes a small personal-finance ledger in Beancount syntax.
///
/// The ledger covers salary, rent, utilities, groceries and restaurants
/// for every month between the start and end dates, with the accounts
/// opened once the owner comes of age.
#[derive(Debug, Clone)]
pub struct ExampleLedgerWriter {
    title: String,
}

impl ExampleLedgerWriter {
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Default for ExampleLedgerWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerWriter for ExampleLedgerWriter {
    fn write(
        &self,
        birth: Date,
        start: Date,
        end: Date,
        reformat: bool,
        rng: &RandomRange,
    ) -> Result<String, WriterError> {
        if start > end {
            return Err(WriterError::invalid_period(format!(
                "start {start} is after end {end}"
            )));
        }

        let open_date = account_open_date(birth, start);
        let mut transactions = generate_transactions(open_date, start, end, rng)?;
        transactions.sort_by_key(|txn| txn.date);

        let mut out = String::new();
        write_header(&mut out, &self.title, birth, start, end);
        write_opens(&mut out, open_date);

        out.push_str("* Transactions\n\n");
        for txn in &transactions {
            write_transaction(&mut out, txn, reformat);
        }

        let checking = balance_before(&transactions, CHECKING, end);
        write_balance(&mut out, end, CHECKING, checking, reformat);

        Ok(out)
    }
}

fn write_header(out: &mut String, title: &str, birth: Date, start: Date, end: Date) {
    let _ = writeln!(out, ";; -*- mode: org; mode: beancount; -*-");
    let _ = writeln!(out, ";; Birth: {birth}");
    let _ = writeln!(out, ";; Dates: {start} - {end}");
    let _ = writeln!(out, ";; THIS FILE HAS BEEN AUTO-GENERATED.");
    out.push_str("* Options\n\n");
    let _ = writeln!(out, "option \"title\" \"{title}\"");
    out.push_str("option \"operating_currency\" \"USD\"\n\n");
}

fn write_opens(out: &mut String, date: Date) {
    out.push_str("* Commodities\n\n");
    let _ = writeln!(out, "{date} commodity USD");
    out.push_str("  name: \"US Dollar\"\n\n");

    out.push_str("* Accounts\n\n");
    for account in ACCOUNTS {
        let _ = writeln!(out, "{date} open {account} USD");
    }
    out.push('\n');
}

/// The later of the owner's eighteenth birthday and `birth`, never past `start`.
fn account_open_date(birth: Date, start: Date) -> Date {
    let adult = Date::from_calendar_date(
        birth.year() + ADULT_AGE_YEARS,
        birth.month(),
        birth.day().min(28),
    )
    .unwrap_or(birth);
    adult.max(birth).min(start)
}

fn generate_transactions(
    open_date: Date,
    start: Date,
    end: Date,
    rng: &RandomRange,
) -> Result<Vec<Transaction>, WriterError> {
    let mut transactions = Vec::new();

    let opening = dollars(rng, 2_000, 8_000)?;
    transactions.push(Transaction::transfer(
        start.max(open_date),
        "Opening",
        "Opening balance for checking account",
        CHECKING,
        OPENING_BALANCES,
        opening,
    ));

    let rent = dollars_even(rng, 1_800, 2_800)?;
    let paycheck = dollars(rng, 2_400, 3_200)?;

    let mut year = start.year();
    let mut month = start.month();
    loop {
        let first = Date::from_calendar_date(year, month, 1)?;
        if first > end {
            break;
        }

        let in_period = |day: u8| -> Result<Option<Date>, WriterError> {
            let date = Date::from_calendar_date(year, month, day)?;
            Ok((date >= start && date <= end).then_some(date))
        };

        for day in [1, 15] {
            if let Some(date) = in_period(day)? {
                transactions.push(Transaction::transfer(
                    date, "Hooli", "Payroll", CHECKING, SALARY, paycheck,
                ));
            }
        }

        if let Some(date) = in_period(3)? {
            transactions.push(Transaction::transfer(
                date,
                "RiverBank Properties",
                "Paying the rent",
                RENT,
                CHECKING,
                rent,
            ));
        }

        if let Some(date) = in_period(20)? {
            let bill = dollars(rng, 45, 120)?;
            transactions.push(Transaction::transfer(
                date,
                "EDISON POWER",
                "Electricity bill",
                ELECTRICITY,
                CHECKING,
                bill,
            ));
        }

        let mut card_charges = 0;
        let grocery_trips = rng.sample(2, 5, None)?;
        for _ in 0..grocery_trips {
            let store = pick(rng, &GROCERY_STORES)?;
            let day = day_of_month(rng)?;
            if let Some(date) = in_period(day)? {
                let amount = dollars(rng, 20, 160)?;
                card_charges += amount;
                transactions.push(Transaction::transfer(
                    date,
                    store,
                    "Buying groceries",
                    GROCERIES,
                    CREDIT_CARD,
                    amount,
                ));
            }
        }

        let meals = rng.sample(1, 6, None)?;
        for _ in 0..meals {
            let place = pick(rng, &RESTAURANTS)?;
            let day = day_of_month(rng)?;
            if let Some(date) = in_period(day)? {
                let amount = dollars(rng, 15, 90)?;
                card_charges += amount;
                transactions.push(Transaction::transfer(
                    date,
                    place,
                    "Eating out",
                    RESTAURANT,
                    CREDIT_CARD,
                    amount,
                ));
            }
        }

        if card_charges > 0 {
            if let Some(date) = in_period(28)? {
                transactions.push(Transaction::transfer(
                    date,
                    "Chase",
                    "Credit card payment",
                    CREDIT_CARD,
                    CHECKING,
                    card_charges,
                ));
            }
        }

        if month == Month::December {
            year += 1;
        }
        month = month.next();
    }

    Ok(transactions)
}

fn balance_before(transactions: &[Transaction], account: &str, date: Date) -> i64 {
    transactions
        .iter()
        .filter(|txn| txn.date < date)
        .flat_map(|txn| txn.postings.iter())
        .filter(|posting| posting.account == account)
        .map(|posting| posting.cents)
        .sum()
}

fn dollars(rng: &RandomRange, low: i64, high: i64) -> Result<i64, WriterError> {
    let whole = rng.sample(low, high, None)?;
    let cents = rng.sample(0, 100, None)?;
    Ok(whole * 100 + cents)
}

fn dollars_even(rng: &RandomRange, low: i64, high: i64) -> Result<i64, WriterError> {
    Ok(rng.sample(low / 50, high / 50, None)? * 50 * 100)
}

fn day_of_month(rng: &RandomRange) -> Result<u8, WriterError> {
    let day = rng.sample(1, 29, None)?;
    u8::try_from(day).map_err(|_| WriterError::other(format!("day {day} out of range")))
}

fn pick<T: Copy>(rng: &RandomRange, items: &[T]) -> Result<T, WriterError> {
    let len = i64::try_from(items.len())
        .map_err(|_| WriterError::other("choice list too long"))?;
    let index = rng.sample(0, len, None)?;
    usize::try_from(index)
        .ok()
        .and_then(|index| items.get(index).copied())
        .ok_or_else(|| WriterError::other(format!("choice index {index} out of range")))
}
