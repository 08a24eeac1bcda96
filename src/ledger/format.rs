use std::fmt::Write as _;

use time::Date;


use super::example::{Posting, Transaction};

/// Column at which posting amounts end when reformatting is enabled.
const AMOUNT_COLUMN: usize = 60;

const CURRENCY: &str = "USD";

/// Render an amount held in cents as a decimal string.
fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub(super) fn write_transaction(out: &mut String, txn: &Transaction, reformat: bool) {
    let _ = writeln!(
        out,
        "{} {} \"{}\" \"{}\"",
        txn.date,
        txn.flag,
        txn.payee,
        txn.narration
    );
    for posting in &txn.postings {
        write_posting(out, posting, reformat);
    }
    out.push('\n');
}

fn write_posting(out: &mut String, posting: &Posting, reformat: bool) {
    write_amount_line(out, &format!("  {}", posting.account), posting.cents, reformat);
}

pub(super) fn write_balance(
    out: &mut String,
    date: Date,
    account: &str,
    cents: i64,
    reformat: bool,
) {
    let prefix = format!("{date} balance {account}");
    write_amount_line(out, &prefix, cents, reformat);
}

fn write_amount_line(out: &mut String, prefix: &str, cents: i64, reformat: bool) {
    let amount = format_amount(cents);
    let gap = if reformat {
        AMOUNT_COLUMN
            .saturating_sub(prefix.len() + amount.len())
            .max(2)
    } else {
        2
    };
    let _ = writeln!(out, "{prefix}{:gap$}{amount} {CURRENCY}", "", gap = gap);
}
