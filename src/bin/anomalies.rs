//! Reproduces the classic read anomalies under each isolation level.
//!
//! Seeds a baseline of two rows, then interleaves two transactions per
//! scenario and reports whether the anomaly showed up (✔) or was prevented
//! (✘). A write that hits a conflict rolls its transaction back and counts
//! as prevented.
//!
//! Run with: cargo run --bin anomalies

use anyhow::Result;
use mvccdb::{IsolationLevel, Table, Transaction};

/// Two committed rows, id 1 ("Joe") and id 3 ("Jill").
fn seeded_table() -> Result<Table> {
    let table = Table::new();
    let mut setup = table.new_transaction(IsolationLevel::ReadCommitted)?;
    setup.add_record(1, "Joe")?;
    setup.add_record(3, "Jill")?;
    setup.commit()?;
    Ok(table)
}

/// Attempt a write. A conflict rolls the writer back and reports `false`;
/// any other error propagates.
fn try_write(
    txn: &mut Transaction,
    op: impl FnOnce(&mut Transaction) -> mvccdb::Result<()>,
) -> Result<bool> {
    match op(txn) {
        Ok(()) => Ok(true),
        Err(err) if err.is_conflict() => {
            txn.rollback()?;
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// One transaction observes another's uncommitted update.
fn dirty_read(level: IsolationLevel) -> Result<bool> {
    let table = seeded_table()?;
    let mut c1 = table.new_transaction(level)?;
    let mut c2 = table.new_transaction(level)?;

    let before = c1.fetch_record(1)?.map(|r| r.name);
    if !try_write(&mut c2, |t| t.update_record(1, "Joe 2"))? {
        c1.rollback()?;
        return Ok(false);
    }
    let after = c1.fetch_record(1)?.map(|r| r.name);

    c1.rollback()?;
    c2.rollback()?;
    Ok(before != after)
}

/// Two reads of the same row straddle another transaction's commit.
fn non_repeatable_read(level: IsolationLevel) -> Result<bool> {
    let table = seeded_table()?;
    let mut c1 = table.new_transaction(level)?;
    let mut c2 = table.new_transaction(level)?;

    let before = c1.fetch_record(1)?.map(|r| r.name);
    if !try_write(&mut c2, |t| t.update_record(1, "Joe 2"))? {
        c1.rollback()?;
        return Ok(false);
    }
    c2.commit()?;
    let after = c1.fetch_record(1)?.map(|r| r.name);

    c1.rollback()?;
    Ok(before != after)
}

/// A range count changes after another transaction commits a new row.
fn phantom_read(level: IsolationLevel) -> Result<bool> {
    let table = seeded_table()?;
    let mut c1 = table.new_transaction(level)?;
    let mut c2 = table.new_transaction(level)?;

    let before = c1.fetch(|r| (1..=3).contains(&r.id))?.len();
    c2.add_record(2, "John")?;
    c2.commit()?;
    let after = c1.count_records(1, 3)?;

    c1.rollback()?;
    Ok(before != after)
}

fn mark(reproduced: bool) -> &'static str {
    if reproduced { "✔" } else { "✘" }
}

fn main() -> Result<()> {
    println!("{:<18} {:^7} {:^7} {:^7}", "", "Dirty", "Repeat", "Phantom");
    for level in IsolationLevel::ALL {
        let name = level.to_string();
        println!(
            "{:<18} {:^7} {:^7} {:^7}",
            name,
            mark(dirty_read(level)?),
            mark(non_repeatable_read(level)?),
            mark(phantom_read(level)?),
        );
    }
    Ok(())
}
