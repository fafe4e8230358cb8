//! Simple utility to recompute daily ledger totals
//! Usage: cargo run --bin recompute_ledgers -- <user_id> [date]
//!
//! With a date, recomputes that single day; without, recomputes every
//! ledger the user has.

use std::path::PathBuf;

fn get_database_path() -> PathBuf {
    std::env::var("FITLEDGER_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("fitledger.db");
            path
        })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let user_id: i64 = match args.get(1).map(|s| s.parse()) {
        Some(Ok(id)) => id,
        _ => {
            eprintln!("Usage: recompute_ledgers <user_id> [date]");
            std::process::exit(1);
        }
    };
    let date = args.get(2).map(|s| s.as_str());

    let db_path = get_database_path();
    println!("Database: {}", db_path.display());

    let database = fitledger::db::Database::new(&db_path)?;

    database.with_conn_mut(|conn| {
        let ledgers = match date {
            Some(date) => {
                let normalized = fitledger::models::normalize_date(date)?;
                match fitledger::models::DailyLedger::get_by_user_date(conn, user_id, &normalized)? {
                    Some(l) => vec![l],
                    None => {
                        println!("No ledger for user {} on {}", user_id, normalized);
                        return Ok(());
                    }
                }
            }
            None => fitledger::models::DailyLedger::list_for_user(
                conn, user_id, None, None, i64::MAX, 0,
            )?,
        };

        println!("Recomputing {} ledger(s) for user {}", ledgers.len(), user_id);

        for ledger in &ledgers {
            let old = ledger.totals;
            let new = fitledger::models::recompute_ledger(conn, ledger.id)?;

            println!("\n{} (ledger {})", ledger.date, ledger.id);
            println!("  kcal eaten:  {:.1} -> {:.1}", old.total_kcal_eaten, new.total_kcal_eaten);
            println!("  kcal burned: {:.1} -> {:.1}", old.total_kcal_burned, new.total_kcal_burned);
            println!("  net kcal:    {:.1} -> {:.1}", old.total_kcal, new.total_kcal);
            println!("  protein:     {:.1} -> {:.1}", old.total_protein_g, new.total_protein_g);
            println!("  water:       {:.2} -> {:.2}", old.water_l, new.water_l);
        }

        Ok(())
    })?;

    Ok(())
}
