mod allocation;
mod cli;
mod config;
mod domain;
mod error;
mod export;
mod history;
mod logging;
mod rollup;
mod session;
mod storage;

use anyhow::{Result, bail};
use clap::Parser;
use rust_decimal::Decimal;

use crate::cli::{Cli, Command, HistoryCmd, SessionCmd};
use crate::config::{AppConfig, AppPaths, app_paths, load_or_init_config};
use crate::domain::{Jar, LedgerRow, Month};
use crate::rollup::{AnnualRollup, JarTotals, MonthlyRollup};
use crate::session::{JarState, Session, parse_income};
use crate::storage::SessionStore;

fn main() {
    logging::init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (cfg, _cfg_path) = load_or_init_config(&paths)?;
    let store = SessionStore::new(&paths);

    match cli.command {
        Command::Jars => print_jars(),
        Command::Session(args) => handle_session(args.cmd, &cfg, &store)?,
        Command::Add(args) => {
            let mut session = store.require()?;
            let jar: Jar = args.jar.parse()?;
            let entry = session.add_expense(jar, Some(&args.subcategory), Some(&args.amount))?;
            store.save(&session)?;
            println!(
                "Added '{}' {:.2} to '{jar}'. Remaining in '{jar}': {:.2}",
                entry.subcategory,
                entry.amount,
                session.remaining(jar)
            );
        }
        Command::Status => {
            let session = store.require()?;
            print_status(&session);
        }
        Command::Save => {
            let session = store.require()?;
            let path = cfg.history_path(&paths);
            let outcome = crate::history::save_session(&path, &session)?;
            println!(
                "Saved {} {} to {} ({} rows in history).",
                session.month,
                session.year,
                path.display(),
                outcome.rows.len()
            );
            if outcome.replaced > 0 {
                println!(
                    "Replaced {} previous rows for {} {}.",
                    outcome.replaced, session.month, session.year
                );
            }
            println!();
            println!("Monthly summary");
            print_monthly(&crate::rollup::monthly(&outcome.rows)?, false);
            println!();
            println!("Annual summary");
            print_annual(&crate::rollup::annual(&outcome.rows)?, false);
        }
        Command::History(args) => handle_history(args.cmd, &cfg, &paths, &store)?,
        Command::Export(args) => {
            let rows = crate::history::read_history(&cfg.history_path(&paths))?;
            crate::export::export(&rows, args.format, &args.path)?;
            println!("Exported {} rows to {}", rows.len(), args.path.display());
        }
    }

    Ok(())
}

fn handle_session(cmd: SessionCmd, cfg: &AppConfig, store: &SessionStore) -> Result<()> {
    match cmd {
        SessionCmd::New {
            income,
            month,
            year,
        } => {
            let income = parse_income(&income)?;
            let month: Month = month.parse()?;
            let year = cfg.resolve_year(year);
            let session = Session::new(income, year, month)?;
            store.save(&session)?;
            println!("Started {month} {year} with income {income:.2}.");
            print_status(&session);
        }
        SessionCmd::Edit {
            income,
            month,
            year,
        } => {
            if income.is_none() && month.is_none() && year.is_none() {
                bail!("Nothing to change. Use --income, --month or --year.");
            }
            let mut session = store.require()?;
            if let Some(raw) = income {
                session.set_income(parse_income(&raw)?)?;
            }
            if month.is_some() || year.is_some() {
                let month = match month {
                    Some(m) => m.parse()?,
                    None => session.month,
                };
                session.set_period(year.unwrap_or(session.year), month)?;
            }
            store.save(&session)?;
            println!("Updated session.");
            print_status(&session);
        }
        SessionCmd::Show => {
            let session = store.require()?;
            print_status(&session);
            println!();
            let rows: Vec<Vec<String>> = Jar::ALL
                .into_iter()
                .flat_map(|jar| {
                    session.entries(jar).iter().map(move |e| {
                        vec![
                            jar.name().to_string(),
                            e.subcategory.clone(),
                            format!("{:.2}", e.amount),
                        ]
                    })
                })
                .collect();
            if rows.is_empty() {
                println!("(no expenses recorded)");
            } else {
                print_table(&["jar", "subcategory", "amount"], &rows);
            }
        }
        SessionCmd::Reset => {
            if store.reset()? {
                println!("Session discarded.");
            } else {
                println!("(no active session)");
            }
        }
    }
    Ok(())
}

fn handle_history(
    cmd: HistoryCmd,
    cfg: &AppConfig,
    paths: &AppPaths,
    store: &SessionStore,
) -> Result<()> {
    let path = cfg.history_path(paths);
    match cmd {
        HistoryCmd::Show => {
            let rows = crate::history::read_history(&path)?;
            if rows.is_empty() {
                println!("(no history)");
                return Ok(());
            }
            print_history(&rows);
        }
        HistoryCmd::Monthly { detail } => {
            let rows = crate::history::read_history(&path)?;
            print_monthly(&crate::rollup::monthly(&rows)?, detail);
        }
        HistoryCmd::Annual { detail } => {
            let rows = crate::history::read_history(&path)?;
            print_annual(&crate::rollup::annual(&rows)?, detail);
        }
        HistoryCmd::Clear => {
            if crate::history::clear_history(&path)? {
                store.reset()?;
                println!("History cleared ({}).", path.display());
            } else {
                println!("No history to clear: {} does not exist.", path.display());
            }
        }
    }
    Ok(())
}

fn money(d: Decimal) -> String {
    format!("{d:.2}")
}

fn share(p: Decimal) -> String {
    format!("{:.0}%", p * Decimal::ONE_HUNDRED)
}

fn print_jars() {
    let rows: Vec<Vec<String>> = Jar::ALL
        .into_iter()
        .map(|jar| {
            vec![
                jar.name().to_string(),
                jar.alias().to_string(),
                share(jar.percentage()),
                jar.subcategories().join(", "),
            ]
        })
        .collect();
    print_table(&["jar", "alias", "share", "subcategories"], &rows);
}

fn print_status(session: &Session) {
    println!(
        "{} {}: income {}",
        session.month,
        session.year,
        money(session.income)
    );

    let rows: Vec<Vec<String>> = session
        .status()
        .into_iter()
        .map(|s| {
            let state = match s.state {
                JarState::Available(_) => "available".to_string(),
                JarState::Full => "full".to_string(),
                JarState::Exceeded(by) => format!("exceeded by {}", money(by)),
            };
            vec![
                s.jar.name().to_string(),
                share(s.percentage),
                money(s.budget),
                money(s.assigned),
                money(s.remaining),
                state,
            ]
        })
        .collect();
    print_table(
        &["jar", "share", "budget", "assigned", "remaining", "state"],
        &rows,
    );

    match session.overall_state() {
        JarState::Available(left) => println!(
            "Unassigned: {} of {} is not assigned to any subcategory yet.",
            money(left),
            money(session.income)
        ),
        JarState::Full => println!(
            "Fully assigned: 100% of {} is placed in jars.",
            money(session.income)
        ),
        JarState::Exceeded(by) => {
            println!("Over-assigned: {} beyond total income.", money(by))
        }
    }
}

fn print_history(rows: &[LedgerRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.year.to_string(),
                r.month.to_string(),
                r.jar.name().to_string(),
                r.subcategory.clone(),
                money(r.amount),
            ]
        })
        .collect();
    print_table(&crate::history::HEADER, &cells);
}

fn jar_columns(totals: &JarTotals) -> impl Iterator<Item = String> + '_ {
    Jar::ALL.into_iter().map(|j| money(totals.jar(j)))
}

fn print_monthly(rollups: &[MonthlyRollup], detail: bool) {
    if rollups.is_empty() {
        println!("(no history)");
        return;
    }
    let mut headers = vec!["Año", "Mes", "Ingreso Mensual"];
    if detail {
        headers.extend(Jar::ALL.iter().map(|j| j.name()));
    }
    headers.extend(["Total Gastado del Mes", "Saldo Mensual"]);

    let rows: Vec<Vec<String>> = rollups
        .iter()
        .map(|r| {
            let mut row = vec![r.year.to_string(), r.month.to_string(), money(r.income)];
            if detail {
                row.extend(jar_columns(&r.totals));
            }
            row.extend([money(r.total_spent), money(r.balance)]);
            row
        })
        .collect();
    print_table(&headers, &rows);
}

fn print_annual(rollups: &[AnnualRollup], detail: bool) {
    if rollups.is_empty() {
        println!("(no history)");
        return;
    }
    let mut headers = vec!["Año", "Ingreso Total Anual"];
    if detail {
        headers.extend(Jar::ALL.iter().map(|j| j.name()));
    }
    headers.extend(["Total Gastado del Año", "Saldo Anual"]);

    let rows: Vec<Vec<String>> = rollups
        .iter()
        .map(|r| {
            let mut row = vec![r.year.to_string(), money(r.income)];
            if detail {
                row.extend(jar_columns(&r.totals));
            }
            row.extend([money(r.total_spent), money(r.balance)]);
            row
        })
        .collect();
    print_table(&headers, &rows);
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if headers.is_empty() {
        println!("(no columns)");
        return;
    }

    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    // `{:width$}` pads by chars, so accented names line up.
    fn print_row(cells: &[String], widths: &[usize]) {
        print!("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            print!(" {:width$} |", cell, width = *w);
        }
        println!();
    }

    fn print_sep(widths: &[usize]) {
        print!("|");
        for w in widths {
            print!("{}|", "-".repeat(w + 2));
        }
        println!();
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    print_row(&header_cells, &widths);
    print_sep(&widths);
    for row in rows {
        print_row(row, &widths);
    }
}
