//! Loan Amortization CLI
//!
//! Command-line interface for building schedules and simulating extra payments

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use loan_amortization::loan::{load_extra_payments, LoanFile};
use loan_amortization::report::{format_schedule_table, format_summary, write_schedule_csv_file};
use loan_amortization::{fixed_installment, monthly_rate_from_annual, LoanBook, RecurringPlan, Simulator};

/// Fixed-installment loan amortization with extra payments
#[derive(Parser)]
#[command(name = "amortize", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the baseline and extra-payment schedules
    Schedule(ScheduleArgs),
    /// Compare recurring extra-payment plans against the current schedule
    Simulate(SimulateArgs),
    /// Show the E.M. rate and fixed installment for a loan
    Preview(PreviewArgs),
}

/// Where the loan and its extra payments come from
#[derive(Args)]
struct LoanSource {
    /// Loan configuration (JSON)
    #[arg(long, conflicts_with = "demo")]
    config: Option<String>,

    /// Extra payments (CSV with Period,Amount,Date), added to the configuration's
    #[arg(long)]
    extras: Option<String>,

    /// Use the built-in demo loan
    #[arg(long)]
    demo: bool,

    /// Date used for payment statuses (YYYY-MM-DD), defaults to today
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Args)]
struct ScheduleArgs {
    #[command(flatten)]
    source: LoanSource,

    /// Number of rows to print
    #[arg(long, default_value_t = 24)]
    rows: usize,

    /// Print the baseline schedule instead of the extra-payment one
    #[arg(long)]
    baseline: bool,

    /// Write the full schedule to this CSV file
    #[arg(long)]
    output: Option<String>,

    /// Print the full result as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    source: LoanSource,

    /// Extra amount per payment; repeat to compare several plans
    #[arg(long, required = true)]
    amount: Vec<f64>,

    /// Pay every N months
    #[arg(long, default_value_t = 1)]
    every: u32,

    /// Plan length in months
    #[arg(long, default_value_t = 12)]
    duration: u32,
}

#[derive(Args)]
struct PreviewArgs {
    #[arg(long)]
    principal: f64,

    /// Annual effective rate as a fraction (0.1201 = 12.01%)
    #[arg(long)]
    rate: f64,

    #[arg(long)]
    term: u32,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Schedule(args) => run_schedule(args),
        Commands::Simulate(args) => run_simulate(args),
        Commands::Preview(args) => run_preview(args),
    }
}

fn load_book(source: &LoanSource) -> Result<LoanBook> {
    let mut file = match (&source.config, source.demo) {
        (Some(path), _) => {
            LoanFile::load(path).with_context(|| format!("failed to load loan configuration {}", path))?
        }
        (None, true) => loan_amortization::loan::demo_loan_file(),
        (None, false) => bail!("either --config <file.json> or --demo is required"),
    };

    if let Some(path) = &source.extras {
        let extras =
            load_extra_payments(path).with_context(|| format!("failed to load extra payments {}", path))?;
        file.extra_payments.extend(extras);
    }

    let mut book = LoanBook::new();
    if let Some(today) = source.today {
        book = book.with_today(today);
    }
    book.load_file(file)?;
    Ok(book)
}

fn run_schedule(args: ScheduleArgs) -> Result<()> {
    let book = load_book(&args.source)?;
    let Some(result) = book.result() else {
        bail!("no loan configured");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let rows = if args.baseline {
        &result.schedule_baseline
    } else {
        &result.schedule_with_extras
    };

    println!("Loan Amortization v{}", env!("CARGO_PKG_VERSION"));
    println!("========================\n");
    if let Some(loan) = book.loan() {
        println!("Loan:");
        println!("  Principal:    {:.0}", loan.principal);
        println!("  Rate (E.A.):  {:.4}%", loan.annual_effective_rate * 100.0);
        println!("  Term:         {} months", loan.term_months);
        println!("  Disbursed:    {}", loan.disbursement_date);
        println!("  Extra payments registered: {}", book.extra_payments().len());
        println!();
    }

    print!("{}", format_schedule_table(rows, args.rows));
    println!();
    print!("{}", format_summary(&result.summary));
    println!(
        "\nProgress: {} of {} installments paid ({:.1}%)",
        result.paid_count(),
        result.summary.actual_term,
        result.progress_percent()
    );

    if let Some(path) = &args.output {
        write_schedule_csv_file(rows, path).with_context(|| format!("failed to write {}", path))?;
        println!("\nFull schedule written to: {}", path);
    }
    Ok(())
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let book = load_book(&args.source)?;
    let simulator = Simulator::from_book(&book).context("no loan configured")?;

    let plans: Vec<RecurringPlan> = args
        .amount
        .iter()
        .map(|&amount| RecurringPlan {
            amount,
            every_months: args.every,
            duration_months: args.duration,
        })
        .collect();

    println!(
        "Simulating from period {} (current term {} months)\n",
        simulator.start_period(),
        simulator.current().summary.actual_term
    );
    println!(
        "{:>14} {:>9} {:>10} {:>12} {:>16} {:>16}",
        "Amount", "Payments", "Term", "Saved (mo)", "Interest", "Saved interest"
    );
    println!("{}", "-".repeat(82));

    for outcome in simulator.run_many(&plans) {
        let outcome = outcome?;
        let c = &outcome.comparison;
        println!(
            "{:>14.0} {:>9} {:>10} {:>12} {:>16.0} {:>16.0}",
            outcome.plan.amount,
            c.payment_count,
            c.simulated_term,
            c.additional_months_saved,
            c.simulated_interest,
            c.additional_interest_saved,
        );
    }
    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<()> {
    let monthly_rate = monthly_rate_from_annual(args.rate);
    let installment = fixed_installment(args.principal, monthly_rate, args.term)?;
    println!("Monthly rate (E.M.): {:.6}%", monthly_rate * 100.0);
    println!("Fixed installment:   {:.0}", installment);
    Ok(())
}
