//! Load loan configurations (JSON) and extra payment lists (CSV)

use super::{ExtraPayment, LoanParams, Strategy};
use crate::error::Result;
use chrono::NaiveDate;
use csv::Reader;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A loan configuration file: the loan itself plus any registered extra payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanFile {
    #[serde(flatten)]
    pub loan: LoanParams,

    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
}

impl LoanFile {
    /// Parse and validate a configuration from any reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let file: LoanFile = serde_json::from_reader(reader)?;
        file.loan.validate()?;
        super::validate_extra_payments(&file.extra_payments)?;
        Ok(file)
    }

    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("Loading loan configuration from {}", path.as_ref().display());
        Self::from_reader(BufReader::new(file))
    }
}

/// Raw CSV row matching the extra payment export columns
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Period")]
    period: u32,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Date")]
    date: NaiveDate,
}

impl CsvRow {
    fn to_extra_payment(self) -> Result<ExtraPayment> {
        let payment = ExtraPayment::new(self.period, self.amount, self.date);
        payment.validate()?;
        Ok(payment)
    }
}

/// Load extra payments from a CSV file with a `Period,Amount,Date` header
pub fn load_extra_payments<P: AsRef<Path>>(path: P) -> Result<Vec<ExtraPayment>> {
    let file = File::open(path)?;
    load_extra_payments_from_reader(file)
}

/// Load extra payments from any reader (e.g., string buffer, stdin)
pub fn load_extra_payments_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ExtraPayment>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut payments = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        payments.push(row.to_extra_payment()?);
    }

    Ok(payments)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Demo mortgage: 101.4M at 12.01% E.A. over 15 years
pub fn demo_loan() -> LoanParams {
    LoanParams::new(101_400_000.0, 0.1201, 180, ymd(2025, 3, 25)).with_strategy(Strategy::ReduceTerm)
}

/// Extra payments registered against the demo loan during its first year
pub fn demo_extra_payments() -> Vec<ExtraPayment> {
    vec![
        ExtraPayment::new(1, 650_000.0, ymd(2025, 3, 12)),
        ExtraPayment::new(2, 655_000.0, ymd(2025, 4, 12)),
        ExtraPayment::new(4, 320_000.0, ymd(2025, 6, 12)),
        ExtraPayment::new(5, 670_000.0, ymd(2025, 7, 12)),
        ExtraPayment::new(6, 777_000.0, ymd(2025, 8, 12)),
        ExtraPayment::new(7, 655_555.0, ymd(2025, 9, 12)),
        ExtraPayment::new(8, 500_000.0, ymd(2025, 10, 12)),
        ExtraPayment::new(10, 770_000.0, ymd(2025, 12, 12)),
        ExtraPayment::new(11, 1_000_000.0, ymd(2026, 1, 12)),
        ExtraPayment::new(12, 1_000_000.0, ymd(2026, 2, 12)),
    ]
}

/// Demo loan together with its extra payments
pub fn demo_loan_file() -> LoanFile {
    LoanFile {
        loan: demo_loan(),
        extra_payments: demo_extra_payments(),
    }
}
