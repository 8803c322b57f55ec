//! Loan configuration, extra payments and their loaders

mod data;
pub mod loader;

pub use data::{add_months, validate_extra_payments, ExtraPayment, LoanParams, Strategy};
pub use loader::{demo_extra_payments, demo_loan, demo_loan_file, load_extra_payments, LoanFile};
