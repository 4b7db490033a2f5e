//! Domain models

pub mod customer;
pub mod financials;
pub mod product;
pub mod proposal;

pub use customer::Customer;
pub use financials::{CategoryBreakdown, ProposalFinancials, VatBreakdown};
pub use product::{Product, ProductRecord};
pub use proposal::{
    CustomTaxLine, EngineeringLine, ExpenseCategory, ExpenseLine, Proposal, ProposalItem,
    ProposalStatus,
};
