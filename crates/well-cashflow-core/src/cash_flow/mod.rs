pub mod afit;
pub mod bfit;

pub use afit::{
    after_income_tax_cash_flow, calculate_well_cash_flow, AfitCashFlow, AfitInput, AfitOutput,
    WellCashFlow, WellCashFlowInput,
};
pub use bfit::{
    assemble_bfit, before_income_tax_cash_flow, group_before_income_tax_cash_flow,
    group_case_before_income_tax_cash_flow, BfitCashFlow, BfitInput, BfitOutput, ExpenseInput,
    ExpenseItem, GroupBfitInput, GroupCaseBfitInput, GroupTotals, NetProfitInterest, NpiKind,
    PhaseRevenue, RevenueInput,
};
