pub mod cash_flow;
pub mod dda;
pub mod income_tax;
