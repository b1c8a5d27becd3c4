pub mod aggregate;
pub mod depletion;
pub mod depreciation;
pub mod model;

pub use aggregate::{allocate_dda, calculate_dda, percentage_depletion, DdaInput, DdaResult};
pub use model::{
    AllocationContext, AllocationModel, CapitalInvestment, Calculation, DdaColumns,
    DepletionMethod, DepletionParams, DepletionVolumes, DepreciationModelSpec, DepreciationParams,
};
