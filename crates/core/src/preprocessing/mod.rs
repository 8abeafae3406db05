pub mod region_preprocessor;
pub mod tensor;
