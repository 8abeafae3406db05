pub mod expression_model;
