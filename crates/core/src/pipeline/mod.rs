pub mod analyze_stream_use_case;
pub mod expression_pipeline;
pub mod pipeline_logger;
