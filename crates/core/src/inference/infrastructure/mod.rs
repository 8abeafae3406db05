pub mod onnx_expression_model;
