pub mod emotion_decoder;
pub mod emotion_label;
pub mod label_table;
