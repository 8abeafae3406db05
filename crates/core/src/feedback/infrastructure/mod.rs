pub mod log_speech_output;
