pub mod speech_output;
