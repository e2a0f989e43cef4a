pub mod ai_rich;
pub mod credentials;
pub mod encryption;
pub mod enqueue;
pub mod generator;
pub mod log_sink;
pub mod marketplace;
pub mod normalize;
pub mod processor;
pub mod worker;
