pub mod alert;
pub mod chart;
pub mod notifier;
pub mod sampler;
pub mod scorer;
pub mod snapshot;
pub mod status;
