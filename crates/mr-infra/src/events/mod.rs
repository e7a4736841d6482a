mod broadcast;

pub use broadcast::BroadcastSessionEventPublisher;
