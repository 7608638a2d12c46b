pub mod coordinator;
pub mod poller;
pub mod sensor;
pub mod snapshot;

pub use self::{
    coordinator::Coordinator,
    poller::Poller,
    sensor::{Reading, Sensor},
};
