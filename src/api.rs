pub mod frank_energie;
