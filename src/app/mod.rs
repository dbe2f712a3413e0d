// Application layer: wires config, connector, engine and report storage together.

pub mod runner;
