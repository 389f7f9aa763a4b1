pub mod codec;
pub mod csv;
pub mod state;

pub use codec::{read_state, write_state, BincodeCodec, Format, JsonCodec, MsgPackCodec, StateCodec};
pub use csv::CsvCodec;
pub use state::{MetricsState, Parameters, SimulationState, STATE_VERSION};
