use std::fmt::{self, Display};
use std::io;

/// Everything that can go wrong while setting up or running a simulation.
#[derive(Debug)]
pub enum SimulationError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// Tables, files or parameters that cannot describe a valid simulation.
    InvalidConfiguration(String),
    /// The compartment counts no longer add up to the population size.
    CountMismatch { expected: usize, actual: usize },
    Logging(String),
}

impl SimulationError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        SimulationError::InvalidConfiguration(message.into())
    }
}

impl From<io::Error> for SimulationError {
    fn from(error: io::Error) -> Self {
        SimulationError::Io(error)
    }
}

impl From<csv::Error> for SimulationError {
    fn from(error: csv::Error) -> Self {
        SimulationError::Csv(error)
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(error: serde_json::Error) -> Self {
        SimulationError::Json(error)
    }
}

impl From<log::SetLoggerError> for SimulationError {
    fn from(error: log::SetLoggerError) -> Self {
        SimulationError::Logging(error.to_string())
    }
}

impl std::error::Error for SimulationError {}

impl Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulationError::Io(e) => write!(f, "I/O error: {}", e),
            SimulationError::Csv(e) => write!(f, "CSV error: {}", e),
            SimulationError::Json(e) => write!(f, "State file error: {}", e),
            SimulationError::InvalidConfiguration(m) => write!(f, "Invalid configuration: {}", m),
            SimulationError::CountMismatch { expected, actual } => write!(
                f,
                "Compartment counts add up to {} instead of the population size {}",
                actual, expected
            ),
            SimulationError::Logging(m) => write!(f, "Could not set up logging: {}", m),
        }
    }
}
