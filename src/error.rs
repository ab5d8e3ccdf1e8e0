use thiserror::Error;

pub type SimBrokerResult<T> = Result<T, SimBrokerError>;

/// Crate-wide error umbrella. Every subsystem owns its own enum; this type
/// only routes them through `?` via `#[from]`.
#[derive(Debug, Error)]
pub enum SimBrokerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Decimal(#[from] DecimalError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// Errors raised while validating a [`crate::config::BacktestConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("end_time ({end}) must be after start_time ({start})")]
    InvalidTimeRange { start: i64, end: i64 },

    #[error("initial_capital must be positive, got {0}")]
    InvalidInitialCapital(String),

    #[error("rate must be non-negative, got {0}")]
    InvalidRates(String),

    #[error("max_positions must be >= 1, got {0}")]
    InvalidMaxPositions(u32),
}

/// Errors raised while ingesting or validating candle data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("no candles were supplied")]
    NoData,

    #[error("candle timestamps are not strictly increasing at index {index}: {prev} >= {next}")]
    DataNotSorted { index: usize, prev: i64, next: i64 },

    #[error("candle at index {index} violates OHLC invariants: {reason}")]
    InvalidData { index: usize, reason: String },

    #[error("failed to parse value: {0}")]
    ParseError(String),

    #[error("data file not found: {0}")]
    FileNotFound(String),

    #[error("insufficient data: need at least {required} candles, got {got}")]
    InsufficientData { required: usize, got: usize },
}

/// Errors raised by [`crate::decimal::Decimal`] arithmetic.
///
/// These abort the run: corruption is preferable to silent miscomputation
/// in the hot loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("division by zero")]
    DivideByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("failed to parse decimal: {0}")]
    ParseError(String),
}

/// Errors raised by illegal event-loop state transitions. These are
/// terminal: a programmer error, not a recoverable condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: String, to: String },

    #[error("a position is already open for this account")]
    PositionAlreadyExists,

    #[error("no open position exists")]
    NoPosition,
}

/// Errors raised while executing a signal against the account. These are
/// recovered locally by the event loop: logged and the signal is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("invalid position size: {0}")]
    InvalidPositionSize(String),
}

/// Errors raised by strategy callbacks. These abort the run, preserving the
/// underlying cause.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy initialization failed: {0}")]
    InitFailed(String),

    #[error("indicator calculation failed: {0}")]
    IndicatorCalculationFailed(String),

    #[error("signal generation failed: {0}")]
    SignalGenerationFailed(String),
}
