use std::fmt;
use thiserror::Error;

/// Raised by a bounded backpressure buffer that could not accept a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("backpressure buffer overflowed its capacity of {capacity}")]
pub struct OverflowError {
  pub capacity: usize,
}

/// Several errors that happened while one stream was failing, for example
/// an error handler that failed itself. The causes keep their arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeError<E> {
  errors: Vec<E>,
}

impl<E> CompositeError<E> {
  pub fn new(first: E, second: E) -> Self { Self { errors: vec![first, second] } }

  pub fn from_errors(errors: Vec<E>) -> Self { Self { errors } }

  #[inline]
  pub fn errors(&self) -> &[E] { &self.errors }

  #[inline]
  pub fn len(&self) -> usize { self.errors.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.errors.is_empty() }

  pub fn into_errors(self) -> Vec<E> { self.errors }
}

impl<E: fmt::Display> fmt::Display for CompositeError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} errors occurred", self.errors.len())?;
    for (idx, err) in self.errors.iter().enumerate() {
      write!(f, "; [{}] {}", idx + 1, err)?;
    }
    Ok(())
  }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for CompositeError<E> {}

/// The error type shipped with the crate. Streams may use any error type;
/// `RxError` covers the failures the runtime itself produces plus free-form
/// user messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RxError {
  #[error(transparent)]
  Overflow(#[from] OverflowError),
  #[error(transparent)]
  Composite(CompositeError<RxError>),
  #[error("{0}")]
  Message(String),
}

impl RxError {
  pub fn msg(message: impl Into<String>) -> Self { RxError::Message(message.into()) }

  pub fn is_overflow(&self) -> bool { matches!(self, RxError::Overflow(_)) }
}

impl From<CompositeError<RxError>> for RxError {
  /// Nested composites are flattened into a single list of causes.
  fn from(composite: CompositeError<RxError>) -> Self {
    let mut errors = Vec::with_capacity(composite.len());
    for err in composite.into_errors() {
      match err {
        RxError::Composite(inner) => errors.extend(inner.into_errors()),
        other => errors.push(other),
      }
    }
    RxError::Composite(CompositeError::from_errors(errors))
  }
}

impl From<&str> for RxError {
  fn from(message: &str) -> Self { RxError::msg(message) }
}

impl From<String> for RxError {
  fn from(message: String) -> Self { RxError::Message(message) }
}
