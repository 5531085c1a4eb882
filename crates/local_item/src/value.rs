//! Tri-state model for the outcome of reading one stored entry.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Result of interpreting a stored entry.
///
/// Every read resolves to exactly one variant; there is no loading state.
pub enum LocalValue<E, A> {
    /// No raw entry was stored and no default value is configured.
    Absent,
    /// The stored entry decoded into a domain value.
    Valid(A),
    /// A raw entry was stored but failed to decode.
    Invalid(E),
}

impl<E, A> LocalValue<E, A> {
    /// Adapts an external success/error result. Never yields [`LocalValue::Absent`].
    pub fn from_result(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Self::Valid(value),
            Err(err) => Self::Invalid(err),
        }
    }

    /// Dispatches on usability: `Absent` and `Invalid` both take the first branch.
    pub fn fold<R>(
        self,
        on_absent_or_invalid: impl FnOnce() -> R,
        on_valid: impl FnOnce(A) -> R,
    ) -> R {
        match self {
            Self::Valid(value) => on_valid(value),
            Self::Absent | Self::Invalid(_) => on_absent_or_invalid(),
        }
    }

    /// Dispatches on all three variants.
    pub fn fold3<R>(
        self,
        on_absent: impl FnOnce() -> R,
        on_invalid: impl FnOnce(E) -> R,
        on_valid: impl FnOnce(A) -> R,
    ) -> R {
        match self {
            Self::Absent => on_absent(),
            Self::Invalid(err) => on_invalid(err),
            Self::Valid(value) => on_valid(value),
        }
    }

    /// Returns `true` for [`LocalValue::Valid`].
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns `true` for [`LocalValue::Absent`].
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` for [`LocalValue::Invalid`].
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Borrows the decoded value, if any.
    pub fn valid(&self) -> Option<&A> {
        match self {
            Self::Valid(value) => Some(value),
            _ => None,
        }
    }

    /// Borrows the decode error of an [`LocalValue::Invalid`] entry.
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }

    /// Collapses to `Option`, discarding any decode error.
    pub fn into_option(self) -> Option<A> {
        self.fold(|| None, Some)
    }

    /// Maps the decoded value.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> LocalValue<E, B> {
        match self {
            Self::Absent => LocalValue::Absent,
            Self::Valid(value) => LocalValue::Valid(f(value)),
            Self::Invalid(err) => LocalValue::Invalid(err),
        }
    }

    /// Maps the decode error.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> LocalValue<F, A> {
        match self {
            Self::Absent => LocalValue::Absent,
            Self::Valid(value) => LocalValue::Valid(value),
            Self::Invalid(err) => LocalValue::Invalid(f(err)),
        }
    }
}

impl<E, A> Default for LocalValue<E, A> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<E, A> From<ValidLocalValue<A>> for LocalValue<E, A> {
    fn from(value: ValidLocalValue<A>) -> Self {
        match value {
            ValidLocalValue::Absent => Self::Absent,
            ValidLocalValue::Valid(value) => Self::Valid(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// The subset of [`LocalValue`] a caller may write.
///
/// Invalid entries only arise from reading corrupted data, so they cannot be written.
pub enum ValidLocalValue<A> {
    /// Remove the stored entry.
    Absent,
    /// Encode and store the value.
    Valid(A),
}

impl<A> ValidLocalValue<A> {
    /// Dispatches on the two writable variants.
    pub fn fold2<R>(self, on_absent: impl FnOnce() -> R, on_valid: impl FnOnce(A) -> R) -> R {
        match self {
            Self::Absent => on_absent(),
            Self::Valid(value) => on_valid(value),
        }
    }
}

impl<A> From<Option<A>> for ValidLocalValue<A> {
    fn from(value: Option<A>) -> Self {
        value.map_or(Self::Absent, Self::Valid)
    }
}
