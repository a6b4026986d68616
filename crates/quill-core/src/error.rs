// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

/// Errors surfaced by the runtime core.
///
/// Suspendable operations return these through their futures; synchronous
/// invariant violations (double-add, wrong-type accessors) are logged and
/// refused instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),

    /// A capability method was called on a protocol that does not implement
    /// the capability.
    #[error("not implemented by this protocol")]
    NotImplemented,

    #[error("operation was cancelled")]
    Cancelled,

    /// A credential operation was attempted while no provider is active.
    #[error("no active credential provider")]
    NoActiveProvider,

    /// The request was well-formed but the server refused it.
    #[error("server error: {0}")]
    OtherServer(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
