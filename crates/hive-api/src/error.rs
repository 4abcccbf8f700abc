use std::fmt;

use thiserror::Error;

/// Machine-readable error code.
///
/// The first group is produced locally by this crate; the second group is
/// reported by the Hive API in its `{errors: [{code, title}]}` envelope and
/// passed through verbatim. Unrecognised vendor codes land in [`Other`](Self::Other).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    Internal,
    InvalidJson,
    InvalidLoginResponse,
    InvalidNodeType,
    InvalidNodeJson,
    InvalidDataType,
    NodeNotFound,
    InvalidUpdate,

    // ── Reported by the Hive API ────────────────────────────────────
    MissingParameter,
    InvalidCredentials,
    NotAuthorized,
    Other(String),
}

impl ErrorCode {
    /// Map a wire code string onto an `ErrorCode`.
    pub fn from_wire(code: &str) -> Self {
        match code {
            "INTERNAL" => Self::Internal,
            "INVALID_JSON" => Self::InvalidJson,
            "INVALID_LOGIN_RESPONSE" => Self::InvalidLoginResponse,
            "INVALID_NODE_TYPE" => Self::InvalidNodeType,
            "INVALID_NODE_JSON" => Self::InvalidNodeJson,
            "INVALID_DATA_TYPE" => Self::InvalidDataType,
            "NODE_NOT_FOUND" => Self::NodeNotFound,
            "INVALID_UPDATE" => Self::InvalidUpdate,
            "MISSING_PARAMETER" => Self::MissingParameter,
            "USERNAME_PASSWORD_ERROR" => Self::InvalidCredentials,
            "NOT_AUTHORIZED" => Self::NotAuthorized,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Internal => "INTERNAL",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidLoginResponse => "INVALID_LOGIN_RESPONSE",
            Self::InvalidNodeType => "INVALID_NODE_TYPE",
            Self::InvalidNodeJson => "INVALID_NODE_JSON",
            Self::InvalidDataType => "INVALID_DATA_TYPE",
            Self::NodeNotFound => "NODE_NOT_FOUND",
            Self::InvalidUpdate => "INVALID_UPDATE",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::InvalidCredentials => "USERNAME_PASSWORD_ERROR",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for the `hive-api` crate.
///
/// Every failure carries either a code and message or a wrapped cause.
/// Context is attached with [`Error::with_op`], which nests the error under
/// an operation label such as `"thermostat: update"`. [`Error::code`] looks
/// through those labels to the root cause.
#[derive(Debug, Error)]
pub enum Error {
    // ── Hive API ────────────────────────────────────────────────────
    /// Error reported by the API through the `{errors: [...]}` envelope.
    #[error("<{code}> {message}")]
    Api {
        code: ErrorCode,
        message: String,
        status: u16,
    },

    /// Non-success response whose error envelope listed no errors.
    #[error("unknown error response (HTTP {status})")]
    UnknownErrorResponse { status: u16 },

    // ── Session ─────────────────────────────────────────────────────
    /// No session token is held; a login is required first.
    #[error("<NOT_AUTHORIZED> no active session")]
    NoSession,

    /// Login returned zero or more than one session object.
    #[error("<INVALID_LOGIN_RESPONSE> login failed: expected 1 session, got {sessions}")]
    InvalidLoginResponse { sessions: usize },

    // ── Data ────────────────────────────────────────────────────────
    /// A response body did not decode, with the raw body for debugging.
    #[error("<INVALID_JSON> {message}")]
    InvalidJson { message: String, body: String },

    /// The `nodeType` attribute is absent.
    #[error("<INVALID_NODE_JSON> node type attribute missing")]
    MissingNodeType,

    /// The `nodeType` attribute is present but not a string.
    #[error("<INVALID_NODE_TYPE> node type attribute not string, found {found}")]
    InvalidNodeType { found: String },

    /// An attribute value was absent or held the wrong type.
    #[error("<INVALID_DATA_TYPE> {attribute}: expected {expected}, found {found}")]
    InvalidDataType {
        attribute: String,
        expected: &'static str,
        found: String,
    },

    /// Zero or several nodes where exactly one was required.
    #[error("<NODE_NOT_FOUND> incorrect number of nodes returned: {count}")]
    NodeNotFound { count: usize },

    /// The node returned for a reference reported a different identifier.
    #[error("<INVALID_UPDATE> update failed, ID mismatch (expected {expected}, got {got})")]
    InvalidUpdate { expected: String, got: String },

    /// A request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Context ─────────────────────────────────────────────────────
    /// An error annotated with the logical operation that produced it.
    #[error("{op}: {source}")]
    Op {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with an operation label.
    pub fn with_op(self, op: &'static str) -> Self {
        Self::Op {
            op,
            source: Box::new(self),
        }
    }

    /// The code of the root error. Errors without a code of their own
    /// (transport, URL, encoding) report [`ErrorCode::Internal`].
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Api { code, .. } => code.clone(),
            Self::NoSession => ErrorCode::NotAuthorized,
            Self::InvalidLoginResponse { .. } => ErrorCode::InvalidLoginResponse,
            Self::InvalidJson { .. } => ErrorCode::InvalidJson,
            Self::MissingNodeType => ErrorCode::InvalidNodeJson,
            Self::InvalidNodeType { .. } => ErrorCode::InvalidNodeType,
            Self::InvalidDataType { .. } => ErrorCode::InvalidDataType,
            Self::NodeNotFound { .. } => ErrorCode::NodeNotFound,
            Self::InvalidUpdate { .. } => ErrorCode::InvalidUpdate,
            Self::Op { source, .. } => source.code(),
            Self::UnknownErrorResponse { .. }
            | Self::Encode(_)
            | Self::Transport(_)
            | Self::InvalidUrl(_)
            | Self::Tls(_) => ErrorCode::Internal,
        }
    }

    /// Human-readable message of the root error, without operation labels.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Op { source, .. } => source.message(),
            other => other.to_string(),
        }
    }

    /// The outermost operation label, if any.
    pub fn op(&self) -> Option<&'static str> {
        match self {
            Self::Op { op, .. } => Some(op),
            _ => None,
        }
    }

    /// The innermost error beneath any operation labels.
    pub fn root(&self) -> &Self {
        match self {
            Self::Op { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns `true` if the session token was rejected (or never obtained)
    /// and a fresh login might resolve it.
    pub fn is_not_authorized(&self) -> bool {
        self.code() == ErrorCode::NotAuthorized
    }

    /// Returns `true` if this is a transient transport failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Op { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_round_trip() {
        for code in [
            "NOT_AUTHORIZED",
            "USERNAME_PASSWORD_ERROR",
            "MISSING_PARAMETER",
            "NODE_NOT_FOUND",
        ] {
            assert_eq!(ErrorCode::from_wire(code).as_str(), code);
        }
        assert_eq!(
            ErrorCode::from_wire("RATE_LIMITED"),
            ErrorCode::Other("RATE_LIMITED".into())
        );
    }

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(!Error::Tls("bad cert".into()).is_transient());
        assert!(!Error::NoSession.with_op("nodes").is_transient());
        assert!(
            !Error::Api {
                code: ErrorCode::NotAuthorized,
                message: "expired".into(),
                status: 401,
            }
            .is_transient()
        );
    }

    #[test]
    fn code_looks_through_operation_labels() {
        let err = Error::NodeNotFound { count: 0 }
            .with_op("node")
            .with_op("thermostat: update");

        assert_eq!(err.code(), ErrorCode::NodeNotFound);
        assert_eq!(err.op(), Some("thermostat: update"));
        assert_eq!(
            err.to_string(),
            "thermostat: update: node: <NODE_NOT_FOUND> incorrect number of nodes returned: 0"
        );
        assert!(matches!(err.root(), Error::NodeNotFound { count: 0 }));
    }

    #[test]
    fn api_error_message_is_title() {
        let err = Error::Api {
            code: ErrorCode::InvalidCredentials,
            message: "Username or password not specified or invalid".into(),
            status: 400,
        }
        .with_op("login: request");

        assert_eq!(err.code(), ErrorCode::InvalidCredentials);
        assert_eq!(err.message(), "Username or password not specified or invalid");
        assert!(!err.is_not_authorized());
    }

    #[test]
    fn missing_session_counts_as_not_authorized() {
        assert!(Error::NoSession.is_not_authorized());
        assert!(Error::NoSession.with_op("nodes").is_not_authorized());
    }

    #[test]
    fn transport_class_errors_are_internal() {
        let err = Error::Tls("bad cert".into());
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(
            Error::UnknownErrorResponse { status: 500 }.code(),
            ErrorCode::Internal
        );
    }
}
