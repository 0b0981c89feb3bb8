use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

pub type ServiceResult<T> = Result<T, AppError>;
pub type ServiceResponse<T> = ServiceResult<Json<T>>;

#[track_caller]
pub fn unexpected<T, E: Into<anyhow::Error>>(e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!("An unexpected error has occurred at {caller}: {}", e.into());
    Err(AppError::Unexpected)
}

/// Infrastructure failure on a read or write. Callers may retry.
#[track_caller]
pub fn store_unavailable<T, E: Into<anyhow::Error>>(e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!("The message store is unavailable at {caller}: {}", e.into());
    Err(AppError::StoreUnavailable)
}

/// Matches a `sqlx::Result`, letting the caller handle specific errors
/// and reporting every other error as [`AppError::StoreUnavailable`].
macro_rules! unwrap_expect {
    ($result:expr, $($pattern:pat => $handler:expr),+ $(,)?) => {
        match $result {
            Ok(value) => value,
            $($pattern => $handler,)+
            Err(e) => return $crate::common::error::store_unavailable(e),
        }
    };
}
pub(crate) use unwrap_expect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    Unexpected,
    Unauthorized,
    Forbidden,
    InternalServerError(&'static str),
    StoreUnavailable,

    ConversationsNotFound,
    ConversationsInvalidParticipants,
    ConversationsNotParticipant,

    MessagesNotFound,
    MessagesEmpty,
    MessagesTooLong,
    MessagesPaymentRequired,
    MessagesNotRecipient,
    MessagesInvalidAttachment,

    UsersNotFound,
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    #[track_caller]
    fn from(e: E) -> Self {
        unexpected::<(), E>(e).unwrap_err()
    }
}

impl AppError {
    pub const fn code(&self) -> &'static str {
        match self {
            AppError::Unexpected => "unexpected",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::InternalServerError(_) => "internal_server_error",
            AppError::StoreUnavailable => "store_unavailable",

            AppError::ConversationsNotFound => "conversations.not_found",
            AppError::ConversationsInvalidParticipants => "conversations.invalid_participants",
            AppError::ConversationsNotParticipant => "conversations.not_participant",

            AppError::MessagesNotFound => "messages.not_found",
            AppError::MessagesEmpty => "messages.empty",
            AppError::MessagesTooLong => "messages.too_long",
            AppError::MessagesPaymentRequired => "messages.payment_required",
            AppError::MessagesNotRecipient => "messages.not_recipient",
            AppError::MessagesInvalidAttachment => "messages.invalid_attachment",

            AppError::UsersNotFound => "users.not_found",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            AppError::Unexpected => "An unexpected error has occurred.",
            AppError::Unauthorized => "Please sign in to continue.",
            AppError::Forbidden => "You are not allowed to do this.",
            AppError::InternalServerError(_) => "An internal server error has occurred.",
            AppError::StoreUnavailable => {
                "The service is temporarily unavailable. Please try again shortly."
            }

            AppError::ConversationsNotFound => "This conversation does not exist.",
            AppError::ConversationsInvalidParticipants => {
                "A conversation needs one student and one mentor."
            }
            AppError::ConversationsNotParticipant => "You are not part of this conversation.",

            AppError::MessagesNotFound => "This message does not exist.",
            AppError::MessagesEmpty => "Your message is empty. It has not been sent.",
            AppError::MessagesTooLong => "Your message was too long. It has not been sent.",
            AppError::MessagesPaymentRequired => {
                "Book a conversation to send your own messages, or pick one of the suggested messages."
            }
            AppError::MessagesNotRecipient => "Only the recipient can mark a message as read.",
            AppError::MessagesInvalidAttachment => "The attachment link is invalid.",

            AppError::UsersNotFound => "This user does not exist.",
        }
    }

    pub const fn http_status_code(&self) -> StatusCode {
        match self {
            AppError::ConversationsInvalidParticipants
            | AppError::MessagesEmpty
            | AppError::MessagesTooLong
            | AppError::MessagesInvalidAttachment => StatusCode::BAD_REQUEST,

            AppError::Unauthorized => StatusCode::UNAUTHORIZED,

            AppError::MessagesPaymentRequired => StatusCode::PAYMENT_REQUIRED,

            AppError::Forbidden
            | AppError::ConversationsNotParticipant
            | AppError::MessagesNotRecipient => StatusCode::FORBIDDEN,

            AppError::ConversationsNotFound
            | AppError::MessagesNotFound
            | AppError::UsersNotFound => StatusCode::NOT_FOUND,

            AppError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            AppError::Unexpected | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether retrying the same call later may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, AppError::StoreUnavailable)
    }

    pub const fn response_parts(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.http_status_code();
        let response = ErrorResponse {
            code: self.code(),
            message: self.message(),
        };
        (status, Json(response))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.response_parts().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        for error in [
            AppError::MessagesEmpty,
            AppError::MessagesTooLong,
            AppError::MessagesPaymentRequired,
            AppError::ConversationsNotParticipant,
            AppError::ConversationsInvalidParticipants,
        ] {
            assert!(error.http_status_code().is_client_error(), "{}", error.code());
            assert!(!error.is_transient());
        }
    }

    #[test]
    fn store_unavailable_is_retryable() {
        let error = AppError::StoreUnavailable;
        assert!(error.is_transient());
        assert_eq!(error.http_status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn too_long_and_payment_required_are_distinguishable() {
        assert_ne!(
            AppError::MessagesTooLong.code(),
            AppError::MessagesPaymentRequired.code()
        );
        assert_ne!(
            AppError::MessagesTooLong.http_status_code(),
            AppError::MessagesPaymentRequired.http_status_code()
        );
    }
}
