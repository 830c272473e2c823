use tonic::{Code, Status};

use crate::error::{AppError, StorageError};

impl From<AppError> for Status {
    fn from(error: AppError) -> Self {
        let message = error.to_string();
        match error {
            AppError::BadRequest(_) => Self::new(Code::InvalidArgument, message),
            AppError::Unauthorized => Self::new(Code::Unauthenticated, message),
            AppError::Forbidden => Self::new(Code::PermissionDenied, message),
            AppError::UnknownShortId(_) => Self::new(Code::NotFound, message),
            AppError::Gone(_) => Self::new(Code::FailedPrecondition, message),
            AppError::Storage(StorageError::Unavailable | StorageError::Connection(_)) => {
                Self::new(Code::Unavailable, message)
            }
            AppError::Storage(_) | AppError::Internal(_) => Self::new(Code::Internal, message),
        }
    }
}
